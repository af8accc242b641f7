//! Family (household group) drafts.

use super::DefinedValueId;
use super::person::PersonDraft;

/// A postal address attached to a family group
#[derive(Debug, Clone, Default)]
pub struct AddressDraft {
    pub street1: String,
    pub street2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: Option<String>,
    /// Group-location type (Home, Work, Previous) as a defined value
    pub location_type_value_id: DefinedValueId,
}

/// The family-level fields of a draft, without its members.
///
/// Each member draft handed to the batch committer carries a copy of the
/// stub, so a flush boundary can fall in the middle of a household: the first
/// member creates the family, later members join it through the foreign
/// household key.
#[derive(Debug, Clone, Default)]
pub struct FamilyStub {
    /// Source-system household key
    pub foreign_household_id: Option<i64>,
    /// Family group name, e.g. "Smith Family"
    pub name: String,
    /// Campus resolved from the members, as a defined value
    pub campus_value_id: Option<DefinedValueId>,
}

/// An in-memory, not-yet-persisted family with its member drafts
#[derive(Debug, Clone, Default)]
pub struct FamilyDraft {
    pub foreign_household_id: Option<i64>,
    pub name: String,
    pub campus_value_id: Option<DefinedValueId>,
    pub members: Vec<PersonDraft>,
}

impl FamilyDraft {
    /// Create an empty family draft
    #[must_use]
    pub fn new(foreign_household_id: Option<i64>, name: &str) -> Self {
        Self {
            foreign_household_id,
            name: name.to_string(),
            campus_value_id: None,
            members: Vec::new(),
        }
    }

    /// The family-level fields, for handing to the committer per member
    #[must_use]
    pub fn stub(&self) -> FamilyStub {
        FamilyStub {
            foreign_household_id: self.foreign_household_id,
            name: self.name.clone(),
            campus_value_id: self.campus_value_id,
        }
    }

    /// Most frequent non-null campus string among the members.
    ///
    /// Ties break toward the campus encountered first in member order.
    #[must_use]
    pub fn dominant_campus(&self) -> Option<&str> {
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for member in &self.members {
            let Some(campus) = member.campus.as_deref() else {
                continue;
            };
            match counts.iter_mut().find(|(name, _)| *name == campus) {
                Some(entry) => entry.1 += 1,
                None => counts.push((campus, 1)),
            }
        }

        let mut best: Option<(&str, usize)> = None;
        for (name, count) in counts {
            match best {
                Some((_, best_count)) if count <= best_count => {}
                _ => best = Some((name, count)),
            }
        }
        best.map(|(name, _)| name)
    }
}
