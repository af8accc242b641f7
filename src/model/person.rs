//! Person draft and its enumerations.

use chrono::NaiveDate;
use smallvec::SmallVec;

use super::attribute::PendingAttributeValue;
use super::{AttributeId, DefinedValueId};

/// Gender of a person
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gender {
    /// No usable gender value in the source
    #[default]
    Unknown,
    Male,
    Female,
}

/// Role a person plays within their family group.
///
/// The rank ordering matters: when a household-scoped identity lookup has
/// several candidates, the lowest rank wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FamilyRole {
    Adult,
    Child,
    Visitor,
}

impl FamilyRole {
    /// Precedence used by household-scoped identity lookups
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Adult => 0,
            Self::Child => 1,
            Self::Visitor => 2,
        }
    }
}

/// A phone number attached to a person draft
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneDraft {
    /// Number type label from the source ("Home", "Mobile", ...)
    pub number_type: String,
    /// Digits-only number, truncated to the storage maximum
    pub number: String,
    /// Digits-only extension split off the raw value, if any
    pub extension: Option<String>,
    /// Whether the source marked the number unlisted
    pub is_unlisted: bool,
}

/// An in-memory, not-yet-persisted person
#[derive(Debug, Clone, Default)]
pub struct PersonDraft {
    /// Source-system individual key, if the source provides one
    pub foreign_individual_id: Option<i64>,
    /// Source-system household key, if the source provides one
    pub foreign_household_id: Option<i64>,
    pub first_name: String,
    /// "Goes by" name, when distinct from the legal first name
    pub nick_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub title_value_id: Option<DefinedValueId>,
    pub suffix_value_id: Option<DefinedValueId>,
    pub gender: Gender,
    pub birth_date: Option<NaiveDate>,
    pub marital_status_value_id: Option<DefinedValueId>,
    pub connection_status_value_id: Option<DefinedValueId>,
    pub is_deceased: bool,
    pub record_status_reason: Option<String>,
    pub email: Option<String>,
    pub is_email_active: bool,
    /// Raw campus string from the source row; the family aggregates these
    pub campus: Option<String>,
    /// Role the person holds as a member of their family group
    pub family_role: Option<FamilyRole>,
    /// Whether the source labelled this row "Visitor"
    pub visitor_label: bool,
    /// Whether the row represents a company rather than a natural person
    pub is_business: bool,
    pub phones: SmallVec<[PhoneDraft; 2]>,
    /// Attribute values waiting for the person to receive an identity
    pub attributes: Vec<PendingAttributeValue>,
}

impl PersonDraft {
    /// Create a draft with the minimum identifying information
    #[must_use]
    pub fn new(first_name: &str, last_name: &str) -> Self {
        Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            is_email_active: true,
            ..Self::default()
        }
    }

    /// Role of the committed group membership, defaulting to Adult
    #[must_use]
    pub fn group_role(&self) -> FamilyRole {
        self.family_role.unwrap_or(FamilyRole::Adult)
    }

    /// Role recorded in the identity index.
    ///
    /// Visitor-labelled rows keep the Adult group role but are indexed as
    /// visitors so household-scoped lookups rank them last and can exclude
    /// them entirely.
    #[must_use]
    pub fn identity_role(&self) -> FamilyRole {
        if self.visitor_label {
            FamilyRole::Visitor
        } else {
            self.group_role()
        }
    }

    /// Add a phone number, suppressing duplicates of the same normalized
    /// digits for this person. Returns whether the number was added.
    pub fn add_phone(&mut self, phone: PhoneDraft) -> bool {
        if self.phones.iter().any(|p| p.number == phone.number) {
            return false;
        }
        self.phones.push(phone);
        true
    }

    /// Queue an attribute value for materialization after commit
    pub fn add_attribute(&mut self, attribute_id: AttributeId, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            return;
        }
        self.attributes.push(PendingAttributeValue {
            attribute_id,
            value,
        });
    }
}
