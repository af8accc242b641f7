//! Identity resolution against previously-imported records.
//!
//! Two long-lived indexes survive the whole run: the person index, which
//! answers "does this foreign key already map to a target person", and the
//! foreign-key map for batches, contributions, ministries, and funds. Both
//! are seeded from the repository once and appended to in-memory as new
//! records are drafted, so later rows in the same streaming pass can
//! reference a record created earlier in the pass without re-querying.

use rustc_hash::FxHashMap;

use crate::model::person::FamilyRole;
use crate::model::{FamilyId, PersonAliasId, PersonId};
use crate::repository::CommittedPerson;

/// Identity of a person the run knows about.
///
/// `person_id` and `person_alias_id` are `None` while the person is drafted
/// but not yet flushed; the committer fills them in after a successful
/// flush.
#[derive(Debug, Clone)]
pub struct ImportedPersonKey {
    pub person_id: Option<PersonId>,
    pub person_alias_id: Option<PersonAliasId>,
    pub foreign_individual_id: Option<i64>,
    pub foreign_household_id: Option<i64>,
    pub family_role: FamilyRole,
    pub family_id: Option<FamilyId>,
}

/// In-memory index of known people, by foreign identifier
#[derive(Debug, Default)]
pub struct IdentityResolver {
    keys: Vec<ImportedPersonKey>,
    by_individual: FxHashMap<i64, usize>,
    /// Candidate indexes per household, in insertion order
    by_household: FxHashMap<i64, Vec<usize>>,
}

impl IdentityResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk-load the index from previously-committed people
    pub fn seed(&mut self, committed: impl IntoIterator<Item = CommittedPerson>) {
        for person in committed {
            self.add(ImportedPersonKey {
                person_id: Some(person.person_id),
                person_alias_id: Some(person.person_alias_id),
                foreign_individual_id: person.foreign_individual_id,
                foreign_household_id: person.foreign_household_id,
                family_role: person.family_role,
                family_id: person.family_id,
            });
        }
    }

    /// Append a key, preserving the uniqueness of foreign individual ids.
    ///
    /// A second key for an already-indexed individual is dropped; the first
    /// one wins. Returns whether the key was added.
    pub fn add(&mut self, key: ImportedPersonKey) -> bool {
        if let Some(individual_id) = key.foreign_individual_id {
            if self.by_individual.contains_key(&individual_id) {
                return false;
            }
        }

        let index = self.keys.len();
        if let Some(individual_id) = key.foreign_individual_id {
            self.by_individual.insert(individual_id, index);
        }
        if let Some(household_id) = key.foreign_household_id {
            self.by_household.entry(household_id).or_default().push(index);
        }
        self.keys.push(key);
        true
    }

    /// Look up a person by foreign identifiers.
    ///
    /// With an individual id the match is exact or nothing. With only a
    /// household id, candidates are ranked Adult before Child before
    /// Visitor (insertion order breaks ties) and visitors are excluded
    /// entirely when `include_visitors` is false. Absence is `None`, never
    /// an error: callers treat it as "create new".
    #[must_use]
    pub fn lookup(
        &self,
        foreign_individual_id: Option<i64>,
        foreign_household_id: Option<i64>,
        include_visitors: bool,
    ) -> Option<&ImportedPersonKey> {
        if let Some(individual_id) = foreign_individual_id {
            return self
                .by_individual
                .get(&individual_id)
                .map(|&index| &self.keys[index]);
        }

        let household_id = foreign_household_id?;
        let candidates = self.by_household.get(&household_id)?;

        let mut best: Option<&ImportedPersonKey> = None;
        for &index in candidates {
            let key = &self.keys[index];
            if !include_visitors && key.family_role == FamilyRole::Visitor {
                continue;
            }
            match best {
                Some(current) if key.family_role.rank() >= current.family_role.rank() => {}
                _ => best = Some(key),
            }
        }
        best
    }

    /// Whether a foreign individual id is already indexed
    #[must_use]
    pub fn contains_individual(&self, foreign_individual_id: i64) -> bool {
        self.by_individual.contains_key(&foreign_individual_id)
    }

    /// Fill in the committed identity of a drafted person
    pub fn assign_identity(
        &mut self,
        foreign_individual_id: i64,
        person_id: PersonId,
        person_alias_id: PersonAliasId,
        family_id: FamilyId,
    ) {
        if let Some(&index) = self.by_individual.get(&foreign_individual_id) {
            let key = &mut self.keys[index];
            key.person_id = Some(person_id);
            key.person_alias_id = Some(person_alias_id);
            key.family_id = Some(family_id);
        }
    }

    /// Number of people the index knows about
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no person has been indexed yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Domains the foreign-key map distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForeignKind {
    Batch,
    Contribution,
    Household,
}

/// Maps foreign identifiers to target identifiers, first mapping wins.
///
/// A reserved entry (target not yet known) still counts as present, so a
/// duplicate source row never creates a second parent while the first one
/// is waiting for its flush.
#[derive(Debug, Default)]
pub struct ForeignKeyMap {
    inner: FxHashMap<(ForeignKind, i64), Option<i64>>,
}

impl ForeignKeyMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a foreign id has been seen, mapped or reserved
    #[must_use]
    pub fn contains(&self, kind: ForeignKind, foreign_id: i64) -> bool {
        self.inner.contains_key(&(kind, foreign_id))
    }

    /// The mapped target id, if the mapping has been fulfilled
    #[must_use]
    pub fn get(&self, kind: ForeignKind, foreign_id: i64) -> Option<i64> {
        self.inner.get(&(kind, foreign_id)).copied().flatten()
    }

    /// Mark a foreign id as drafted before its target id exists.
    /// Returns false when the id was already present.
    pub fn reserve(&mut self, kind: ForeignKind, foreign_id: i64) -> bool {
        match self.inner.entry((kind, foreign_id)) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(None);
                true
            }
        }
    }

    /// Record the target id for a foreign id; an existing fulfilled mapping
    /// is kept unchanged
    pub fn fulfill(&mut self, kind: ForeignKind, foreign_id: i64, target_id: i64) {
        let entry = self.inner.entry((kind, foreign_id)).or_insert(None);
        if entry.is_none() {
            *entry = Some(target_id);
        }
    }

    /// Number of foreign ids tracked
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the map is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
