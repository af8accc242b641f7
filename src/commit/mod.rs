//! Incremental batch commits.
//!
//! Drafts accumulate in a buffer and are flushed to the repository every
//! `reporting_number` draft-producing rows, inside one scoped transaction.
//! Attribute values need entity ids the repository assigns, so a flush runs
//! in phases: primary inserts first, then attribute materialization, then
//! alias and giving-group fixups. A failed flush rolls the whole batch back
//! and leaves the buffer untouched; a successful flush clears it.

use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::model::attribute::KnownAttributes;
use crate::model::family::FamilyStub;
use crate::model::person::{FamilyRole, PersonDraft};
use crate::model::{
    BatchDraft, ContributionDraft, DocumentDraft, FamilyId, PersonAliasId, PersonId, PledgeDraft,
};
use crate::model::document::DocumentKind;
use crate::repository::{AttributeStore, Repository};
use crate::resolve::{ForeignKeyMap, ForeignKind, IdentityResolver};

/// Default flush interval for person and transaction tables
pub const DEFAULT_REPORTING_NUMBER: usize = 100;
/// Default flush interval for batch tables
pub const BATCH_REPORTING_NUMBER: usize = 50;
/// Default flush interval for attachment scans
pub const DOCUMENT_REPORTING_NUMBER: usize = 30;

/// One accumulated draft awaiting flush
#[derive(Debug, Clone)]
pub enum Draft {
    /// A person together with the family-level fields of their household
    Person {
        person: PersonDraft,
        family: FamilyStub,
    },
    Batch(BatchDraft),
    Contribution(ContributionDraft),
    Pledge(PledgeDraft),
    Document(DocumentDraft),
}

/// Identity assignments collected during a flush, applied only after the
/// transaction commits
#[derive(Debug, Default)]
struct FlushAssignments {
    people: Vec<(i64, PersonId, PersonAliasId, FamilyId)>,
    keys: Vec<(ForeignKind, i64, i64)>,
}

/// Accumulates drafts and flushes them in bounded batches
#[derive(Debug)]
pub struct BatchCommitter {
    reporting_number: usize,
    buffer: Vec<Draft>,
}

impl BatchCommitter {
    #[must_use]
    pub fn new(reporting_number: usize) -> Self {
        Self {
            reporting_number: reporting_number.max(1),
            buffer: Vec::new(),
        }
    }

    /// The configured flush interval
    #[must_use]
    pub const fn reporting_number(&self) -> usize {
        self.reporting_number
    }

    /// Accumulate one draft
    pub fn add(&mut self, draft: Draft) {
        self.buffer.push(draft);
    }

    /// Number of drafts waiting for the next flush
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the per-table completed counter sits on a flush boundary.
    ///
    /// The counter only counts rows that produced a draft; skipped rows do
    /// not move it.
    #[must_use]
    pub const fn should_flush(&self, completed: usize) -> bool {
        completed > 0 && completed % self.reporting_number == 0
    }

    /// Flush the accumulated batch inside one scoped transaction.
    ///
    /// All-or-nothing: on error the transaction is rolled back, the buffer
    /// is kept for diagnosis, and the error propagates. On success the
    /// buffer is cleared and newly assigned identities are published to the
    /// resolver and key map. Returns the number of drafts committed.
    pub fn flush<R: Repository + AttributeStore>(
        &mut self,
        repository: &mut R,
        resolver: &mut IdentityResolver,
        keys: &mut ForeignKeyMap,
        attributes: &KnownAttributes,
    ) -> Result<usize> {
        if self.buffer.is_empty() {
            return Ok(0);
        }

        repository.begin_transaction();
        let assignments = match self.run_phases(repository, keys, attributes) {
            Ok(assignments) => assignments,
            Err(e) => {
                repository.rollback_transaction();
                return Err(e);
            }
        };
        repository.commit_transaction()?;

        for (foreign_id, person_id, alias_id, family_id) in assignments.people {
            resolver.assign_identity(foreign_id, person_id, alias_id, family_id);
        }
        for (kind, foreign_id, target_id) in assignments.keys {
            keys.fulfill(kind, foreign_id, target_id);
        }

        let committed = self.buffer.len();
        self.buffer.clear();
        Ok(committed)
    }

    fn run_phases<R: Repository + AttributeStore>(
        &self,
        repository: &mut R,
        keys: &ForeignKeyMap,
        attributes: &KnownAttributes,
    ) -> Result<FlushAssignments> {
        let mut assignments = FlushAssignments::default();
        // Families created within this flush, by foreign household id
        let mut local_families: FxHashMap<i64, FamilyId> = FxHashMap::default();
        // (buffer index, person id, family id) for the fixup phases
        let mut inserted_people: Vec<(usize, PersonId, FamilyId)> = Vec::new();
        let mut inserted_batches: Vec<(usize, i64)> = Vec::new();
        let mut inserted_transactions: Vec<(usize, i64)> = Vec::new();
        let mut inserted_files: Vec<(usize, i64)> = Vec::new();

        // Phase 1: primary inserts, which assign entity ids
        for (index, draft) in self.buffer.iter().enumerate() {
            match draft {
                Draft::Person { person, family } => {
                    let family_id =
                        self.family_for(repository, keys, &mut local_families, family)?;
                    let person_id = repository.insert_person(person, family_id)?;
                    inserted_people.push((index, person_id, family_id));
                }
                Draft::Batch(batch) => {
                    let batch_id = repository.insert_batch(batch)?;
                    inserted_batches.push((index, batch_id));
                    assignments
                        .keys
                        .push((ForeignKind::Batch, batch.foreign_batch_id, batch_id));
                }
                Draft::Contribution(contribution) => {
                    let batch_id = contribution
                        .foreign_batch_id
                        .and_then(|foreign| keys.get(ForeignKind::Batch, foreign));
                    let transaction_id = repository.insert_transaction(contribution, batch_id)?;
                    inserted_transactions.push((index, transaction_id));
                    assignments.keys.push((
                        ForeignKind::Contribution,
                        contribution.foreign_contribution_id,
                        transaction_id,
                    ));
                }
                Draft::Pledge(pledge) => {
                    repository.insert_pledge(pledge)?;
                }
                Draft::Document(document) => {
                    let file_id = repository.insert_binary_file(document)?;
                    inserted_files.push((index, file_id));
                }
            }
        }

        // Phase 2: attribute values, now that owners have ids
        for &(index, person_id, _) in &inserted_people {
            let Draft::Person { person, .. } = &self.buffer[index] else {
                continue;
            };
            if let Some(foreign_id) = person.foreign_individual_id {
                repository.insert_value(
                    attributes.individual_id,
                    person_id,
                    &foreign_id.to_string(),
                )?;
            }
            if let Some(foreign_id) = person.foreign_household_id {
                repository.insert_value(
                    attributes.household_id,
                    person_id,
                    &foreign_id.to_string(),
                )?;
            }
            for pending in &person.attributes {
                repository.insert_value(pending.attribute_id, person_id, &pending.value)?;
            }
        }
        for &(index, batch_id) in &inserted_batches {
            let Draft::Batch(batch) = &self.buffer[index] else {
                continue;
            };
            repository.insert_value(
                attributes.batch_id,
                batch_id,
                &batch.foreign_batch_id.to_string(),
            )?;
        }
        for &(index, transaction_id) in &inserted_transactions {
            let Draft::Contribution(contribution) = &self.buffer[index] else {
                continue;
            };
            repository.insert_value(
                attributes.contribution_id,
                transaction_id,
                &contribution.foreign_contribution_id.to_string(),
            )?;
        }
        for &(index, file_id) in &inserted_files {
            let Draft::Document(document) = &self.buffer[index] else {
                continue;
            };
            if let Some(attribute_id) = document.attribute_id {
                repository.insert_value(attribute_id, document.person_id, &file_id.to_string())?;
            }
        }

        // Phase 3: one self-referencing alias per person, idempotent
        for &(index, person_id, family_id) in &inserted_people {
            let alias_id = repository.ensure_person_alias(person_id)?;
            let Draft::Person { person, .. } = &self.buffer[index] else {
                continue;
            };
            if let Some(foreign_id) = person.foreign_individual_id {
                assignments
                    .people
                    .push((foreign_id, person_id, alias_id, family_id));
            }
            if let Some(foreign_household_id) = person.foreign_household_id {
                assignments
                    .keys
                    .push((ForeignKind::Household, foreign_household_id, family_id));
            }
        }

        // Phase 4: giving group for non-child members, portraits for files
        for &(index, person_id, family_id) in &inserted_people {
            let Draft::Person { person, .. } = &self.buffer[index] else {
                continue;
            };
            if person.group_role() != FamilyRole::Child {
                repository.set_giving_group(person_id, family_id)?;
            }
        }
        for &(index, file_id) in &inserted_files {
            let Draft::Document(document) = &self.buffer[index] else {
                continue;
            };
            if document.kind == DocumentKind::Portrait {
                repository.set_person_photo(document.person_id, file_id)?;
            }
        }

        repository.save_changes(true)?;
        Ok(assignments)
    }

    fn family_for<R: Repository>(
        &self,
        repository: &mut R,
        keys: &ForeignKeyMap,
        local_families: &mut FxHashMap<i64, FamilyId>,
        family: &FamilyStub,
    ) -> Result<FamilyId> {
        let Some(foreign_household_id) = family.foreign_household_id else {
            // No grouping key: every such person gets their own family
            return repository.insert_family(family);
        };

        if let Some(family_id) = keys.get(ForeignKind::Household, foreign_household_id) {
            return Ok(family_id);
        }
        if let Some(&family_id) = local_families.get(&foreign_household_id) {
            return Ok(family_id);
        }

        let family_id = repository.insert_family(family)?;
        local_families.insert(foreign_household_id, family_id);
        Ok(family_id)
    }
}
