//! Target persistence boundary.
//!
//! The engine talks to the target schema through two narrow traits: a
//! transactional [`Repository`] for fixed-column entities and an
//! [`AttributeStore`] for the schema-less extension fields. Production
//! deployments put a real database behind these; the in-memory
//! implementation backs the test suite and the demo path.

pub mod memory;

pub use memory::MemoryRepository;

use crate::error::Result;
use crate::model::family::{AddressDraft, FamilyStub};
use crate::model::person::{FamilyRole, PersonDraft, PhoneDraft};
use crate::model::{
    AccountDraft, AccountId, AttributeId, BatchDraft, BatchId, BinaryFileId, ContributionDraft,
    DocumentDraft, FamilyId, PersonAliasId, PersonId, PledgeDraft, TransactionId,
};
use crate::model::attribute::AttributeEntityType;

/// A previously-committed person, re-derived from foreign-id attributes
#[derive(Debug, Clone)]
pub struct CommittedPerson {
    pub person_id: PersonId,
    pub person_alias_id: PersonAliasId,
    pub foreign_individual_id: Option<i64>,
    pub foreign_household_id: Option<i64>,
    pub family_role: FamilyRole,
    pub family_id: Option<FamilyId>,
}

/// An existing fund account, as seen by the fund matcher
#[derive(Debug, Clone)]
pub struct AccountRecord {
    pub id: AccountId,
    pub name: String,
    pub campus_scope: Option<String>,
}

/// Transactional create/query/save surface of the target schema
pub trait Repository {
    /// Open the transaction scope one flush runs inside
    fn begin_transaction(&mut self);
    /// Commit the open scope; on error the scope is rolled back
    fn commit_transaction(&mut self) -> Result<()>;
    /// Discard everything since `begin_transaction`
    fn rollback_transaction(&mut self);

    fn insert_family(&mut self, family: &FamilyStub) -> Result<FamilyId>;
    fn insert_person(&mut self, person: &PersonDraft, family_id: FamilyId) -> Result<PersonId>;
    /// Create the person's self-referencing alias if it does not exist yet
    fn ensure_person_alias(&mut self, person_id: PersonId) -> Result<PersonAliasId>;
    fn set_giving_group(&mut self, person_id: PersonId, family_id: FamilyId) -> Result<()>;
    fn set_person_photo(&mut self, person_id: PersonId, file_id: BinaryFileId) -> Result<()>;

    /// Current primary email and its active flag
    fn person_email(&self, person_id: PersonId) -> Result<Option<(String, bool)>>;
    fn set_person_email(&mut self, person_id: PersonId, email: &str, active: bool) -> Result<()>;
    /// Normalized numbers already stored for the person
    fn person_phones(&self, person_id: PersonId) -> Result<Vec<String>>;
    fn add_person_phone(&mut self, person_id: PersonId, phone: &PhoneDraft) -> Result<()>;

    fn add_family_address(&mut self, family_id: FamilyId, address: &AddressDraft) -> Result<()>;

    fn insert_batch(&mut self, batch: &BatchDraft) -> Result<BatchId>;
    fn insert_transaction(
        &mut self,
        contribution: &ContributionDraft,
        batch_id: Option<BatchId>,
    ) -> Result<TransactionId>;
    fn insert_pledge(&mut self, pledge: &PledgeDraft) -> Result<i64>;

    fn insert_account(&mut self, account: &AccountDraft) -> Result<AccountId>;
    fn accounts(&self) -> Result<Vec<AccountRecord>>;

    fn insert_binary_file(&mut self, document: &DocumentDraft) -> Result<BinaryFileId>;

    /// People committed by earlier runs, keyed by their foreign-id attributes
    fn previously_imported_people(&self) -> Result<Vec<CommittedPerson>>;
    /// Foreign batch ids committed by earlier runs and their target ids
    fn previously_imported_batches(&self) -> Result<Vec<(i64, BatchId)>>;
    /// Foreign contribution ids committed by earlier runs and their target ids
    fn previously_imported_contributions(&self) -> Result<Vec<(i64, TransactionId)>>;

    fn save_changes(&mut self, disable_audit: bool) -> Result<()>;
}

/// Uniqueness-checked attribute definition and value store
pub trait AttributeStore {
    /// Idempotent, name-guarded upsert of an attribute definition
    fn get_or_create_attribute(
        &mut self,
        entity_type: AttributeEntityType,
        key: &str,
        field_type: &str,
        name: &str,
        description: &str,
    ) -> Result<AttributeId>;

    /// Insert a value for an entity; an existing value for the same
    /// attribute and entity is kept unchanged
    fn insert_value(&mut self, attribute_id: AttributeId, entity_id: i64, value: &str)
    -> Result<()>;

    /// All (entity id, value) pairs stored for an attribute
    fn values_by_attribute(&self, attribute_id: AttributeId) -> Result<Vec<(i64, String)>>;
}
