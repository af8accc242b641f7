//! Target-schema draft models.
//!
//! A draft is an in-memory, not-yet-persisted entity. Drafts are owned by the
//! table pass that builds them and die at their batch flush; only the
//! identity indexes in [`crate::resolve`] outlive a table pass.

pub mod attribute;
pub mod defined_value;
pub mod document;
pub mod family;
pub mod financial;
pub mod person;

pub use attribute::{
    AttributeDefinition, AttributeEntityType, KnownAttributes, PendingAttributeValue, keys,
};
pub use defined_value::{DefinedValue, DefinedValueSet, LookupTables, well_known};
pub use document::{DocumentDraft, DocumentKind};
pub use family::{AddressDraft, FamilyDraft, FamilyStub};
pub use financial::{AccountDraft, BatchDraft, ContributionDraft, PledgeDraft, PledgeFrequency};
pub use person::{FamilyRole, Gender, PersonDraft, PhoneDraft};

/// Target-system person primary key, assigned post-commit
pub type PersonId = i64;
/// Target-system person alias primary key
pub type PersonAliasId = i64;
/// Target-system family group primary key
pub type FamilyId = i64;
/// Target-system financial account primary key
pub type AccountId = i64;
/// Target-system financial batch primary key
pub type BatchId = i64;
/// Target-system financial transaction primary key
pub type TransactionId = i64;
/// Target-system binary file primary key
pub type BinaryFileId = i64;
/// Target-system attribute definition primary key
pub type AttributeId = i64;
/// Target-system defined value primary key
pub type DefinedValueId = i64;
