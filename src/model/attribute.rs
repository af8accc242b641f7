//! Attribute definitions and pending values.
//!
//! Attributes are the target schema's schema-less extension fields. Their
//! *definitions* may be upserted synchronously while building drafts; their
//! *values* are only written after the owning entity has a committed
//! identity.

use super::AttributeId;
use crate::error::Result;
use crate::repository::AttributeStore;

/// Entity kind an attribute definition is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeEntityType {
    Person,
    FinancialTransaction,
    FinancialBatch,
}

/// A dynamically-defined extension field
#[derive(Debug, Clone)]
pub struct AttributeDefinition {
    pub id: AttributeId,
    pub entity_type: AttributeEntityType,
    /// Stable key the definition is looked up by
    pub key: String,
    pub name: String,
    /// Field type tag, e.g. "Text", "File"
    pub field_type: String,
    pub description: String,
}

/// An attribute value waiting for its owner to receive an identity
#[derive(Debug, Clone)]
pub struct PendingAttributeValue {
    pub attribute_id: AttributeId,
    pub value: String,
}

/// Well-known attribute keys
pub mod keys {
    /// Foreign individual key preserved for dedupe and re-import detection
    pub const FOREIGN_INDIVIDUAL_ID: &str = "F1IndividualId";
    /// Foreign household key preserved for household-scoped lookups
    pub const FOREIGN_HOUSEHOLD_ID: &str = "F1HouseholdId";
    /// Foreign contribution key preserved on imported transactions
    pub const FOREIGN_CONTRIBUTION_ID: &str = "F1ContributionId";
    /// Foreign batch key preserved on imported batches
    pub const FOREIGN_BATCH_ID: &str = "F1BatchId";
    /// Extra email addresses that did not become the primary email
    pub const SECONDARY_EMAIL: &str = "SecondaryEmail";
    pub const TWITTER: &str = "TwitterUsername";
    pub const FACEBOOK: &str = "FacebookUsername";
    pub const POSITION: &str = "Position";
    pub const SCHOOL: &str = "School";
    pub const EMPLOYER: &str = "Employer";
    pub const FORMER_CHURCH: &str = "FormerChurch";
}

/// Attribute ids the engine needs on every run, created up front.
///
/// The upsert is idempotent and guarded by a key lookup, so re-running the
/// tool reuses the definitions committed by an earlier run.
#[derive(Debug, Clone, Copy)]
pub struct KnownAttributes {
    pub individual_id: AttributeId,
    pub household_id: AttributeId,
    pub contribution_id: AttributeId,
    pub batch_id: AttributeId,
    pub secondary_email: AttributeId,
}

impl KnownAttributes {
    /// Ensure every well-known definition exists and collect its id
    pub fn ensure(store: &mut impl AttributeStore) -> Result<Self> {
        let individual_id = store.get_or_create_attribute(
            AttributeEntityType::Person,
            keys::FOREIGN_INDIVIDUAL_ID,
            "Text",
            "F1 Individual Id",
            "Individual key from the source system",
        )?;
        let household_id = store.get_or_create_attribute(
            AttributeEntityType::Person,
            keys::FOREIGN_HOUSEHOLD_ID,
            "Text",
            "F1 Household Id",
            "Household key from the source system",
        )?;
        let contribution_id = store.get_or_create_attribute(
            AttributeEntityType::FinancialTransaction,
            keys::FOREIGN_CONTRIBUTION_ID,
            "Text",
            "F1 Contribution Id",
            "Contribution key from the source system",
        )?;
        let batch_id = store.get_or_create_attribute(
            AttributeEntityType::FinancialBatch,
            keys::FOREIGN_BATCH_ID,
            "Text",
            "F1 Batch Id",
            "Batch key from the source system",
        )?;
        let secondary_email = store.get_or_create_attribute(
            AttributeEntityType::Person,
            keys::SECONDARY_EMAIL,
            "Text",
            "Secondary Email",
            "Email address that did not become the primary email",
        )?;

        Ok(Self {
            individual_id,
            household_id,
            contribution_id,
            batch_id,
            secondary_email,
        })
    }
}
