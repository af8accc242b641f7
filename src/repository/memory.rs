//! In-memory target repository.
//!
//! Backs the test suite and the demo path. Transaction scopes are snapshots
//! of the whole state: `begin_transaction` clones it, `rollback_transaction`
//! restores the clone.

use chrono::NaiveDate;

use super::{AccountRecord, AttributeStore, CommittedPerson, Repository};
use crate::error::{Error, Result};
use crate::model::attribute::{AttributeDefinition, AttributeEntityType, keys};
use crate::model::family::{AddressDraft, FamilyStub};
use crate::model::person::{FamilyRole, Gender, PersonDraft, PhoneDraft};
use crate::model::{
    AccountDraft, AccountId, AttributeId, BatchDraft, BatchId, BinaryFileId, ContributionDraft,
    DefinedValueId, DocumentDraft, FamilyId, PersonAliasId, PersonId, PledgeDraft, TransactionId,
};

/// A committed family group row
#[derive(Debug, Clone)]
pub struct FamilyRecord {
    pub id: FamilyId,
    pub foreign_household_id: Option<i64>,
    pub name: String,
    pub campus_value_id: Option<DefinedValueId>,
    pub addresses: Vec<AddressDraft>,
}

/// A committed person row
#[derive(Debug, Clone)]
pub struct PersonRecord {
    pub id: PersonId,
    pub family_id: FamilyId,
    pub giving_group_id: Option<FamilyId>,
    pub first_name: String,
    pub nick_name: Option<String>,
    pub last_name: String,
    pub gender: Gender,
    pub birth_date: Option<NaiveDate>,
    pub family_role: FamilyRole,
    pub marital_status_value_id: Option<DefinedValueId>,
    pub connection_status_value_id: Option<DefinedValueId>,
    pub is_deceased: bool,
    pub record_status_reason: Option<String>,
    pub email: Option<(String, bool)>,
    pub phones: Vec<PhoneDraft>,
    pub is_business: bool,
    pub photo_file_id: Option<BinaryFileId>,
}

/// A committed financial batch row
#[derive(Debug, Clone)]
pub struct BatchRecord {
    pub id: BatchId,
    pub name: String,
    pub batch_date: Option<NaiveDate>,
    pub control_amount: f64,
}

/// A committed financial transaction row
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub batch_id: Option<BatchId>,
    pub authorized_alias_id: PersonAliasId,
    pub amount: f64,
    pub transaction_date: Option<NaiveDate>,
    pub currency_type_value_id: DefinedValueId,
    pub transaction_code: Option<String>,
    pub summary: Option<String>,
    pub account_id: AccountId,
}

/// A committed pledge row
#[derive(Debug, Clone)]
pub struct PledgeRecord {
    pub id: i64,
    pub alias_id: PersonAliasId,
    pub account_id: AccountId,
    pub total_amount: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// A committed binary file row
#[derive(Debug, Clone)]
pub struct BinaryFileRecord {
    pub id: BinaryFileId,
    pub file_name: String,
    pub mime_type: String,
    pub size: usize,
}

#[derive(Debug, Clone, Default)]
struct State {
    next_id: i64,
    families: Vec<FamilyRecord>,
    people: Vec<PersonRecord>,
    aliases: Vec<(PersonAliasId, PersonId)>,
    batches: Vec<BatchRecord>,
    transactions: Vec<TransactionRecord>,
    pledges: Vec<PledgeRecord>,
    accounts: Vec<(AccountId, String, Option<String>, bool)>,
    binary_files: Vec<BinaryFileRecord>,
    attributes: Vec<AttributeDefinition>,
    attribute_values: Vec<(AttributeId, i64, String)>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn attribute_id(&self, entity_type: AttributeEntityType, key: &str) -> Option<AttributeId> {
        self.attributes
            .iter()
            .find(|a| a.entity_type == entity_type && a.key == key)
            .map(|a| a.id)
    }

    fn value_for(&self, attribute_id: AttributeId, entity_id: i64) -> Option<&str> {
        self.attribute_values
            .iter()
            .find(|(attr, entity, _)| *attr == attribute_id && *entity == entity_id)
            .map(|(_, _, value)| value.as_str())
    }
}

/// In-memory implementation of the repository and attribute store
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: State,
    snapshot: Option<State>,
    /// Number of `save_changes` calls observed, for tests
    pub saves: usize,
    /// When set, the next `commit_transaction` fails and rolls back
    pub fail_next_commit: bool,
}

impl MemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // Read accessors used by tests and the run summary

    #[must_use]
    pub fn families(&self) -> &[FamilyRecord] {
        &self.state.families
    }

    #[must_use]
    pub fn people(&self) -> &[PersonRecord] {
        &self.state.people
    }

    #[must_use]
    pub fn members_of(&self, family_id: FamilyId) -> Vec<&PersonRecord> {
        self.state
            .people
            .iter()
            .filter(|p| p.family_id == family_id)
            .collect()
    }

    #[must_use]
    pub fn batches(&self) -> &[BatchRecord] {
        &self.state.batches
    }

    #[must_use]
    pub fn transactions(&self) -> &[TransactionRecord] {
        &self.state.transactions
    }

    #[must_use]
    pub fn pledges(&self) -> &[PledgeRecord] {
        &self.state.pledges
    }

    #[must_use]
    pub fn binary_files(&self) -> &[BinaryFileRecord] {
        &self.state.binary_files
    }

    #[must_use]
    pub fn aliases(&self) -> &[(PersonAliasId, PersonId)] {
        &self.state.aliases
    }

    fn person_mut(&mut self, person_id: PersonId) -> Result<&mut PersonRecord> {
        self.state
            .people
            .iter_mut()
            .find(|p| p.id == person_id)
            .ok_or_else(|| Error::Repository(format!("no person with id {person_id}")))
    }

    fn validate_person(person: &PersonDraft) -> Result<()> {
        let mut messages = Vec::new();
        if person.last_name.trim().is_empty() {
            messages.push("LastName must not be empty".to_string());
        }
        if person.first_name.trim().is_empty() && !person.is_business {
            messages.push("FirstName must not be empty".to_string());
        }
        if messages.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation {
                entity: "Person".to_string(),
                messages,
            })
        }
    }
}

impl Repository for MemoryRepository {
    fn begin_transaction(&mut self) {
        self.snapshot = Some(self.state.clone());
    }

    fn commit_transaction(&mut self) -> Result<()> {
        if self.fail_next_commit {
            self.fail_next_commit = false;
            self.rollback_transaction();
            return Err(Error::Validation {
                entity: "Person".to_string(),
                messages: vec!["injected constraint violation".to_string()],
            });
        }
        self.snapshot = None;
        Ok(())
    }

    fn rollback_transaction(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.state = snapshot;
        }
    }

    fn insert_family(&mut self, family: &FamilyStub) -> Result<FamilyId> {
        let id = self.state.next_id();
        self.state.families.push(FamilyRecord {
            id,
            foreign_household_id: family.foreign_household_id,
            name: family.name.clone(),
            campus_value_id: family.campus_value_id,
            addresses: Vec::new(),
        });
        Ok(id)
    }

    fn insert_person(&mut self, person: &PersonDraft, family_id: FamilyId) -> Result<PersonId> {
        Self::validate_person(person)?;
        let id = self.state.next_id();
        self.state.people.push(PersonRecord {
            id,
            family_id,
            giving_group_id: None,
            first_name: person.first_name.clone(),
            nick_name: person.nick_name.clone(),
            last_name: person.last_name.clone(),
            gender: person.gender,
            birth_date: person.birth_date,
            family_role: person.group_role(),
            marital_status_value_id: person.marital_status_value_id,
            connection_status_value_id: person.connection_status_value_id,
            is_deceased: person.is_deceased,
            record_status_reason: person.record_status_reason.clone(),
            email: person.email.clone().map(|e| (e, person.is_email_active)),
            phones: person.phones.to_vec(),
            is_business: person.is_business,
            photo_file_id: None,
        });
        Ok(id)
    }

    fn ensure_person_alias(&mut self, person_id: PersonId) -> Result<PersonAliasId> {
        if let Some((alias_id, _)) = self.state.aliases.iter().find(|(_, p)| *p == person_id) {
            return Ok(*alias_id);
        }
        let id = self.state.next_id();
        self.state.aliases.push((id, person_id));
        Ok(id)
    }

    fn set_giving_group(&mut self, person_id: PersonId, family_id: FamilyId) -> Result<()> {
        self.person_mut(person_id)?.giving_group_id = Some(family_id);
        Ok(())
    }

    fn set_person_photo(&mut self, person_id: PersonId, file_id: BinaryFileId) -> Result<()> {
        self.person_mut(person_id)?.photo_file_id = Some(file_id);
        Ok(())
    }

    fn person_email(&self, person_id: PersonId) -> Result<Option<(String, bool)>> {
        Ok(self
            .state
            .people
            .iter()
            .find(|p| p.id == person_id)
            .and_then(|p| p.email.clone()))
    }

    fn set_person_email(&mut self, person_id: PersonId, email: &str, active: bool) -> Result<()> {
        self.person_mut(person_id)?.email = Some((email.to_string(), active));
        Ok(())
    }

    fn person_phones(&self, person_id: PersonId) -> Result<Vec<String>> {
        Ok(self
            .state
            .people
            .iter()
            .find(|p| p.id == person_id)
            .map(|p| p.phones.iter().map(|phone| phone.number.clone()).collect())
            .unwrap_or_default())
    }

    fn add_person_phone(&mut self, person_id: PersonId, phone: &PhoneDraft) -> Result<()> {
        let person = self.person_mut(person_id)?;
        if !person.phones.iter().any(|p| p.number == phone.number) {
            person.phones.push(phone.clone());
        }
        Ok(())
    }

    fn add_family_address(&mut self, family_id: FamilyId, address: &AddressDraft) -> Result<()> {
        let family = self
            .state
            .families
            .iter_mut()
            .find(|f| f.id == family_id)
            .ok_or_else(|| Error::Repository(format!("no family with id {family_id}")))?;
        family.addresses.push(address.clone());
        Ok(())
    }

    fn insert_batch(&mut self, batch: &BatchDraft) -> Result<BatchId> {
        let id = self.state.next_id();
        self.state.batches.push(BatchRecord {
            id,
            name: batch.name.clone(),
            batch_date: batch.batch_date,
            control_amount: batch.control_amount,
        });
        Ok(id)
    }

    fn insert_transaction(
        &mut self,
        contribution: &ContributionDraft,
        batch_id: Option<BatchId>,
    ) -> Result<TransactionId> {
        let id = self.state.next_id();
        self.state.transactions.push(TransactionRecord {
            id,
            batch_id,
            authorized_alias_id: contribution.authorized_alias_id,
            amount: contribution.amount,
            transaction_date: contribution.transaction_date,
            currency_type_value_id: contribution.currency_type_value_id,
            transaction_code: contribution.transaction_code.clone(),
            summary: contribution.summary.clone(),
            account_id: contribution.account_id,
        });
        Ok(id)
    }

    fn insert_pledge(&mut self, pledge: &PledgeDraft) -> Result<i64> {
        let id = self.state.next_id();
        self.state.pledges.push(PledgeRecord {
            id,
            alias_id: pledge.alias_id,
            account_id: pledge.account_id,
            total_amount: pledge.total_amount,
            start_date: pledge.start_date,
            end_date: pledge.end_date,
        });
        Ok(id)
    }

    fn insert_account(&mut self, account: &AccountDraft) -> Result<AccountId> {
        let id = self.state.next_id();
        self.state.accounts.push((
            id,
            account.name.clone(),
            account.campus_scope.clone(),
            account.is_active,
        ));
        Ok(id)
    }

    fn accounts(&self) -> Result<Vec<AccountRecord>> {
        Ok(self
            .state
            .accounts
            .iter()
            .map(|(id, name, campus_scope, _)| AccountRecord {
                id: *id,
                name: name.clone(),
                campus_scope: campus_scope.clone(),
            })
            .collect())
    }

    fn insert_binary_file(&mut self, document: &DocumentDraft) -> Result<BinaryFileId> {
        let id = self.state.next_id();
        self.state.binary_files.push(BinaryFileRecord {
            id,
            file_name: document.file_name.clone(),
            mime_type: document.mime_type.clone(),
            size: document.data.len(),
        });
        Ok(id)
    }

    fn previously_imported_people(&self) -> Result<Vec<CommittedPerson>> {
        let individual_attr = self
            .state
            .attribute_id(AttributeEntityType::Person, keys::FOREIGN_INDIVIDUAL_ID);
        let household_attr = self
            .state
            .attribute_id(AttributeEntityType::Person, keys::FOREIGN_HOUSEHOLD_ID);

        let mut committed = Vec::new();
        for person in &self.state.people {
            let foreign_individual_id = individual_attr
                .and_then(|attr| self.state.value_for(attr, person.id))
                .and_then(|v| v.parse().ok());
            let foreign_household_id = household_attr
                .and_then(|attr| self.state.value_for(attr, person.id))
                .and_then(|v| v.parse().ok());
            if foreign_individual_id.is_none() && foreign_household_id.is_none() {
                continue;
            }
            let person_alias_id = self
                .state
                .aliases
                .iter()
                .find(|(_, p)| *p == person.id)
                .map_or(0, |(alias, _)| *alias);
            committed.push(CommittedPerson {
                person_id: person.id,
                person_alias_id,
                foreign_individual_id,
                foreign_household_id,
                family_role: person.family_role,
                family_id: Some(person.family_id),
            });
        }

        Ok(committed)
    }

    fn previously_imported_batches(&self) -> Result<Vec<(i64, BatchId)>> {
        let Some(attr) = self
            .state
            .attribute_id(AttributeEntityType::FinancialBatch, keys::FOREIGN_BATCH_ID)
        else {
            return Ok(Vec::new());
        };
        Ok(self
            .state
            .attribute_values
            .iter()
            .filter(|(a, _, _)| *a == attr)
            .filter_map(|(_, entity, value)| value.parse().ok().map(|f| (f, *entity)))
            .collect())
    }

    fn previously_imported_contributions(&self) -> Result<Vec<(i64, TransactionId)>> {
        let Some(attr) = self.state.attribute_id(
            AttributeEntityType::FinancialTransaction,
            keys::FOREIGN_CONTRIBUTION_ID,
        ) else {
            return Ok(Vec::new());
        };
        Ok(self
            .state
            .attribute_values
            .iter()
            .filter(|(a, _, _)| *a == attr)
            .filter_map(|(_, entity, value)| value.parse().ok().map(|f| (f, *entity)))
            .collect())
    }

    fn save_changes(&mut self, _disable_audit: bool) -> Result<()> {
        self.saves += 1;
        Ok(())
    }
}

impl AttributeStore for MemoryRepository {
    fn get_or_create_attribute(
        &mut self,
        entity_type: AttributeEntityType,
        key: &str,
        field_type: &str,
        name: &str,
        description: &str,
    ) -> Result<AttributeId> {
        if let Some(id) = self.state.attribute_id(entity_type, key) {
            return Ok(id);
        }
        let id = self.state.next_id();
        self.state.attributes.push(AttributeDefinition {
            id,
            entity_type,
            key: key.to_string(),
            name: name.to_string(),
            field_type: field_type.to_string(),
            description: description.to_string(),
        });
        Ok(id)
    }

    fn insert_value(
        &mut self,
        attribute_id: AttributeId,
        entity_id: i64,
        value: &str,
    ) -> Result<()> {
        // Uniqueness check: first value for an (attribute, entity) pair wins
        if self.state.value_for(attribute_id, entity_id).is_some() {
            return Ok(());
        }
        self.state
            .attribute_values
            .push((attribute_id, entity_id, value.to_string()));
        Ok(())
    }

    fn values_by_attribute(&self, attribute_id: AttributeId) -> Result<Vec<(i64, String)>> {
        Ok(self
            .state
            .attribute_values
            .iter()
            .filter(|(attr, _, _)| *attr == attribute_id)
            .map(|(_, entity, value)| (*entity, value.clone()))
            .collect())
    }
}
