//! Person and household mapping.
//!
//! Turns one household's group of source rows into a family draft with its
//! member person drafts, applying the lookup-table translations and the
//! dedupe check against the identity index.

use chrono::NaiveDate;
use rustc_hash::FxHashMap;

use super::field_map::FieldMap;
use super::translate;
use crate::error::exceptions::ExceptionLog;
use crate::model::AttributeId;
use crate::model::defined_value::LookupTables;
use crate::model::family::FamilyDraft;
use crate::model::person::PersonDraft;
use crate::resolve::IdentityResolver;
use crate::rows::Row;

/// Builds person and family drafts for one table pass
pub struct PersonBuilder<'a> {
    pub map: &'a FieldMap,
    pub lookups: &'a LookupTables,
    /// Attribute ids for the free-form person columns, keyed by attribute key
    pub extra_attributes: &'a FxHashMap<&'static str, AttributeId>,
    /// Reference date for age computation
    pub as_of: NaiveDate,
    /// Table name used in exception-log entries
    pub table: &'a str,
}

impl PersonBuilder<'_> {
    /// Map one household's rows into a family draft.
    ///
    /// Rows that are structurally invalid or already imported are dropped;
    /// `None` means the whole household produced no new members.
    pub fn build_household(
        &self,
        rows: &[Row],
        resolver: &IdentityResolver,
        exceptions: &mut ExceptionLog,
    ) -> Option<FamilyDraft> {
        let mut family: Option<FamilyDraft> = None;

        for row in rows {
            let Some(person) = self.build_person(row, resolver, exceptions) else {
                continue;
            };

            let family = family.get_or_insert_with(|| {
                let name = row
                    .string(self.map.household_name)
                    .unwrap_or_else(|| format!("{} Family", person.last_name));
                FamilyDraft::new(person.foreign_household_id, &name)
            });
            family.members.push(person);
        }

        let mut family = family?;
        if let Some(campus) = family.dominant_campus() {
            family.campus_value_id = translate::campus(&self.lookups.campus, campus);
        }
        Some(family)
    }

    /// Map one source row into a person draft
    pub fn build_person(
        &self,
        row: &Row,
        resolver: &IdentityResolver,
        exceptions: &mut ExceptionLog,
    ) -> Option<PersonDraft> {
        let map = self.map;

        let Some(individual_id) = row.i64(map.individual_id) else {
            exceptions.record(
                self.table,
                row.ordinal(),
                "missing or unparsable individual id",
            );
            return None;
        };
        if resolver.contains_individual(individual_id) {
            log::debug!("individual {individual_id} already imported, skipping");
            return None;
        }

        let Some(last_name) = row.string(map.last_name) else {
            exceptions.record(self.table, row.ordinal(), "missing last name");
            return None;
        };
        let first_name = row.string(map.first_name).unwrap_or_default();

        let mut person = PersonDraft::new(&first_name, &last_name);
        person.foreign_individual_id = Some(individual_id);
        person.foreign_household_id = row.i64(map.household_id);

        person.nick_name = map
            .goes_by
            .and_then(|col| row.string(col))
            .filter(|nick| *nick != person.first_name);
        person.middle_name = row.string(map.middle_name);
        person.title_value_id = row
            .str(map.prefix)
            .and_then(|title| self.lookups.title.by_name(title))
            .map(|v| v.id);
        person.suffix_value_id = row
            .str(map.suffix)
            .and_then(|suffix| self.lookups.suffix.by_name(suffix))
            .map(|v| v.id);

        person.gender = translate::gender(row.str(map.gender));
        person.birth_date = row.date(map.birth_date);
        person.campus = row.string(map.campus);

        person.marital_status_value_id = Some(translate::marital_status(
            &self.lookups.marital_status,
            row.str(map.marital_status),
        ));

        let connection = translate::connection_status(self.lookups, row.str(map.connection_status));
        person.connection_status_value_id = Some(connection.value_id);
        person.is_deceased = connection.is_deceased;
        person.record_status_reason = connection.record_status_reason;

        let age = translate::age_on(person.birth_date, self.as_of);
        let (role, visitor) = translate::family_role(row.str(map.household_position), age);
        person.family_role = Some(role);
        person.visitor_label = visitor;

        if let Some(email_column) = map.email {
            if let Some(email) = row.string(email_column) {
                let listed = map
                    .email_listed
                    .and_then(|col| row.bool(col))
                    .unwrap_or(true);
                person.email = Some(email);
                person.is_email_active = listed;
            }
        }

        for (label, column) in map.phones {
            let Some(raw) = row.str(column) else { continue };
            if let Some(phone) = translate::phone(label, raw, false) {
                person.add_phone(phone);
            }
        }

        for (key, _, column) in map.person_attributes {
            let Some(value) = row.string(column) else {
                continue;
            };
            if let Some(&attribute_id) = self.extra_attributes.get(key) {
                person.add_attribute(attribute_id, value);
            }
        }

        Some(person)
    }

    /// Map one company row into a single-member family draft.
    ///
    /// The company becomes a person whose last name is the company name, so
    /// contribution rows can reference it like any other giver.
    pub fn build_company(
        &self,
        row: &Row,
        resolver: &IdentityResolver,
        exceptions: &mut ExceptionLog,
    ) -> Option<FamilyDraft> {
        let map = self.map;

        let Some(company_id) = row.i64(map.company_id) else {
            exceptions.record(self.table, row.ordinal(), "missing or unparsable company id");
            return None;
        };
        if resolver.contains_individual(company_id) {
            log::debug!("company {company_id} already imported, skipping");
            return None;
        }

        let Some(name) = row.string(map.company_name) else {
            exceptions.record(self.table, row.ordinal(), "missing company name");
            return None;
        };

        let mut person = PersonDraft::new("", &name);
        person.is_business = true;
        // Companies carry the same key in both slots
        person.foreign_individual_id = Some(company_id);
        person.foreign_household_id = Some(company_id);

        let mut family = FamilyDraft::new(Some(company_id), &name);
        family.members.push(person);
        Some(family)
    }
}
