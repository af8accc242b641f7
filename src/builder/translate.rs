//! Lookup-table translation policies.
//!
//! Small, pure translations from source strings to target enumerations and
//! defined values. Each one falls back to a documented default instead of
//! failing the row.

use chrono::NaiveDate;

use crate::model::DefinedValueId;
use crate::model::defined_value::{DefinedValueSet, LookupTables, well_known};
use crate::model::person::{FamilyRole, Gender, PhoneDraft};

/// Longest number the phone column can hold
pub const MAX_PHONE_LENGTH: usize = 20;

/// Translate a source gender string
#[must_use]
pub fn gender(value: Option<&str>) -> Gender {
    match value.map(str::to_lowercase).as_deref() {
        Some("m" | "male") => Gender::Male,
        Some("f" | "female") => Gender::Female,
        _ => Gender::Unknown,
    }
}

/// Work out a person's family role from their label and age.
///
/// An explicit "Child" label or an age under 18 makes a Child. A "Visitor"
/// label does not change the Adult group role but is surfaced to the caller
/// so the identity index can rank the person as a visitor.
#[must_use]
pub fn family_role(label: Option<&str>, age: Option<i64>) -> (FamilyRole, bool) {
    let label = label.map(str::to_lowercase);
    let is_child = label.as_deref() == Some("child") || age.is_some_and(|a| a < 18);
    if is_child {
        return (FamilyRole::Child, false);
    }
    let visitor = label.as_deref() == Some("visitor");
    (FamilyRole::Adult, visitor)
}

/// Whole years between a birthdate and a reference date
#[must_use]
pub fn age_on(birth_date: Option<NaiveDate>, on: NaiveDate) -> Option<i64> {
    let birth = birth_date?;
    Some(i64::from(on.years_since(birth).unwrap_or(0)))
}

/// Exact-name marital status match, defaulting to the "Unknown" value
#[must_use]
pub fn marital_status(set: &DefinedValueSet, value: Option<&str>) -> DefinedValueId {
    value
        .and_then(|v| set.by_name_exact(v))
        .map_or(well_known::MARITAL_UNKNOWN, |v| v.id)
}

/// Result of translating a connection status string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOutcome {
    pub value_id: DefinedValueId,
    pub is_deceased: bool,
    pub record_status_reason: Option<String>,
}

/// Translate a source connection status.
///
/// Member and Visitor map to their fixed values. "Deceased" marks the
/// person deceased with a matching record-status reason. Anything else is
/// looked up by name among the user-defined connection types and defaults
/// to Attendee when nothing matches.
#[must_use]
pub fn connection_status(lookups: &LookupTables, value: Option<&str>) -> ConnectionOutcome {
    let mut outcome = ConnectionOutcome {
        value_id: well_known::CONNECTION_ATTENDEE,
        is_deceased: false,
        record_status_reason: None,
    };

    let Some(value) = value else {
        return outcome;
    };

    match value.to_lowercase().as_str() {
        "member" => outcome.value_id = well_known::CONNECTION_MEMBER,
        "visitor" => outcome.value_id = well_known::CONNECTION_VISITOR,
        "deceased" => {
            outcome.is_deceased = true;
            outcome.record_status_reason = Some("Deceased".to_string());
        }
        _ => {
            if let Some(found) = lookups.connection_status.by_name(value) {
                outcome.value_id = found.id;
            }
        }
    }

    outcome
}

/// Campus match by name prefix or short code
#[must_use]
pub fn campus(set: &DefinedValueSet, value: &str) -> Option<DefinedValueId> {
    set.campus_match(value).map(|v| v.id)
}

/// Normalize a raw phone value into a draft.
///
/// An embedded `x1234` extension is split off, both sides pass through a
/// digits-only filter, and the number is truncated to the storage maximum.
/// A value with no digits yields nothing.
#[must_use]
pub fn phone(number_type: &str, raw: &str, is_unlisted: bool) -> Option<PhoneDraft> {
    let lowered = raw.to_lowercase();
    let (main, extension) = match lowered.split_once('x') {
        Some((main, ext)) => (main, Some(ext)),
        None => (lowered.as_str(), None),
    };

    let mut number: String = main.chars().filter(char::is_ascii_digit).collect();
    if number.is_empty() {
        return None;
    }
    number.truncate(MAX_PHONE_LENGTH);

    let extension = extension
        .map(|ext| ext.chars().filter(char::is_ascii_digit).collect::<String>())
        .filter(|ext| !ext.is_empty());

    Some(PhoneDraft {
        number_type: number_type.to_string(),
        number,
        extension,
        is_unlisted,
    })
}

/// Translate a contribution currency type string
#[must_use]
pub fn currency_type(value: Option<&str>) -> DefinedValueId {
    match value.map(str::to_lowercase).as_deref() {
        Some("cash") => well_known::CURRENCY_CASH,
        Some("check" | "cheque") => well_known::CURRENCY_CHECK,
        Some("credit" | "credit card" | "visa" | "mastercard") => well_known::CURRENCY_CREDIT_CARD,
        Some("ach" | "bank draft" | "eft") => well_known::CURRENCY_ACH,
        Some("non-cash" | "noncash" | "stock") => well_known::CURRENCY_NON_CASH,
        _ => well_known::CURRENCY_UNKNOWN,
    }
}

/// Translate an address type string to a group-location type
#[must_use]
pub fn location_type(value: Option<&str>) -> DefinedValueId {
    match value.map(str::to_lowercase).as_deref() {
        Some("business" | "work") => well_known::LOCATION_WORK,
        Some("previous" | "prior") => well_known::LOCATION_PREVIOUS,
        _ => well_known::LOCATION_HOME,
    }
}
