//! Defined values: the target schema's configurable lookup tables.

use super::DefinedValueId;

/// One entry of a configurable enumeration
#[derive(Debug, Clone)]
pub struct DefinedValue {
    pub id: DefinedValueId,
    pub name: String,
    /// Optional short code, used by campus matching
    pub short_code: Option<String>,
}

impl DefinedValue {
    #[must_use]
    pub fn new(id: DefinedValueId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            short_code: None,
        }
    }

    #[must_use]
    pub fn with_short_code(mut self, code: &str) -> Self {
        self.short_code = Some(code.to_string());
        self
    }
}

/// An ordered list of defined values for one lookup table
#[derive(Debug, Clone, Default)]
pub struct DefinedValueSet {
    values: Vec<DefinedValue>,
}

impl DefinedValueSet {
    #[must_use]
    pub fn from_values(values: Vec<DefinedValue>) -> Self {
        Self { values }
    }

    /// Exact, case-sensitive name match
    #[must_use]
    pub fn by_name_exact(&self, name: &str) -> Option<&DefinedValue> {
        self.values.iter().find(|v| v.name == name)
    }

    /// Case-insensitive name match
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&DefinedValue> {
        self.values.iter().find(|v| v.name.eq_ignore_ascii_case(name))
    }

    /// Campus-style match: the value's name starts with the query, or its
    /// short code equals the query
    #[must_use]
    pub fn campus_match(&self, query: &str) -> Option<&DefinedValue> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        self.values.iter().find(|v| {
            v.name.to_lowercase().starts_with(&query.to_lowercase())
                || v.short_code
                    .as_deref()
                    .is_some_and(|code| code.eq_ignore_ascii_case(query))
        })
    }
}

/// Ids of the fixed defined values the translation policies depend on
pub mod well_known {
    use crate::model::DefinedValueId;

    pub const MARITAL_MARRIED: DefinedValueId = 143;
    pub const MARITAL_DIVORCED: DefinedValueId = 144;
    pub const MARITAL_SINGLE: DefinedValueId = 145;
    pub const MARITAL_UNKNOWN: DefinedValueId = 146;

    pub const CONNECTION_MEMBER: DefinedValueId = 65;
    pub const CONNECTION_VISITOR: DefinedValueId = 66;
    pub const CONNECTION_ATTENDEE: DefinedValueId = 67;
    pub const CONNECTION_PARTICIPANT: DefinedValueId = 68;

    pub const CURRENCY_CASH: DefinedValueId = 809;
    pub const CURRENCY_CHECK: DefinedValueId = 810;
    pub const CURRENCY_CREDIT_CARD: DefinedValueId = 811;
    pub const CURRENCY_ACH: DefinedValueId = 812;
    pub const CURRENCY_NON_CASH: DefinedValueId = 813;
    pub const CURRENCY_UNKNOWN: DefinedValueId = 814;

    pub const LOCATION_HOME: DefinedValueId = 19;
    pub const LOCATION_WORK: DefinedValueId = 20;
    pub const LOCATION_PREVIOUS: DefinedValueId = 137;
}

/// The pre-loaded lookup tables a table pass translates against
#[derive(Debug, Clone, Default)]
pub struct LookupTables {
    pub marital_status: DefinedValueSet,
    pub connection_status: DefinedValueSet,
    pub title: DefinedValueSet,
    pub suffix: DefinedValueSet,
    pub campus: DefinedValueSet,
}

impl LookupTables {
    /// The standard target-schema lookup tables with their fixed values.
    ///
    /// Campuses vary per installation; callers add their own campus list on
    /// top of the empty default.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            marital_status: DefinedValueSet::from_values(vec![
                DefinedValue::new(well_known::MARITAL_MARRIED, "Married"),
                DefinedValue::new(well_known::MARITAL_DIVORCED, "Divorced"),
                DefinedValue::new(well_known::MARITAL_SINGLE, "Single"),
                DefinedValue::new(well_known::MARITAL_UNKNOWN, "Unknown"),
            ]),
            connection_status: DefinedValueSet::from_values(vec![
                DefinedValue::new(well_known::CONNECTION_MEMBER, "Member"),
                DefinedValue::new(well_known::CONNECTION_VISITOR, "Visitor"),
                DefinedValue::new(well_known::CONNECTION_ATTENDEE, "Attendee"),
                DefinedValue::new(well_known::CONNECTION_PARTICIPANT, "Participant"),
            ]),
            title: DefinedValueSet::from_values(vec![
                DefinedValue::new(300, "Mr."),
                DefinedValue::new(301, "Mrs."),
                DefinedValue::new(302, "Ms."),
                DefinedValue::new(303, "Dr."),
                DefinedValue::new(304, "Rev."),
            ]),
            suffix: DefinedValueSet::from_values(vec![
                DefinedValue::new(310, "Jr."),
                DefinedValue::new(311, "Sr."),
                DefinedValue::new(312, "II"),
                DefinedValue::new(313, "III"),
                DefinedValue::new(314, "IV"),
            ]),
            campus: DefinedValueSet::default(),
        }
    }

    /// Replace the campus list with a per-installation set
    #[must_use]
    pub fn with_campuses(mut self, campuses: Vec<DefinedValue>) -> Self {
        self.campus = DefinedValueSet::from_values(campuses);
        self
    }
}
