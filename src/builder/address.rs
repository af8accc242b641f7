//! Address mapping.

use super::field_map::FieldMap;
use super::translate;
use crate::error::exceptions::ExceptionLog;
use crate::model::family::AddressDraft;
use crate::rows::Row;

/// Map one address row to a draft plus the foreign household it belongs to
pub fn build_address(
    map: &FieldMap,
    table: &str,
    row: &Row,
    exceptions: &mut ExceptionLog,
) -> Option<(i64, AddressDraft)> {
    let Some(household_id) = row.i64(map.address_household_id) else {
        exceptions.record(table, row.ordinal(), "missing or unparsable household id");
        return None;
    };

    let Some(street1) = row.string(map.address_street1) else {
        exceptions.record(table, row.ordinal(), "missing street address");
        return None;
    };

    Some((
        household_id,
        AddressDraft {
            street1,
            street2: row.string(map.address_street2),
            city: row.string(map.address_city).unwrap_or_default(),
            state: row.string(map.address_state).unwrap_or_default(),
            postal_code: row.string(map.address_postal_code).unwrap_or_default(),
            country: row.string(map.address_country),
            location_type_value_id: translate::location_type(row.str(map.address_type)),
        },
    ))
}
