//! Tests for draft-model policies.

use rock_migrate::model::defined_value::{DefinedValue, DefinedValueSet};
use rock_migrate::model::family::FamilyDraft;
use rock_migrate::model::person::{PersonDraft, PhoneDraft};

fn campuses() -> DefinedValueSet {
    DefinedValueSet::from_values(vec![
        DefinedValue::new(1001, "Main Campus").with_short_code("MAIN"),
        DefinedValue::new(1002, "West Campus").with_short_code("WST"),
    ])
}

fn member_with_campus(campus: Option<&str>) -> PersonDraft {
    let mut person = PersonDraft::new("Test", "Person");
    person.campus = campus.map(str::to_string);
    person
}

fn phone(number: &str) -> PhoneDraft {
    PhoneDraft {
        number_type: "Home".to_string(),
        number: number.to_string(),
        extension: None,
        is_unlisted: false,
    }
}

#[test]
fn test_dominant_campus_majority_wins() {
    let mut family = FamilyDraft::new(Some(10), "Test Family");
    family.members.push(member_with_campus(Some("North")));
    family.members.push(member_with_campus(Some("South")));
    family.members.push(member_with_campus(Some("South")));
    family.members.push(member_with_campus(None));

    assert_eq!(family.dominant_campus(), Some("South"));
}

#[test]
fn test_dominant_campus_tie_breaks_to_first_seen() {
    let mut family = FamilyDraft::new(Some(10), "Test Family");
    family.members.push(member_with_campus(Some("North")));
    family.members.push(member_with_campus(Some("South")));
    family.members.push(member_with_campus(Some("South")));
    family.members.push(member_with_campus(Some("North")));

    assert_eq!(family.dominant_campus(), Some("North"));
}

#[test]
fn test_dominant_campus_none_when_no_member_has_one() {
    let mut family = FamilyDraft::new(Some(10), "Test Family");
    family.members.push(member_with_campus(None));
    assert_eq!(family.dominant_campus(), None);
}

#[test]
fn test_add_phone_suppresses_duplicate_numbers() {
    let mut person = PersonDraft::new("Ted", "Decker");
    assert!(person.add_phone(phone("5551234567")));
    // Same normalized digits under a different label are one number
    let mut duplicate = phone("5551234567");
    duplicate.number_type = "Mobile".to_string();
    assert!(!person.add_phone(duplicate));
    assert!(person.add_phone(phone("5559876543")));
    assert_eq!(person.phones.len(), 2);
}

#[test]
fn test_empty_attribute_values_are_dropped() {
    let mut person = PersonDraft::new("Ted", "Decker");
    person.add_attribute(1, "");
    person.add_attribute(1, "value");
    assert_eq!(person.attributes.len(), 1);
}

#[test]
fn test_campus_match_on_name_prefix() {
    let set = campuses();
    assert_eq!(set.campus_match("west").unwrap().id, 1002);
    // A prefix of the full name is enough
    assert_eq!(set.campus_match("Main").unwrap().id, 1001);
    assert!(set.campus_match("Downtown").is_none());
}

#[test]
fn test_campus_match_on_short_code() {
    let set = campuses();
    assert_eq!(set.campus_match("wst").unwrap().id, 1002);
    assert_eq!(set.campus_match(" MAIN ").unwrap().id, 1001);
    assert!(set.campus_match("").is_none());
}
