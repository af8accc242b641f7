//! Tests for the batch committer.

use rock_migrate::commit::{BatchCommitter, Draft};
use rock_migrate::model::attribute::KnownAttributes;
use rock_migrate::model::family::FamilyStub;
use rock_migrate::model::person::{FamilyRole, PersonDraft};
use rock_migrate::repository::{AttributeStore, MemoryRepository, Repository};
use rock_migrate::resolve::{ForeignKeyMap, ForeignKind, IdentityResolver, ImportedPersonKey};

fn person(individual_id: i64, household_id: i64, role: FamilyRole) -> PersonDraft {
    let mut draft = PersonDraft::new("Test", &format!("Person{individual_id}"));
    draft.foreign_individual_id = Some(individual_id);
    draft.foreign_household_id = Some(household_id);
    draft.family_role = Some(role);
    draft
}

fn stub(household_id: i64) -> FamilyStub {
    FamilyStub {
        foreign_household_id: Some(household_id),
        name: "Test Family".to_string(),
        campus_value_id: None,
    }
}

fn pending_key(individual_id: i64, household_id: i64, role: FamilyRole) -> ImportedPersonKey {
    ImportedPersonKey {
        person_id: None,
        person_alias_id: None,
        foreign_individual_id: Some(individual_id),
        foreign_household_id: Some(household_id),
        family_role: role,
        family_id: None,
    }
}

#[test]
fn test_flush_creates_family_once_per_household() {
    let mut repository = MemoryRepository::new();
    let attributes = KnownAttributes::ensure(&mut repository).unwrap();
    let mut resolver = IdentityResolver::new();
    let mut keys = ForeignKeyMap::new();

    let mut committer = BatchCommitter::new(100);
    for individual_id in 1..=3 {
        resolver.add(pending_key(individual_id, 10, FamilyRole::Adult));
        committer.add(Draft::Person {
            person: person(individual_id, 10, FamilyRole::Adult),
            family: stub(10),
        });
    }

    let committed = committer
        .flush(&mut repository, &mut resolver, &mut keys, &attributes)
        .unwrap();

    assert_eq!(committed, 3);
    assert_eq!(committer.pending(), 0);
    assert_eq!(repository.families().len(), 1);
    assert_eq!(repository.people().len(), 3);
    assert_eq!(repository.aliases().len(), 3);
    assert_eq!(repository.saves, 1);
}

#[test]
fn test_flush_materializes_foreign_id_attributes() {
    let mut repository = MemoryRepository::new();
    let attributes = KnownAttributes::ensure(&mut repository).unwrap();
    let mut resolver = IdentityResolver::new();
    let mut keys = ForeignKeyMap::new();

    resolver.add(pending_key(7, 70, FamilyRole::Adult));
    let mut committer = BatchCommitter::new(100);
    committer.add(Draft::Person {
        person: person(7, 70, FamilyRole::Adult),
        family: stub(70),
    });
    committer
        .flush(&mut repository, &mut resolver, &mut keys, &attributes)
        .unwrap();

    let individual_values = repository.values_by_attribute(attributes.individual_id).unwrap();
    assert_eq!(individual_values.len(), 1);
    assert_eq!(individual_values[0].1, "7");

    let household_values = repository.values_by_attribute(attributes.household_id).unwrap();
    assert_eq!(household_values.len(), 1);
    assert_eq!(household_values[0].1, "70");

    // A re-run seeds itself from exactly these values
    let committed = repository.previously_imported_people().unwrap();
    assert_eq!(committed.len(), 1);
    assert_eq!(committed[0].foreign_individual_id, Some(7));
    assert_eq!(committed[0].foreign_household_id, Some(70));
}

#[test]
fn test_flush_publishes_identities() {
    let mut repository = MemoryRepository::new();
    let attributes = KnownAttributes::ensure(&mut repository).unwrap();
    let mut resolver = IdentityResolver::new();
    let mut keys = ForeignKeyMap::new();

    resolver.add(pending_key(1, 10, FamilyRole::Adult));
    let mut committer = BatchCommitter::new(100);
    committer.add(Draft::Person {
        person: person(1, 10, FamilyRole::Adult),
        family: stub(10),
    });
    committer
        .flush(&mut repository, &mut resolver, &mut keys, &attributes)
        .unwrap();

    // The pending resolver key now carries the committed identity
    let found = resolver.lookup(Some(1), None, false).unwrap();
    assert!(found.person_id.is_some());
    assert!(found.person_alias_id.is_some());

    // The household key maps to the created family
    let family_id = repository.families()[0].id;
    assert_eq!(keys.get(ForeignKind::Household, 10), Some(family_id));
}

#[test]
fn test_later_members_join_family_from_earlier_flush() {
    let mut repository = MemoryRepository::new();
    let attributes = KnownAttributes::ensure(&mut repository).unwrap();
    let mut resolver = IdentityResolver::new();
    let mut keys = ForeignKeyMap::new();

    let mut committer = BatchCommitter::new(100);
    resolver.add(pending_key(1, 10, FamilyRole::Adult));
    committer.add(Draft::Person {
        person: person(1, 10, FamilyRole::Adult),
        family: stub(10),
    });
    committer
        .flush(&mut repository, &mut resolver, &mut keys, &attributes)
        .unwrap();

    // Second flush, same household: no second family
    resolver.add(pending_key(2, 10, FamilyRole::Child));
    committer.add(Draft::Person {
        person: person(2, 10, FamilyRole::Child),
        family: stub(10),
    });
    committer
        .flush(&mut repository, &mut resolver, &mut keys, &attributes)
        .unwrap();

    assert_eq!(repository.families().len(), 1);
    let family_id = repository.families()[0].id;
    assert_eq!(repository.members_of(family_id).len(), 2);
}

#[test]
fn test_giving_group_excludes_children() {
    let mut repository = MemoryRepository::new();
    let attributes = KnownAttributes::ensure(&mut repository).unwrap();
    let mut resolver = IdentityResolver::new();
    let mut keys = ForeignKeyMap::new();

    let mut committer = BatchCommitter::new(100);
    resolver.add(pending_key(1, 10, FamilyRole::Adult));
    resolver.add(pending_key(2, 10, FamilyRole::Child));
    committer.add(Draft::Person {
        person: person(1, 10, FamilyRole::Adult),
        family: stub(10),
    });
    committer.add(Draft::Person {
        person: person(2, 10, FamilyRole::Child),
        family: stub(10),
    });
    committer
        .flush(&mut repository, &mut resolver, &mut keys, &attributes)
        .unwrap();

    let adult = repository
        .people()
        .iter()
        .find(|p| p.family_role == FamilyRole::Adult)
        .unwrap();
    let child = repository
        .people()
        .iter()
        .find(|p| p.family_role == FamilyRole::Child)
        .unwrap();
    assert_eq!(adult.giving_group_id, Some(adult.family_id));
    assert_eq!(child.giving_group_id, None);
}

#[test]
fn test_failed_flush_rolls_back_and_keeps_buffer() {
    let mut repository = MemoryRepository::new();
    let attributes = KnownAttributes::ensure(&mut repository).unwrap();
    let mut resolver = IdentityResolver::new();
    let mut keys = ForeignKeyMap::new();

    resolver.add(pending_key(1, 10, FamilyRole::Adult));
    let mut committer = BatchCommitter::new(100);
    committer.add(Draft::Person {
        person: person(1, 10, FamilyRole::Adult),
        family: stub(10),
    });

    repository.fail_next_commit = true;
    let result = committer.flush(&mut repository, &mut resolver, &mut keys, &attributes);
    assert!(result.is_err());

    // Nothing committed, drafts still buffered for diagnosis
    assert_eq!(repository.families().len(), 0);
    assert_eq!(repository.people().len(), 0);
    assert_eq!(committer.pending(), 1);

    // The pending resolver key stays unassigned
    assert!(resolver.lookup(Some(1), None, false).unwrap().person_id.is_none());

    // The same buffer commits cleanly once the fault is gone
    committer
        .flush(&mut repository, &mut resolver, &mut keys, &attributes)
        .unwrap();
    assert_eq!(repository.people().len(), 1);
}

#[test]
fn test_130_rows_at_reporting_50_means_three_commits() {
    let mut repository = MemoryRepository::new();
    let attributes = KnownAttributes::ensure(&mut repository).unwrap();
    let mut resolver = IdentityResolver::new();
    let mut keys = ForeignKeyMap::new();

    let mut committer = BatchCommitter::new(50);
    for completed in 1..=130 {
        let individual_id = i64::try_from(completed).unwrap();
        resolver.add(pending_key(individual_id, individual_id, FamilyRole::Adult));
        committer.add(Draft::Person {
            person: person(individual_id, individual_id, FamilyRole::Adult),
            family: stub(individual_id),
        });
        if committer.should_flush(completed) {
            committer
                .flush(&mut repository, &mut resolver, &mut keys, &attributes)
                .unwrap();
        }
    }
    // Two mid-run flushes at 50 and 100, one final flush for the rest
    assert_eq!(repository.saves, 2);
    committer
        .flush(&mut repository, &mut resolver, &mut keys, &attributes)
        .unwrap();
    assert_eq!(repository.saves, 3);
    assert_eq!(repository.people().len(), 130);
}

#[test]
fn test_empty_flush_is_a_no_op() {
    let mut repository = MemoryRepository::new();
    let attributes = KnownAttributes::ensure(&mut repository).unwrap();
    let mut resolver = IdentityResolver::new();
    let mut keys = ForeignKeyMap::new();

    let saves_before = repository.saves;
    let mut committer = BatchCommitter::new(100);
    let committed = committer
        .flush(&mut repository, &mut resolver, &mut keys, &attributes)
        .unwrap();
    assert_eq!(committed, 0);
    assert_eq!(repository.saves, saves_before);
}
