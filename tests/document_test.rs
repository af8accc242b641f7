//! Tests for the attachment scan and its commit path.

use std::fs;
use std::path::PathBuf;

use rock_migrate::builder::scan_attachments;
use rock_migrate::commit::{BatchCommitter, Draft};
use rock_migrate::error::exceptions::ExceptionLog;
use rock_migrate::model::attribute::{AttributeEntityType, KnownAttributes};
use rock_migrate::model::document::DocumentKind;
use rock_migrate::model::family::FamilyStub;
use rock_migrate::model::person::{FamilyRole, PersonDraft};
use rock_migrate::repository::{AttributeStore, MemoryRepository, Repository};
use rock_migrate::resolve::{ForeignKeyMap, IdentityResolver, ImportedPersonKey};

fn temp_attachment_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "rock-migrate-{label}-{}",
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Commit one person so attachments have a resolvable, committed owner
fn committed_person(
    repository: &mut MemoryRepository,
    resolver: &mut IdentityResolver,
    foreign_id: i64,
) -> i64 {
    let family_id = repository
        .insert_family(&FamilyStub {
            foreign_household_id: Some(foreign_id * 10),
            name: "Decker Family".to_string(),
            campus_value_id: None,
        })
        .unwrap();
    let person_id = repository
        .insert_person(&PersonDraft::new("Ted", "Decker"), family_id)
        .unwrap();
    let alias_id = repository.ensure_person_alias(person_id).unwrap();
    resolver.add(ImportedPersonKey {
        person_id: Some(person_id),
        person_alias_id: Some(alias_id),
        foreign_individual_id: Some(foreign_id),
        foreign_household_id: Some(foreign_id * 10),
        family_role: FamilyRole::Adult,
        family_id: Some(family_id),
    });
    person_id
}

#[test]
fn test_scan_classifies_and_filters_files() {
    let dir = temp_attachment_dir("scan");
    fs::write(dir.join("7.jpg"), b"portrait bytes").unwrap();
    fs::write(dir.join("ted_decker_7_baptism_certificate.pdf"), b"pdf bytes").unwrap();
    // Unknown owner, denylisted extension, unrecognized name
    fs::write(dir.join("8.jpg"), b"stranger").unwrap();
    fs::write(dir.join("payload.exe"), b"nope").unwrap();
    fs::write(dir.join("notes.txt"), b"misc").unwrap();

    let mut repository = MemoryRepository::new();
    let mut resolver = IdentityResolver::new();
    committed_person(&mut repository, &mut resolver, 7);

    let mut exceptions = ExceptionLog::new();
    let drafts = scan_attachments(&dir, &resolver, &mut repository, &mut exceptions).unwrap();

    assert_eq!(drafts.len(), 2);
    let portrait = drafts.iter().find(|d| d.kind == DocumentKind::Portrait).unwrap();
    assert_eq!(portrait.file_name, "7.jpg");
    assert_eq!(portrait.mime_type, "image/jpeg");
    assert!(portrait.attribute_id.is_none());

    let document = drafts.iter().find(|d| d.kind == DocumentKind::Document).unwrap();
    assert_eq!(document.file_name, "ted_decker_7_baptism_certificate.pdf");
    assert_eq!(document.mime_type, "application/pdf");
    assert!(document.attribute_id.is_some());

    assert_eq!(exceptions.len(), 3);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_committed_documents_attach_to_their_person() {
    let dir = temp_attachment_dir("commit");
    fs::write(dir.join("7.jpg"), b"portrait bytes").unwrap();
    fs::write(dir.join("ted_decker_7_baptism_certificate.pdf"), b"pdf bytes").unwrap();

    let mut repository = MemoryRepository::new();
    let attributes = KnownAttributes::ensure(&mut repository).unwrap();
    let mut resolver = IdentityResolver::new();
    let mut keys = ForeignKeyMap::new();
    let person_id = committed_person(&mut repository, &mut resolver, 7);

    let mut exceptions = ExceptionLog::new();
    let drafts = scan_attachments(&dir, &resolver, &mut repository, &mut exceptions).unwrap();
    assert!(exceptions.is_empty());

    let mut committer = BatchCommitter::new(30);
    for draft in drafts {
        committer.add(Draft::Document(draft));
    }
    committer
        .flush(&mut repository, &mut resolver, &mut keys, &attributes)
        .unwrap();

    assert_eq!(repository.binary_files().len(), 2);

    // The portrait became the person's photo
    let person = repository.people().iter().find(|p| p.id == person_id).unwrap();
    let photo_id = person.photo_file_id.unwrap();
    let photo = repository
        .binary_files()
        .iter()
        .find(|f| f.id == photo_id)
        .unwrap();
    assert_eq!(photo.file_name, "7.jpg");

    // The labelled document landed in a file-typed attribute
    let attribute_id = repository
        .get_or_create_attribute(
            AttributeEntityType::Person,
            "baptism_certificate",
            "File",
            "baptism_certificate",
            "",
        )
        .unwrap();
    let values = repository.values_by_attribute(attribute_id).unwrap();
    assert_eq!(values.len(), 1);
    assert_eq!(values[0].0, person_id);
    let certificate = repository
        .binary_files()
        .iter()
        .find(|f| f.id.to_string() == values[0].1)
        .unwrap();
    assert_eq!(certificate.mime_type, "application/pdf");

    fs::remove_dir_all(&dir).unwrap();
}
