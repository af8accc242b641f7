//! Attachment scanning.
//!
//! Walks a directory of attachment files and pairs each one with the person
//! it belongs to. Two naming conventions are recognized:
//!
//! * `<foreignid>.<ext>` names the person's portrait photo
//! * `firstname_lastname_foreignid_label.<ext>` names a labelled document,
//!   parsed positionally and stored as a file-typed person attribute
//!
//! The extension denylist is enforced before any file is read.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::error::exceptions::ExceptionLog;
use crate::model::attribute::AttributeEntityType;
use crate::model::document::{DocumentDraft, DocumentKind, extension_allowed, mime_for_file};
use crate::repository::AttributeStore;
use crate::resolve::IdentityResolver;

/// Table label used for attachment entries in the exception log
pub const DOCUMENT_TABLE: &str = "Attachments";

/// Parse a portrait file name of the form `<foreignid>.<ext>`
#[must_use]
pub fn parse_portrait_name(file_name: &str) -> Option<i64> {
    let (stem, _) = file_name.rsplit_once('.')?;
    stem.parse().ok()
}

/// Parse a document file name of the form
/// `firstname_lastname_foreignid_label.<ext>`, returning the foreign id and
/// the label
#[must_use]
pub fn parse_document_name(file_name: &str) -> Option<(i64, String)> {
    let (stem, _) = file_name.rsplit_once('.')?;
    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() < 4 {
        return None;
    }
    let foreign_id: i64 = parts[2].parse().ok()?;
    let label = parts[3..].join("_");
    if label.is_empty() {
        return None;
    }
    Some((foreign_id, label))
}

/// Scan a directory of attachments into document drafts.
///
/// Files whose owner cannot be resolved, whose name matches no convention,
/// or whose extension is disallowed are exception-logged and skipped.
pub fn scan_attachments(
    dir: &Path,
    resolver: &IdentityResolver,
    store: &mut impl AttributeStore,
    exceptions: &mut ExceptionLog,
) -> Result<Vec<DocumentDraft>> {
    let mut entries: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .collect();
    entries.sort_by_key(std::fs::DirEntry::file_name);

    let mut drafts = Vec::new();
    for (ordinal, entry) in entries.iter().enumerate() {
        let file_name = entry.file_name().to_string_lossy().to_string();

        if !extension_allowed(&file_name) {
            exceptions.record(DOCUMENT_TABLE, ordinal, "disallowed file extension");
            continue;
        }

        let (foreign_person_id, kind, label) = if let Some((id, label)) =
            parse_document_name(&file_name)
        {
            (id, DocumentKind::Document, Some(label))
        } else if let Some(id) = parse_portrait_name(&file_name) {
            (id, DocumentKind::Portrait, None)
        } else {
            exceptions.record(DOCUMENT_TABLE, ordinal, "unrecognized file name");
            continue;
        };

        let Some(person_id) = resolver
            .lookup(Some(foreign_person_id), None, true)
            .and_then(|key| key.person_id)
        else {
            exceptions.record(DOCUMENT_TABLE, ordinal, "owner not found");
            continue;
        };

        let attribute_id = match &label {
            Some(label) => Some(store.get_or_create_attribute(
                AttributeEntityType::Person,
                &label.replace(' ', ""),
                "File",
                label,
                "Imported document",
            )?),
            None => None,
        };

        let data = fs::read(entry.path())?;
        drafts.push(DocumentDraft {
            foreign_person_id,
            person_id,
            mime_type: mime_for_file(&file_name).to_string(),
            file_name,
            data,
            kind,
            attribute_id,
        });
    }

    Ok(drafts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portrait_names_are_bare_foreign_ids() {
        assert_eq!(parse_portrait_name("12345.jpg"), Some(12345));
        assert_eq!(parse_portrait_name("john.jpg"), None);
        assert_eq!(parse_portrait_name("12345"), None);
    }

    #[test]
    fn document_names_parse_positionally() {
        assert_eq!(
            parse_document_name("john_smith_12345_baptism.pdf"),
            Some((12345, "baptism".to_string()))
        );
        assert_eq!(
            parse_document_name("mary_jones_77_background_check.pdf"),
            Some((77, "background_check".to_string()))
        );
        assert_eq!(parse_document_name("12345.jpg"), None);
        assert_eq!(parse_document_name("john_smith_notanid_label.pdf"), None);
    }
}
