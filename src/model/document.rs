//! Binary attachment drafts.

use super::{AttributeId, PersonId};

/// File extensions that are never read, let alone imported
pub const DISALLOWED_EXTENSIONS: &[&str] = &[
    "exe", "dll", "com", "bat", "cmd", "scr", "vbs", "js", "msi", "ps1", "jar",
];

/// What a scanned file attaches to once committed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// The person's photo
    Portrait,
    /// A labelled document stored as a file-typed person attribute
    Document,
}

/// A binary attachment paired with the person it belongs to
#[derive(Debug, Clone)]
pub struct DocumentDraft {
    /// Source-system individual key parsed out of the file name
    pub foreign_person_id: i64,
    /// Committed person the file attaches to
    pub person_id: PersonId,
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
    pub kind: DocumentKind,
    /// For documents, the file-typed attribute the value lands on
    pub attribute_id: Option<AttributeId>,
}

/// Whether a file name's extension passes the denylist
#[must_use]
pub fn extension_allowed(file_name: &str) -> bool {
    match extension_of(file_name) {
        Some(ext) => !DISALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str()),
        None => false,
    }
}

/// Content type for a file name, from a fixed extension table.
///
/// This stands in for the external file-type lookup service; anything the
/// table does not know falls back to a generic byte stream.
#[must_use]
pub fn mime_for_file(file_name: &str) -> &'static str {
    match extension_of(file_name)
        .map(str::to_lowercase)
        .as_deref()
        .unwrap_or("")
    {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        "rtf" => "application/rtf",
        _ => "application/octet-stream",
    }
}

fn extension_of(file_name: &str) -> Option<&str> {
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() { None } else { Some(ext) }
}
