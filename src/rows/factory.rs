//! Source-format registry.
//!
//! Importer variants are looked up by tag in a fixed strategy table rather
//! than discovered dynamically; registering a new variant means adding an
//! arm here.

use super::{CsvRowSource, MemorySource, RowSource};
use crate::builder::field_map::{self, FieldMap};
use crate::config::ImportConfig;
use crate::error::{Error, Result};

/// Construct the row source and field map for a configured format tag.
///
/// Known tags: `fellowship-one` (CSV exports of FellowshipOne tables),
/// `csv` (the generic export layout), and `example` (a small built-in
/// dataset, no files needed).
pub fn source_from_config(config: &ImportConfig) -> Result<(Box<dyn RowSource>, FieldMap)> {
    match config.source_format.to_lowercase().as_str() {
        "fellowship-one" | "f1" => Ok((
            Box::new(CsvRowSource::new(&config.source_path)),
            field_map::FELLOWSHIP_ONE,
        )),
        "csv" => Ok((
            Box::new(CsvRowSource::new(&config.source_path)),
            field_map::CSV_EXPORT,
        )),
        "example" => Ok((Box::new(MemorySource::example()), field_map::CSV_EXPORT)),
        other => Err(Error::UnknownFormat(other.to_string())),
    }
}
