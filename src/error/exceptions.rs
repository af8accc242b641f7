//! Persistent log of skipped rows.
//!
//! Malformed or unmatchable rows never interrupt a run. Each one is recorded
//! here and the whole log can be written to a text file at the end of the run
//! so an administrator can review what was left behind.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// One skipped row and the reason it was skipped
#[derive(Debug, Clone)]
pub struct ExceptionEntry {
    /// Source table the row came from
    pub table: String,
    /// Zero-based ordinal of the row within its table scan
    pub row: usize,
    /// Human-readable reason the row was skipped
    pub reason: String,
}

/// Collects skipped-row entries for the duration of a run
#[derive(Debug, Default)]
pub struct ExceptionLog {
    entries: Vec<ExceptionEntry>,
    path: Option<PathBuf>,
}

impl ExceptionLog {
    /// Create an in-memory log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log that will be persisted to the given file on flush
    #[must_use]
    pub fn with_path(path: &Path) -> Self {
        Self {
            entries: Vec::new(),
            path: Some(path.to_path_buf()),
        }
    }

    /// Record a skipped row
    pub fn record(&mut self, table: &str, row: usize, reason: impl Into<String>) {
        let reason = reason.into();
        log::warn!("skipping {table} row {row}: {reason}");
        self.entries.push(ExceptionEntry {
            table: table.to_string(),
            row,
            reason,
        });
    }

    /// All entries recorded so far
    #[must_use]
    pub fn entries(&self) -> &[ExceptionEntry] {
        &self.entries
    }

    /// Number of entries recorded so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no row has been skipped
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the log to its configured file, one line per entry.
    ///
    /// A log created without a path writes nothing and returns `Ok`.
    pub fn flush_to_disk(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let mut writer = BufWriter::new(File::create(path)?);
        for entry in &self.entries {
            writeln!(writer, "{}\t{}\t{}", entry.table, entry.row, entry.reason)?;
        }
        writer.flush()?;

        Ok(())
    }
}
