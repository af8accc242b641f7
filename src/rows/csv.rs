//! CSV-backed row source.
//!
//! Each table is one `<name>.csv` file inside the source directory. The
//! header row supplies column names; cells are inferred to JSON scalars so
//! the rest of the engine sees the same loosely-typed rows regardless of
//! source format.

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{Reader, ReaderBuilder, StringRecord, StringRecordsIntoIter};
use serde_json::Value;

use super::{Row, RowSource, TableInfo};
use crate::error::{Error, Result};

/// Row source reading one CSV file per table from a directory
pub struct CsvRowSource {
    dir: PathBuf,
}

impl CsvRowSource {
    /// Create a source over a directory of `<table>.csv` files
    #[must_use]
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    fn table_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.csv"))
    }

    fn open_reader(path: &Path) -> Result<Reader<File>> {
        Ok(ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)?)
    }
}

impl RowSource for CsvRowSource {
    fn tables(&self) -> Result<Vec<TableInfo>> {
        let mut tables = Vec::new();
        let mut entries: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
            .collect();
        entries.sort();

        for path in entries {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            // One counting pass; scans restart from row zero anyway
            let mut reader = Self::open_reader(&path)?;
            let row_count = reader.records().filter_map(std::result::Result::ok).count();
            tables.push(TableInfo {
                name: stem.to_string(),
                row_count,
            });
        }

        Ok(tables)
    }

    fn scan_table(&self, name: &str) -> Result<Box<dyn Iterator<Item = Row> + '_>> {
        let path = self.table_path(name);
        if !path.exists() {
            return Err(Error::UnknownTable(name.to_string()));
        }

        let mut reader = Self::open_reader(&path)?;
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        Ok(Box::new(CsvRowIter {
            headers,
            records: reader.into_records(),
            ordinal: 0,
            table: name.to_string(),
        }))
    }
}

struct CsvRowIter {
    headers: Vec<String>,
    records: StringRecordsIntoIter<File>,
    ordinal: usize,
    table: String,
}

impl Iterator for CsvRowIter {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        loop {
            match self.records.next()? {
                Ok(record) => {
                    let row = self.to_row(&record);
                    self.ordinal += 1;
                    return Some(row);
                }
                Err(e) => {
                    // A mangled line is skipped, not fatal
                    log::warn!("unreadable record in table {}: {e}", self.table);
                    self.ordinal += 1;
                }
            }
        }
    }
}

impl CsvRowIter {
    fn to_row(&self, record: &StringRecord) -> Row {
        let mut row = Row::new(self.ordinal);
        for (header, cell) in self.headers.iter().zip(record.iter()) {
            row.insert(header, infer_value(cell));
        }
        row
    }
}

/// Infer a JSON scalar from a CSV cell; empty cells become null
fn infer_value(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        // Preserve leading zeros as text (zip codes, phone numbers)
        if !trimmed.starts_with('0') || trimmed == "0" {
            return Value::from(i);
        }
    }
    Value::from(trimmed)
}
