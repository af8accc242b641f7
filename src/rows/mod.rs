//! Row source surface.
//!
//! The engine consumes flat key-value rows from a black-box producer. A
//! source enumerates its tables with approximate row counts for progress
//! totals and yields each table as a lazy, forward-only row sequence; a
//! fresh scan always restarts from row zero.

pub mod csv;
pub mod factory;
pub mod memory;

pub use csv::CsvRowSource;
pub use factory::source_from_config;
pub use memory::MemorySource;

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::error::Result;

/// Name and approximate size of one source table
#[derive(Debug, Clone)]
pub struct TableInfo {
    pub name: String,
    /// Approximate row count, used only for progress totals
    pub row_count: usize,
}

/// One flat source row with loosely-typed cells
#[derive(Debug, Clone, Default)]
pub struct Row {
    ordinal: usize,
    values: FxHashMap<String, Value>,
}

impl Row {
    /// Create an empty row with its scan ordinal
    #[must_use]
    pub fn new(ordinal: usize) -> Self {
        Self {
            ordinal,
            values: FxHashMap::default(),
        }
    }

    /// Zero-based position of the row within its table scan
    #[must_use]
    pub const fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Set a cell value, dropping JSON nulls
    pub fn insert(&mut self, column: &str, value: Value) {
        if !value.is_null() {
            self.values.insert(column.to_string(), value);
        }
    }

    /// Builder-style cell setter for tests and in-memory sources
    #[must_use]
    pub fn with(mut self, column: &str, value: Value) -> Self {
        self.insert(column, value);
        self
    }

    /// Raw cell lookup; absent and null cells are both `None`
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// Cell as a trimmed string; empty strings are `None`
    #[must_use]
    pub fn str(&self, column: &str) -> Option<&str> {
        match self.values.get(column)? {
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() { None } else { Some(trimmed) }
            }
            _ => None,
        }
    }

    /// Cell as an owned string, stringifying numeric cells
    #[must_use]
    pub fn string(&self, column: &str) -> Option<String> {
        match self.values.get(column)? {
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Cell as an integer, accepting numeric strings
    #[must_use]
    pub fn i64(&self, column: &str) -> Option<i64> {
        match self.values.get(column)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Cell as a float, accepting numeric strings
    #[must_use]
    pub fn f64(&self, column: &str) -> Option<f64> {
        match self.values.get(column)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Cell as a boolean, accepting the common source spellings
    #[must_use]
    pub fn bool(&self, column: &str) -> Option<bool> {
        match self.values.get(column)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" | "y" | "1" => Some(true),
                "false" | "no" | "n" | "0" => Some(false),
                _ => None,
            },
            Value::Number(n) => n.as_i64().map(|v| v != 0),
            _ => None,
        }
    }

    /// Cell as a date, trying the formats sources actually emit.
    ///
    /// An unparsable value in an optional field is simply `None`; the caller
    /// decides whether that is worth an exception-log entry.
    #[must_use]
    pub fn date(&self, column: &str) -> Option<NaiveDate> {
        let raw = self.str(column)?;
        parse_date(raw)
    }
}

/// Parse a date string in the formats source exports actually use
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    const FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y", "%Y/%m/%d"];

    let raw = raw.trim();
    // Timestamps keep only their date part
    let date_part = raw.split(['T', ' ']).next().unwrap_or(raw);
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// A black-box producer of flat rows, one lazy sequence per table.
///
/// Sources must be `Send` so a run can live on its dedicated worker thread.
pub trait RowSource: Send {
    /// Enumerate the tables this source provides, in source order
    fn tables(&self) -> Result<Vec<TableInfo>>;

    /// Scan one table from row zero
    fn scan_table(&self, name: &str) -> Result<Box<dyn Iterator<Item = Row> + '_>>;
}
