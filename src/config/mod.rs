//! Configuration for an import run.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Configuration for one import run
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Name of the person the import is attributed to
    pub import_user: String,
    /// Source format tag ("fellowship-one", "csv", "example")
    pub source_format: String,
    /// Directory or file the row source reads from
    pub source_path: PathBuf,
    /// Directory of attachment files to scan, if any
    pub attachment_dir: Option<PathBuf>,
    /// File the skipped-row log is written to at the end of the run
    pub exception_log_path: Option<PathBuf>,
    /// Tables to include; empty means every table the source enumerates
    pub tables: Vec<String>,
    /// Override for the per-table flush interval
    pub reporting_number: Option<usize>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            import_user: "Admin".to_string(),
            source_format: "csv".to_string(),
            source_path: PathBuf::new(),
            attachment_dir: None,
            exception_log_path: None,
            tables: Vec::new(),
            reporting_number: None,
        }
    }
}

impl ImportConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        serde_json::from_reader(reader)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Whether a table passed the pre-run inclusion checklist
    #[must_use]
    pub fn is_table_selected(&self, name: &str) -> bool {
        self.tables.is_empty() || self.tables.iter().any(|t| t == name)
    }
}
