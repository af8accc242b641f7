//! A Rust library for migrating church-management data between systems:
//! identity-resolved people and households, batched financial records, and
//! incremental transactional commits with progress reporting.

pub mod builder;
pub mod commit;
pub mod config;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod progress;
pub mod repository;
pub mod resolve;
pub mod rows;

// Re-export the most common types for easier use
// Core types
pub use config::ImportConfig;
pub use error::{Error, Result};
pub use orchestrator::{CancelFlag, ImportOrchestrator, RunSummary, TableState};

// Row sources
pub use rows::{CsvRowSource, MemorySource, Row, RowSource, source_from_config};

// Persistence boundary
pub use repository::{AttributeStore, MemoryRepository, Repository};

// Progress reporting
pub use progress::{ChannelObserver, NullObserver, ProgressEvent, ProgressObserver};
