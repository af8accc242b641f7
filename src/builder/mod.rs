//! Entity builders: per-table mapping from source rows to target drafts.
//!
//! Builders are pure-ish transforms over one row or one row group, driven
//! by a per-format [`field_map::FieldMap`] so every source format shares the
//! same mapping logic. The only side effects are exception-log entries,
//! idempotent attribute-definition upserts, and create-on-miss fund
//! accounts.

pub mod address;
pub mod document;
pub mod field_map;
pub mod financial;
pub mod person;
pub mod translate;

pub use address::build_address;
pub use document::scan_attachments;
pub use field_map::{FieldMap, TableNames};
pub use financial::{FinancialBuilder, resolve_account};
pub use person::PersonBuilder;
