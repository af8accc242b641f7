//! In-memory row source for tests and the bundled example dataset.

use serde_json::json;

use super::{Row, RowSource, TableInfo};
use crate::error::{Error, Result};

/// Row source over tables held in memory, preserving insertion order
#[derive(Debug, Default)]
pub struct MemorySource {
    tables: Vec<(String, Vec<Row>)>,
}

impl MemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table; rows keep the order they are given in
    pub fn add_table(&mut self, name: &str, rows: Vec<Row>) {
        self.tables.push((name.to_string(), rows));
    }

    /// Builder-style variant of [`MemorySource::add_table`]
    #[must_use]
    pub fn with_table(mut self, name: &str, rows: Vec<Row>) -> Self {
        self.add_table(name, rows);
        self
    }

    /// A small built-in dataset exercising the whole pipeline
    #[must_use]
    pub fn example() -> Self {
        let people = vec![
            Row::new(0)
                .with("individual_id", json!(1))
                .with("household_id", json!(10))
                .with("household_name", json!("Decker Family"))
                .with("first_name", json!("Ted"))
                .with("last_name", json!("Decker"))
                .with("gender", json!("Male"))
                .with("date_of_birth", json!("1975-02-10"))
                .with("marital_status", json!("Married"))
                .with("status", json!("Member"))
                .with("campus", json!("Main Campus"))
                .with("household_position", json!("Head"))
                .with("email", json!("ted@example.com"))
                .with("home_phone", json!("(555) 123-4567")),
            Row::new(1)
                .with("individual_id", json!(2))
                .with("household_id", json!(10))
                .with("household_name", json!("Decker Family"))
                .with("first_name", json!("Cindy"))
                .with("last_name", json!("Decker"))
                .with("gender", json!("F"))
                .with("date_of_birth", json!("1977-05-01"))
                .with("marital_status", json!("Married"))
                .with("status", json!("Member"))
                .with("campus", json!("Main Campus"))
                .with("household_position", json!("Spouse")),
            Row::new(2)
                .with("individual_id", json!(3))
                .with("household_id", json!(10))
                .with("household_name", json!("Decker Family"))
                .with("first_name", json!("Noah"))
                .with("last_name", json!("Decker"))
                .with("gender", json!("M"))
                .with("date_of_birth", json!("2012-03-12"))
                .with("status", json!("Attendee"))
                .with("household_position", json!("Child")),
        ];

        let batches = vec![
            Row::new(0)
                .with("batch_id", json!(100))
                .with("batch_name", json!("Sunday Offering"))
                .with("batch_date", json!("2024-01-07"))
                .with("amount", json!(250.0)),
        ];

        let contributions = vec![
            Row::new(0)
                .with("contribution_id", json!(1000))
                .with("batch_id", json!(100))
                .with("individual_id", json!(1))
                .with("household_id", json!(10))
                .with("amount", json!(250.0))
                .with("received_date", json!("2024-01-07"))
                .with("contribution_type_name", json!("Check"))
                .with("check_number", json!("1234"))
                .with("fund_name", json!("General Fund")),
        ];

        Self::new()
            .with_table("individual", people)
            .with_table("batch", batches)
            .with_table("contribution", contributions)
    }
}

impl RowSource for MemorySource {
    fn tables(&self) -> Result<Vec<TableInfo>> {
        Ok(self
            .tables
            .iter()
            .map(|(name, rows)| TableInfo {
                name: name.clone(),
                row_count: rows.len(),
            })
            .collect())
    }

    fn scan_table(&self, name: &str) -> Result<Box<dyn Iterator<Item = Row> + '_>> {
        let (_, rows) = self
            .tables
            .iter()
            .find(|(table, _)| table == name)
            .ok_or_else(|| Error::UnknownTable(name.to_string()))?;
        Ok(Box::new(rows.iter().cloned()))
    }
}
