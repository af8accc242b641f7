//! Terminal rendering for progress events, using the indicatif crate.
//!
//! Only the binary uses this; the engine itself talks to observers.

use indicatif::{ProgressBar, ProgressStyle};

use super::ProgressEvent;

/// Template for the per-table progress bar
pub const TABLE_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/100 {msg}";

/// Create a percent-based progress bar for one table pass
#[must_use]
pub fn create_table_progress_bar(table: &str) -> ProgressBar {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(TABLE_TEMPLATE)
            .unwrap()
            .progress_chars("#>-"),
    );
    pb.set_message(table.to_string());
    pb
}

/// Drive a progress bar from a stream of events, one bar per table
#[derive(Debug, Default)]
pub struct ProgressDisplay {
    current: Option<ProgressBar>,
}

impl ProgressDisplay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event to the display
    pub fn handle(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::TableStarted { table, total_rows } => {
                if let Some(bar) = self.current.take() {
                    bar.finish_and_clear();
                }
                log::info!("processing table {table} ({total_rows} rows)");
                self.current = Some(create_table_progress_bar(table));
            }
            ProgressEvent::Percent {
                percent, message, ..
            } => {
                if let Some(bar) = &self.current {
                    bar.set_position(u64::from(*percent));
                    bar.set_message(message.clone());
                }
            }
            ProgressEvent::Partial { .. } => {
                if let Some(bar) = &self.current {
                    bar.tick();
                }
            }
        }
    }

    /// Finish the last bar
    pub fn finish(&mut self) {
        if let Some(bar) = self.current.take() {
            bar.finish_and_clear();
        }
    }
}
