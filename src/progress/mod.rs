//! Progress reporting.
//!
//! The engine never touches a UI toolkit. It emits [`ProgressEvent`]s
//! through an observer; the consuming display (a terminal progress bar, a
//! test harness) subscribes on the other side. When the run lives on a
//! background thread, [`ChannelObserver`] is the sole cross-thread
//! boundary.

pub mod display;

use std::sync::mpsc::Sender;

/// One progress notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A whole-percent boundary was crossed
    Percent {
        table: String,
        percent: u8,
        message: String,
    },
    /// Still working: a flush happened between percent boundaries
    Partial { table: String },
    /// A table pass started, with its row total
    TableStarted { table: String, total_rows: usize },
}

/// Receives progress notifications
pub trait ProgressObserver: Send {
    fn on_event(&self, event: ProgressEvent);
}

/// Observer that drops every event
#[derive(Debug, Default)]
pub struct NullObserver;

impl ProgressObserver for NullObserver {
    fn on_event(&self, _event: ProgressEvent) {}
}

/// Observer that forwards events over an mpsc channel.
///
/// Send failures are ignored: a disconnected consumer must not abort the
/// import.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    sender: Sender<ProgressEvent>,
}

impl ChannelObserver {
    #[must_use]
    pub fn new(sender: Sender<ProgressEvent>) -> Self {
        Self { sender }
    }
}

impl ProgressObserver for ChannelObserver {
    fn on_event(&self, event: ProgressEvent) {
        let _ = self.sender.send(event);
    }
}

/// Computes percent boundaries for one table pass.
///
/// `percent_step = ceil(total / 100)`, so a pass produces about one hundred
/// percent notifications regardless of row count. The reported percent is
/// monotonically non-decreasing and reaches 100 exactly once, at the end of
/// the pass.
pub struct ProgressReporter<'a> {
    observer: &'a dyn ProgressObserver,
    table: String,
    total: usize,
    percent_step: usize,
    completed: usize,
    last_percent: Option<u8>,
}

impl<'a> ProgressReporter<'a> {
    /// Start reporting for one table pass
    pub fn new(observer: &'a dyn ProgressObserver, table: &str, total: usize) -> Self {
        observer.on_event(ProgressEvent::TableStarted {
            table: table.to_string(),
            total_rows: total,
        });
        Self {
            observer,
            table: table.to_string(),
            total: total.max(1),
            percent_step: total.div_ceil(100).max(1),
            completed: 0,
            last_percent: None,
        }
    }

    /// Rows completed so far
    #[must_use]
    pub const fn completed(&self) -> usize {
        self.completed
    }

    /// Count one completed row; returns whether a percent boundary fired
    pub fn row_completed(&mut self) -> bool {
        self.completed += 1;
        if self.completed % self.percent_step != 0 {
            return false;
        }
        let percent = self.percent_of(self.completed);
        self.emit(percent);
        true
    }

    /// Emit a lightweight "still working" signal between boundaries
    pub fn partial(&self) {
        self.observer.on_event(ProgressEvent::Partial {
            table: self.table.clone(),
        });
    }

    /// Close the pass, reporting 100 if no boundary already did
    pub fn finish(&mut self) {
        if self.last_percent != Some(100) {
            self.emit(100);
        }
    }

    fn percent_of(&self, completed: usize) -> u8 {
        let percent = completed * 100 / self.total;
        u8::try_from(percent.min(100)).unwrap_or(100)
    }

    fn emit(&mut self, percent: u8) {
        // Clamp to keep the sequence non-decreasing
        let percent = percent.max(self.last_percent.unwrap_or(0));
        if self.last_percent == Some(100) {
            return;
        }
        self.last_percent = Some(percent);
        self.observer.on_event(ProgressEvent::Percent {
            table: self.table.clone(),
            percent,
            message: format!("{} of {} rows", self.completed, self.total),
        });
    }
}
