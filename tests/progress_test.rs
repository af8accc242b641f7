//! Tests for percent-based progress reporting.

use std::cell::RefCell;
use std::sync::mpsc;

use rock_migrate::progress::{
    ChannelObserver, ProgressEvent, ProgressObserver, ProgressReporter,
};

/// Observer that records every event for inspection
#[derive(Default)]
struct Recorder {
    events: RefCell<Vec<ProgressEvent>>,
}

impl Recorder {
    fn percents(&self) -> Vec<u8> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Percent { percent, .. } => Some(*percent),
                _ => None,
            })
            .collect()
    }
}

impl ProgressObserver for Recorder {
    fn on_event(&self, event: ProgressEvent) {
        self.events.borrow_mut().push(event);
    }
}

#[test]
fn test_percent_sequence_is_monotonic_and_caps_at_100() {
    let recorder = Recorder::default();
    let mut reporter = ProgressReporter::new(&recorder, "Individual_Household", 250);
    for _ in 0..250 {
        reporter.row_completed();
    }
    reporter.finish();

    let percents = recorder.percents();
    assert!(!percents.is_empty());
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(percents.iter().filter(|&&p| p == 100).count(), 1);
    assert_eq!(*percents.last().unwrap(), 100);
}

#[test]
fn test_small_table_reports_each_row() {
    let recorder = Recorder::default();
    let mut reporter = ProgressReporter::new(&recorder, "batch", 4);
    for _ in 0..4 {
        reporter.row_completed();
    }
    reporter.finish();

    // percent_step is 1, so every row fires a boundary
    assert_eq!(recorder.percents(), vec![25, 50, 75, 100]);
}

#[test]
fn test_finish_reports_100_when_rows_were_skipped() {
    let recorder = Recorder::default();
    let mut reporter = ProgressReporter::new(&recorder, "contribution", 10);
    // Only some rows produced drafts; the pass still ends at 100
    for _ in 0..3 {
        reporter.row_completed();
    }
    reporter.finish();

    let percents = recorder.percents();
    assert_eq!(*percents.last().unwrap(), 100);
    assert_eq!(percents.iter().filter(|&&p| p == 100).count(), 1);
}

#[test]
fn test_empty_table_still_completes() {
    let recorder = Recorder::default();
    let mut reporter = ProgressReporter::new(&recorder, "pledge", 0);
    reporter.finish();
    assert_eq!(recorder.percents(), vec![100]);
}

#[test]
fn test_table_started_event_carries_total() {
    let recorder = Recorder::default();
    let _reporter = ProgressReporter::new(&recorder, "Individual_Household", 42);
    let events = recorder.events.borrow();
    assert!(matches!(
        &events[0],
        ProgressEvent::TableStarted { table, total_rows: 42 } if table == "Individual_Household"
    ));
}

#[test]
fn test_partial_events_between_boundaries() {
    let recorder = Recorder::default();
    let mut reporter = ProgressReporter::new(&recorder, "Individual_Household", 1000);
    // 1000 rows means a boundary every 10; a flush at row 5 is partial
    for _ in 0..5 {
        reporter.row_completed();
    }
    reporter.partial();

    let events = recorder.events.borrow();
    assert!(events
        .iter()
        .any(|e| matches!(e, ProgressEvent::Partial { table } if table == "Individual_Household")));
    assert!(!events
        .iter()
        .any(|e| matches!(e, ProgressEvent::Percent { .. })));
}

#[test]
fn test_channel_observer_forwards_events() {
    let (sender, receiver) = mpsc::channel();
    let observer = ChannelObserver::new(sender);
    {
        let mut reporter = ProgressReporter::new(&observer, "batch", 2);
        reporter.row_completed();
        reporter.row_completed();
        reporter.finish();
    }
    drop(observer);

    let events: Vec<ProgressEvent> = receiver.iter().collect();
    assert!(matches!(events[0], ProgressEvent::TableStarted { .. }));
    let percents: Vec<u8> = events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::Percent { percent, .. } => Some(*percent),
            _ => None,
        })
        .collect();
    assert_eq!(percents, vec![50, 100]);
}

#[test]
fn test_dropped_receiver_does_not_panic() {
    let (sender, receiver) = mpsc::channel();
    let observer = ChannelObserver::new(sender);
    drop(receiver);

    let mut reporter = ProgressReporter::new(&observer, "batch", 1);
    reporter.row_completed();
    reporter.finish();
}
