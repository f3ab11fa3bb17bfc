// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Test support: a tracker that records events in memory.

use std::cell::{Cell, RefCell};

use regex::Regex;

use crate::{Id, Track};

/// A [`Track`] implementation that stores the textual form of every event
/// so tests can assert on what was emitted.
///
/// Every entity is enabled at every level.
pub struct TestTracker {
    events: RefCell<Vec<String>>,
    next_id: Cell<u64>,
}

impl TestTracker {
    /// Create a recorder whose first handed-out ID is `first_id`.
    #[must_use]
    pub fn new(first_id: u64) -> Self {
        Self {
            events: RefCell::new(Vec::new()),
            next_id: Cell::new(first_id),
        }
    }

    fn record(&self, event: String) {
        println!("{event}");
        self.events.borrow_mut().push(event);
    }

    /// The number of events recorded so far.
    #[must_use]
    pub fn num_events(&self) -> usize {
        self.events.borrow().len()
    }

    /// Assert that the recorded events match `expected`, one regular
    /// expression per event and in order, then clear the recording.
    pub fn expect(&self, expected: &[&str]) {
        let mut events = self.events.borrow_mut();
        assert_eq!(
            expected.len(),
            events.len(),
            "expected {expected:?}, recorded {events:?}"
        );

        for (pattern, event) in expected.iter().zip(events.iter()) {
            let re = Regex::new(pattern).unwrap();
            assert!(re.is_match(event), "{pattern:?} does not match {event:?}");
        }

        events.clear();
    }
}

impl Track for TestTracker {
    fn unique_id(&self) -> Id {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        Id(id)
    }

    fn enabled(&self, _id: Id, _level: log::Level) -> bool {
        true
    }

    fn register_entity(&self, _id: Id, _full_name: &str) {}

    fn enter(&self, at: Id, object: Id) {
        self.record(format!("{at}: {object} entered"));
    }

    fn exit(&self, from: Id, object: Id) {
        self.record(format!("{from}: {object} exited"));
    }

    fn create(&self, by: Id, object: Id, num_bytes: usize, name: &str) {
        self.record(format!("{by}: created {object}, {name}, {num_bytes} bytes"));
    }

    fn destroy(&self, by: Id, object: Id) {
        self.record(format!("{by}: destroyed {object}"));
    }

    fn connect(&self, from: Id, to: Id) {
        self.record(format!("{from}: connect to {to}"));
    }

    fn log(&self, by: Id, level: log::Level, msg: std::fmt::Arguments) {
        self.record(format!("{by}:{level}: {msg}"));
    }

    fn time(&self, by: Id, time_ns: f64) {
        self.record(format!("{by}: set time {time_ns:.1}ns"));
    }

    fn shutdown(&self) {}
}
