// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! The [`Track`] trait and the trackers that implement it.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io;
use std::rc::Rc;

use regex::Regex;

use crate::id::{Id, ROOT};
use crate::{SharedWriter, Writer};

/// Raised when a tracker cannot be built from its configuration.
#[derive(Debug)]
pub struct TrackConfigError(pub String);

/// The sink for every _log_ and _trace_ event in a simulation.
pub trait Track {
    /// Hand out the next free [`Id`].
    fn unique_id(&self) -> Id;

    /// Whether the entity with this ID emits events at `level`.
    fn enabled(&self, id: Id, level: log::Level) -> bool;

    /// Tell the tracker that an entity now exists under the given name.
    fn register_entity(&self, id: Id, full_name: &str);

    /// An object arrived at an entity.
    fn enter(&self, at: Id, object: Id);

    /// An object left an entity.
    fn exit(&self, from: Id, object: Id);

    /// An object of `num_bytes` came into existence.
    fn create(&self, by: Id, object: Id, num_bytes: usize, name: &str);

    /// An object was destroyed.
    fn destroy(&self, by: Id, object: Id);

    /// Two entities were wired together.
    fn connect(&self, from: Id, to: Id);

    /// A formatted log message at the given level.
    fn log(&self, by: Id, level: log::Level, msg: std::fmt::Arguments);

    /// Simulated time moved forward to `time_ns`.
    fn time(&self, by: Id, time_ns: f64);

    /// Flush and release any resources before the simulation ends.
    fn shutdown(&self);
}

/// A shared, dynamically-dispatched tracker.
pub type Tracker = Rc<dyn Track>;

/// A [`Tracker`] writing text to stdout, enabled at `level` for all entities.
#[must_use]
pub fn stdout_tracker(level: log::Level) -> Tracker {
    let writer = Box::new(io::BufWriter::new(io::stdout()));
    Rc::new(TextTracker::new(EntityLevels::new(level), writer))
}

/// A [`Tracker`] that swallows every event.
#[must_use]
pub fn null_tracker() -> Tracker {
    Rc::new(NullTracker)
}

/// Per-entity log levels, plus the ID and time bookkeeping shared by the
/// real trackers.
///
/// The default level applies to every entity unless a filter regex matched
/// its full name when it was registered.
pub struct EntityLevels {
    default_level: log::Level,

    /// Filters in priority order; the first regex to match wins.
    filters: Vec<(Regex, log::Level)>,

    /// Entities whose level differs from the default.
    overrides: RefCell<HashMap<Id, log::Level>>,

    next_id: Cell<u64>,
    now_ns: Cell<f64>,
}

impl EntityLevels {
    #[must_use]
    pub fn new(default_level: log::Level) -> Self {
        Self {
            default_level,
            filters: Vec::new(),
            overrides: RefCell::new(HashMap::new()),
            next_id: Cell::new(ROOT.0 + 1),
            now_ns: Cell::new(0.0),
        }
    }

    /// Entities whose full name matches `regex_str` get `level` instead of
    /// the default. Filters added earlier take priority.
    pub fn add_filter(&mut self, regex_str: &str, level: log::Level) -> Result<(), TrackConfigError> {
        let regex = Regex::new(regex_str).map_err(|e| {
            TrackConfigError(format!("Failed to parse regex {regex_str}:\n{e}\n"))
        })?;
        self.filters.push((regex, level));
        Ok(())
    }

    fn unique_id(&self) -> Id {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        Id(id)
    }

    fn level_for(&self, full_name: &str) -> log::Level {
        self.filters
            .iter()
            .find(|(regex, _)| regex.is_match(full_name))
            .map_or(self.default_level, |(_, level)| *level)
    }

    fn register(&self, id: Id, full_name: &str) {
        let level = self.level_for(full_name);
        if level == self.default_level {
            return;
        }
        let seen = self.overrides.borrow_mut().insert(id, level);
        assert!(seen.is_none(), "Entity ID {id} already seen ({full_name})");
    }

    fn enabled(&self, id: Id, level: log::Level) -> bool {
        let limit = match self.overrides.borrow().get(&id) {
            Some(entity_level) => *entity_level,
            None => self.default_level,
        };
        level <= limit
    }

    fn set_time(&self, time_ns: f64) {
        assert!(time_ns >= self.now_ns.get());
        self.now_ns.set(time_ns);
    }
}

/// Writes every event as one line of text.
pub struct TextTracker {
    levels: EntityLevels,
    writer: SharedWriter,
}

impl TextTracker {
    pub fn new(levels: EntityLevels, writer: Writer) -> Self {
        Self {
            levels,
            writer: Rc::new(RefCell::new(writer)),
        }
    }

    fn emit(&self, line: String) {
        self.writer.borrow_mut().write_all(line.as_bytes()).unwrap();
    }
}

impl Track for TextTracker {
    fn unique_id(&self) -> Id {
        self.levels.unique_id()
    }

    fn enabled(&self, id: Id, level: log::Level) -> bool {
        self.levels.enabled(id, level)
    }

    fn register_entity(&self, id: Id, full_name: &str) {
        self.levels.register(id, full_name);
    }

    fn enter(&self, at: Id, object: Id) {
        self.emit(format!("{at}: enter {object}\n"));
    }

    fn exit(&self, from: Id, object: Id) {
        self.emit(format!("{from}: exit {object}\n"));
    }

    fn create(&self, by: Id, object: Id, num_bytes: usize, name: &str) {
        self.emit(format!("{by}: created {object}, {name}, {num_bytes} bytes\n"));
    }

    fn destroy(&self, by: Id, object: Id) {
        self.emit(format!("{by}: destroyed {object}\n"));
    }

    fn connect(&self, from: Id, to: Id) {
        self.emit(format!("{from}: connect to {to}\n"));
    }

    fn log(&self, by: Id, level: log::Level, msg: std::fmt::Arguments) {
        self.emit(format!("{by}:{level}: {msg}\n"));
    }

    fn time(&self, by: Id, time_ns: f64) {
        self.levels.set_time(time_ns);
        self.emit(format!("{by}: set time to {time_ns:.1}ns\n"));
    }

    fn shutdown(&self) {
        self.writer.borrow_mut().flush().unwrap();
    }
}

/// Drops every event. Useful when tracking overhead is unwanted.
pub struct NullTracker;

impl Track for NullTracker {
    fn unique_id(&self) -> Id {
        Id(0)
    }
    fn enabled(&self, _id: Id, _level: log::Level) -> bool {
        false
    }
    fn register_entity(&self, _id: Id, _full_name: &str) {}
    fn enter(&self, _at: Id, _object: Id) {}
    fn exit(&self, _from: Id, _object: Id) {}
    fn create(&self, _by: Id, _object: Id, _num_bytes: usize, _name: &str) {}
    fn destroy(&self, _by: Id, _object: Id) {}
    fn connect(&self, _from: Id, _to: Id) {}
    fn log(&self, _by: Id, _level: log::Level, _msg: std::fmt::Arguments) {}
    fn time(&self, _by: Id, _time_ns: f64) {}
    fn shutdown(&self) {}
}
