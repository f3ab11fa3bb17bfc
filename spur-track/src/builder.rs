// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Build trackers from user-facing configuration.

use std::io;
use std::rc::Rc;

use crate::Tracker;
use crate::tracker::{EntityLevels, TextTracker, TrackConfigError, null_tracker};

/// Configuration for one tracker.
pub struct TrackerConfig<'a> {
    /// Whether this tracker is active at all.
    pub enable: bool,

    /// Level entities emit at.
    pub level: log::Level,

    /// When non-empty, only entities matching this regular expression get
    /// `level`; everything else is restricted to errors.
    pub filter_regex: &'a str,
}

impl Default for TrackerConfig<'_> {
    fn default() -> Self {
        Self {
            enable: true,
            level: log::Level::Warn,
            filter_regex: "",
        }
    }
}

/// Configuration for every tracker the application supports.
#[derive(Default)]
pub struct TrackersConfig<'a> {
    /// The stdout text tracker.
    pub stdout: TrackerConfig<'a>,
}

/// Build the tracker the given configuration asks for.
pub fn setup_trackers(config: &TrackersConfig) -> Result<Tracker, TrackConfigError> {
    if !config.stdout.enable {
        return Ok(null_tracker());
    }

    let stdout = &config.stdout;
    let levels = if stdout.filter_regex.is_empty() {
        EntityLevels::new(stdout.level)
    } else {
        let mut levels = EntityLevels::new(log::Level::Error);
        levels.add_filter(stdout.filter_regex, stdout.level)?;
        levels
    };

    let writer = Box::new(io::BufWriter::new(io::stdout()));
    Ok(Rc::new(TextTracker::new(levels, writer)))
}
