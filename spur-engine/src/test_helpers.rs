// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Helpers shared by the engine and component tests.

use spur_track::tracker::stdout_tracker;

use crate::engine::Engine;

/// An engine for a test, tracking warnings and errors to stdout so they
/// show up under `--nocapture`.
#[must_use]
pub fn start_test(test_file: &str) -> Engine {
    println!("Tracking for {test_file}");
    Engine::new(&stdout_tracker(log::Level::Warn))
}
