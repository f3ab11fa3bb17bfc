// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

use std::rc::Rc;

use sim_leafspine::{ScenarioConfig, run_scenario};
use spur_models::error::BuildError;
use spur_track::Tracker;
use spur_track::test_helpers::TestTracker;
use spur_track::tracker::stdout_tracker;

fn config(duration_s: f64) -> ScenarioConfig {
    ScenarioConfig {
        num_leaves: 2,
        num_spines: 1,
        bandwidth: "1Gbps".to_string(),
        delay: "1us".to_string(),
        queue: "16".to_string(),
        payload_bytes: 1200,
        duration_s,
    }
}

/// A short run delivers traffic and stops at the configured time.
#[test]
fn bounded_run_delivers_traffic() {
    let tracker = stdout_tracker(log::Level::Warn);
    let summary = run_scenario(&config(0.001), &tracker).unwrap();

    // 1ms at the 1MHz link clock.
    assert_eq!(summary.simulated_ns, 1_000_000.0);
    assert!(summary.packets_received > 0);
    assert!(summary.packets_sent >= summary.packets_received);
    assert_eq!(summary.bytes_received, summary.packets_received * 1242);
}

/// An empty link parameter is rejected before the engine or any node exists:
/// the tracker records no creation at all.
#[test]
fn missing_parameter_builds_nothing() {
    let recorder = Rc::new(TestTracker::new(1));
    let tracker: Tracker = recorder.clone();

    let mut bad = config(0.001);
    bad.delay = String::new();
    let result = run_scenario(&bad, &tracker);

    assert!(matches!(
        result,
        Err(BuildError::MissingParameter("delay"))
    ));
    assert_eq!(recorder.num_events(), 0);
}

/// Missing parameters are reported by name.
#[test]
fn missing_parameter_is_named() {
    let tracker = stdout_tracker(log::Level::Warn);

    let mut bad = config(0.001);
    bad.bandwidth = String::new();
    let message = run_scenario(&bad, &tracker).unwrap_err().to_string();

    assert_eq!(message, "missing required link parameter 'bandwidth'");
}
