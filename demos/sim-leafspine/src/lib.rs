// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Scenario driver for the leaf-spine demo.
//!
//! [run_scenario] builds a fabric from a [ScenarioConfig], attaches a client
//! and a server endpoint, streams traffic from the client for the configured
//! duration of simulated time and reports what arrived.

use spur_engine::engine::Engine;
use spur_engine::events::Once;
use spur_models::endpoint::Endpoint;
use spur_models::error::BuildError;
use spur_models::leaf_spine::{LeafSpineConfig, LeafSpineFabric};
use spur_models::link::LinkProfile;
use spur_track::Tracker;

/// The clock all links run on. One tick per microsecond keeps millisecond
/// delays and megabit rates in comfortable integer ranges.
pub const LINK_CLOCK_MHZ: f64 = 1.0;

/// A scenario as it arrives from the command line. The link parameters stay
/// unparsed here; [run_scenario] validates them before it builds anything.
pub struct ScenarioConfig {
    pub num_leaves: usize,
    pub num_spines: usize,
    pub bandwidth: String,
    pub delay: String,
    pub queue: String,
    pub payload_bytes: usize,
    pub duration_s: f64,
}

/// What happened during a scenario run.
#[derive(Debug)]
pub struct ScenarioSummary {
    pub simulated_ns: f64,
    pub packets_sent: usize,
    pub packets_received: usize,
    pub bytes_received: usize,
}

pub fn run_scenario(
    config: &ScenarioConfig,
    tracker: &Tracker,
) -> Result<ScenarioSummary, BuildError> {
    // A missing or malformed link parameter aborts here, before the engine or
    // any node exists.
    let profile = LinkProfile::parse(&config.bandwidth, &config.delay, &config.queue)?;

    let mut engine = Engine::new(tracker);
    let clock = engine.clock_mhz(LINK_CLOCK_MHZ);

    let top = engine.top();
    let fabric = LeafSpineFabric::build(
        &engine,
        &clock,
        top,
        "fabric",
        LeafSpineConfig {
            num_leaves: config.num_leaves,
            num_spines: config.num_spines,
        },
        &profile,
    )?;

    let client = Endpoint::new_and_register(&engine, top, "client", 0, config.payload_bytes)?;
    let server = Endpoint::new_and_register(&engine, top, "server", 1, config.payload_bytes)?;
    client.set_peer(server.address());

    fabric.attach(&engine, &clock, &client, &server, &profile)?;

    // The client streams until this fires.
    let duration_ticks = (config.duration_s * LINK_CLOCK_MHZ * 1e6).round() as u64;
    let stop = Once::new(());
    {
        let clock = clock.clone();
        let stop = stop.clone();
        engine.spawn(async move {
            clock.wait_ticks(duration_ticks).await;
            stop.notify()?;
            Ok(())
        });
    }
    engine.run_until(Box::new(stop))?;

    Ok(ScenarioSummary {
        simulated_ns: engine.time_now_ns(),
        packets_sent: client.num_sent(),
        packets_received: server.num_received(),
        bytes_received: server.bytes_received(),
    })
}
