// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

use spur_components::connect_port;
use spur_components::router::{DestinationIndex, Router};
use spur_components::sink::Sink;
use spur_components::source::Source;
use spur_engine::run_simulation;
use spur_engine::test_helpers::start_test;

#[test]
fn router() {
    let mut engine = start_test(file!());

    const NUM_PUTS: usize = 50;

    let iter = Box::new((0..2).cycle().take(NUM_PUTS));
    let top = engine.top();
    let source = Source::new_and_register(&engine, top, "source", Some(iter)).unwrap();
    let router =
        Router::new_and_register(&engine, top, "router", 2, Box::new(DestinationIndex {})).unwrap();
    let sink_a = Sink::new_and_register(&engine, top, "sink_a").unwrap();
    let sink_b = Sink::new_and_register(&engine, top, "sink_b").unwrap();

    connect_port!(source, tx => router, rx).unwrap();
    connect_port!(router, tx, 0 => sink_a, rx).unwrap();
    connect_port!(router, tx, 1 => sink_b, rx).unwrap();

    run_simulation!(engine);

    assert_eq!(sink_a.num_sunk(), NUM_PUTS / 2);
    assert_eq!(sink_b.num_sunk(), NUM_PUTS / 2);
}

/// Routing to an egress index that does not exist must fail the simulation.
#[test]
#[should_panic(expected = "routed to missing egress")]
fn router_invalid_egress() {
    let mut engine = start_test(file!());

    let top = engine.top();
    // Every value routes to index equal to its destination, which is out of
    // range for a single-egress router.
    let iter = Box::new(std::iter::repeat(5).take(3));
    let source = Source::new_and_register(&engine, top, "source", Some(iter)).unwrap();
    let router =
        Router::new_and_register(&engine, top, "router", 1, Box::new(DestinationIndex {})).unwrap();
    let sink = Sink::new_and_register(&engine, top, "sink").unwrap();

    connect_port!(source, tx => router, rx).unwrap();
    connect_port!(router, tx, 0 => sink, rx).unwrap();

    run_simulation!(engine);
}
