// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

use spur_components::arbiter::{Arbiter, RoundRobinPolicy};
use spur_components::sink::Sink;
use spur_components::source::Source;
use spur_components::{connect_port, option_box_repeat};
use spur_engine::run_simulation;
use spur_engine::test_helpers::start_test;

#[test]
fn source_sink() {
    let mut engine = start_test(file!());

    const NUM_PUTS: usize = 25;

    let top = engine.top();
    let arbiter =
        Arbiter::new_and_register(&engine, top, "arb", 3, Box::new(RoundRobinPolicy::new()))
            .unwrap();
    let source_a =
        Source::new_and_register(&engine, top, "source_a", option_box_repeat!(1; NUM_PUTS))
            .unwrap();
    let source_b =
        Source::new_and_register(&engine, top, "source_b", option_box_repeat!(2; NUM_PUTS))
            .unwrap();
    let source_c =
        Source::new_and_register(&engine, top, "source_c", option_box_repeat!(3; NUM_PUTS))
            .unwrap();
    let sink = Sink::new_and_register(&engine, top, "sink").unwrap();

    connect_port!(source_a, tx => arbiter, rx, 0).unwrap();
    connect_port!(source_b, tx => arbiter, rx, 1).unwrap();
    connect_port!(source_c, tx => arbiter, rx, 2).unwrap();
    connect_port!(arbiter, tx => sink, rx).unwrap();

    run_simulation!(engine);

    let num_sunk = sink.num_sunk();
    assert_eq!(num_sunk, NUM_PUTS * 3);
}

#[test]
fn two_active_inputs() {
    let mut engine = start_test(file!());

    let na = 10;
    let nb = 0;
    let nc = 20;

    let top = engine.top();
    let arbiter =
        Arbiter::new_and_register(&engine, top, "arb", 3, Box::new(RoundRobinPolicy::new()))
            .unwrap();
    let source_a =
        Source::new_and_register(&engine, top, "source_a", option_box_repeat!(1; na)).unwrap();
    let source_b =
        Source::new_and_register(&engine, top, "source_b", option_box_repeat!(2; nb)).unwrap();
    let source_c =
        Source::new_and_register(&engine, top, "source_c", option_box_repeat!(3; nc)).unwrap();
    let sink = Sink::new_and_register(&engine, top, "sink").unwrap();

    connect_port!(source_a, tx => arbiter, rx, 0).unwrap();
    connect_port!(source_b, tx => arbiter, rx, 1).unwrap();
    connect_port!(source_c, tx => arbiter, rx, 2).unwrap();
    connect_port!(arbiter, tx => sink, rx).unwrap();

    run_simulation!(engine);

    let num_sunk = sink.num_sunk();
    assert_eq!(num_sunk, 30);
}

/// Connecting more sources than the arbiter has inputs must fail.
#[test]
#[should_panic(expected = "no rx port 2")]
fn more_inputs() {
    let mut engine = start_test(file!());

    let top = engine.top();
    let arbiter =
        Arbiter::new_and_register(&engine, top, "arb", 2, Box::new(RoundRobinPolicy::new()))
            .unwrap();
    let source_a =
        Source::new_and_register(&engine, top, "source_a", option_box_repeat!(1; 10)).unwrap();
    let source_b =
        Source::new_and_register(&engine, top, "source_b", option_box_repeat!(2; 10)).unwrap();
    let source_c =
        Source::new_and_register(&engine, top, "source_c", option_box_repeat!(3; 10)).unwrap();

    connect_port!(source_a, tx => arbiter, rx, 0).unwrap();
    connect_port!(source_b, tx => arbiter, rx, 1).unwrap();
    connect_port!(source_c, tx => arbiter, rx, 2).unwrap();
}
