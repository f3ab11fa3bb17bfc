// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! The engine spawns every registered component and runs it to completion.

use std::rc::Rc;

use spur_components::option_box_repeat;
use spur_components::sink::Sink;
use spur_components::source::Source;
use spur_engine::run_simulation;
use spur_engine::test_helpers::start_test;

#[test]
fn idle_components_finish() {
    let mut engine = start_test(file!());

    let top = engine.top();
    let source: Rc<Source<i32>> = Source::new_and_register(&engine, top, "source", None).unwrap();
    let sink = Sink::new_and_register(&engine, top, "sink").unwrap();

    source.connect_port_tx(sink.port_rx()).unwrap();
    run_simulation!(engine);

    assert_eq!(sink.num_sunk(), 0);
}

#[test]
fn source_feeds_sink() {
    let mut engine = start_test(file!());

    let top = engine.top();
    let source: Rc<Source<i32>> =
        Source::new_and_register(&engine, top, "source", option_box_repeat!(0x7e ; 8)).unwrap();
    let sink = Sink::new_and_register(&engine, top, "sink").unwrap();

    source.connect_port_tx(sink.port_rx()).unwrap();
    run_simulation!(engine);

    assert_eq!(sink.num_sunk(), 8);
}
