// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! `run_until` must stop the simulation the moment its event fires, even
//! with other tasks still ticking.

use spur_engine::test_helpers::start_test;

mod common;
use common::{once_after, spawn_ticker};

#[test]
fn stops_on_event() {
    let mut engine = start_test(file!());

    let done = once_after(&mut engine, 5, 1);

    spawn_ticker(&mut engine);
    engine.run_until(done).unwrap();

    assert_eq!(engine.time_now_ns(), 5.0);
}

#[test]
fn stops_on_unit_event() {
    let mut engine = start_test(file!());

    let done = once_after(&mut engine, 20, ());

    spawn_ticker(&mut engine);
    engine.run_until(done).unwrap();

    assert_eq!(engine.time_now_ns(), 20.0);
}
