// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Misuse of ports must fail with an error naming the port.

use spur_engine::port::{InPort, OutPort};
use spur_engine::run_simulation;
use spur_engine::test_helpers::start_test;

#[test]
#[should_panic(expected = "top::egress not connected")]
fn put_on_unconnected_output() {
    let mut engine = start_test(file!());

    let egress = OutPort::new(engine.top(), "egress");
    engine.spawn(async move {
        egress.put(42)?.await;
        Ok(())
    });
    run_simulation!(engine);
}

#[test]
#[should_panic(expected = "top::egress not connected")]
fn try_put_on_unconnected_output() {
    let mut engine = start_test(file!());

    let egress = OutPort::new(engine.top(), "egress");
    engine.spawn(async move {
        egress.try_put()?.await;
        egress.put(42)?.await;
        Ok(())
    });
    run_simulation!(engine);
}

#[test]
#[should_panic(expected = "top::ingress not connected")]
fn get_on_unconnected_input() {
    let mut engine = start_test(file!());

    let ingress = InPort::new(engine.top(), "ingress");
    engine.spawn(async move {
        let _: i32 = ingress.get()?.await;
        Ok(())
    });
    run_simulation!(engine);
}

#[test]
#[should_panic(expected = "top::ingress not connected")]
fn start_get_on_unconnected_input() {
    let mut engine = start_test(file!());

    let ingress = InPort::new(engine.top(), "ingress");
    engine.spawn(async move {
        let _: i32 = ingress.start_get()?.await;
        ingress.finish_get();
        Ok(())
    });
    run_simulation!(engine);
}

#[test]
fn input_accepts_only_one_connection() {
    let engine = start_test(file!());

    let ingress: InPort<i32> = InPort::new(engine.top(), "ingress");
    assert!(ingress.channel().is_ok());

    let again = ingress.channel();
    assert_eq!(
        format!("{}", again.unwrap_err()),
        "Error: top::ingress already connected"
    );
}

#[test]
fn output_accepts_only_one_connection() {
    let engine = start_test(file!());

    let a: InPort<i32> = InPort::new(engine.top(), "a");
    let b: InPort<i32> = InPort::new(engine.top(), "b");
    let mut egress = OutPort::new(engine.top(), "egress");

    egress.connect(a.channel()).unwrap();
    let again = egress.connect(b.channel());
    assert_eq!(
        format!("{}", again.unwrap_err()),
        "Error: top::egress already connected"
    );
}
