// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Timing across multiple clock domains.

use std::cell::RefCell;
use std::rc::Rc;

use spur_engine::test_helpers::start_test;

// Two tasks ticking on different frequencies must interleave in strict
// time order.
#[test]
fn two_domains_interleave() {
    let mut engine = start_test(file!());

    let slow_mhz = 512.0;
    let fast_mhz = 1024.0;

    let slow = engine.clock_mhz(slow_mhz);
    let fast = engine.clock_mhz(fast_mhz);

    let timestamps = Rc::new(RefCell::new(Vec::new()));

    let log = timestamps.clone();
    engine.spawn(async move {
        for _ in 0..4 {
            slow.wait_ticks(1).await;
            log.borrow_mut().push(("slow", slow.time_now_ns()));
        }
        Ok(())
    });

    let log = timestamps.clone();
    engine.spawn(async move {
        for _ in 0..4 {
            fast.wait_ticks(1).await;
            log.borrow_mut().push(("fast", fast.time_now_ns()));
        }
        Ok(())
    });

    engine.run().unwrap();

    let slow_ns = 1000.0 / slow_mhz;
    let fast_ns = 1000.0 / fast_mhz;
    assert_eq!(
        vec![
            ("fast", 1.0 * fast_ns),
            ("slow", 1.0 * slow_ns),
            ("fast", 2.0 * fast_ns),
            ("fast", 3.0 * fast_ns),
            ("slow", 2.0 * slow_ns),
            ("fast", 4.0 * fast_ns),
            ("slow", 3.0 * slow_ns),
            ("slow", 4.0 * slow_ns),
        ],
        *timestamps.borrow()
    );
}

// A background sleeper must not keep the simulation alive once the real
// work is done.
#[test]
fn background_sleeper_does_not_block_exit() {
    let mut engine = start_test(file!());

    {
        let clk = engine.default_clock();
        engine.spawn(async move {
            for _ in 0..3 {
                clk.wait_ticks(1).await;
            }
            Ok(())
        });
    }

    {
        let clk = engine.default_clock();
        engine.spawn(async move {
            for _ in 0..40 {
                clk.wait_ticks_or_exit(7).await;
            }
            Ok(())
        });
    }

    engine.run().unwrap();

    // Finished when the foreground loop did.
    assert_eq!(engine.time_now_ns(), 3.0);
}

// clock_ghz and clock_mhz asking for the same frequency share a domain.
#[test]
fn ghz_is_mhz_scaled() {
    let mut engine = start_test(file!());

    let a = engine.clock_ghz(2.5);
    let b = engine.clock_mhz(2500.0);
    assert_eq!(a.freq_mhz(), b.freq_mhz());
}
