// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Shared plumbing for the engine integration tests.

use spur_engine::engine::Engine;
use spur_engine::events::Once;
use spur_engine::types::Eventable;

/// Spawn a task that ticks forever, so the simulation always has work.
pub fn spawn_ticker(engine: &mut Engine) {
    let clock = engine.default_clock();
    engine.spawn(async move {
        loop {
            clock.wait_ticks(1).await;
            println!("Running {}", clock.tick_now());
        }
    });
}

/// An event that fires with `value` after `delay` ticks of the default
/// clock.
pub fn once_after<T>(engine: &mut Engine, delay: u64, value: T) -> Eventable<T>
where
    T: Copy + 'static,
{
    let event = Once::new(value);
    {
        let clock = engine.default_clock();
        let event = event.clone();
        engine.spawn(async move {
            clock.wait_ticks(delay).await;
            event.notify()?;
            Ok(())
        });
    }
    Box::new(event)
}
