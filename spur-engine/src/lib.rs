// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

#![doc(test(attr(warn(unused))))]

//! `SPUR` - the SPUR simulation engine.
//!
//! An event driven simulator for networks of asynchronous
//! [components](../spur_components/index.html). Components talk through
//! [ports](crate::port), wait on [events](crate::events) and sleep on
//! [clocks](crate::time); the [engine](crate::engine::Engine) drives them
//! all from a single-threaded executor.

pub mod engine;
pub mod events;
pub mod executor;
pub mod port;
pub mod test_helpers;
pub mod time;
pub mod traits;
pub mod types;

/// Spawn all registered components and run the simulation to completion,
/// panicking on error.
#[macro_export]
macro_rules! run_simulation {
    ($engine:ident) => {
        $engine.run().unwrap();
    };
}
