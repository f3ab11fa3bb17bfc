// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Shared result and handle types.

use std::error::Error;
use std::fmt;
use std::rc::Rc;

use crate::traits::{Event, Runnable};

/// Build the `Err` variant of a [`SimResult`] from anything that can be
/// turned into a string.
#[macro_export]
macro_rules! sim_error {
    ($msg:expr) => {
        Err($crate::types::SimError($msg.to_string()))
    };
}

/// An error raised somewhere in a simulation.
#[derive(Debug)]
pub struct SimError(pub String);

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Error: {}", self.0)
    }
}

impl Error for SimError {}

/// The return type of most simulation functions.
pub type SimResult = Result<(), SimError>;

/// A registered component, shared between the caller and the engine.
pub type Component = Rc<dyn Runnable + 'static>;

/// A boxed [`Event`] yielding `T`, as accepted by
/// [`Engine::run_until`](crate::engine::Engine::run_until).
pub type Eventable<T> = Box<dyn Event<EventResult = T> + 'static>;
