// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! _Track_ support for the SPUR simulator.
//!
//! Tracking combines two kinds of event:
//!
//!   - _log_: human-readable messages with the usual
//!     [log](https://docs.rs/log) levels,
//!   - _trace_: structured modelling events, such as objects being created
//!     or entering and leaving [entities](crate::entity::Entity).
//!
//! Both kinds are emitted through a single [`Tracker`], which filters them
//! per entity and per level.

#![warn(missing_docs)]

use std::cell::RefCell;
use std::rc::Rc;

pub use log;

pub mod builder;
pub mod entity;
pub mod id;
pub mod test_helpers;
pub mod tracker;

pub use id::{Id, NO_ID, ROOT};
pub use tracker::{Track, Tracker};

/// Destination for the textual form of track events.
pub type Writer = Box<dyn std::io::Write>;
type SharedWriter = Rc<RefCell<Writer>>;

// All trace events share the same shape: check the entity is enabled at
// Trace level, then forward to the tracker.
#[doc(hidden)]
#[macro_export]
macro_rules! trace_on {
    ($entity:expr => $method:ident($($args:expr),* $(,)?)) => {
        if $entity.tracker.enabled($entity.id, $crate::log::Level::Trace) {
            $entity.tracker.$method($($args),*);
        }
    };
}

/// Trace an object arriving at an entity.
#[macro_export]
macro_rules! enter {
    ($entity:expr ; $object:expr) => {
        $crate::trace_on!($entity => enter($entity.id, $object));
    };
}

/// Trace an object leaving an entity.
#[macro_export]
macro_rules! exit {
    ($entity:expr ; $object:expr) => {
        $crate::trace_on!($entity => exit($entity.id, $object));
    };
}

/// Allocate a fresh [`Id`] from an entity's tracker.
///
/// Use this for objects whose creation will then be traced with [`create`].
#[macro_export]
macro_rules! create_id {
    ($entity:expr) => {{ $entity.tracker.unique_id() }};
}

/// Trace the creation of an entity, or of an object owned by one.
#[macro_export]
macro_rules! create {
    ($entity:expr) => {
        $crate::trace_on!($entity => create(
            match &$entity.parent {
                Some(parent) => parent.id,
                None => $crate::NO_ID,
            },
            $entity.id,
            0,
            $entity.full_name().as_str(),
        ));
    };
    ($entity:expr ; $object:expr, $num_bytes:expr) => {
        $crate::trace_on!($entity => create(
            $entity.id,
            $object.id,
            $num_bytes,
            format!("{}", $object).as_str(),
        ));
    };
}

/// Trace the destruction of an entity.
#[macro_export]
macro_rules! destroy {
    ($entity:expr) => {
        $crate::trace_on!($entity => destroy(
            $entity.id,
            match &$entity.parent {
                Some(parent) => parent.id,
                None => $crate::NO_ID,
            },
        ));
    };
}

/// Trace a connection from one entity to another.
#[macro_export]
macro_rules! connect {
    ($from:expr ; $to:expr) => {
        $crate::trace_on!($from => connect($from.id, $to.id));
    };
}

/// Trace simulated time moving forward.
#[macro_export]
macro_rules! set_time {
    ($entity:expr ; $time_ns:expr) => {
        $crate::trace_on!($entity => time($entity.id, $time_ns));
    };
}

/// Log a message at an explicit level. Prefer the per-level wrappers.
#[macro_export]
macro_rules! log_at {
    ($entity:expr ; $level:expr, $($arg:tt)+) => {
        if $entity.tracker.enabled($entity.id, $level) {
            $entity.tracker.log($entity.id, $level, format_args!($($arg)+));
        }
    };
}

/// Log a message at `Trace` level.
#[macro_export]
macro_rules! trace {
    ($entity:expr ; $($arg:tt)+) => {
        $crate::log_at!($entity ; $crate::log::Level::Trace, $($arg)+);
    };
}

/// Log a message at `Debug` level.
#[macro_export]
macro_rules! debug {
    ($entity:expr ; $($arg:tt)+) => {
        $crate::log_at!($entity ; $crate::log::Level::Debug, $($arg)+);
    };
}

/// Log a message at `Info` level.
#[macro_export]
macro_rules! info {
    ($entity:expr ; $($arg:tt)+) => {
        $crate::log_at!($entity ; $crate::log::Level::Info, $($arg)+);
    };
}

/// Log a message at `Warn` level.
#[macro_export]
macro_rules! warn {
    ($entity:expr ; $($arg:tt)+) => {
        $crate::log_at!($entity ; $crate::log::Level::Warn, $($arg)+);
    };
}

/// Log a message at `Error` level.
#[macro_export]
macro_rules! error {
    ($entity:expr ; $($arg:tt)+) => {
        $crate::log_at!($entity ; $crate::log::Level::Error, $($arg)+);
    };
}
