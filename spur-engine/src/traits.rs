// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Traits shared across the engine and the component libraries.

use std::fmt::{Debug, Display};
use std::future::Future;
use std::mem::size_of;
use std::pin::Pin;

use async_trait::async_trait;
use spur_track::id::Unique;

use crate::types::{Eventable, SimResult};

/// A boxed future, as returned by [`Event::listen`].
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T>>>;

/// How many bytes an object stands for on a wire.
///
/// Rate limiting and link serialization use this to turn an object into a
/// length of time.
pub trait TotalBytes {
    fn total_bytes(&self) -> usize;
}

/// An object that knows where it is going.
pub trait Routable {
    fn destination(&self) -> u64;
}

/// Everything an object must support to be passed through ports.
///
/// `Clone` rather than `Copy` so objects can own heap data such as a
/// payload `Vec`; `'static` because the futures holding the object in
/// flight require it.
pub trait SimObject: Clone + Debug + Display + Routable + Unique + TotalBytes + 'static {}

// Primitive types usable as payloads in tests.
macro_rules! primitive_sim_object {
    ($ty:ty) => {
        impl TotalBytes for $ty {
            fn total_bytes(&self) -> usize {
                size_of::<$ty>()
            }
        }

        impl Routable for $ty {
            fn destination(&self) -> u64 {
                *self as u64
            }
        }

        impl SimObject for $ty {}
    };
}

primitive_sim_object!(i32);
primitive_sim_object!(usize);

/// Work a component does once the simulation starts.
///
/// The [`Engine`](crate::engine::Engine) spawns the `run()` of every
/// registered component.
#[async_trait(?Send)]
pub trait Runnable {
    async fn run(&self) -> SimResult {
        Ok(())
    }
}

/// Something that can be listened to from `async` code.
pub trait Event {
    type EventResult;

    #[must_use = "Futures do nothing unless you `.await` or otherwise use them"]
    fn listen(&self) -> BoxFuture<Self::EventResult>;

    /// Clone into a box, so collections of events stay cloneable.
    fn clone_dyn(&self) -> Eventable<Self::EventResult>;
}

impl<T> Clone for Eventable<T> {
    fn clone(&self) -> Self {
        self.clone_dyn()
    }
}
