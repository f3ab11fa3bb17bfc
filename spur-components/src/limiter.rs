// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Bandwidth limiting.
//!
//! A [`RateLimiter`] turns an object's size into a number of ticks at a
//! given rate in bits per tick. A [`Limiter`] is the component built around
//! one: values pass through it no faster than the rate allows, asserting
//! back-pressure upstream while each one drains.
//!
//! `RateLimiter`s are shared immutably, so components with the same
//! bandwidth can hold the same `Rc<RateLimiter>`. The
//! [`rc_limiter!`](crate::rc_limiter) macro builds one in that form.
//!
//! # Ports
//!
//! The [`Limiter`] component has two ports:
//!  - One [input port](spur_engine::port::InPort): `rx`
//!  - One [output port](spur_engine::port::OutPort): `tx`

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use async_trait::async_trait;
use spur_engine::engine::Engine;
use spur_engine::port::{ChannelResult, InPort, OutPort};
use spur_engine::time::Clock;
use spur_engine::traits::{Runnable, SimObject, TotalBytes};
use spur_engine::types::{SimError, SimResult};
use spur_model_builder::EntityDisplay;
use spur_track::entity::Entity;
use spur_track::id::Unique;
use spur_track::{enter, exit};

use crate::{connect_tx, port_rx, take_option};

/// Create a [RateLimiter] wrapped in an [Rc](std::rc::Rc).
#[macro_export]
macro_rules! rc_limiter {
    ($clock:expr, $bits_per_tick:expr) => {
        std::rc::Rc::new($crate::limiter::RateLimiter::new($clock, $bits_per_tick))
    };
}

/// Converts object sizes into delays on a clock.
#[derive(Clone)]
pub struct RateLimiter<T>
where
    T: TotalBytes,
{
    clock: Clock,

    /// Bits that can pass per tick of `clock`.
    bits_per_tick: usize,

    phantom: PhantomData<T>,
}

impl<T> RateLimiter<T>
where
    T: TotalBytes,
{
    pub fn new(clock: &Clock, bits_per_tick: usize) -> Self {
        Self {
            clock: clock.clone(),
            bits_per_tick,
            phantom: PhantomData,
        }
    }

    pub async fn delay_ticks(&self, ticks: usize) {
        self.clock.wait_ticks(ticks as u64).await;
    }

    /// The number of ticks `value` takes to pass at this rate.
    pub fn ticks(&self, value: &T) -> usize {
        self.ticks_from_bits(value.total_bytes() * 8)
    }

    pub fn ticks_from_bits(&self, bits: usize) -> usize {
        bits.div_ceil(self.bits_per_tick)
    }
}

/// A component that lets values through at its [`RateLimiter`]'s rate.
#[derive(EntityDisplay)]
pub struct Limiter<T>
where
    T: SimObject,
{
    pub entity: Rc<Entity>,
    limiter: Rc<RateLimiter<T>>,
    tx: RefCell<Option<OutPort<T>>>,
    rx: RefCell<Option<InPort<T>>>,
}

impl<T> Limiter<T>
where
    T: SimObject,
{
    pub fn new_and_register(
        engine: &Engine,
        parent: &Rc<Entity>,
        name: &str,
        limiter: Rc<RateLimiter<T>>,
    ) -> Result<Rc<Self>, SimError> {
        let entity = Rc::new(Entity::new(parent, name));
        let tx = OutPort::new(&entity, "tx");
        let rx = InPort::new(&entity, "rx");
        let rc_self = Rc::new(Self {
            entity,
            limiter,
            tx: RefCell::new(Some(tx)),
            rx: RefCell::new(Some(rx)),
        });
        engine.register(rc_self.clone());
        Ok(rc_self)
    }

    pub fn connect_port_tx(&self, channel: ChannelResult<T>) -> SimResult {
        connect_tx!(self.tx, connect ; channel)
    }

    pub fn port_rx(&self) -> ChannelResult<T> {
        port_rx!(self.rx, channel)
    }
}

#[async_trait(?Send)]
impl<T> Runnable for Limiter<T>
where
    T: SimObject,
{
    async fn run(&self) -> SimResult {
        let rx = take_option!(self.rx);
        let tx = take_option!(self.tx);
        let limiter = &self.limiter;
        loop {
            // Take the value while holding the sender blocked, so upstream
            // feels the drain time.
            let value = rx.start_get()?.await;

            let value_id = value.id();
            let ticks = limiter.ticks(&value);
            enter!(self.entity ; value_id);

            tx.put(value)?.await;
            limiter.delay_ticks(ticks).await;
            exit!(self.entity ; value_id);

            rx.finish_get();
        }
    }
}
