// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! A bounded FIFO store.
//!
//! The [Store] holds up to `capacity` objects between its two ports:
//!   - `rx` [InPort]: puts data into the store.
//!   - `tx` [OutPort]: takes data out of the store.
//!
//! A full store asserts back-pressure on its input. With
//! [Store::set_error_on_overflow] it fails the simulation instead.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use async_trait::async_trait;
use spur_engine::engine::Engine;
use spur_engine::events::Repeated;
use spur_engine::executor::Spawner;
use spur_engine::port::{ChannelResult, InPort, OutPort};
use spur_engine::sim_error;
use spur_engine::traits::{Event, Runnable, SimObject};
use spur_engine::types::{SimError, SimResult};
use spur_model_builder::EntityDisplay;
use spur_track::entity::Entity;
use spur_track::id::Unique;
use spur_track::{enter, exit};

use crate::{connect_tx, port_rx, take_option};

/// The queue shared by the two halves of a [`Store`].
struct Buffer<T>
where
    T: SimObject,
{
    entity: Rc<Entity>,
    capacity: usize,
    items: RefCell<VecDeque<T>>,
    error_on_overflow: Cell<bool>,

    /// Notified with the new fill level on every push and pop.
    level_change: Repeated<usize>,
}

impl<T> Buffer<T>
where
    T: SimObject,
{
    fn new(entity: &Rc<Entity>, capacity: usize) -> Self {
        Self {
            entity: entity.clone(),
            capacity,
            items: RefCell::new(VecDeque::with_capacity(capacity)),
            error_on_overflow: Cell::new(false),
            level_change: Repeated::new(0),
        }
    }

    fn level(&self) -> usize {
        self.items.borrow().len()
    }

    fn push(&self, value: T) -> SimResult {
        enter!(self.entity ; value.id());
        if self.level() >= self.capacity {
            return sim_error!(format!("{} overflowed", self.entity));
        }

        self.items.borrow_mut().push_back(value);
        self.level_change.notify_result(self.level());
        Ok(())
    }

    /// Remove the oldest object. The buffer must not be empty.
    fn pop(&self) -> Result<T, SimError> {
        let Some(value) = self.items.borrow_mut().pop_front() else {
            return sim_error!(format!("{} popped while empty", self.entity));
        };
        self.level_change.notify_result(self.level());
        exit!(self.entity ; value.id());
        Ok(value)
    }
}

/// A component that holds a configurable number of objects in flight.
#[derive(EntityDisplay)]
pub struct Store<T>
where
    T: SimObject,
{
    pub entity: Rc<Entity>,
    spawner: Spawner,
    buffer: Rc<Buffer<T>>,

    tx: RefCell<Option<OutPort<T>>>,
    rx: RefCell<Option<InPort<T>>>,
}

impl<T> Store<T>
where
    T: SimObject,
{
    pub fn new_and_register(
        engine: &Engine,
        parent: &Rc<Entity>,
        name: &str,
        capacity: usize,
    ) -> Result<Rc<Self>, SimError> {
        if capacity == 0 {
            return sim_error!(format!("Store {name} needs a capacity of at least 1"));
        }
        let spawner = engine.spawner();
        let entity = Rc::new(Entity::new(parent, name));
        let buffer = Rc::new(Buffer::new(&entity, capacity));
        let tx = OutPort::new(&entity, "tx");
        let rx = InPort::new(&entity, "rx");
        let rc_self = Rc::new(Self {
            entity,
            spawner,
            buffer,
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

    /// The number of objects currently held.
    #[must_use]
    pub fn fill_level(&self) -> usize {
        self.buffer.level()
    }

    /// Fail the simulation on overflow instead of blocking the input.
    pub fn set_error_on_overflow(&self) {
        self.buffer.error_on_overflow.set(true);
    }
}

#[async_trait(?Send)]
impl<T> Runnable for Store<T>
where
    T: SimObject,
{
    async fn run(&self) -> SimResult {
        let rx = take_option!(self.rx);
        let buffer = self.buffer.clone();
        self.spawner.spawn(async move { run_rx(rx, buffer).await });

        let tx = take_option!(self.tx);
        let buffer = self.buffer.clone();
        self.spawner.spawn(async move { run_tx(tx, buffer).await });
        Ok(())
    }
}

async fn run_rx<T>(rx: InPort<T>, buffer: Rc<Buffer<T>>) -> SimResult
where
    T: SimObject,
{
    let level_change = buffer.level_change.clone();
    let error_on_overflow = buffer.error_on_overflow.get();
    loop {
        if buffer.level() < buffer.capacity || error_on_overflow {
            let value = rx.get()?.await;
            buffer.push(value)?;
        } else {
            level_change.listen().await;
        }
    }
}

async fn run_tx<T>(tx: OutPort<T>, buffer: Rc<Buffer<T>>) -> SimResult
where
    T: SimObject,
{
    let level_change = buffer.level_change.clone();
    loop {
        if buffer.level() > 0 {
            // Hold the value until something downstream actually wants it.
            tx.try_put()?.await;
            let value = buffer.pop()?;
            tx.put(value)?.await;
        } else {
            level_change.listen().await;
        }
    }
}
