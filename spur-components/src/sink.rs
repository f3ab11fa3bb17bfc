// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! A data sink.
//!
//! The [Sink] accepts any value presented at its `rx` [InPort] and counts
//! it. The standard way to terminate a pipeline of components.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;
use spur_engine::engine::Engine;
use spur_engine::port::{ChannelResult, InPort};
use spur_engine::traits::{Runnable, SimObject};
use spur_engine::types::{SimError, SimResult};
use spur_model_builder::EntityDisplay;
use spur_track::enter;
use spur_track::entity::Entity;
use spur_track::id::Unique;

use crate::{port_rx, take_option};

#[derive(EntityDisplay)]
pub struct Sink<T>
where
    T: SimObject,
{
    pub entity: Rc<Entity>,
    sunk: Cell<usize>,
    rx: RefCell<Option<InPort<T>>>,
}

impl<T> Sink<T>
where
    T: SimObject,
{
    pub fn new_and_register(
        engine: &Engine,
        parent: &Rc<Entity>,
        name: &str,
    ) -> Result<Rc<Self>, SimError> {
        let entity = Rc::new(Entity::new(parent, name));
        let rx = InPort::new(&entity, "rx");
        let rc_self = Rc::new(Self {
            entity,
            sunk: Cell::new(0),
            rx: RefCell::new(Some(rx)),
        });
        engine.register(rc_self.clone());
        Ok(rc_self)
    }

    pub fn port_rx(&self) -> ChannelResult<T> {
        port_rx!(self.rx, channel)
    }

    /// The number of values this sink has accepted.
    #[must_use]
    pub fn num_sunk(&self) -> usize {
        self.sunk.get()
    }
}

#[async_trait(?Send)]
impl<T> Runnable for Sink<T>
where
    T: SimObject,
{
    async fn run(&self) -> SimResult {
        let rx = take_option!(self.rx);
        loop {
            let value = rx.get()?.await;
            enter!(self.entity ; value.id());
            self.sunk.set(self.sunk.get() + 1);
        }
    }
}
