// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Routing from one input to a number of outputs.
//!
//! The [Router] asks its [`Route`] algorithm for an egress index for every
//! value arriving on `rx` and forwards the value there.
//!
//! # Ports
//!
//!  - One [input port](spur_engine::port::InPort): `rx`
//!  - N [output ports](spur_engine::port::OutPort): `tx[i]` for `i in [0, N-1]`

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use spur_engine::engine::Engine;
use spur_engine::port::{ChannelResult, InPort, OutPort};
use spur_engine::sim_error;
use spur_engine::traits::{Routable, Runnable, SimObject};
use spur_engine::types::{SimError, SimResult};
use spur_model_builder::EntityDisplay;
use spur_track::entity::Entity;
use spur_track::id::Unique;
use spur_track::{enter, exit, trace};

use crate::{port_rx, take_option};

/// A routing algorithm.
pub trait Route<T>
where
    T: Routable,
{
    /// The index of the egress port the given object should leave by.
    fn route(&self, object: &T) -> Result<usize, SimError>;
}

/// Routes each object to the egress index equal to its destination.
pub struct DestinationIndex {}

impl<T> Route<T> for DestinationIndex
where
    T: Routable,
{
    fn route(&self, object: &T) -> Result<usize, SimError> {
        Ok(object.destination() as usize)
    }
}

#[derive(EntityDisplay)]
pub struct Router<T>
where
    T: SimObject + Routable,
{
    pub entity: Rc<Entity>,
    rx: RefCell<Option<InPort<T>>>,
    tx: RefCell<Vec<OutPort<T>>>,
    algorithm: Box<dyn Route<T>>,
}

impl<T> Router<T>
where
    T: SimObject + Routable,
{
    pub fn new_and_register(
        engine: &Engine,
        parent: &Rc<Entity>,
        name: &str,
        num_egress: usize,
        algorithm: Box<dyn Route<T>>,
    ) -> Result<Rc<Self>, SimError> {
        let entity = Rc::new(Entity::new(parent, name));
        let rx = InPort::new(&entity, "rx");
        let tx = (0..num_egress)
            .map(|i| OutPort::new(&entity, &format!("tx_{i}")))
            .collect();
        let rc_self = Rc::new(Self {
            entity,
            rx: RefCell::new(Some(rx)),
            tx: RefCell::new(tx),
            algorithm,
        });
        engine.register(rc_self.clone());
        Ok(rc_self)
    }

    pub fn connect_port_tx_i(&self, i: usize, channel: ChannelResult<T>) -> SimResult {
        match self.tx.borrow_mut().get_mut(i) {
            Some(tx) => tx.connect(channel),
            None => sim_error!(format!("{self}: no tx port {i}")),
        }
    }

    pub fn port_rx(&self) -> ChannelResult<T> {
        port_rx!(self.rx, channel)
    }
}

#[async_trait(?Send)]
impl<T> Runnable for Router<T>
where
    T: SimObject + Routable,
{
    async fn run(&self) -> SimResult {
        let tx: Vec<OutPort<T>> = self.tx.borrow_mut().drain(..).collect();
        let rx = take_option!(self.rx);

        loop {
            let value = rx.get()?.await;
            enter!(self.entity ; value.id());

            let index = self.algorithm.route(&value)?;
            trace!(self.entity ; "Route {} to {}", value, index);

            let Some(tx) = tx.get(index) else {
                return sim_error!(format!("{self}: {value:?} routed to missing egress {index}"));
            };

            exit!(self.entity ; value.id());
            tx.put(value)?.await;
        }
    }
}
