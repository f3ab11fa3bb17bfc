// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! A store-and-forward switch node.
//!
//! A [SwitchNode] with `P` ports is built from `P` ingress [Router]s and `P`
//! egress [Arbiter]s wired as a full crossbar: any ingress can reach any
//! egress and each egress arbitrates between all ingresses round-robin.
//!
//! The routing decision is delegated to a [Route] algorithm supplied per
//! ingress port, so the same node can serve as a leaf or a spine switch.
//!
//! # Ports
//!
//! This component has the following ports:
//!  - P [input ports](spur_engine::port::InPort): `rx[i]` for `i in [0, P-1]`
//!  - P [output ports](spur_engine::port::OutPort): `tx[i]` for `i in [0, P-1]`

use std::rc::Rc;

use async_trait::async_trait;
use spur_components::arbiter::{Arbiter, RoundRobinPolicy};
use spur_components::connect_port;
use spur_components::router::{Route, Router};
use spur_engine::engine::Engine;
use spur_engine::port::ChannelResult;
use spur_engine::traits::{Routable, SimObject};
use spur_engine::types::{SimError, SimResult};
use spur_model_builder::{EntityDisplay, Runnable};
use spur_track::entity::Entity;

#[derive(EntityDisplay, Runnable)]
pub struct SwitchNode<T>
where
    T: SimObject + Routable,
{
    pub entity: Rc<Entity>,

    routers: Vec<Rc<Router<T>>>,
    arbiters: Vec<Rc<Arbiter<T>>>,
}

impl<T> SwitchNode<T>
where
    T: SimObject + Routable,
{
    /// Build a `num_ports` switch.
    ///
    /// `mk_route` is called once per ingress port to create the routing
    /// algorithm used by that port's router.
    pub fn new_and_register<F>(
        engine: &Engine,
        parent: &Rc<Entity>,
        name: &str,
        num_ports: usize,
        mut mk_route: F,
    ) -> Result<Rc<Self>, SimError>
    where
        F: FnMut(usize) -> Box<dyn Route<T>>,
    {
        let entity = Rc::new(Entity::new(parent, name));

        let mut routers = Vec::with_capacity(num_ports);
        let mut arbiters = Vec::with_capacity(num_ports);
        for i in 0..num_ports {
            routers.push(Router::new_and_register(
                engine,
                &entity,
                &format!("router_{i}"),
                num_ports,
                mk_route(i),
            )?);
            arbiters.push(Arbiter::new_and_register(
                engine,
                &entity,
                &format!("arb_{i}"),
                num_ports,
                Box::new(RoundRobinPolicy::new()),
            )?);
        }

        // Full crossbar: router egress j feeds arbiter j input i.
        for (i, router) in routers.iter().enumerate() {
            for (j, arbiter) in arbiters.iter().enumerate() {
                connect_port!(router, tx, j => arbiter, rx, i)?;
            }
        }

        let rc_self = Rc::new(Self {
            entity,
            routers,
            arbiters,
        });
        engine.register(rc_self.clone());
        Ok(rc_self)
    }

    #[must_use]
    pub fn num_ports(&self) -> usize {
        self.routers.len()
    }

    pub fn connect_port_tx_i(&self, i: usize, channel: ChannelResult<T>) -> SimResult {
        self.arbiters[i].connect_port_tx(channel)
    }

    pub fn port_rx_i(&self, i: usize) -> ChannelResult<T> {
        self.routers[i].port_rx()
    }
}
