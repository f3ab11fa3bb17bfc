// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! A two-tier leaf-spine fabric.
//!
//! [LeafSpineFabric::build] creates two pools of [SwitchNode]s and joins them
//! into a complete bipartite graph: every leaf is linked to every spine by a
//! dedicated [PointToPointLink], giving `num_leaves * num_spines` links in
//! total. The spine tier has no links of its own to other spines, and leaves
//! are never linked to each other.
//!
//! Endpoints are attached afterwards with [LeafSpineFabric::attach]: the
//! client lands on the first leaf and the server on the last one, each behind
//! its own access link. Attachment must happen before the simulation runs so
//! that every switch port ends up connected.
//!
//! Routing is destination based. Each endpoint address is registered in a
//! fabric-wide table mapping it to its leaf and host port. A leaf forwards
//! local destinations straight to the host port and spreads remote ones over
//! its uplinks; a spine forwards to the destination's leaf.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use spur_components::connect_port;
use spur_components::router::Route;
use spur_engine::engine::Engine;
use spur_engine::sim_error;
use spur_engine::time::Clock;
use spur_engine::traits::Routable;
use spur_engine::types::SimError;
use spur_model_builder::{EntityDisplay, Runnable};
use spur_track::entity::Entity;
use spur_track::warn;

use crate::endpoint::Endpoint;
use crate::error::BuildError;
use crate::link::{LinkProfile, PointToPointLink};
use crate::packet::Packet;
use crate::switch::SwitchNode;

/// The dimensions of a fabric.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LeafSpineConfig {
    pub num_leaves: usize,
    pub num_spines: usize,
}

/// One leaf-to-spine link and its position in the fabric.
pub struct FabricLink {
    pub leaf: usize,
    pub spine: usize,
    pub link: Rc<PointToPointLink<Packet>>,
}

/// Where [LeafSpineFabric::attach] placed the two endpoints, and the access
/// links it built for them.
pub struct Attachment {
    pub client_leaf: usize,
    pub server_leaf: usize,
    pub client_link: Rc<PointToPointLink<Packet>>,
    pub server_link: Rc<PointToPointLink<Packet>>,
}

/// Maps an endpoint address to `(leaf index, host port on that leaf)`.
type RouteTable = Rc<RefCell<HashMap<u64, (usize, usize)>>>;

/// Routing algorithm for a leaf ingress port.
struct LeafRoute {
    leaf_index: usize,
    num_spines: usize,
    table: RouteTable,
}

impl Route<Packet> for LeafRoute {
    fn route(&self, value: &Packet) -> Result<usize, SimError> {
        let dest = value.destination();
        let entry = self.table.borrow().get(&dest).copied();
        let Some((dest_leaf, host_port)) = entry else {
            return sim_error!(format!("no route to destination 0x{dest:x}"));
        };
        if dest_leaf == self.leaf_index {
            Ok(host_port)
        } else if self.num_spines == 0 {
            sim_error!(format!(
                "destination 0x{dest:x} is on leaf {dest_leaf} but leaf {} has no uplinks",
                self.leaf_index
            ))
        } else {
            Ok((dest % self.num_spines as u64) as usize)
        }
    }
}

/// Routing algorithm for a spine ingress port.
struct SpineRoute {
    table: RouteTable,
}

impl Route<Packet> for SpineRoute {
    fn route(&self, value: &Packet) -> Result<usize, SimError> {
        let dest = value.destination();
        let entry = self.table.borrow().get(&dest).copied();
        match entry {
            Some((dest_leaf, _)) => Ok(dest_leaf),
            None => sim_error!(format!("no route to destination 0x{dest:x}")),
        }
    }
}

#[derive(EntityDisplay, Runnable)]
pub struct LeafSpineFabric {
    pub entity: Rc<Entity>,
    config: LeafSpineConfig,
    profile: LinkProfile,

    leaves: Vec<Rc<SwitchNode<Packet>>>,
    spines: Vec<Rc<SwitchNode<Packet>>>,
    links: Vec<FabricLink>,
    table: RouteTable,
}

impl LeafSpineFabric {
    /// Build the fabric: `num_leaves + num_spines` switches and one
    /// bidirectional link per leaf-spine pair.
    ///
    /// Leaf ports `0..num_spines` are uplinks. Host ports for [attach] are
    /// pre-allocated after the uplinks, but only on the first and last leaf:
    /// an unconnected switch port fails the simulation, so no spare ports are
    /// created anywhere an endpoint will not land.
    ///
    /// [attach]: LeafSpineFabric::attach
    pub fn build(
        engine: &Engine,
        clock: &Clock,
        parent: &Rc<Entity>,
        name: &str,
        config: LeafSpineConfig,
        profile: &LinkProfile,
    ) -> Result<Rc<Self>, BuildError> {
        let entity = Rc::new(Entity::new(parent, name));
        let table: RouteTable = Rc::new(RefCell::new(HashMap::new()));

        let mut leaves = Vec::with_capacity(config.num_leaves);
        for i in 0..config.num_leaves {
            let num_ports = config.num_spines + Self::num_host_ports(&config, i);
            let table = table.clone();
            let leaf = SwitchNode::new_and_register(
                engine,
                &entity,
                &format!("leaf_{i}"),
                num_ports,
                |_| {
                    Box::new(LeafRoute {
                        leaf_index: i,
                        num_spines: config.num_spines,
                        table: table.clone(),
                    })
                },
            )?;
            leaves.push(leaf);
        }

        let mut spines = Vec::with_capacity(config.num_spines);
        for j in 0..config.num_spines {
            let table = table.clone();
            let spine = SwitchNode::new_and_register(
                engine,
                &entity,
                &format!("spine_{j}"),
                config.num_leaves,
                |_| Box::new(SpineRoute { table: table.clone() }),
            )?;
            spines.push(spine);
        }

        let mut links = Vec::with_capacity(config.num_leaves * config.num_spines);
        for (i, leaf) in leaves.iter().enumerate() {
            for (j, spine) in spines.iter().enumerate() {
                let link = PointToPointLink::new_and_register(
                    engine,
                    clock,
                    &entity,
                    &format!("link_l{i}_s{j}"),
                    profile,
                )?;
                connect_port!(leaf, tx, j => link, rx_a)?;
                connect_port!(link, tx_a => spine, rx, i)?;
                connect_port!(spine, tx, i => link, rx_b)?;
                connect_port!(link, tx_b => leaf, rx, j)?;
                links.push(FabricLink {
                    leaf: i,
                    spine: j,
                    link,
                });
            }
        }

        let rc_self = Rc::new(Self {
            entity,
            config,
            profile: profile.clone(),
            leaves,
            spines,
            links,
            table,
        });
        engine.register(rc_self.clone());
        Ok(rc_self)
    }

    /// Host ports pre-allocated on leaf `i`.
    fn num_host_ports(config: &LeafSpineConfig, i: usize) -> usize {
        if config.num_leaves == 1 {
            // Client and server share the only leaf.
            if i == 0 { 2 } else { 0 }
        } else if i == 0 || i == config.num_leaves - 1 {
            1
        } else {
            0
        }
    }

    /// Attach a client and a server endpoint to the fabric.
    ///
    /// The client lands on the first leaf, the server on the last one, each
    /// behind a dedicated access link built from `access_profile`. Both
    /// endpoint addresses are registered in the routing table, and both access
    /// links are handed back in the [Attachment].
    pub fn attach(
        &self,
        engine: &Engine,
        clock: &Clock,
        client: &Rc<Endpoint>,
        server: &Rc<Endpoint>,
        access_profile: &LinkProfile,
    ) -> Result<Attachment, BuildError> {
        if self.config.num_leaves == 0 {
            return Err(BuildError::LeafIndex {
                index: 0,
                num_leaves: 0,
            });
        }
        let client_leaf = 0;
        let server_leaf = self.config.num_leaves - 1;
        if client_leaf == server_leaf {
            warn!(self.entity ; "client and server share leaf 0; traffic will not traverse the spine");
        }

        let client_port = self.config.num_spines;
        let server_port = if client_leaf == server_leaf {
            self.config.num_spines + 1
        } else {
            self.config.num_spines
        };

        let client_link =
            self.attach_endpoint(engine, clock, client, "access_client", client_leaf, client_port, access_profile)?;
        let server_link =
            self.attach_endpoint(engine, clock, server, "access_server", server_leaf, server_port, access_profile)?;

        Ok(Attachment {
            client_leaf,
            server_leaf,
            client_link,
            server_link,
        })
    }

    fn attach_endpoint(
        &self,
        engine: &Engine,
        clock: &Clock,
        endpoint: &Rc<Endpoint>,
        link_name: &str,
        leaf_index: usize,
        host_port: usize,
        access_profile: &LinkProfile,
    ) -> Result<Rc<PointToPointLink<Packet>>, BuildError> {
        let link =
            PointToPointLink::new_and_register(engine, clock, &self.entity, link_name, access_profile)?;
        let leaf = &self.leaves[leaf_index];
        connect_port!(endpoint, tx => link, rx_a)?;
        connect_port!(link, tx_a => leaf, rx, host_port)?;
        connect_port!(leaf, tx, host_port => link, rx_b)?;
        connect_port!(link, tx_b => endpoint, rx)?;

        self.table
            .borrow_mut()
            .insert(endpoint.address(), (leaf_index, host_port));
        Ok(link)
    }

    #[must_use]
    pub fn num_leaves(&self) -> usize {
        self.config.num_leaves
    }

    #[must_use]
    pub fn num_spines(&self) -> usize {
        self.config.num_spines
    }

    #[must_use]
    pub fn profile(&self) -> &LinkProfile {
        &self.profile
    }

    #[must_use]
    pub fn links(&self) -> &[FabricLink] {
        &self.links
    }
}
