// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! A traffic-generating network endpoint.
//!
//! An [Endpoint] plays both the client and the server role: it streams
//! packets addressed to its peer out of its `tx` port and counts every packet
//! arriving on its `rx` port. An endpoint without a peer is a pure receiver.
//!
//! # Ports
//!
//! This component has two ports:
//!  - One [input port](spur_engine::port::InPort): `rx`,
//!  - One [output port](spur_engine::port::OutPort): `tx`,

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;
use spur_components::{connect_tx, port_rx, take_option};
use spur_engine::engine::Engine;
use spur_engine::executor::Spawner;
use spur_engine::port::{ChannelResult, InPort, OutPort};
use spur_engine::traits::{Runnable, TotalBytes};
use spur_engine::types::{SimError, SimResult};
use spur_model_builder::EntityDisplay;
use spur_track::entity::Entity;
use spur_track::id::Unique;
use spur_track::{enter, exit};

use crate::packet::Packet;

/// Per-packet protocol overhead modelled on an Ethernet frame: preamble,
/// header, FCS and inter-packet gap.
pub const OVERHEAD_BYTES: usize = 42;

/// Counters shared between the endpoint and its receive task.
struct EndpointState {
    entity: Rc<Entity>,
    sent: Cell<usize>,
    sent_bytes: Cell<usize>,
    received: Cell<usize>,
    received_bytes: Cell<usize>,
}

#[derive(EntityDisplay)]
pub struct Endpoint {
    pub entity: Rc<Entity>,
    spawner: Spawner,
    state: Rc<EndpointState>,

    address: u64,
    peer: Cell<Option<u64>>,
    payload_size_bytes: Cell<usize>,
    num_to_send: Cell<Option<usize>>,

    tx: RefCell<Option<OutPort<Packet>>>,
    rx: RefCell<Option<InPort<Packet>>>,
}

impl Endpoint {
    pub fn new_and_register(
        engine: &Engine,
        parent: &Rc<Entity>,
        name: &str,
        address: u64,
        payload_size_bytes: usize,
    ) -> Result<Rc<Self>, SimError> {
        let spawner = engine.spawner();
        let entity = Rc::new(Entity::new(parent, name));
        let tx = OutPort::new(&entity, "tx");
        let rx = InPort::new(&entity, "rx");
        let state = Rc::new(EndpointState {
            entity: entity.clone(),
            sent: Cell::new(0),
            sent_bytes: Cell::new(0),
            received: Cell::new(0),
            received_bytes: Cell::new(0),
        });
        let rc_self = Rc::new(Self {
            entity,
            spawner,
            state,
            address,
            peer: Cell::new(None),
            payload_size_bytes: Cell::new(payload_size_bytes),
            num_to_send: Cell::new(None),
            tx: RefCell::new(Some(tx)),
            rx: RefCell::new(Some(rx)),
        });
        engine.register(rc_self.clone());
        Ok(rc_self)
    }

    #[must_use]
    pub fn address(&self) -> u64 {
        self.address
    }

    /// Set the destination address packets from this endpoint are sent to.
    pub fn set_peer(&self, peer: u64) {
        self.peer.set(Some(peer));
    }

    /// Limit the number of packets sent. `None` streams until the simulation
    /// is stopped.
    pub fn set_num_to_send(&self, num_to_send: Option<usize>) {
        self.num_to_send.set(num_to_send);
    }

    pub fn set_payload_size_bytes(&self, payload_size_bytes: usize) {
        self.payload_size_bytes.set(payload_size_bytes);
    }

    #[must_use]
    pub fn num_sent(&self) -> usize {
        self.state.sent.get()
    }

    #[must_use]
    pub fn bytes_sent(&self) -> usize {
        self.state.sent_bytes.get()
    }

    #[must_use]
    pub fn num_received(&self) -> usize {
        self.state.received.get()
    }

    #[must_use]
    pub fn bytes_received(&self) -> usize {
        self.state.received_bytes.get()
    }

    pub fn connect_port_tx(&self, channel: ChannelResult<Packet>) -> SimResult {
        connect_tx!(self.tx, connect ; channel)
    }

    pub fn port_rx(&self) -> ChannelResult<Packet> {
        port_rx!(self.rx, channel)
    }
}

#[async_trait(?Send)]
impl Runnable for Endpoint {
    async fn run(&self) -> SimResult {
        let rx = take_option!(self.rx);
        let state = self.state.clone();
        self.spawner.spawn(async move { run_rx(rx, state).await });

        let Some(peer) = self.peer.get() else {
            return Ok(());
        };
        let tx = take_option!(self.tx);
        let payload_size_bytes = self.payload_size_bytes.get();
        let num_to_send = self.num_to_send.get();

        let mut sent = 0;
        while num_to_send.is_none_or(|limit| sent < limit) {
            let packet = Packet::new(&self.entity, OVERHEAD_BYTES, payload_size_bytes)
                .set_label(self.address)
                .set_dest(peer);
            let num_bytes = packet.total_bytes();
            exit!(self.entity ; packet.id());
            tx.put(packet)?.await;
            sent += 1;
            self.state.sent.set(sent);
            self.state.sent_bytes.set(self.state.sent_bytes.get() + num_bytes);
        }
        Ok(())
    }
}

async fn run_rx(rx: InPort<Packet>, state: Rc<EndpointState>) -> SimResult {
    loop {
        let packet = rx.get()?.await;
        enter!(state.entity ; packet.id());
        state.received.set(state.received.get() + 1);
        state
            .received_bytes
            .set(state.received_bytes.get() + packet.total_bytes());
    }
}
