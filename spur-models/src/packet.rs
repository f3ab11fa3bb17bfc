// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! A network packet with a configurable payload size.
//!
//! The overhead bytes model everything on the wire that is not payload, so
//! serialization time reflects the full frame.

use std::fmt;
use std::rc::Rc;

use spur_engine::traits::{Routable, SimObject, TotalBytes};
use spur_track::entity::Entity;
use spur_track::id::Unique;
use spur_track::{Id, create, create_id};

#[derive(Clone, Debug)]
pub struct Packet {
    id: Id,
    created_by: Rc<Entity>,

    /// Address of the endpoint this packet is for.
    dest: u64,

    /// Sender-chosen value carried for debugging, usually the sender's
    /// address.
    label: u64,

    payload_bytes: usize,
    overhead_bytes: usize,
}

impl Packet {
    #[must_use]
    pub fn new(created_by: &Rc<Entity>, overhead_bytes: usize, payload_bytes: usize) -> Self {
        let packet = Self {
            id: create_id!(created_by),
            created_by: created_by.clone(),
            dest: 0,
            label: 0,
            payload_bytes,
            overhead_bytes,
        };
        create!(created_by ; packet, packet.total_bytes());
        packet
    }

    #[must_use]
    pub fn set_label(mut self, label: u64) -> Self {
        self.label = label;
        self
    }

    #[must_use]
    pub fn set_dest(mut self, dest: u64) -> Self {
        self.dest = dest;
        self
    }
}

impl TotalBytes for Packet {
    fn total_bytes(&self) -> usize {
        self.overhead_bytes + self.payload_bytes
    }
}

impl Routable for Packet {
    fn destination(&self) -> u64 {
        self.dest
    }
}

impl Unique for Packet {
    fn id(&self) -> Id {
        self.id
    }
}

impl SimObject for Packet {}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "pkt 0x{:x}->0x{:x} {}B+{}B via {}",
            self.label,
            self.dest,
            self.payload_bytes,
            self.overhead_bytes,
            self.created_by
        )
    }
}
