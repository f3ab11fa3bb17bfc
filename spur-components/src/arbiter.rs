// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Arbitration between several inputs contending for one output.
//!
//! Each input task parks its latest value in a per-input slot; the arbiter
//! task repeatedly asks its [`Arbitrate`] policy to pick one of the filled
//! slots and forwards the winner. An input whose slot is still occupied
//! waits for the grant before accepting more data.
//!
//! # Ports
//!
//! This component has `N` inputs and one output:
//!  - N [input ports](spur_engine::port::InPort): `rx[i]` for `i in [0, N-1]`
//!  - One [output port](spur_engine::port::OutPort): `tx`

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use spur_engine::engine::Engine;
use spur_engine::events::Once;
use spur_engine::executor::Spawner;
use spur_engine::port::{ChannelResult, InPort, OutPort};
use spur_engine::sim_error;
use spur_engine::traits::{Event, Runnable, SimObject};
use spur_engine::types::{SimError, SimResult};
use spur_model_builder::EntityDisplay;
use spur_track::entity::Entity;
use spur_track::id::Unique;
use spur_track::{enter, exit, trace};

use crate::{connect_tx, take_option};

/// One value slot per input, plus the events that coordinate the input
/// tasks with the arbiter task.
struct Inbox<T> {
    slots: RefCell<Vec<Option<T>>>,

    /// Set while the arbiter sleeps with every slot empty.
    wake: RefCell<Option<Once<()>>>,

    /// Per-input gate an input waits on while its slot is occupied.
    release: Vec<RefCell<Option<Once<()>>>>,
}

impl<T> Inbox<T> {
    fn new(num_inputs: usize) -> Self {
        Self {
            slots: RefCell::new((0..num_inputs).map(|_| None).collect()),
            wake: RefCell::new(None),
            release: (0..num_inputs).map(|_| RefCell::new(None)).collect(),
        }
    }
}

/// An arbitration policy.
pub trait Arbitrate<T>
where
    T: SimObject,
{
    /// Pick one of the filled slots, taking the value out of it.
    fn arbitrate(&mut self, entity: &Rc<Entity>, inputs: &mut [Option<T>]) -> Option<(usize, T)>;
}

/// Grants inputs in cyclic order, starting after the previous winner.
pub struct RoundRobinPolicy {
    candidate: usize,
}

impl RoundRobinPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self { candidate: 0 }
    }
}

impl Default for RoundRobinPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arbitrate<T> for RoundRobinPolicy
where
    T: SimObject,
{
    fn arbitrate(&mut self, _entity: &Rc<Entity>, inputs: &mut [Option<T>]) -> Option<(usize, T)> {
        let n = inputs.len();
        let winner = (self.candidate..self.candidate + n)
            .map(|i| i % n)
            .find(|&i| inputs[i].is_some())?;
        self.candidate = (winner + 1) % n;
        let value = inputs[winner].take()?;
        Some((winner, value))
    }
}

#[derive(EntityDisplay)]
pub struct Arbiter<T>
where
    T: SimObject,
{
    pub entity: Rc<Entity>,
    rx: RefCell<Vec<Option<InPort<T>>>>,
    tx: RefCell<Option<OutPort<T>>>,
    policy: RefCell<Option<Box<dyn Arbitrate<T>>>>,
    inbox: Rc<Inbox<T>>,
    spawner: Spawner,
}

impl<T> Arbiter<T>
where
    T: SimObject,
{
    pub fn new_and_register(
        engine: &Engine,
        parent: &Rc<Entity>,
        name: &str,
        num_rx: usize,
        policy: Box<dyn Arbitrate<T>>,
    ) -> Result<Rc<Self>, SimError> {
        let entity = Rc::new(Entity::new(parent, name));
        let rx: Vec<_> = (0..num_rx)
            .map(|i| Some(InPort::new(&entity, &format!("rx{i}"))))
            .collect();
        let arbiter = Rc::new(Self {
            tx: RefCell::new(Some(OutPort::new(&entity, "tx"))),
            rx: RefCell::new(rx),
            policy: RefCell::new(Some(policy)),
            inbox: Rc::new(Inbox::new(num_rx)),
            spawner: engine.spawner(),
            entity,
        });
        engine.register(arbiter.clone());
        Ok(arbiter)
    }

    pub fn connect_port_tx(&self, channel: ChannelResult<T>) -> SimResult {
        connect_tx!(self.tx, connect ; channel)
    }

    pub fn port_rx_i(&self, i: usize) -> ChannelResult<T> {
        match self.rx.borrow().get(i) {
            Some(Some(rx)) => rx.channel(),
            _ => sim_error!(format!("{self}: no rx port {i}")),
        }
    }
}

#[async_trait(?Send)]
impl<T> Runnable for Arbiter<T>
where
    T: SimObject,
{
    async fn run(&self) -> SimResult {
        for (i, mut rx) in self.rx.borrow_mut().drain(..).enumerate() {
            let Some(rx) = rx.take() else {
                return sim_error!(format!("{self}: rx port {i} already taken"));
            };
            let entity = self.entity.clone();
            let inbox = self.inbox.clone();
            self.spawner
                .spawn(async move { run_input(entity, rx, i, inbox).await });
        }

        let tx = take_option!(self.tx);
        let mut policy = take_option!(self.policy);

        loop {
            let granted = {
                let mut slots = self.inbox.slots.borrow_mut();
                policy.arbitrate(&self.entity, &mut slots)
            };

            match granted {
                Some((index, value)) => {
                    trace!(self.entity ; "granted input {}: {}", index, value);
                    if let Some(gate) = self.inbox.release[index].borrow_mut().take() {
                        gate.notify()?;
                    }
                    exit!(self.entity ; value.id());
                    tx.put(value)?.await;
                }
                None => {
                    trace!(self.entity ; "all slots empty, waiting");
                    let wake = Once::default();
                    *self.inbox.wake.borrow_mut() = Some(wake.clone());
                    wake.listen().await;
                }
            }
        }
    }
}

async fn run_input<T: SimObject>(
    entity: Rc<Entity>,
    rx: InPort<T>,
    index: usize,
    inbox: Rc<Inbox<T>>,
) -> SimResult {
    loop {
        let value = rx.get()?.await;
        enter!(entity ; value.id());

        // A previous value from this input may still be waiting for its
        // grant; hold off until the slot clears.
        let occupied = inbox.slots.borrow()[index].is_some();
        if occupied {
            let gate = Once::default();
            *inbox.release[index].borrow_mut() = Some(gate.clone());
            gate.listen().await;
        }

        inbox.slots.borrow_mut()[index] = Some(value);

        if let Some(wake) = inbox.wake.borrow_mut().take() {
            wake.notify()?;
        }
    }
}
