// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! A fixed-latency pipe.
//!
//! Values entering the [Delay] at tick `t` leave at tick `t + delay_ticks`.
//! Up to `delay_ticks` values can be in flight at once; beyond that the
//! input feels back-pressure.
//!
//! # Ports
//!
//!  - One [input port](spur_engine::port::InPort): `rx`
//!  - One [output port](spur_engine::port::OutPort): `tx`

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use async_trait::async_trait;
use spur_engine::engine::Engine;
use spur_engine::events::Repeated;
use spur_engine::executor::Spawner;
use spur_engine::port::{ChannelResult, InPort, OutPort};
use spur_engine::time::{Clock, ClockTick};
use spur_engine::traits::{Event, Runnable, SimObject};
use spur_engine::types::{SimError, SimResult};
use spur_model_builder::EntityDisplay;
use spur_track::entity::Entity;
use spur_track::id::Unique;
use spur_track::{enter, exit};

use crate::{connect_tx, port_rx, take_option};

#[derive(EntityDisplay)]
pub struct Delay<T>
where
    T: SimObject,
{
    pub entity: Rc<Entity>,
    spawner: Spawner,
    clock: Clock,
    delay_ticks: usize,

    rx: RefCell<Option<InPort<T>>>,
    in_flight: Rc<RefCell<VecDeque<(T, ClockTick)>>>,
    arrivals: Repeated<()>,
    departures: Repeated<()>,
    tx: RefCell<Option<OutPort<T>>>,
}

impl<T> Delay<T>
where
    T: SimObject,
{
    pub fn new_and_register(
        engine: &Engine,
        clock: &Clock,
        parent: &Rc<Entity>,
        name: &str,
        delay_ticks: usize,
    ) -> Result<Rc<Self>, SimError> {
        let spawner = engine.spawner();
        let entity = Rc::new(Entity::new(parent, name));
        let tx = OutPort::new(&entity, "tx");
        let rx = InPort::new(&entity, "rx");
        let rc_self = Rc::new(Self {
            entity,
            spawner,
            clock: clock.clone(),
            delay_ticks,
            rx: RefCell::new(Some(rx)),
            in_flight: Rc::new(RefCell::new(VecDeque::new())),
            arrivals: Repeated::default(),
            departures: Repeated::default(),
            tx: RefCell::new(Some(tx)),
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
impl<T> Runnable for Delay<T>
where
    T: SimObject,
{
    async fn run(&self) -> SimResult {
        // The output side runs as its own task.
        let tx = take_option!(self.tx);
        let clock = self.clock.clone();
        let in_flight = self.in_flight.clone();
        let arrivals = self.arrivals.clone();
        let departures = self.departures.clone();
        self.spawner
            .spawn(async move { run_tx(tx, &clock, in_flight, arrivals, departures).await });

        let rx = take_option!(self.rx);
        loop {
            let value = rx.get()?.await;
            enter!(self.entity ; value.id());

            let due = self.clock.tick_now().advance(self.delay_ticks as u64);
            self.in_flight.borrow_mut().push_back((value, due));
            self.arrivals.notify();

            if self.delay_ticks > 0 {
                // Back-pressure: no more in flight than the pipe is long.
                while self.in_flight.borrow().len() >= self.delay_ticks {
                    self.departures.listen().await;
                }
            }
        }
    }
}

async fn run_tx<T>(
    tx: OutPort<T>,
    clock: &Clock,
    in_flight: Rc<RefCell<VecDeque<(T, ClockTick)>>>,
    arrivals: Repeated<()>,
    departures: Repeated<()>,
) -> SimResult
where
    T: SimObject,
{
    loop {
        let next = in_flight.borrow_mut().pop_front();
        let Some((value, due)) = next else {
            arrivals.listen().await;
            continue;
        };

        let now = clock.tick_now();
        if due > now {
            clock.wait_ticks(due.tick() - now.tick()).await;
        }

        exit!(tx.entity ; value.id());
        tx.put(value)?.await;
        departures.notify();
    }
}
