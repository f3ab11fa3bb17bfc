// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! The engine: owns the executor, the tracker and the components waiting
//! to run.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use spur_track::entity::{Entity, toplevel};
use spur_track::{Tracker, trace};

use crate::executor::{self, Executor, Spawner};
use crate::time::Clock;
use crate::types::{Component, Eventable, SimResult};

/// Default clock frequency of 1GHz.
const DEFAULT_CLOCK_MHZ: f64 = 1000.0;

pub struct Engine {
    executor: Executor,
    spawner: Spawner,
    top: Rc<Entity>,
    tracker: Tracker,
    components: RefCell<Vec<Component>>,
}

impl Engine {
    pub fn new(tracker: &Tracker) -> Self {
        let top = toplevel(tracker, "top");
        let (executor, spawner) = executor::new_executor_and_spawner(&top);
        Self {
            executor,
            spawner,
            top,
            tracker: tracker.clone(),
            components: RefCell::new(Vec::new()),
        }
    }

    /// Register a component to be run when the simulation starts.
    pub fn register(&self, component: Component) {
        self.components.borrow_mut().push(component);
    }

    // Spawn every registered component onto the executor.
    fn start(&self) {
        let mut components = self.components.borrow_mut();
        trace!(self.top ; "Spawning {} components", components.len());
        for component in components.drain(..) {
            self.spawner.spawn(async move { component.run().await });
        }
    }

    /// Run until no non-background work remains.
    pub fn run(&mut self) -> SimResult {
        self.start();

        // A finish flag that is never set.
        let finished = Rc::new(Cell::new(false));
        self.executor.run(&finished)
    }

    /// Run until the given event fires.
    pub fn run_until<T: Default + Copy + 'static>(&mut self, event: Eventable<T>) -> SimResult {
        self.start();

        let finished = Rc::new(Cell::new(false));
        {
            let finished = finished.clone();
            self.spawner.spawn(async move {
                event.listen().await;
                finished.set(true);
                Ok(())
            });
        }

        self.executor.run(&finished)
    }

    #[must_use]
    pub fn spawner(&self) -> Spawner {
        self.spawner.clone()
    }

    pub fn spawn(&self, future: impl Future<Output = SimResult> + 'static) {
        self.spawner.spawn(future);
    }

    #[must_use]
    pub fn default_clock(&mut self) -> Clock {
        self.clock_mhz(DEFAULT_CLOCK_MHZ)
    }

    #[must_use]
    pub fn clock_mhz(&mut self, freq_mhz: f64) -> Clock {
        self.executor.get_clock(freq_mhz)
    }

    #[must_use]
    pub fn clock_ghz(&mut self, freq_ghz: f64) -> Clock {
        self.clock_mhz(freq_ghz * 1000.0)
    }

    #[must_use]
    pub fn time_now_ns(&self) -> f64 {
        self.executor.time_now_ns()
    }

    #[must_use]
    pub fn top(&self) -> &Rc<Entity> {
        &self.top
    }

    #[must_use]
    pub fn tracker(&self) -> Tracker {
        self.tracker.clone()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        // The tracker may hold a buffered writer that needs flushing.
        self.tracker.shutdown();
    }
}
