// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! The single-threaded task executor.
//!
//! Ready tasks are polled in turn; when none are ready the executor lets
//! the [`Timeline`] advance to the next scheduled tick and wakes the
//! sleepers due then.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

use spur_track::entity::Entity;

use crate::time::{Clock, Timeline};
use crate::types::SimResult;

// Waker plumbing. The data pointer of every raw waker is a leaked
// `Rc<Task>`; dropping a waker is deliberately a no-op, balancing the
// reference that clone and wake release when they reconstruct the Rc.
static VTABLE: RawWakerVTable = RawWakerVTable::new(clone_task, wake_task, noop, noop);

fn noop(_: *const ()) {}

fn raw_waker(task: Rc<Task>) -> RawWaker {
    RawWaker::new(Rc::into_raw(task).cast(), &VTABLE)
}

fn waker(task: Rc<Task>) -> Waker {
    unsafe { Waker::from_raw(raw_waker(task)) }
}

unsafe fn clone_task(data: *const ()) -> RawWaker {
    let task = unsafe { Rc::from_raw(data.cast::<Task>()) };
    raw_waker(task.clone())
}

unsafe fn wake_task(data: *const ()) {
    let task = unsafe { Rc::from_raw(data.cast::<Task>()) };
    task.core.incoming.borrow_mut().push(task.clone());
}

struct Task {
    future: RefCell<Pin<Box<dyn Future<Output = SimResult>>>>,
    core: Rc<ExecCore>,
}

impl Task {
    fn poll(&self, cx: &mut Context) -> Poll<SimResult> {
        self.future.borrow_mut().as_mut().poll(cx)
    }
}

struct ExecCore {
    /// Tasks to poll on the current pass.
    ready: RefCell<Vec<Rc<Task>>>,

    /// Tasks spawned or woken since the pass started.
    incoming: RefCell<Vec<Rc<Task>>>,

    timeline: RefCell<Timeline>,
}

impl ExecCore {
    fn spawn(self: &Rc<Self>, future: impl Future<Output = SimResult> + 'static) {
        self.incoming.borrow_mut().push(Rc::new(Task {
            future: RefCell::new(Box::pin(future)),
            core: self.clone(),
        }));
    }
}

/// Cheaply cloneable handle on the executor.
#[derive(Clone)]
pub struct Executor {
    pub entity: Rc<Entity>,
    core: Rc<ExecCore>,
}

impl Executor {
    pub fn spawn(&self, future: impl Future<Output = SimResult> + 'static) {
        self.core.spawn(future);
    }

    /// Drive all tasks until `finished` is set, a task fails, or nothing
    /// further is scheduled.
    pub fn run(&self, finished: &Rc<Cell<bool>>) -> SimResult {
        loop {
            self.poll_ready(finished)?;
            if finished.get() {
                break;
            }

            if !self.core.incoming.borrow().is_empty() {
                // More work at the current time.
                continue;
            }

            if self.core.timeline.borrow().idle() {
                break;
            }

            let Some(sleepers) = self.core.timeline.borrow_mut().advance() else {
                break;
            };
            for sleeper in sleepers {
                sleeper.waker.wake();
            }
        }
        Ok(())
    }

    // One polling pass: take on the tasks spawned or woken since the last
    // pass and poll each of them once. Pending tasks have parked their
    // waker somewhere.
    fn poll_ready(&self, finished: &Rc<Cell<bool>>) -> SimResult {
        let mut ready = self.core.ready.borrow_mut();
        ready.append(&mut self.core.incoming.borrow_mut());

        for task in ready.drain(..) {
            if finished.get() {
                break;
            }

            let waker = waker(task.clone());
            let mut cx = Context::from_waker(&waker);
            if let Poll::Ready(result) = task.poll(&mut cx) {
                result?;
            }
        }
        Ok(())
    }

    pub fn get_clock(&self, freq_mhz: f64) -> Clock {
        self.core.timeline.borrow_mut().get_clock(freq_mhz)
    }

    pub fn time_now_ns(&self) -> f64 {
        self.core.timeline.borrow().time_now_ns()
    }
}

/// Spawns new futures onto the executor.
#[derive(Clone)]
pub struct Spawner {
    core: Rc<ExecCore>,
}

impl Spawner {
    pub fn spawn(&self, future: impl Future<Output = SimResult> + 'static) {
        self.core.spawn(future);
    }
}

pub fn new_executor_and_spawner(top: &Rc<Entity>) -> (Executor, Spawner) {
    let core = Rc::new(ExecCore {
        ready: RefCell::new(Vec::new()),
        incoming: RefCell::new(Vec::new()),
        timeline: RefCell::new(Timeline::new(top)),
    });
    let executor = Executor {
        entity: Rc::new(Entity::new(top, "executor")),
        core: core.clone(),
    };
    (executor, Spawner { core })
}
