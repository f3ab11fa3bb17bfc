// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Events that tasks can wait on without consuming them.
//!
//! Unlike a [port](crate::port), an event has any number of listeners and
//! carries at most a small `Copy` payload. [`Once`] fires a single time;
//! [`Repeated`] fires again and again, releasing whoever is listening at
//! that moment.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use futures::future::FusedFuture;

use crate::sim_error;
use crate::traits::{BoxFuture, Event};
use crate::types::{Eventable, SimResult};

struct OnceCore<T: Copy> {
    value: T,
    fired: Cell<bool>,
    waiters: RefCell<Vec<Waker>>,
}

impl<T: Copy> OnceCore<T> {
    fn release_waiters(&self) {
        for waker in self.waiters.borrow_mut().drain(..) {
            waker.wake();
        }
    }
}

/// An event that fires exactly once, then yields its value to every
/// listener, past and future.
pub struct Once<T: Copy> {
    core: Rc<OnceCore<T>>,
}

impl<T: Copy> Clone for Once<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T: Copy> Once<T> {
    /// Create an unfired event yielding `value` once fired.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            core: Rc::new(OnceCore {
                value,
                fired: Cell::new(false),
                waiters: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Fire the event, waking every listener. Firing twice is an error.
    pub fn notify(&self) -> SimResult {
        if self.core.fired.replace(true) {
            return sim_error!("once event already triggered");
        }
        self.core.release_waiters();
        Ok(())
    }
}

impl Default for Once<()> {
    fn default() -> Self {
        Self::new(())
    }
}

impl<T: Copy + 'static> Event for Once<T> {
    type EventResult = T;

    fn listen(&self) -> BoxFuture<Self::EventResult> {
        Box::pin(ListenOnce {
            core: self.core.clone(),
            done: false,
        })
    }

    fn clone_dyn(&self) -> Eventable<T> {
        Box::new(self.clone())
    }
}

struct ListenOnce<T: Copy> {
    core: Rc<OnceCore<T>>,
    done: bool,
}

impl<T: Copy> Future for ListenOnce<T> {
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.core.fired.get() {
            self.done = true;
            Poll::Ready(self.core.value)
        } else {
            self.core.waiters.borrow_mut().push(cx.waker().clone());
            Poll::Pending
        }
    }
}

impl<T: Copy> FusedFuture for ListenOnce<T> {
    fn is_terminated(&self) -> bool {
        self.done
    }
}

struct RepeatedCore<T: Copy> {
    value: Cell<T>,
    waiters: RefCell<Vec<Waker>>,
}

/// An event that can fire any number of times.
///
/// Each firing releases the tasks listening at that moment; a listener that
/// arrives afterwards waits for the next firing. The value yielded is the
/// one most recently supplied through [`Repeated::notify_result`].
pub struct Repeated<T: Copy> {
    core: Rc<RepeatedCore<T>>,
}

impl<T: Copy> Clone for Repeated<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T: Copy> Repeated<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            core: Rc::new(RepeatedCore {
                value: Cell::new(value),
                waiters: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Fire the event, re-yielding the previous value.
    pub fn notify(&self) {
        for waker in self.core.waiters.borrow_mut().drain(..) {
            waker.wake();
        }
    }

    /// Fire the event with a new value.
    pub fn notify_result(&self, value: T) {
        self.core.value.set(value);
        self.notify();
    }
}

impl Default for Repeated<()> {
    fn default() -> Self {
        Self::new(())
    }
}

impl<T: Copy + 'static> Event for Repeated<T> {
    type EventResult = T;

    fn listen(&self) -> BoxFuture<Self::EventResult> {
        Box::pin(ListenRepeated {
            core: self.core.clone(),
            armed: false,
            done: false,
        })
    }

    fn clone_dyn(&self) -> Eventable<T> {
        Box::new(self.clone())
    }
}

struct ListenRepeated<T: Copy> {
    core: Rc<RepeatedCore<T>>,
    armed: bool,
    done: bool,
}

impl<T: Copy> Future for ListenRepeated<T> {
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.armed {
            self.done = true;
            Poll::Ready(self.core.value.get())
        } else {
            self.armed = true;
            self.core.waiters.borrow_mut().push(cx.waker().clone());
            Poll::Pending
        }
    }
}

impl<T: Copy> FusedFuture for ListenRepeated<T> {
    fn is_terminated(&self) -> bool {
        self.done
    }
}
