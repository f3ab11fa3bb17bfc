// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Ports: one-to-one rendezvous message passing between components.
//!
//! An [`OutPort`] is connected to an [`InPort`] by handing it the input's
//! [`Channel`]. A put blocks until the receiver takes the value; a get
//! blocks until a value arrives. [`InPort::start_get`] splits the receive
//! in two so a component can model work done while the sender stays
//! blocked.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use futures::future::FusedFuture;
use spur_track::connect;
use spur_track::entity::Entity;

use crate::sim_error;
use crate::traits::SimObject;
use crate::types::{SimError, SimResult};

/// The single-value slot shared by a connected pair of ports.
#[derive(Debug)]
pub struct Channel<T: SimObject> {
    slot: RefCell<Option<T>>,
    getter: RefCell<Option<Waker>>,
    putter: RefCell<Option<Waker>>,
    rx_entity: Rc<Entity>,
}

impl<T: SimObject> Channel<T> {
    fn new(rx_entity: Rc<Entity>) -> Self {
        Self {
            slot: RefCell::new(None),
            getter: RefCell::new(None),
            putter: RefCell::new(None),
            rx_entity,
        }
    }

    fn wake_getter(&self) {
        if let Some(waker) = self.getter.borrow_mut().take() {
            waker.wake();
        }
    }

    fn wake_putter(&self) {
        if let Some(waker) = self.putter.borrow_mut().take() {
            waker.wake();
        }
    }
}

/// Result of asking an [`InPort`] for its channel.
pub type ChannelResult<T> = Result<Rc<Channel<T>>, SimError>;

/// Result of starting a get on an [`InPort`].
pub type GetResult<T> = Result<Get<T>, SimError>;

/// Result of starting a put on an [`OutPort`].
pub type PutResult<T> = Result<Put<T>, SimError>;

/// Result of starting a try-put on an [`OutPort`].
pub type TryPutResult<T> = Result<TryPut<T>, SimError>;

/// The receiving end of a connection.
pub struct InPort<T: SimObject> {
    pub entity: Rc<Entity>,
    channel: Rc<Channel<T>>,
    connected: Cell<bool>,
}

impl<T: SimObject> std::fmt::Display for InPort<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.entity.fmt(f)
    }
}

impl<T: SimObject> InPort<T> {
    #[must_use]
    pub fn new(parent: &Rc<Entity>, name: &str) -> Self {
        let entity = Rc::new(Entity::new(parent, name));
        Self {
            channel: Rc::new(Channel::new(entity.clone())),
            entity,
            connected: Cell::new(false),
        }
    }

    /// Hand this input's channel to the producer side.
    ///
    /// Each input accepts exactly one connection.
    pub fn channel(&self) -> ChannelResult<T> {
        if self.connected.replace(true) {
            return sim_error!(format!("{self} already connected"));
        }
        Ok(self.channel.clone())
    }

    /// Receive a value, releasing the sender once it arrives.
    pub fn get(&self) -> GetResult<T> {
        self.receive(true)
    }

    /// Receive a value but keep the sender blocked until
    /// [`InPort::finish_get`] is called.
    pub fn start_get(&self) -> GetResult<T> {
        self.receive(false)
    }

    /// Release the sender blocked by an earlier [`InPort::start_get`].
    pub fn finish_get(&self) {
        self.channel.wake_putter();
    }

    fn receive(&self, release: bool) -> GetResult<T> {
        if !self.connected.get() {
            return sim_error!(format!("{self} not connected"));
        }
        Ok(Get {
            channel: self.channel.clone(),
            release,
            done: false,
        })
    }
}

/// The sending end of a connection.
pub struct OutPort<T: SimObject> {
    pub entity: Rc<Entity>,
    channel: Option<Rc<Channel<T>>>,
}

impl<T: SimObject> std::fmt::Display for OutPort<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.entity.fmt(f)
    }
}

impl<T: SimObject> OutPort<T> {
    #[must_use]
    pub fn new(parent: &Rc<Entity>, name: &str) -> Self {
        Self {
            entity: Rc::new(Entity::new(parent, name)),
            channel: None,
        }
    }

    /// Connect this output to the input whose channel is given.
    pub fn connect(&mut self, channel: ChannelResult<T>) -> SimResult {
        let channel = channel?;
        connect!(self.entity ; channel.rx_entity);
        if self.channel.is_some() {
            return sim_error!(format!("{self} already connected"));
        }
        self.channel = Some(channel);
        Ok(())
    }

    /// Send a value, blocking until the receiver takes it.
    pub fn put(&self, value: T) -> PutResult<T> {
        Ok(Put {
            channel: self.connected()?,
            value: Some(value),
            done: false,
        })
    }

    /// Wait until a receiver is ready, without sending anything.
    ///
    /// Completes as soon as a get is pending on the other end, so a put
    /// issued next completes on that same get.
    pub fn try_put(&self) -> TryPutResult<T> {
        Ok(TryPut {
            channel: self.connected()?,
            done: false,
        })
    }

    fn connected(&self) -> ChannelResult<T> {
        match &self.channel {
            Some(channel) => Ok(channel.clone()),
            None => sim_error!(format!("{self} not connected")),
        }
    }
}

/// Future of a get in progress.
#[must_use = "Futures do nothing unless you `.await` or otherwise use them"]
pub struct Get<T: SimObject> {
    channel: Rc<Channel<T>>,
    release: bool,
    done: bool,
}

impl<T: SimObject> Future for Get<T> {
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let taken = self.channel.slot.borrow_mut().take();
        match taken {
            Some(value) => {
                self.done = true;
                if self.release {
                    self.channel.wake_putter();
                }
                Poll::Ready(value)
            }
            None => {
                // A sender may be parked in try_put; a getter now exists.
                if self.release {
                    self.channel.wake_putter();
                }
                *self.channel.getter.borrow_mut() = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

impl<T: SimObject> FusedFuture for Get<T> {
    fn is_terminated(&self) -> bool {
        self.done
    }
}

/// Future of a put in progress.
#[must_use = "Futures do nothing unless you `.await` or otherwise use them"]
pub struct Put<T: SimObject> {
    channel: Rc<Channel<T>>,
    value: Option<T>,
    done: bool,
}

impl<T: SimObject> Unpin for Put<T> {}

impl<T: SimObject> Future for Put<T> {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let value = self.value.take();
        match value {
            Some(value) => {
                let stale = self.channel.slot.borrow_mut().replace(value);
                assert!(stale.is_none(), "Put over an unconsumed value");
                self.channel.wake_getter();
                *self.channel.putter.borrow_mut() = Some(cx.waker().clone());
                Poll::Pending
            }
            None => {
                // Woken again only once the receiver has taken the value.
                self.done = true;
                Poll::Ready(())
            }
        }
    }
}

impl<T: SimObject> FusedFuture for Put<T> {
    fn is_terminated(&self) -> bool {
        self.done
    }
}

/// Future of a try-put in progress.
#[must_use = "Futures do nothing unless you `.await` or otherwise use them"]
pub struct TryPut<T: SimObject> {
    channel: Rc<Channel<T>>,
    done: bool,
}

impl<T: SimObject> Future for TryPut<T> {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.channel.getter.borrow().is_some() {
            self.done = true;
            Poll::Ready(())
        } else {
            *self.channel.putter.borrow_mut() = Some(cx.waker().clone());
            Poll::Pending
        }
    }
}

impl<T: SimObject> FusedFuture for TryPut<T> {
    fn is_terminated(&self) -> bool {
        self.done
    }
}
