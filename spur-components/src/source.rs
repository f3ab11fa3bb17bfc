// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! A data source.
//!
//! The [Source] draws values from an iterator and sends them out of its
//! single `tx` [OutPort]. Once the iterator runs dry the source completes.
//! A source with no generator does nothing when the simulation runs.

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use spur_engine::engine::Engine;
use spur_engine::port::{ChannelResult, OutPort};
use spur_engine::traits::{Runnable, SimObject};
use spur_engine::types::{SimError, SimResult};
use spur_model_builder::EntityDisplay;
use spur_track::entity::Entity;
use spur_track::exit;
use spur_track::id::Unique;

use crate::types::DataGenerator;
use crate::{connect_tx, take_option};

/// An `Option<DataGenerator>` that repeats `$value` `$repeat` times: the
/// simplest way to make a [Source] send a fixed number of identical values.
#[macro_export]
macro_rules! option_box_repeat {
    ($value:expr ; $repeat:expr) => {
        Some(Box::new(std::iter::repeat($value).take($repeat)))
    };
}

#[derive(EntityDisplay)]
pub struct Source<T>
where
    T: SimObject,
{
    pub entity: Rc<Entity>,
    generator: RefCell<Option<DataGenerator<T>>>,
    tx: RefCell<Option<OutPort<T>>>,
}

impl<T> Source<T>
where
    T: SimObject,
{
    pub fn new_and_register(
        engine: &Engine,
        parent: &Rc<Entity>,
        name: &str,
        generator: Option<DataGenerator<T>>,
    ) -> Result<Rc<Self>, SimError> {
        let entity = Rc::new(Entity::new(parent, name));
        let tx = OutPort::new(&entity, "tx");
        let rc_self = Rc::new(Self {
            entity,
            generator: RefCell::new(generator),
            tx: RefCell::new(Some(tx)),
        });
        engine.register(rc_self.clone());
        Ok(rc_self)
    }

    pub fn connect_port_tx(&self, channel: ChannelResult<T>) -> SimResult {
        connect_tx!(self.tx, connect ; channel)
    }
}

#[async_trait(?Send)]
impl<T> Runnable for Source<T>
where
    T: SimObject,
{
    async fn run(&self) -> SimResult {
        let Some(generator) = self.generator.borrow_mut().take() else {
            return Ok(());
        };

        let tx = take_option!(self.tx);
        for value in generator {
            exit!(self.entity ; value.id());
            tx.put(value)?.await;
        }
        Ok(())
    }
}
