//! A data source.
//!
//! The data source produces data as defined by the [DataGenerator] that is
//! provided.
//!
//! # Ports
//!
//! This component has:
//!  - One [output port](lockstep_engine::port::OutPort): `tx`

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use async_trait::async_trait;
use lockstep_engine::engine::Engine;
use lockstep_engine::port::{OutPort, PortState};
use lockstep_engine::traits::{Runnable, SimObject};
use lockstep_engine::types::SimResult;
use lockstep_track::entity::Entity;
use lockstep_track::trace;

#[macro_export]
macro_rules! option_box_repeat {
    ($value:expr ; $repeat:expr) => {
        Some(Box::new(std::iter::repeat($value).take($repeat)))
    };
}
use crate::types::DataGenerator;
use crate::{connect_tx, take_option};

pub struct Source<T>
where
    T: SimObject,
{
    pub entity: Arc<Entity>,
    data_generator: RefCell<Option<DataGenerator<T>>>,
    tx: RefCell<Option<OutPort<T>>>,
}

impl<T> std::fmt::Display for Source<T>
where
    T: SimObject,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.entity.fmt(f)
    }
}

impl<T> Source<T>
where
    T: SimObject,
{
    #[must_use]
    pub fn new_and_register(
        engine: &Engine,
        parent: &Arc<Entity>,
        name: &str,
        data_generator: Option<DataGenerator<T>>,
    ) -> Rc<Self> {
        let entity = Arc::new(Entity::new(parent, name));
        let tx = OutPort::new(&entity, "tx");
        let rc_self = Rc::new(Self {
            entity,
            data_generator: RefCell::new(data_generator),
            tx: RefCell::new(Some(tx)),
        });
        engine.register(rc_self.clone());
        rc_self
    }

    pub fn set_generator(&self, data_generator: Option<DataGenerator<T>>) {
        *self.data_generator.borrow_mut() = data_generator;
    }

    pub fn connect_port_tx(&self, port_state: Rc<PortState<T>>) -> SimResult {
        connect_tx!(self.tx, connect ; port_state)
    }
}

#[async_trait(?Send)]
impl<T> Runnable for Source<T>
where
    T: SimObject,
{
    async fn run(&self) -> SimResult {
        let mut data_generator = match self.data_generator.borrow_mut().take() {
            Some(data_generator) => data_generator,
            None => return Ok(()),
        };

        let tx = take_option!(self.tx);
        loop {
            let value = data_generator.next();
            if let Some(value) = value {
                trace!(self.entity ; "sending {value}");
                tx.put(value).await?;
            } else {
                break;
            }
        }
        Ok(())
    }
}
