//! A periodic sensor.
//!
//! Once per period the sensor takes the next reading from its generator,
//! spends its worst-case execution time processing it, and then sends it
//! as a sequence-numbered [Packet] to every connected consumer. The run
//! ends when the generator is exhausted.
//!
//! # Ports
//!
//! This component has:
//!  - `num_outputs` [output ports](lockstep_engine::port::OutPort): `tx[i]`

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use async_trait::async_trait;
use lockstep_components::types::DataGenerator;
use lockstep_engine::engine::Engine;
use lockstep_engine::port::{OutPort, PortState};
use lockstep_engine::sim_error;
use lockstep_engine::time::clock::Clock;
use lockstep_engine::traits::{Runnable, SimObject};
use lockstep_engine::types::{SimError, SimResult};
use lockstep_track::entity::Entity;
use lockstep_track::trace;

use crate::packet::Packet;

/// Timing of a [Sensor].
#[derive(Clone, Copy, Debug)]
pub struct SensorConfig {
    /// Tick of the first activation.
    pub start_tick: u64,
    /// Ticks between activations.
    pub period: u64,
    /// Ticks an activation spends before its packet leaves.
    pub wcet: u64,
}

pub struct Sensor<T>
where
    T: SimObject,
{
    pub entity: Arc<Entity>,
    clock: Clock,
    config: SensorConfig,
    readings: RefCell<Option<DataGenerator<T>>>,
    tx: RefCell<Vec<OutPort<Packet<T>>>>,
}

impl<T> fmt::Display for Sensor<T>
where
    T: SimObject,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.entity.fmt(f)
    }
}

impl<T> Sensor<T>
where
    T: SimObject,
{
    pub fn new_and_register(
        engine: &Engine,
        parent: &Arc<Entity>,
        name: &str,
        num_outputs: usize,
        config: SensorConfig,
        readings: Option<DataGenerator<T>>,
    ) -> Result<Rc<Self>, SimError> {
        let entity = Arc::new(Entity::new(parent, name));
        if num_outputs == 0 {
            return sim_error!(format!("{entity}: a sensor needs at least one output"));
        }
        if config.period == 0 {
            return sim_error!(format!("{entity}: the period must be non-zero"));
        }
        let tx = (0..num_outputs)
            .map(|index| OutPort::new(&entity, &format!("tx{index}")))
            .collect();
        let rc_self = Rc::new(Self {
            entity,
            clock: engine.clock(),
            config,
            readings: RefCell::new(readings),
            tx: RefCell::new(tx),
        });
        engine.register(rc_self.clone());
        Ok(rc_self)
    }

    pub fn set_readings(&self, readings: Option<DataGenerator<T>>) {
        *self.readings.borrow_mut() = readings;
    }

    pub fn connect_port_tx_i(
        &self,
        index: usize,
        port_state: Rc<PortState<Packet<T>>>,
    ) -> SimResult {
        match self.tx.borrow().get(index) {
            Some(port) => port.connect(port_state),
            None => sim_error!(format!("{}: no output port {index}", self.entity)),
        }
    }
}

#[async_trait(?Send)]
impl<T> Runnable for Sensor<T>
where
    T: SimObject,
{
    async fn run(&self) -> SimResult {
        let mut readings = match self.readings.borrow_mut().take() {
            Some(readings) => readings,
            None => return Ok(()),
        };
        let tx: Vec<_> = self.tx.borrow_mut().drain(..).collect();

        let mut seq_n = 0;
        loop {
            self.clock
                .wait_until(self.config.start_tick + seq_n * self.config.period)
                .await;
            let reading = match readings.next() {
                Some(reading) => reading,
                None => break,
            };
            self.clock.wait_ticks(self.config.wcet).await;

            trace!(self.entity ; "iteration {seq_n}: sending {reading}");
            for port in &tx {
                port.put(Packet::new(seq_n, reading.clone())).await?;
            }
            seq_n += 1;
        }
        Ok(())
    }
}
