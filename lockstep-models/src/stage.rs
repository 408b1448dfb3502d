//! A periodic compute stage.
//!
//! A stage owns one [sequenced buffer](lockstep_components::sequencer) and
//! one [estimator](lockstep_components::policy) per input. A receive task
//! per input delivers arriving [packets](crate::packet) into the buffer in
//! whatever order the transport produced them. Once per period the main
//! task demands `tokens_per_iteration` tokens from every buffer,
//! substituting for any that never arrived, combines the values, and after
//! its worst-case execution time sends the result onwards tagged with the
//! iteration number.
//!
//! # Ports
//!
//! This component has:
//!  - `num_inputs` [input ports](lockstep_engine::port::InPort): `rx[i]`
//!  - `num_outputs` [output ports](lockstep_engine::port::OutPort): `tx[i]`

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use async_trait::async_trait;
use lockstep_components::policy::{Estimator, Sample, SubstitutionPolicy};
use lockstep_components::sequencer::SeqBuffer;
use lockstep_engine::engine::Engine;
use lockstep_engine::executor::Spawner;
use lockstep_engine::port::{InPort, OutPort, PortState};
use lockstep_engine::sim_error;
use lockstep_engine::time::clock::Clock;
use lockstep_engine::traits::Runnable;
use lockstep_engine::types::{SimError, SimResult};
use lockstep_track::entity::Entity;
use lockstep_track::trace;

use crate::packet::Packet;

/// How a stage turns its gathered input values into one output value.
///
/// The slice holds `num_inputs * tokens_per_iteration` values in input-major
/// order.
pub type Combine<T> = Box<dyn Fn(&[T]) -> T>;

/// A weighted sum, the combine function of a linear pipeline stage.
#[must_use]
pub fn weighted_sum(weights: Vec<f64>) -> Combine<f64> {
    Box::new(move |inputs| {
        inputs
            .iter()
            .zip(&weights)
            .map(|(input, weight)| input * weight)
            .sum()
    })
}

/// Configuration of a [Stage].
#[derive(Clone, Copy, Debug)]
pub struct StageConfig {
    /// Tick of the first activation.
    pub start_tick: u64,
    /// Ticks between activations.
    pub period: u64,
    /// Ticks an activation spends before its packet leaves.
    pub wcet: u64,
    /// Activations before the stage finishes.
    pub num_iterations: u64,
    /// Tokens consumed from every input on each activation.
    pub tokens_per_iteration: usize,
    /// Tokens each input buffer can hold.
    pub buffer_capacity: usize,
    /// What to use for a value that never arrived in time.
    pub policy: SubstitutionPolicy,
}

pub struct Stage<T>
where
    T: Sample,
{
    pub entity: Arc<Entity>,
    spawner: Spawner,
    clock: Clock,
    config: StageConfig,
    combine: Combine<T>,

    rx: RefCell<Vec<InPort<Packet<T>>>>,
    buffers: Vec<Rc<RefCell<SeqBuffer<T>>>>,
    estimators: RefCell<Vec<Estimator<T>>>,
    tx: RefCell<Vec<OutPort<Packet<T>>>>,
    outputs: RefCell<Vec<T>>,
}

impl<T> fmt::Display for Stage<T>
where
    T: Sample,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.entity.fmt(f)
    }
}

impl<T> Stage<T>
where
    T: Sample,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new_and_register(
        engine: &Engine,
        parent: &Arc<Entity>,
        name: &str,
        num_inputs: usize,
        num_outputs: usize,
        config: StageConfig,
        default_value: T,
        combine: Combine<T>,
    ) -> Result<Rc<Self>, SimError> {
        let entity = Arc::new(Entity::new(parent, name));
        if num_inputs == 0 {
            return sim_error!(format!("{entity}: a stage needs at least one input"));
        }
        if config.period == 0 {
            return sim_error!(format!("{entity}: the period must be non-zero"));
        }
        if config.tokens_per_iteration == 0 {
            return sim_error!(format!(
                "{entity}: every iteration must consume at least one token"
            ));
        }
        if config.tokens_per_iteration > config.buffer_capacity {
            return sim_error!(format!(
                "{entity}: cannot consume {} tokens per iteration from buffers of capacity {}",
                config.tokens_per_iteration, config.buffer_capacity
            ));
        }

        let rx = (0..num_inputs)
            .map(|index| InPort::new(&entity, &format!("rx{index}")))
            .collect();
        let buffers = (0..num_inputs)
            .map(|index| {
                Ok(Rc::new(RefCell::new(SeqBuffer::new(
                    &entity,
                    &format!("buffer{index}"),
                    config.buffer_capacity,
                )?)))
            })
            .collect::<Result<Vec<_>, SimError>>()?;
        let estimators = (0..num_inputs)
            .map(|_| Estimator::new(config.policy, default_value.clone()))
            .collect();
        let tx = (0..num_outputs)
            .map(|index| OutPort::new(&entity, &format!("tx{index}")))
            .collect();

        let rc_self = Rc::new(Self {
            entity,
            spawner: engine.spawner(),
            clock: engine.clock(),
            config,
            combine,
            rx: RefCell::new(rx),
            buffers,
            estimators: RefCell::new(estimators),
            tx: RefCell::new(tx),
            outputs: RefCell::new(Vec::new()),
        });
        engine.register(rc_self.clone());
        Ok(rc_self)
    }

    #[must_use]
    pub fn port_rx_i(&self, index: usize) -> Rc<PortState<Packet<T>>> {
        self.rx.borrow()[index].state()
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

    /// The value produced by each completed iteration.
    #[must_use]
    pub fn outputs(&self) -> Vec<T> {
        self.outputs.borrow().clone()
    }

    /// Values substituted for `input` because nothing arrived in time.
    #[must_use]
    pub fn num_lost(&self, input: usize) -> u64 {
        self.estimators.borrow()[input].num_lost()
    }

    /// The fraction of `input`'s consumed values that were substituted.
    #[must_use]
    pub fn loss_rate(&self, input: usize) -> f64 {
        self.estimators.borrow()[input].loss_rate()
    }

    /// Deliveries on `input` dropped because its window was full.
    #[must_use]
    pub fn num_dropped(&self, input: usize) -> u64 {
        self.buffers[input].borrow().num_dropped()
    }
}

/// Deliver everything arriving on one input into its buffer.
async fn run_rx<T>(rx: InPort<Packet<T>>, buffer: Rc<RefCell<SeqBuffer<T>>>) -> SimResult
where
    T: Sample,
{
    loop {
        let packet = rx.get().await;
        buffer.borrow_mut().deliver(packet.seq_n, packet.payload)?;
    }
}

#[async_trait(?Send)]
impl<T> Runnable for Stage<T>
where
    T: Sample,
{
    async fn run(&self) -> SimResult {
        for (rx, buffer) in self
            .rx
            .borrow_mut()
            .drain(..)
            .zip(self.buffers.iter().cloned())
        {
            self.spawner.spawn(run_rx(rx, buffer));
        }
        let tx: Vec<_> = self.tx.borrow_mut().drain(..).collect();

        for iteration in 0..self.config.num_iterations {
            self.clock
                .wait_until(self.config.start_tick + iteration * self.config.period)
                .await;

            let tokens = self.config.tokens_per_iteration;
            let mut inputs = Vec::with_capacity(self.buffers.len() * tokens);
            let mut estimators = self.estimators.borrow_mut();
            for (buffer, estimator) in self.buffers.iter().zip(estimators.iter_mut()) {
                let mut buffer = buffer.borrow_mut();
                buffer.provision(tokens)?;
                for index in 0..tokens {
                    let token = buffer.read(index)?;
                    let value = if token.is_empty() {
                        token.mark_consumed();
                        estimator.substitute()
                    } else {
                        let value = token.data()?;
                        estimator.record(&value);
                        value
                    };
                    inputs.push(value);
                }
                buffer.pop(tokens)?;
            }
            drop(estimators);

            let output = (self.combine)(&inputs);
            trace!(self.entity ; "iteration {iteration}: produced {output}");
            self.outputs.borrow_mut().push(output.clone());

            self.clock.wait_ticks(self.config.wcet).await;
            for port in &tx {
                port.put(Packet::new(iteration, output.clone())).await?;
            }
        }
        Ok(())
    }
}
