//! An unreliable link.
//!
//! The link forwards everything received on `rx` to `tx` after a base
//! delay plus a uniformly drawn jitter, and can be configured to lose or
//! duplicate traffic. Because each passage draws its own jitter, two
//! messages sent back to back can overtake one another, which is how the
//! link models a reordering transport. All randomness comes from a seeded
//! generator so a run is reproducible.
//!
//! # Ports
//!
//! This component has two ports:
//!  - One [input port](lockstep_engine::port::InPort): `rx`
//!  - One [output port](lockstep_engine::port::OutPort): `tx`

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use lockstep_engine::engine::Engine;
use lockstep_engine::events::repeated::Repeated;
use lockstep_engine::executor::Spawner;
use lockstep_engine::port::{InPort, OutPort, PortState};
use lockstep_engine::sim_error;
use lockstep_engine::time::clock::Clock;
use lockstep_engine::traits::{Event, Runnable, SimObject};
use lockstep_engine::types::{SimError, SimResult};
use lockstep_track::entity::Entity;
use lockstep_track::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{connect_tx, port_rx, take_option};

/// Transport behaviour of a [LossyLink].
#[derive(Clone, Copy, Debug)]
pub struct LinkConfig {
    /// Ticks every message spends in flight.
    pub delay_ticks: u64,
    /// Extra in-flight ticks drawn uniformly from `0..=jitter_ticks`.
    pub jitter_ticks: u64,
    /// Probability that a message is lost.
    pub loss_probability: f64,
    /// Probability that a message is delivered twice.
    pub duplicate_probability: f64,
    /// Seed for the link's random generator.
    pub seed: u64,
}

impl Default for LinkConfig {
    /// A perfect link: single-tick delay, no jitter, no loss.
    fn default() -> Self {
        Self {
            delay_ticks: 1,
            jitter_ticks: 0,
            loss_probability: 0.0,
            duplicate_probability: 0.0,
            seed: 0,
        }
    }
}

struct LinkState<T>
where
    T: SimObject,
{
    entity: Arc<Entity>,
    clock: Clock,
    config: LinkConfig,
    rng: RefCell<StdRng>,

    rx: RefCell<Option<InPort<T>>>,
    /// In-flight messages with their due tick, kept sorted so the first
    /// entry is the next to leave.
    pending: RefCell<Vec<(u64, T)>>,
    pending_changed: Repeated<usize>,
    tx: RefCell<Option<OutPort<T>>>,

    num_dropped: Cell<u64>,
    num_duplicated: Cell<u64>,
}

impl<T> LinkState<T>
where
    T: SimObject,
{
    fn schedule(&self, due: u64, value: T) {
        let mut pending = self.pending.borrow_mut();
        // Insert after any message already due at the same tick so that
        // equal delays preserve arrival order.
        let index = pending.partition_point(|(tick, _)| *tick <= due);
        pending.insert(index, (due, value));
    }
}

/// A point-to-point link with loss, duplication and reordering.
pub struct LossyLink<T>
where
    T: SimObject,
{
    pub entity: Arc<Entity>,
    spawner: Spawner,
    state: Rc<LinkState<T>>,
}

impl<T> fmt::Display for LossyLink<T>
where
    T: SimObject,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.entity.fmt(f)
    }
}

impl<T> LossyLink<T>
where
    T: SimObject,
{
    pub fn new_and_register(
        engine: &Engine,
        parent: &Arc<Entity>,
        name: &str,
        config: LinkConfig,
    ) -> Result<Rc<Self>, SimError> {
        let entity = Arc::new(Entity::new(parent, name));
        for (label, p) in [
            ("loss", config.loss_probability),
            ("duplicate", config.duplicate_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return sim_error!(format!("{entity}: {label} probability {p} outside [0, 1]"));
            }
        }
        let rc_self = Rc::new(Self {
            entity: entity.clone(),
            spawner: engine.spawner(),
            state: Rc::new(LinkState {
                entity: entity.clone(),
                clock: engine.clock(),
                config,
                rng: RefCell::new(StdRng::seed_from_u64(config.seed)),
                rx: RefCell::new(Some(InPort::new(&entity, "rx"))),
                pending: RefCell::new(Vec::new()),
                pending_changed: Repeated::new(usize::default()),
                tx: RefCell::new(Some(OutPort::new(&entity, "tx"))),
                num_dropped: Cell::new(0),
                num_duplicated: Cell::new(0),
            }),
        });
        engine.register(rc_self.clone());
        Ok(rc_self)
    }

    pub fn connect_port_tx(&self, port_state: Rc<PortState<T>>) -> SimResult {
        connect_tx!(self.state.tx, connect ; port_state)
    }

    #[must_use]
    pub fn port_rx(&self) -> Rc<PortState<T>> {
        port_rx!(self.state.rx, state)
    }

    /// Messages lost in transit.
    #[must_use]
    pub fn num_dropped(&self) -> u64 {
        self.state.num_dropped.get()
    }

    /// Messages delivered twice.
    #[must_use]
    pub fn num_duplicated(&self) -> u64 {
        self.state.num_duplicated.get()
    }
}

#[async_trait(?Send)]
impl<T> Runnable for LossyLink<T>
where
    T: SimObject,
{
    async fn run(&self) -> SimResult {
        // Spawn the sending end of the link.
        let tx = take_option!(self.state.tx);
        let state = self.state.clone();
        self.spawner.spawn(async move { run_tx(tx, state).await });

        let rx = take_option!(self.state.rx);
        loop {
            let value = rx.get().await;

            let (lost, delay, duplicate) = {
                let mut rng = self.state.rng.borrow_mut();
                let lost = rng.gen_range(0.0..1.0) < self.state.config.loss_probability;
                let delay = self.state.config.delay_ticks
                    + rng.gen_range(0..=self.state.config.jitter_ticks);
                let duplicate =
                    !lost && rng.gen_range(0.0..1.0) < self.state.config.duplicate_probability;
                (lost, delay, duplicate)
            };

            if lost {
                self.state.num_dropped.set(self.state.num_dropped.get() + 1);
                debug!(self.entity ; "losing {value}");
                continue;
            }

            let now = self.state.clock.tick_now();
            if duplicate {
                self.state
                    .num_duplicated
                    .set(self.state.num_duplicated.get() + 1);
                let extra = self.state.config.delay_ticks
                    + self
                        .state
                        .rng
                        .borrow_mut()
                        .gen_range(0..=self.state.config.jitter_ticks);
                debug!(self.entity ; "duplicating {value}");
                self.state.schedule(now + extra, value.clone());
            }
            self.state.schedule(now + delay, value);
            self.state.pending_changed.notify()?;
        }
    }
}

async fn run_tx<T>(tx: OutPort<T>, state: Rc<LinkState<T>>) -> SimResult
where
    T: SimObject,
{
    loop {
        let next_due = state.pending.borrow().first().map(|(tick, _)| *tick);
        match next_due {
            None => {
                state.pending_changed.listen().await;
            }
            Some(due) if due <= state.clock.tick_now() => {
                let (_, value) = state.pending.borrow_mut().remove(0);
                trace!(state.entity ; "forwarding {value}");
                tx.put(value).await?;
            }
            Some(due) => {
                // An arrival while waiting may schedule an earlier due
                // tick, so the wait also watches for changes.
                let mut wait = state.clock.wait_until(due).fuse();
                let mut changed = state.pending_changed.listen().fuse();
                futures::select! {
                    () = wait => {}
                    _ = changed => {}
                }
            }
        }
    }
}
