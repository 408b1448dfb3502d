//! The simulation engine.
//!
//! Owns the [executor](crate::executor) and the top-level entity, and keeps
//! the list of registered [components](crate::types::Component) that are
//! spawned when the simulation is run.

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use lockstep_track::entity::{Entity, toplevel};

use crate::executor::{self, Executor, Spawner};
use crate::time::clock::Clock;
use crate::types::{Component, SimResult};

/// A single simulation engine.
pub struct Engine {
    /// The executor driving all simulation tasks.
    pub executor: Executor,
    /// A spawner for additional tasks.
    pub spawner: Spawner,
    toplevel: Arc<Entity>,
    components: RefCell<Vec<Component>>,
}

impl Engine {
    /// Create a standalone engine whose top-level entity uses `name`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        let toplevel = toplevel(name);
        let (executor, spawner) = executor::new_executor_and_spawner(&toplevel);
        Self {
            executor,
            spawner,
            toplevel,
            components: RefCell::new(Vec::new()),
        }
    }

    /// Register a component whose `run()` is spawned by [`Engine::run`].
    pub fn register(&self, component: Component) {
        self.components.borrow_mut().push(component);
    }

    /// Spawn all registered components and run the simulation until no
    /// foreground activity remains.
    pub fn run(&mut self) -> SimResult {
        for component in self.components.borrow_mut().drain(..) {
            self.executor.spawn(async move { component.run().await });
        }

        // Pass an atomic bool that will never be set to true
        let finished = Rc::new(AtomicBool::new(false));
        self.executor.run(finished)
    }

    /// Spawn a bare task.
    pub fn spawn(&self, future: impl Future<Output = SimResult> + 'static) {
        self.executor.spawn(future);
    }

    /// A clone of the spawner for use by components.
    #[must_use]
    pub fn spawner(&self) -> Spawner {
        self.spawner.clone()
    }

    /// A handle on the simulation clock.
    #[must_use]
    pub fn clock(&self) -> Clock {
        self.executor.clock()
    }

    /// The top-level entity that all models hang off.
    #[must_use]
    pub fn top(&self) -> &Arc<Entity> {
        &self.toplevel
    }
}

/// Create a default engine with a top-level entity named `top`.
///
/// This is provided to keep documentation examples simple with fewer
/// concepts to have to consider at once.
impl Default for Engine {
    fn default() -> Self {
        Self::new("top")
    }
}
