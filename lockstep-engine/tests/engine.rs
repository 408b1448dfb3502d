use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use async_trait::async_trait;
use lockstep_engine::engine::Engine;
use lockstep_engine::test_helpers::start_test;
use lockstep_engine::traits::Runnable;
use lockstep_engine::types::SimResult;
use lockstep_engine::{run_simulation, sim_error};
use lockstep_track::entity::Entity;

#[test]
fn an_empty_engine_completes() {
    let mut engine = start_test(file!());
    run_simulation!(engine);
}

#[test]
fn task_errors_stop_the_run() {
    let mut engine = start_test(file!());
    engine.spawn(async move { sim_error!("boom") });
    run_simulation!(engine, "Error: boom");
}

struct Oneshot {
    pub entity: Arc<Entity>,
    ran: Rc<Cell<bool>>,
}

#[async_trait(?Send)]
impl Runnable for Oneshot {
    async fn run(&self) -> SimResult {
        lockstep_track::debug!(self.entity ; "running");
        self.ran.set(true);
        Ok(())
    }
}

#[test]
fn registered_components_are_spawned_by_run() {
    let mut engine = start_test(file!());
    let ran = Rc::new(Cell::new(false));
    let component = Rc::new(Oneshot {
        entity: Arc::new(Entity::new(engine.top(), "oneshot")),
        ran: ran.clone(),
    });
    engine.register(component);

    assert!(!ran.get(), "must not run before the simulation starts");
    run_simulation!(engine);
    assert!(ran.get());
}

#[test]
fn finish_task_can_abort_a_run() {
    let mut engine = start_test(file!());
    let clock = engine.clock();
    let spawner = engine.spawner();

    // An endless foreground ticker.
    {
        let clock = clock.clone();
        engine.spawn(async move {
            loop {
                clock.wait_ticks(1).await;
            }
        });
    }

    // Install an event to terminate the simulation at a fixed tick.
    {
        let clock = clock.clone();
        spawner.spawn(async move {
            clock.wait_ticks(100).await;
            sim_error!("Finish")
        });
    }

    run_simulation!(engine, "Error: Finish");
    assert_eq!(clock.tick_now(), 100);
}

#[test]
fn engine_names_the_top_level() {
    let engine = Engine::new("pipeline");
    assert_eq!(engine.top().full_name(), "pipeline");
}
