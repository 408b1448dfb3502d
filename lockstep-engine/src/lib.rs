#![doc(test(attr(warn(unused))))]

//! `lockstep-engine` - a discrete-event engine for periodic pipelines.
//!
//! This library provides the single-threaded cooperative
//! [engine](crate::engine) which executes event driven asynchronous
//! simulation components. Components are `async` objects connected through
//! rendezvous [ports](crate::port); time is modelled by a tick
//! [clock](crate::time::clock) from which components request delays.
//!
//! # Simple Application
//!
//! A very simple application would look like:
//!
//! ```rust
//! use lockstep_components::sink::Sink;
//! use lockstep_components::source::Source;
//! use lockstep_components::{connect_port, option_box_repeat};
//! use lockstep_engine::engine::Engine;
//! use lockstep_engine::run_simulation;
//!
//! let mut engine = Engine::default();
//! let source = Source::new_and_register(&engine, engine.top(), "source",
//!     option_box_repeat!(0x123 ; 10));
//! let sink = Sink::new_and_register(&engine, engine.top(), "sink");
//! connect_port!(source, tx => sink, rx).unwrap();
//! run_simulation!(engine);
//! assert_eq!(sink.num_sunk(), 10);
//! ```
//!
//! Simulations can be run as purely event driven (where one event triggers
//! one or more others) or the use of the clock can be introduced to model
//! time. The combination of both is the most common. The simulation ends
//! when no runnable task and no pending foreground clock delay remains.

pub mod engine;
pub mod events;
pub mod executor;
pub mod port;
pub mod test_helpers;
pub mod time;
pub mod traits;
pub mod types;

#[macro_export]
/// Run the simulation to completion, spawning all registered components.
macro_rules! run_simulation {
    ($engine:ident) => {
        $engine.run().unwrap();
    };
    ($engine:ident, $expect:expr) => {
        match $engine.run() {
            Ok(()) => panic!("Expected an error!"),
            Err(e) => assert_eq!(format!("{e}").as_str(), $expect),
        }
    };
}
