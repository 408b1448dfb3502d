//! A set of common traits used across the lockstep engine.

use std::fmt::{Debug, Display};
use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::types::SimResult;

/// A super-trait that objects that are passed around the simulation have to
/// implement
///
///  - Clone:     It would be nice to use `Copy` instead, but given that
///    things like `Vec` are not `Copy` we have to use `Clone` instead to
///    allow the application to keep copies of objects sent around.
///  - Debug:     In order to print "{:?}" objects have to at least implement
///    Debug.
///  - Display:   Allows objects to be named in log messages.
///  - 'static:   Due to the way that futures are implemented, the lifetimes
///    need to be `static. This means that objects may have to be placed in
///    `Box` to make them static.
pub trait SimObject: Clone + Debug + Display + 'static {}

// Implementations for basic types that can be sent around the simulation
// for testing

impl SimObject for i32 {}
impl SimObject for usize {}
impl SimObject for f64 {}

/// The trait implemented by all components that have a run function that is
/// spawned by the engine.
#[async_trait(?Send)]
pub trait Runnable {
    /// Run the component.
    async fn run(&self) -> SimResult;
}

/// The `Event` trait defines an object that can be used as an Event
///
/// This is a trait that defines the `listen` function that returns a future
/// so that it can be used in `async` code.
pub trait Event<T> {
    #[must_use = "Futures do nothing unless you `.await` or otherwise use them"]
    /// Wait for the next notification of this event.
    fn listen(&self) -> BoxFuture<'static, T>;

    /// Allow cloning of boxed events.
    fn clone_dyn(&self) -> Box<dyn Event<T>>;
}

/// Provide Clone implementation for boxed Event
impl<T> Clone for Box<dyn Event<T>> {
    fn clone(self: &Box<dyn Event<T>>) -> Box<dyn Event<T>> {
        self.clone_dyn()
    }
}

/// A boxed future as returned by [`Event::listen`].
pub type BoxFuture<'a, T> = Pin<std::boxed::Box<dyn Future<Output = T> + 'a>>;
