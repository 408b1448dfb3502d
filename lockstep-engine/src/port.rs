//! Ports connect components together.
//!
//! An [`OutPort`] is connected to the [`PortState`] of exactly one
//! [`InPort`]. A `put` rendezvouses with a `get`: the sender parks until
//! the receiver has consumed the value, so a port never holds more than one
//! in-flight object.

use std::cell::RefCell;
use std::fmt;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use futures::Future;
use futures::future::FusedFuture;
use lockstep_track::entity::Entity;

use crate::traits::SimObject;
use crate::types::{SimError, SimResult};

/// The state shared between the two ends of a connection.
pub struct PortState<T>
where
    T: SimObject,
{
    value: RefCell<Option<T>>,
    waiting_get: RefCell<Option<Waker>>,
    waiting_put: RefCell<Option<Waker>>,
}

impl<T> PortState<T>
where
    T: SimObject,
{
    /// Create an empty, unobserved port state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            value: RefCell::new(None),
            waiting_get: RefCell::new(None),
            waiting_put: RefCell::new(None),
        }
    }
}

impl<T> Default for PortState<T>
where
    T: SimObject,
{
    fn default() -> Self {
        Self::new()
    }
}

/// The receiving end of a connection.
pub struct InPort<T>
where
    T: SimObject,
{
    /// The entity naming this port in log messages.
    pub entity: Arc<Entity>,
    state: Rc<PortState<T>>,
}

impl<T> fmt::Display for InPort<T>
where
    T: SimObject,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.entity.fmt(f)
    }
}

impl<T> InPort<T>
where
    T: SimObject,
{
    /// Create a new input port under `parent`.
    #[must_use]
    pub fn new(parent: &Arc<Entity>, name: &str) -> Self {
        Self {
            entity: Arc::new(Entity::new(parent, name)),
            state: Rc::new(PortState::new()),
        }
    }

    /// The shared state to pass to [`OutPort::connect`].
    #[must_use]
    pub fn state(&self) -> Rc<PortState<T>> {
        self.state.clone()
    }

    /// Wait for and consume the next value.
    pub fn get(&self) -> PortGet<T> {
        PortGet {
            state: self.state.clone(),
            done: false,
        }
    }
}

/// The sending end of a connection.
pub struct OutPort<T>
where
    T: SimObject,
{
    entity: Arc<Entity>,
    state: RefCell<Option<Rc<PortState<T>>>>,
}

impl<T> fmt::Display for OutPort<T>
where
    T: SimObject,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.entity.fmt(f)
    }
}

impl<T> OutPort<T>
where
    T: SimObject,
{
    /// Create a new, unconnected output port under `parent`.
    #[must_use]
    pub fn new(parent: &Arc<Entity>, name: &str) -> Self {
        Self {
            entity: Arc::new(Entity::new(parent, name)),
            state: RefCell::new(None),
        }
    }

    /// Connect this port to the state of an [`InPort`].
    ///
    /// Connecting a port twice is a configuration error.
    pub fn connect(&self, port_state: Rc<PortState<T>>) -> SimResult {
        let mut state = self.state.borrow_mut();
        match *state {
            Some(_) => Err(SimError(format!("{} already connected", self.entity))),
            None => {
                *state = Some(port_state);
                Ok(())
            }
        }
    }

    /// Send a value, completing once the receiver has consumed it.
    pub fn put(&self, value: T) -> PortPut<T> {
        let state = self
            .state
            .borrow()
            .as_ref()
            .unwrap_or_else(|| panic!("{} not connected", self.entity))
            .clone();
        PortPut {
            state,
            value: RefCell::new(Some(value)),
            done: RefCell::new(false),
        }
    }
}

/// Future returned by [`OutPort::put`].
pub struct PortPut<T>
where
    T: SimObject,
{
    state: Rc<PortState<T>>,
    value: RefCell<Option<T>>,
    done: RefCell<bool>,
}

impl<T> Future for PortPut<T>
where
    T: SimObject,
{
    type Output = SimResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.state.value.borrow().is_none() {
            match self.value.take() {
                Some(value) => {
                    // Space in the port, send the value and wake the
                    // receiver
                    *self.state.value.borrow_mut() = Some(value);
                    if let Some(waker) = self.state.waiting_get.borrow_mut().take() {
                        waker.wake();
                    }
                    *self.state.waiting_put.borrow_mut() = Some(cx.waker().clone());
                    Poll::Pending
                }
                None => {
                    // Value already sent, woken because it has been consumed
                    *self.done.borrow_mut() = true;
                    Poll::Ready(Ok(()))
                }
            }
        } else {
            // Port already full - wait for it to be consumed
            *self.state.waiting_put.borrow_mut() = Some(cx.waker().clone());
            Poll::Pending
        }
    }
}

impl<T> FusedFuture for PortPut<T>
where
    T: SimObject,
{
    fn is_terminated(&self) -> bool {
        *self.done.borrow()
    }
}

/// Future returned by [`InPort::get`].
pub struct PortGet<T>
where
    T: SimObject,
{
    state: Rc<PortState<T>>,
    done: bool,
}

impl<T> Future for PortGet<T>
where
    T: SimObject,
{
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let value = self.state.value.borrow_mut().take();
        match value {
            Some(value) => {
                self.done = true;
                if let Some(waker) = self.state.waiting_put.borrow_mut().take() {
                    waker.wake();
                }
                Poll::Ready(value)
            }
            None => {
                if let Some(waker) = self.state.waiting_put.borrow_mut().take() {
                    waker.wake();
                }
                *self.state.waiting_get.borrow_mut() = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

impl<T> FusedFuture for PortGet<T>
where
    T: SimObject,
{
    fn is_terminated(&self) -> bool {
        self.done
    }
}
