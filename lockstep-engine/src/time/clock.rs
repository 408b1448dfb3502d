//! The simulation clock.
//!
//! Time is a monotonically increasing tick count. Components request
//! delays with [`Clock::wait_ticks`] or absolute deadlines with
//! [`Clock::wait_until`]; the executor advances the clock to the earliest
//! pending wake-up whenever no task is runnable. A wait registered with
//! [`Clock::wait_ticks_or_exit`] is a background wait: it never keeps the
//! simulation alive on its own.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

/// A parked task along with whether the simulation may end without waking
/// it.
struct TaskWaker {
    waker: Waker,
    can_exit: bool,
}

/// All tasks waiting for one particular tick.
struct Pending {
    tick: u64,
    wakers: Vec<TaskWaker>,
}

/// Shared state between futures using a Clock and the Clock itself.
struct ClockState {
    now: Cell<u64>,

    /// Queue of pending wake-ups, kept sorted by tick so that the first
    /// entry is the next to be woken.
    waiting: RefCell<Vec<Pending>>,
}

impl ClockState {
    fn schedule(&self, tick: u64, cx: &mut Context<'_>, can_exit: bool) {
        let mut waiting = self.waiting.borrow_mut();
        let task_waker = TaskWaker {
            waker: cx.waker().clone(),
            can_exit,
        };
        match waiting.binary_search_by_key(&tick, |p| p.tick) {
            Ok(index) => waiting[index].wakers.push(task_waker),
            Err(index) => waiting.insert(
                index,
                Pending {
                    tick,
                    wakers: vec![task_waker],
                },
            ),
        }
    }
}

/// Handle on the simulation clock.
///
/// This is a thin wrapper (using [`Rc`]) around the shared clock state so
/// that it can be cloned and passed to every component.
#[derive(Clone)]
pub struct Clock {
    shared_state: Rc<ClockState>,
}

impl Clock {
    /// Create a new clock at tick zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared_state: Rc::new(ClockState {
                now: Cell::new(0),
                waiting: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Returns the current tick.
    #[must_use]
    pub fn tick_now(&self) -> u64 {
        self.shared_state.now.get()
    }

    /// Returns a [ClockDelay] future which must be `await`ed to delay the
    /// specified number of ticks.
    #[must_use = "Futures do nothing unless you `.await` or otherwise use them"]
    pub fn wait_ticks(&self, ticks: u64) -> ClockDelay {
        self.delay_until(self.tick_now() + ticks, false)
    }

    /// Returns a [ClockDelay] future which completes at the given absolute
    /// tick. A deadline at or before the current tick completes without
    /// suspending, so periodic tasks can run on a drift-free cadence.
    #[must_use = "Futures do nothing unless you `.await` or otherwise use them"]
    pub fn wait_until(&self, tick: u64) -> ClockDelay {
        self.delay_until(tick, false)
    }

    /// Returns a [ClockDelay] future which must be `await`ed to delay the
    /// specified number of ticks. However, if the remainder of the
    /// simulation completes then this future is allowed to not complete.
    /// This allows the user to create tasks that run continuously as long
    /// as the rest of the simulation continues to run.
    #[must_use = "Futures do nothing unless you `.await` or otherwise use them"]
    pub fn wait_ticks_or_exit(&self, ticks: u64) -> ClockDelay {
        self.delay_until(self.tick_now() + ticks, true)
    }

    fn delay_until(&self, until: u64, can_exit: bool) -> ClockDelay {
        ClockDelay {
            shared_state: self.shared_state.clone(),
            until,
            scheduled: false,
            can_exit,
        }
    }

    /// Advance to the earliest pending wake-up.
    ///
    /// Returns the wakers for that tick, or `None` if no wake-up remains
    /// that must keep the simulation alive.
    pub(crate) fn advance(&self) -> Option<Vec<Waker>> {
        let mut waiting = self.shared_state.waiting.borrow_mut();
        if waiting
            .iter()
            .all(|p| p.wakers.iter().all(|w| w.can_exit))
        {
            // Nothing left but background waits (or nothing at all).
            return None;
        }
        let pending = waiting.remove(0);
        drop(waiting);

        assert!(
            pending.tick >= self.shared_state.now.get(),
            "Time moving backwards"
        );
        self.shared_state.now.set(pending.tick);
        Some(pending.wakers.into_iter().map(|w| w.waker).collect())
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// Future returned by the clock to manage advancing time using async
/// functions.
pub struct ClockDelay {
    shared_state: Rc<ClockState>,
    until: u64,
    scheduled: bool,
    can_exit: bool,
}

impl Future for ClockDelay {
    type Output = ();
    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.scheduled || self.until <= self.shared_state.now.get() {
            Poll::Ready(())
        } else {
            self.shared_state.schedule(self.until, cx, self.can_exit);
            self.scheduled = true;
            Poll::Pending
        }
    }
}
