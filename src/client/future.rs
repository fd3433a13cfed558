//! Cancellable result handle for asynchronous controller calls.
//!
//! Every call is backed by a [`PendingCall`]. Its owner field decides, in one place,
//! whether a worker's completion or a canceller wins:
//!
//! ```text
//! Unclaimed --worker claims--> Worker --canceller takes over--> Canceller --worker leaves--> Vacated
//!     |                          |                                                          ^
//!     +--canceller first---------+----------------worker finishes---------------------------+
//! ```
//!
//! The worker only publishes a result while it still holds `Worker`; a canceller that
//! displaced a running worker waits on the condition variable until the worker has
//! left. The worker's interrupt flag stays with the `Canceller` state, so it is raised
//! at most once, by whichever canceller first asks for it. Lock order is always owner,
//! then slot.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll, Waker};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use serde_json::Value;
use tracing::{debug, warn};

use crate::controller::OperationResponse;
use crate::error::{ClientError, ClientResult};
use crate::identity::Interrupt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FutureStatus {
    Waiting,
    Complete,
    Failed,
    Cancelled,
}

/// Terminal state of a call. Cancellation is its own state, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome<T> {
    Completed(T),
    Failed(ClientError),
    Cancelled,
}

impl<T> CallOutcome<T> {
    pub fn status(&self) -> FutureStatus {
        match self {
            CallOutcome::Completed(_) => FutureStatus::Complete,
            CallOutcome::Failed(_) => FutureStatus::Failed,
            CallOutcome::Cancelled => FutureStatus::Cancelled,
        }
    }

    pub fn is_cancelled(&self) -> bool { matches!(self, CallOutcome::Cancelled) }

    /// For callers that prefer `?`. A cancelled call becomes [`ClientError::Cancelled`].
    pub fn into_result(self) -> ClientResult<T> {
        match self {
            CallOutcome::Completed(v) => Ok(v),
            CallOutcome::Failed(e) => Err(e),
            CallOutcome::Cancelled => Err(ClientError::Cancelled),
        }
    }
}

/// Maps the controller's raw response into the caller-visible result type.
pub(crate) type ResponseConverter<T> = fn(OperationResponse) -> T;

/// Document-only shape. Streams are not wanted, so they are closed here.
pub(crate) fn to_response_node(mut response: OperationResponse) -> Value {
    if let Err(e) = response.close() {
        debug!(target: "modelgate::client", error = %e, "Caught exception closing response whose associated streams, if any, were not wanted");
    }
    response.into_response_node()
}

pub(crate) fn to_operation_response(response: OperationResponse) -> OperationResponse {
    response
}

#[derive(Debug)]
enum Owner {
    Unclaimed,
    Worker { thread: ThreadId, interrupt: Interrupt },
    Canceller { thread: ThreadId, worker: Interrupt, interrupted: bool },
    Vacated,
}

enum Slot<T> {
    Waiting(Vec<Waker>),
    Done(CallOutcome<T>),
}

pub(crate) struct PendingCall<T> {
    owner: Mutex<Owner>,
    vacated: Condvar,
    slot: Mutex<Slot<T>>,
    settled: Condvar,
    interrupts: AtomicUsize,
    converter: ResponseConverter<T>,
}

impl<T: Clone> PendingCall<T> {
    pub(crate) fn new(converter: ResponseConverter<T>) -> Arc<Self> {
        Arc::new(Self {
            owner: Mutex::new(Owner::Unclaimed),
            vacated: Condvar::new(),
            slot: Mutex::new(Slot::Waiting(Vec::new())),
            settled: Condvar::new(),
            interrupts: AtomicUsize::new(0),
            converter,
        })
    }

    /// Worker side. Returns the interrupt flag for this execution, or `None` when a
    /// canceller got there first, in which case the worker must not run the call.
    pub(crate) fn claim(&self) -> Option<Interrupt> {
        let mut owner = self.owner.lock();
        match *owner {
            Owner::Unclaimed => {
                let interrupt = Interrupt::new();
                *owner = Owner::Worker { thread: thread::current().id(), interrupt: interrupt.clone() };
                Some(interrupt)
            }
            _ => None,
        }
    }

    /// Worker side. Publishes `result` if the worker still owns the call, then vacates
    /// and wakes any canceller waiting for it.
    pub(crate) fn finish(&self, result: ClientResult<OperationResponse>) {
        let mut owner = self.owner.lock();
        match &*owner {
            Owner::Worker { .. } => match result {
                Ok(response) => self.handle_result(response),
                Err(e) => self.settle(CallOutcome::Failed(e)),
            },
            other => {
                debug!(target: "modelgate::client", owner = ?other, "discarding result of a call claimed by a canceller");
            }
        }
        *owner = Owner::Vacated;
        self.vacated.notify_all();
    }

    fn handle_result(&self, response: OperationResponse) {
        if response.is_cancelled() {
            self.settle(CallOutcome::Cancelled);
        } else {
            self.settle(CallOutcome::Completed((self.converter)(response)));
        }
    }

    /// Settles a call whose task was dropped before any worker claimed it.
    pub(crate) fn abandon(&self) {
        let mut owner = self.owner.lock();
        if matches!(*owner, Owner::Unclaimed) {
            *owner = Owner::Vacated;
            warn!(target: "modelgate::client", "executor dropped the call before it ran");
            self.settle(CallOutcome::Failed(ClientError::ExecutorRejected));
        }
    }

    pub(crate) fn cancel(&self, interrupt: bool) -> bool {
        let me = thread::current().id();
        let mut owner = self.owner.lock();
        match &mut *owner {
            Owner::Unclaimed => {
                // Never started; no worker will ever claim it now.
                *owner = Owner::Vacated;
            }
            Owner::Vacated => {}
            Owner::Worker { thread, interrupt: flag } => {
                let (worker, flag) = (*thread, flag.clone());
                if interrupt {
                    debug!(target: "modelgate::client", worker = ?worker, "interrupting running call");
                    self.raise(&flag);
                }
                *owner = Owner::Canceller { thread: me, worker: flag, interrupted: interrupt };
            }
            Owner::Canceller { thread, worker, interrupted } => {
                debug!(target: "modelgate::client", canceller = ?thread, "cancel already in progress");
                if interrupt && !*interrupted {
                    self.raise(worker);
                    *interrupted = true;
                }
            }
        }
        while matches!(*owner, Owner::Canceller { .. }) {
            self.vacated.wait(&mut owner);
        }
        // No-op when a result was already published.
        self.settle(CallOutcome::Cancelled);
        drop(owner);
        self.status() == FutureStatus::Cancelled
    }

    fn raise(&self, flag: &Interrupt) {
        flag.raise();
        self.interrupts.fetch_add(1, Ordering::SeqCst);
    }

    #[cfg(test)]
    fn interrupt_count(&self) -> usize { self.interrupts.load(Ordering::SeqCst) }

    #[cfg(test)]
    fn is_cancelling(&self) -> bool { matches!(*self.owner.lock(), Owner::Canceller { .. }) }

    /// Write-once; later outcomes are ignored.
    fn settle(&self, outcome: CallOutcome<T>) {
        let wakers = {
            let mut slot = self.slot.lock();
            match &mut *slot {
                Slot::Done(_) => return,
                Slot::Waiting(wakers) => {
                    let wakers = std::mem::take(wakers);
                    *slot = Slot::Done(outcome);
                    wakers
                }
            }
        };
        self.settled.notify_all();
        for w in wakers {
            w.wake();
        }
    }

    fn status(&self) -> FutureStatus {
        match &*self.slot.lock() {
            Slot::Waiting(_) => FutureStatus::Waiting,
            Slot::Done(outcome) => outcome.status(),
        }
    }

    fn get(&self) -> CallOutcome<T> {
        let mut slot = self.slot.lock();
        loop {
            if let Slot::Done(outcome) = &*slot {
                return outcome.clone();
            }
            self.settled.wait(&mut slot);
        }
    }

    fn wait_until(&self, deadline: Instant) -> FutureStatus {
        let mut slot = self.slot.lock();
        loop {
            if let Slot::Done(outcome) = &*slot {
                return outcome.status();
            }
            if self.settled.wait_until(&mut slot, deadline).timed_out() {
                return match &*slot {
                    Slot::Done(outcome) => outcome.status(),
                    Slot::Waiting(_) => FutureStatus::Waiting,
                };
            }
        }
    }

    fn poll_outcome(&self, waker: &Waker) -> Poll<CallOutcome<T>> {
        let mut slot = self.slot.lock();
        match &mut *slot {
            Slot::Done(outcome) => Poll::Ready(outcome.clone()),
            Slot::Waiting(wakers) => {
                if !wakers.iter().any(|w| w.will_wake(waker)) {
                    wakers.push(waker.clone());
                }
                Poll::Pending
            }
        }
    }
}

/// Handle returned by the asynchronous client calls. Clones share the same call.
/// Awaiting it and calling [`ResponseFuture::get`] both yield the terminal
/// [`CallOutcome`].
pub struct ResponseFuture<T> {
    call: Arc<PendingCall<T>>,
}

impl<T> Clone for ResponseFuture<T> {
    fn clone(&self) -> Self { Self { call: self.call.clone() } }
}

impl<T> std::fmt::Debug for ResponseFuture<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseFuture").finish_non_exhaustive()
    }
}

impl<T: Clone> ResponseFuture<T> {
    pub(crate) fn new(call: Arc<PendingCall<T>>) -> Self { Self { call } }

    pub fn status(&self) -> FutureStatus { self.call.status() }

    pub fn is_done(&self) -> bool { self.status() != FutureStatus::Waiting }

    /// Blocks until the call reaches a terminal state.
    pub fn get(&self) -> CallOutcome<T> { self.call.get() }

    /// Blocks for at most `timeout`; returns the status at that point.
    pub fn wait_timeout(&self, timeout: Duration) -> FutureStatus {
        self.call.wait_until(Instant::now() + timeout)
    }

    /// Cancel the call. With `interrupt`, a running worker's interrupt flag is raised.
    /// Blocks while a worker is executing the call and returns once it has left.
    /// Returns whether the call ended up cancelled; a call that already completed is
    /// left untouched.
    pub fn cancel(&self, interrupt: bool) -> bool { self.call.cancel(interrupt) }
}

impl<T: Clone> Future for ResponseFuture<T> {
    type Output = CallOutcome<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.call.poll_outcome(cx.waker())
    }
}

#[cfg(test)]
#[path = "future_tests.rs"]
mod tests;
