//! Simulated calls
//!
//! A [`SimulatedCall`] wraps one canned outcome with the latency and failure
//! injection of a [`NetworkBehavior`]. It runs at most once, either blocking
//! on the caller's thread ([`SimulatedCall::execute`]) or on an execution
//! backend with a callback ([`SimulatedCall::enqueue`]). Both paths share one
//! resolution routine, so cancellation and failure semantics are identical.
//!
//! # Lifecycle
//!
//! ```text
//! Created ──execute/enqueue──▶ Running ──delay elapsed──▶ Completed | Failed
//!    │                            │
//!    └──cancel──▶ Canceled ◀──────┘ cancel (observed before commit)
//! ```
//!
//! Cancellation wins whenever it is recorded before the terminal state is
//! committed. After the commit, `cancel()` is a no-op.

use crate::behavior::NetworkBehavior;
use crate::delay::{CancellableDelay, DelayOutcome};
use crate::errors::{CallError, FailureCause};
use crate::executor::CallExecutor;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Pre-scripted result of one invocation
#[derive(Debug, Clone)]
pub enum CannedOutcome<T> {
    /// Successful response value
    Response(T),
    /// Failure cause, delivered with the same identity
    Failure(FailureCause),
}

impl<T> CannedOutcome<T> {
    /// A successful response
    pub fn response(value: T) -> Self {
        Self::Response(value)
    }

    /// A failure built from an owned error
    pub fn failure(cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Failure(Arc::new(cause))
    }

    /// A failure that keeps the identity of an existing cause
    pub fn failure_shared(cause: FailureCause) -> Self {
        Self::Failure(cause)
    }

    /// True for a canned failure
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }
}

/// Observable call lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// Not yet executed
    Created,
    /// Executing or enqueued
    Running,
    /// Delivered the canned response
    Completed,
    /// Delivered a canned or injected failure
    Failed,
    /// Delivered (or will deliver) the cancellation failure
    Canceled,
}

impl CallState {
    /// True for states no transition leaves
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Canceled)
    }
}

struct Lifecycle<T> {
    state: CallState,
    canceled: bool,
    // Taken by the single permitted execution.
    outcome: Option<CannedOutcome<T>>,
}

struct CallShared<T> {
    operation: Arc<str>,
    behavior: Arc<NetworkBehavior>,
    executor: Arc<dyn CallExecutor>,
    lifecycle: Mutex<Lifecycle<T>>,
    delay: CancellableDelay,
}

impl<T> CallShared<T> {
    /// Claim the canned outcome, rejecting a second execution
    fn start(&self) -> Result<CannedOutcome<T>, CallError> {
        let mut lifecycle = self.lifecycle.lock();
        let outcome = lifecycle.outcome.take().ok_or(CallError::AlreadyExecuted)?;
        if lifecycle.state == CallState::Created {
            lifecycle.state = CallState::Running;
        }
        Ok(outcome)
    }

    /// decide → wait → resolve; runs exactly once per call
    fn run(&self, outcome: CannedOutcome<T>) -> Result<T, CallError> {
        if self.lifecycle.lock().canceled {
            return self.finish_canceled();
        }

        let (decision, snapshot) = self.behavior.decide();
        debug!(
            operation = %self.operation,
            delay_ms = decision.delay.as_millis() as u64,
            forced_failure = decision.forced_failure,
            "simulated call started"
        );

        if self.delay.wait(decision.delay) == DelayOutcome::Aborted {
            return self.finish_canceled();
        }

        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.canceled {
            drop(lifecycle);
            return self.finish_canceled();
        }

        let result = if decision.forced_failure {
            Err(CallError::Injected(snapshot.failure_exception))
        } else {
            match outcome {
                CannedOutcome::Response(value) => Ok(value),
                CannedOutcome::Failure(cause) => Err(CallError::Failed(cause)),
            }
        };
        lifecycle.state = if result.is_ok() {
            CallState::Completed
        } else {
            CallState::Failed
        };
        debug!(operation = %self.operation, state = ?lifecycle.state, "simulated call resolved");
        result
    }

    fn finish_canceled(&self) -> Result<T, CallError> {
        self.lifecycle.lock().state = CallState::Canceled;
        debug!(operation = %self.operation, "simulated call canceled");
        Err(CallError::Canceled)
    }
}

trait Cancel: Send + Sync {
    fn cancel(&self);
    fn is_canceled(&self) -> bool;
}

impl<T: Send> Cancel for CallShared<T> {
    fn cancel(&self) {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.state.is_terminal() {
            return;
        }
        lifecycle.canceled = true;
        if lifecycle.state == CallState::Created {
            lifecycle.state = CallState::Canceled;
        }
        drop(lifecycle);

        self.delay.abort();
        trace!(operation = %self.operation, "cancel requested");
    }

    fn is_canceled(&self) -> bool {
        self.lifecycle.lock().canceled
    }
}

/// One invocation of a mocked remote operation
pub struct SimulatedCall<T> {
    shared: Arc<CallShared<T>>,
}

impl<T: Send + 'static> SimulatedCall<T> {
    /// Wrap `outcome` with the latency and failure injection of `behavior`
    pub fn new(
        operation: impl Into<Arc<str>>,
        outcome: CannedOutcome<T>,
        behavior: Arc<NetworkBehavior>,
        executor: Arc<dyn CallExecutor>,
    ) -> Self {
        Self {
            shared: Arc::new(CallShared {
                operation: operation.into(),
                behavior,
                executor,
                lifecycle: Mutex::new(Lifecycle {
                    state: CallState::Created,
                    canceled: false,
                    outcome: Some(outcome),
                }),
                delay: CancellableDelay::new(),
            }),
        }
    }

    /// Run the call on the current thread.
    ///
    /// Blocks for the realized delay unless canceled. Returns
    /// [`CallError::AlreadyExecuted`] immediately if the call already ran.
    pub fn execute(&self) -> Result<T, CallError> {
        let outcome = self.shared.start()?;
        self.shared.run(outcome)
    }

    /// Run the call on the execution backend and report through `callback`.
    ///
    /// The callback is invoked exactly once, on the backend's thread. A second
    /// `enqueue` (or an `enqueue` after `execute`) is rejected synchronously
    /// and never reaches the callback.
    pub fn enqueue<F>(&self, callback: F) -> Result<(), CallError>
    where
        F: FnOnce(Result<T, CallError>) + Send + 'static,
    {
        let outcome = self.shared.start()?;
        let shared = self.shared.clone();
        self.shared.executor.execute(Box::new(move || {
            let result = shared.run(outcome);
            callback(result);
        }));
        Ok(())
    }

    /// Request cancellation; idempotent and callable from any thread
    pub fn cancel(&self) {
        Cancel::cancel(&*self.shared);
    }

    /// True once cancellation was requested before a terminal outcome
    pub fn is_canceled(&self) -> bool {
        Cancel::is_canceled(&*self.shared)
    }

    /// A cloneable handle for canceling this call from another thread
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            target: self.shared.clone(),
        }
    }
}

impl<T> SimulatedCall<T> {
    /// True once `execute` or `enqueue` has been called
    pub fn is_executed(&self) -> bool {
        self.shared.lifecycle.lock().outcome.is_none()
    }

    /// Current lifecycle state
    pub fn state(&self) -> CallState {
        self.shared.lifecycle.lock().state
    }

    /// Name of the operation this call was created for
    pub fn operation(&self) -> &str {
        &self.shared.operation
    }
}

impl<T> fmt::Debug for SimulatedCall<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedCall")
            .field("operation", &self.shared.operation)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Cross-thread cancellation handle for one call
#[derive(Clone)]
pub struct CancelHandle {
    target: Arc<dyn Cancel>,
}

impl CancelHandle {
    /// Request cancellation of the call
    pub fn cancel(&self) {
        self.target.cancel();
    }

    /// True once cancellation was requested before a terminal outcome
    pub fn is_canceled(&self) -> bool {
        self.target.is_canceled()
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("canceled", &self.is_canceled())
            .finish()
    }
}
