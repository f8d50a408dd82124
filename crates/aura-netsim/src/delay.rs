//! Interruptible timed wait
//!
//! [`CancellableDelay`] parks the executing thread on a condition variable
//! until the deadline passes or another thread calls [`CancellableDelay::abort`].
//! Aborting before the wait starts makes the next wait return immediately;
//! aborting after a wait completed has no effect.

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};
use tracing::trace;

/// How a delay ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayOutcome {
    /// The full duration elapsed
    Completed,
    /// The delay was aborted before the deadline
    Aborted,
}

#[derive(Debug, Default)]
struct DelayState {
    aborted: bool,
    completed: bool,
}

/// One-shot cancellable delay
#[derive(Debug, Default)]
pub struct CancellableDelay {
    state: Mutex<DelayState>,
    wake: Condvar,
}

impl CancellableDelay {
    /// Create a delay that has neither run nor been aborted
    pub fn new() -> Self {
        Self::default()
    }

    /// Block the calling thread for `duration` unless aborted.
    ///
    /// Abort and expiry are both decided under the state lock: whichever is
    /// observed first wins, and an abort already recorded when the deadline
    /// passes still wins.
    pub fn wait(&self, duration: Duration) -> DelayOutcome {
        let mut state = self.state.lock();
        if state.aborted {
            return DelayOutcome::Aborted;
        }
        let deadline = Instant::now().checked_add(duration);
        trace!(delay_ms = duration.as_millis() as u64, "delay started");

        loop {
            if state.aborted {
                trace!("delay aborted");
                return DelayOutcome::Aborted;
            }
            match deadline {
                Some(deadline) if Instant::now() < deadline => {
                    self.wake.wait_until(&mut state, deadline);
                }
                Some(_) => {
                    state.completed = true;
                    return DelayOutcome::Completed;
                }
                // Too far in the future to represent: only an abort ends it.
                None => self.wake.wait(&mut state),
            }
        }
    }

    /// Abort a pending or future wait.
    ///
    /// Returns `false` when the delay had already completed, in which case
    /// nothing changes.
    pub fn abort(&self) -> bool {
        let mut state = self.state.lock();
        if state.completed {
            return false;
        }
        state.aborted = true;
        drop(state);
        self.wake.notify_all();
        true
    }

    /// True once an abort has been recorded
    pub fn is_aborted(&self) -> bool {
        self.state.lock().aborted
    }

    /// True once a wait ran to its deadline
    pub fn is_completed(&self) -> bool {
        self.state.lock().completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_wait_completes_after_duration() {
        let delay = CancellableDelay::new();
        let start = Instant::now();
        assert_eq!(delay.wait(Duration::from_millis(50)), DelayOutcome::Completed);
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert!(delay.is_completed());
    }

    #[test]
    fn test_zero_duration_completes() {
        let delay = CancellableDelay::new();
        assert_eq!(delay.wait(Duration::ZERO), DelayOutcome::Completed);
    }

    #[test]
    fn test_abort_before_wait_returns_immediately() {
        let delay = CancellableDelay::new();
        assert!(delay.abort());
        let start = Instant::now();
        assert_eq!(delay.wait(Duration::from_secs(10)), DelayOutcome::Aborted);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_abort_during_wait() {
        let delay = Arc::new(CancellableDelay::new());
        let aborter = {
            let delay = delay.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                delay.abort()
            })
        };

        let start = Instant::now();
        assert_eq!(delay.wait(Duration::from_secs(10)), DelayOutcome::Aborted);
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(aborter.join().unwrap());
    }

    #[test]
    fn test_abort_after_completion_has_no_effect() {
        let delay = CancellableDelay::new();
        assert_eq!(delay.wait(Duration::from_millis(1)), DelayOutcome::Completed);
        assert!(!delay.abort());
        assert!(!delay.is_aborted());
    }

    #[test]
    fn test_abort_racing_expiry_resolves_to_one_outcome() {
        for _ in 0..50 {
            let delay = Arc::new(CancellableDelay::new());
            let aborter = {
                let delay = delay.clone();
                thread::spawn(move || {
                    thread::sleep(Duration::from_millis(2));
                    delay.abort()
                })
            };
            let outcome = delay.wait(Duration::from_millis(2));
            let abort_took_effect = aborter.join().unwrap();
            match outcome {
                DelayOutcome::Aborted => assert!(abort_took_effect),
                DelayOutcome::Completed => assert!(!abort_took_effect),
            }
        }
    }
}
