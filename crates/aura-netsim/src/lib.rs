//! Aura Netsim - Simulated Network Behavior for Mocked Calls
//!
//! Wraps pre-scripted call results with simulated latency and failure
//! injection so clients of a remote-call layer can be tested without a real
//! network. A test declares "calls take ~100ms, vary by X%, fail Y% of the
//! time" once, and every invocation made through the mock network honors it.
//!
//! # Components
//!
//! - [`RandomSource`]: seeded ChaCha generator, owned per behavior
//! - [`BehaviorConfig`] / [`BehaviorSettings`]: live configuration and its
//!   TOML / environment form
//! - [`BehaviorEngine`]: turns a configuration snapshot into a [`Decision`]
//! - [`CancellableDelay`]: interruptible timed wait
//! - [`SimulatedCall`]: one invocation, blocking or callback driven
//! - [`MockNetwork`], [`BoundOperation`], [`MockService`]: bind outcome
//!   sources to fresh calls and supply the execution backend
//!
//! # Example
//!
//! ```rust,no_run
//! use aura_netsim::{CannedOutcome, MockNetwork, NetworkBehavior};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let behavior = Arc::new(NetworkBehavior::seeded(2847));
//! behavior.set_delay(Duration::from_millis(100));
//! behavior.set_variance_percent(0);
//! behavior.set_failure_percent(0);
//!
//! let network = MockNetwork::with_thread_executor(behavior);
//! let response = network.bind("response", || CannedOutcome::response("Response!"));
//!
//! // Blocks for ~100ms.
//! assert_eq!(response.call().execute().unwrap(), "Response!");
//!
//! // Same rules, delivered on a backend thread.
//! response
//!     .call()
//!     .enqueue(|result| println!("{result:?}"))
//!     .unwrap();
//! ```

#![forbid(unsafe_code)]

/// Binding outcome sources to simulated calls
pub mod adapter;

/// Network behavior facade
pub mod behavior;

/// Simulated call state machine
pub mod call;

/// Behavior configuration and settings
pub mod config;

/// Interruptible delay
pub mod delay;

/// Randomized decision engine
pub mod engine;

/// Error types
pub mod errors;

/// Execution backends
pub mod executor;

/// Seeded random source
pub mod random;

pub use adapter::{BoundOperation, MockNetwork, MockService, OutcomeSource};
pub use behavior::NetworkBehavior;
pub use call::{CallState, CancelHandle, CannedOutcome, SimulatedCall};
pub use config::{BehaviorConfig, BehaviorSettings, BehaviorSnapshot};
pub use delay::{CancellableDelay, DelayOutcome};
pub use engine::{BehaviorEngine, Decision};
pub use errors::{CallError, FailureCause, MockFailure, NetSimError, Result};
pub use executor::{CallExecutor, Task, ThreadExecutor, TokioExecutor};
pub use random::RandomSource;
