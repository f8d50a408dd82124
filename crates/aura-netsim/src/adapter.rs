//! Binding canned-outcome sources to simulated calls
//!
//! [`MockNetwork`] owns the shared behavior and execution backend. Operations
//! are bound either one at a time ([`BoundOperation`]) or by name in a
//! [`MockService`] registry. Every invocation produces a brand new
//! [`SimulatedCall`]; calls are never cached or shared between invocations.

use crate::behavior::NetworkBehavior;
use crate::call::{CannedOutcome, SimulatedCall};
use crate::errors::{NetSimError, Result};
use crate::executor::{CallExecutor, ThreadExecutor};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Produces the canned outcome for one logical operation.
///
/// Sources know nothing about timing or cancellation; they are asked once per
/// invocation.
pub trait OutcomeSource<T>: Send + Sync {
    /// Canned outcome for the next invocation
    fn produce(&self) -> CannedOutcome<T>;
}

impl<T, F> OutcomeSource<T> for F
where
    F: Fn() -> CannedOutcome<T> + Send + Sync,
{
    fn produce(&self) -> CannedOutcome<T> {
        self()
    }
}

/// Shared behavior plus the backend used by enqueued calls
#[derive(Clone)]
pub struct MockNetwork {
    behavior: Arc<NetworkBehavior>,
    executor: Arc<dyn CallExecutor>,
}

impl MockNetwork {
    /// Combine a behavior with an execution backend
    pub fn new(behavior: Arc<NetworkBehavior>, executor: Arc<dyn CallExecutor>) -> Self {
        Self { behavior, executor }
    }

    /// Use a [`ThreadExecutor`] for enqueued calls
    pub fn with_thread_executor(behavior: Arc<NetworkBehavior>) -> Self {
        Self::new(behavior, Arc::new(ThreadExecutor::default()))
    }

    /// The shared behavior
    pub fn behavior(&self) -> &Arc<NetworkBehavior> {
        &self.behavior
    }

    /// The execution backend
    pub fn executor(&self) -> &Arc<dyn CallExecutor> {
        &self.executor
    }

    /// Wrap a single canned outcome in a new call
    pub fn wrap<T: Send + 'static>(
        &self,
        operation: impl Into<Arc<str>>,
        outcome: CannedOutcome<T>,
    ) -> SimulatedCall<T> {
        SimulatedCall::new(
            operation,
            outcome,
            self.behavior.clone(),
            self.executor.clone(),
        )
    }

    /// Bind one operation to its outcome source
    pub fn bind<T, S>(&self, operation: impl Into<Arc<str>>, source: S) -> BoundOperation<T>
    where
        T: Send + 'static,
        S: OutcomeSource<T> + 'static,
    {
        BoundOperation {
            network: self.clone(),
            operation: operation.into(),
            source: Arc::new(source),
        }
    }

    /// Start an empty registry of operations producing `T`
    pub fn service<T: Send + 'static>(&self) -> MockService<T> {
        MockService {
            network: self.clone(),
            operations: IndexMap::new(),
        }
    }
}

impl fmt::Debug for MockNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockNetwork")
            .field("behavior", &self.behavior)
            .finish_non_exhaustive()
    }
}

/// A single operation bound to an outcome source
pub struct BoundOperation<T> {
    network: MockNetwork,
    operation: Arc<str>,
    source: Arc<dyn OutcomeSource<T>>,
}

impl<T: Send + 'static> BoundOperation<T> {
    /// Invoke the operation, producing a fresh call
    pub fn call(&self) -> SimulatedCall<T> {
        trace!(operation = %self.operation, "invoking bound operation");
        self.network
            .wrap(self.operation.clone(), self.source.produce())
    }
}

impl<T> BoundOperation<T> {
    /// Operation name
    pub fn name(&self) -> &str {
        &self.operation
    }
}

impl<T> Clone for BoundOperation<T> {
    fn clone(&self) -> Self {
        Self {
            network: self.network.clone(),
            operation: self.operation.clone(),
            source: self.source.clone(),
        }
    }
}

impl<T> fmt::Debug for BoundOperation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundOperation")
            .field("operation", &self.operation)
            .finish_non_exhaustive()
    }
}

/// Registry of named operations, all producing `T`
pub struct MockService<T> {
    network: MockNetwork,
    operations: IndexMap<String, BoundOperation<T>>,
}

impl<T: Send + 'static> MockService<T> {
    /// Register `source` under `name`; names must be unique
    pub fn register<S>(&mut self, name: impl Into<String>, source: S) -> Result<()>
    where
        S: OutcomeSource<T> + 'static,
    {
        let name = name.into();
        if self.operations.contains_key(&name) {
            return Err(NetSimError::invalid(format!(
                "operation '{name}' is already registered"
            )));
        }
        let bound = self.network.bind(name.as_str(), source);
        self.operations.insert(name, bound);
        debug!(operations = self.operations.len(), "mock operation registered");
        Ok(())
    }

    /// Builder form of [`MockService::register`]
    pub fn with_operation<S>(mut self, name: impl Into<String>, source: S) -> Result<Self>
    where
        S: OutcomeSource<T> + 'static,
    {
        self.register(name, source)?;
        Ok(self)
    }

    /// Invoke `name`, producing a fresh call
    pub fn invoke(&self, name: &str) -> Result<SimulatedCall<T>> {
        self.operations
            .get(name)
            .map(BoundOperation::call)
            .ok_or_else(|| NetSimError::not_found(format!("operation '{name}'")))
    }
}

impl<T> MockService<T> {
    /// Look up a bound operation
    pub fn operation(&self, name: &str) -> Option<&BoundOperation<T>> {
        self.operations.get(name)
    }

    /// Registered operation names in registration order
    pub fn operations(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    /// Number of registered operations
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl<T> fmt::Debug for MockService<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockService")
            .field("operations", &self.operations.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::CallState;
    use crate::errors::MockFailure;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn network() -> MockNetwork {
        let behavior = NetworkBehavior::seeded(2847);
        behavior.set_delay(Duration::ZERO);
        behavior.set_variance_percent(0);
        behavior.set_failure_percent(0);
        MockNetwork::with_thread_executor(Arc::new(behavior))
    }

    #[test]
    fn test_bound_operation_yields_fresh_calls() {
        let produced = Arc::new(AtomicUsize::new(0));
        let counter = produced.clone();
        let op = network().bind("response", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            CannedOutcome::response("Response!".to_string())
        });

        let first = op.call();
        let second = op.call();
        assert_eq!(produced.load(Ordering::SeqCst), 2);

        assert_eq!(first.execute().unwrap(), "Response!");
        assert_eq!(second.state(), CallState::Created);
        assert_eq!(second.execute().unwrap(), "Response!");
        assert_eq!(op.name(), "response");
        assert_eq!(first.operation(), "response");
    }

    #[test]
    fn test_network_exposes_shared_parts() {
        let network = network();
        let (tx, rx) = std::sync::mpsc::channel();
        network.executor().execute(Box::new(move || tx.send(()).unwrap()));
        rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(network.behavior().failure_percent(), 0);

        assert!(CannedOutcome::<u32>::failure(MockFailure::new("Timeout!")).is_failure());
        assert!(!CannedOutcome::response(1u32).is_failure());
    }

    #[test]
    fn test_service_registry() {
        let mut service = network().service::<String>();
        assert!(service.is_empty());
        service
            .register("response", || CannedOutcome::response("ok".to_string()))
            .unwrap();
        service
            .register("failure", || CannedOutcome::failure(MockFailure::new("Timeout!")))
            .unwrap();

        assert_eq!(service.operations().collect::<Vec<_>>(), ["response", "failure"]);
        assert_eq!(service.invoke("response").unwrap().execute().unwrap(), "ok");
        let err = service.invoke("failure").unwrap().execute().unwrap_err();
        assert_eq!(err.to_string(), "Timeout!");
        assert!(service.operation("failure").is_some());
    }

    #[test]
    fn test_service_rejects_duplicates_and_unknown() {
        let mut service = network()
            .service::<u32>()
            .with_operation("one", || CannedOutcome::response(1))
            .unwrap();

        let err = service
            .register("one", || CannedOutcome::response(2))
            .unwrap_err();
        assert!(matches!(err, NetSimError::Invalid { .. }));

        let err = service.invoke("two").unwrap_err();
        assert!(matches!(err, NetSimError::NotFound { .. }));
        assert_eq!(service.len(), 1);
    }
}
