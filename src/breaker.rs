//! Call executor gating protected operations behind per-service circuits.
//!
//! [`CircuitBreaker`] is the public entry point: it resolves the named
//! circuit, applies the admission decision, runs the operation with no lock
//! held, classifies the outcome, and feeds it back into the state machine.
//! Every call returns a structured [`CallOutcome`]; operation errors never
//! surface as `Err` from [`CircuitBreaker::call`].
//!
//! The breaker is an admission gate, not a retry engine: it never retries,
//! never sleeps, and imposes no timeout of its own. A caller wanting retries
//! re-invokes the breaker, and each invocation is evaluated independently.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::CircuitConfig;
use crate::error::{CallError, ConfigError, ErrorKind};
use crate::record::{now_secs, Admission, FailFastReason};
use crate::registry::{CircuitRegistry, CircuitSnapshot, ServiceCircuit};
use crate::state::CircuitState;

/// Uniform result of one gated call
#[derive(Debug)]
pub enum CallOutcome<T> {
    /// The operation ran and succeeded
    Success {
        data: T,
        response_time: Duration,
        circuit_state: CircuitState,
        health_score: u8,
    },
    /// The operation ran and failed
    Failure {
        error: CallError,
        response_time: Duration,
        circuit_state: CircuitState,
        health_score: u8,
    },
    /// The call was rejected before the operation ran
    FailFast {
        reason: FailFastReason,
        circuit_state: CircuitState,
        health_score: u8,
    },
}

impl<T> CallOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, CallOutcome::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, CallOutcome::Failure { .. })
    }

    pub fn is_fail_fast(&self) -> bool {
        matches!(self, CallOutcome::FailFast { .. })
    }

    /// Circuit state observed right after the outcome was applied
    pub fn circuit_state(&self) -> CircuitState {
        match self {
            CallOutcome::Success { circuit_state, .. }
            | CallOutcome::Failure { circuit_state, .. }
            | CallOutcome::FailFast { circuit_state, .. } => *circuit_state,
        }
    }

    pub fn health_score(&self) -> u8 {
        match self {
            CallOutcome::Success { health_score, .. }
            | CallOutcome::Failure { health_score, .. }
            | CallOutcome::FailFast { health_score, .. } => *health_score,
        }
    }

    /// Elapsed time of the protected operation, if it ran
    pub fn response_time(&self) -> Option<Duration> {
        match self {
            CallOutcome::Success { response_time, .. }
            | CallOutcome::Failure { response_time, .. } => Some(*response_time),
            CallOutcome::FailFast { .. } => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            CallOutcome::Success { data, .. } => Some(data),
            _ => None,
        }
    }
}

/// Records a `Cancelled` failure if the call future is dropped mid-flight,
/// so an abandoned operation still reaches the bookkeeping.
struct CancelGuard<'a> {
    circuit: &'a ServiceCircuit,
    started: Instant,
    armed: bool,
}

impl Drop for CancelGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let elapsed = self.started.elapsed();
            let mut record = self.circuit.lock();
            record.record_failure(
                self.circuit.name(),
                self.circuit.config(),
                now_secs(),
                elapsed.as_secs_f64(),
                ErrorKind::Cancelled,
            );
        }
    }
}

/// Admission gate for calls to named remote services.
///
/// Cheap to clone; clones share the same registry. One instance per process
/// is the intended shape, constructed at startup next to the transport it
/// protects.
#[derive(Clone)]
pub struct CircuitBreaker {
    registry: Arc<CircuitRegistry>,
    default_config: CircuitConfig,
}

impl CircuitBreaker {
    /// Breaker with default per-service config
    pub fn new() -> Self {
        Self {
            registry: Arc::new(CircuitRegistry::new()),
            default_config: CircuitConfig::default(),
        }
    }

    /// Breaker whose unconfigured services use `config`.
    ///
    /// Fails fast on out-of-range values, before any call is attempted.
    pub fn with_config(config: CircuitConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            registry: Arc::new(CircuitRegistry::new()),
            default_config: config,
        })
    }

    /// Register `service` with its own config.
    ///
    /// Validates before the record is constructed. If the service already
    /// has a record the existing config is kept (first writer wins).
    pub fn configure(&self, service: &str, config: CircuitConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.registry.get_or_create(service, &config);
        Ok(())
    }

    pub fn registry(&self) -> &CircuitRegistry {
        &self.registry
    }

    pub fn snapshot(&self, service: &str) -> Option<CircuitSnapshot> {
        self.registry.snapshot(service)
    }

    pub fn snapshots(&self) -> Vec<CircuitSnapshot> {
        self.registry.snapshots()
    }

    /// Run `op` through the circuit for `service`.
    ///
    /// The record lock is held only for the admission decision and the
    /// outcome bookkeeping; the operation itself awaits unlocked, so a slow
    /// remote never blocks other callers of the same service.
    pub async fn call<T, E, F, Fut>(&self, service: &str, op: F) -> CallOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<CallError>,
    {
        let circuit = self.registry.get_or_create(service, &self.default_config);

        let admission = {
            let mut record = circuit.lock();
            record.admit(service, circuit.config(), now_secs())
        };
        if let Admission::Reject(reason) = admission {
            let record = circuit.lock();
            return CallOutcome::FailFast {
                reason,
                circuit_state: record.state(),
                health_score: record.health_score(),
            };
        }

        let started = Instant::now();
        let mut guard = CancelGuard {
            circuit: circuit.as_ref(),
            started,
            armed: true,
        };
        let result = op().await;
        guard.armed = false;
        let elapsed = started.elapsed();

        match result {
            Ok(data) => {
                let mut record = circuit.lock();
                record.record_success(
                    service,
                    circuit.config(),
                    now_secs(),
                    elapsed.as_secs_f64(),
                );
                CallOutcome::Success {
                    data,
                    response_time: elapsed,
                    circuit_state: record.state(),
                    health_score: record.health_score(),
                }
            }
            Err(err) => {
                let error: CallError = err.into();
                let mut record = circuit.lock();
                record.record_failure(
                    service,
                    circuit.config(),
                    now_secs(),
                    elapsed.as_secs_f64(),
                    error.kind(),
                );
                CallOutcome::Failure {
                    error,
                    response_time: elapsed,
                    circuit_state: record.state(),
                    health_score: record.health_score(),
                }
            }
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}
