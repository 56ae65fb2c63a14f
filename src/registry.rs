//! Process-wide registry mapping service names to their circuits.
//!
//! The registry hands out `Arc<ServiceCircuit>` handles with get-or-create
//! semantics: the first reference to a name creates the record, every later
//! reference returns the same one. Records are never deleted; they live for
//! the life of the process and are never persisted.
//!
//! Locking is two-level. The registry map takes a `RwLock` held only for
//! lookup and the narrow create-if-absent path, so circuits for different
//! services never contend. Each circuit serializes its own admission and
//! bookkeeping through a per-record mutex.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock};
use serde::Serialize;

use crate::config::CircuitConfig;
use crate::error::ErrorKind;
use crate::record::{now_secs, CircuitRecord};
use crate::state::CircuitState;

/// A named circuit: immutable config plus the lock-guarded mutable record
pub struct ServiceCircuit {
    name: String,
    config: CircuitConfig,
    record: Mutex<CircuitRecord>,
}

impl ServiceCircuit {
    fn new(name: &str, config: CircuitConfig) -> Self {
        Self {
            name: name.to_string(),
            config,
            record: Mutex::new(CircuitRecord::new(now_secs())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Config frozen at record creation; later supplied configs are ignored
    pub fn config(&self) -> &CircuitConfig {
        &self.config
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, CircuitRecord> {
        self.record.lock()
    }

    /// Read-only copy of the circuit's observable state.
    ///
    /// Taking a snapshot never mutates the record; in particular an open
    /// circuit past its retry deadline stays open until a call probes it.
    pub fn snapshot(&self) -> CircuitSnapshot {
        let record = self.record.lock();
        CircuitSnapshot {
            service: self.name.clone(),
            state: record.state(),
            health_score: record.health_score(),
            total_requests: record.total_requests(),
            failure_count: record.failure_count(),
            success_count: record.success_count(),
            error_kinds: record.error_kinds().clone(),
        }
    }
}

/// Read-only view of one circuit, suitable for a dashboard or summary report
#[derive(Debug, Clone, Serialize)]
pub struct CircuitSnapshot {
    pub service: String,
    pub state: CircuitState,
    pub health_score: u8,
    pub total_requests: u64,
    pub failure_count: u64,
    pub success_count: u64,
    pub error_kinds: HashMap<ErrorKind, u64>,
}

/// Keyed store of circuits, created once and shared for the process lifetime
pub struct CircuitRegistry {
    circuits: RwLock<HashMap<String, Arc<ServiceCircuit>>>,
}

impl CircuitRegistry {
    pub fn new() -> Self {
        Self {
            circuits: RwLock::new(HashMap::new()),
        }
    }

    /// Return the circuit for `service`, creating it with `config` if this is
    /// the first reference. Concurrent creators for one unseen name converge
    /// on a single record; the first writer's config wins.
    pub fn get_or_create(&self, service: &str, config: &CircuitConfig) -> Arc<ServiceCircuit> {
        if let Some(circuit) = self.circuits.read().get(service) {
            return Arc::clone(circuit);
        }
        let mut circuits = self.circuits.write();
        Arc::clone(
            circuits
                .entry(service.to_string())
                .or_insert_with(|| Arc::new(ServiceCircuit::new(service, config.clone()))),
        )
    }

    pub fn get(&self, service: &str) -> Option<Arc<ServiceCircuit>> {
        self.circuits.read().get(service).cloned()
    }

    pub fn snapshot(&self, service: &str) -> Option<CircuitSnapshot> {
        self.get(service).map(|circuit| circuit.snapshot())
    }

    /// Snapshots for every known service, sorted by name for stable output
    pub fn snapshots(&self) -> Vec<CircuitSnapshot> {
        let mut snapshots: Vec<CircuitSnapshot> = self
            .circuits
            .read()
            .values()
            .map(|circuit| circuit.snapshot())
            .collect();
        snapshots.sort_by(|a, b| a.service.cmp(&b.service));
        snapshots
    }

    pub fn len(&self) -> usize {
        self.circuits.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.circuits.read().is_empty()
    }
}

impl Default for CircuitRegistry {
    fn default() -> Self {
        Self::new()
    }
}
