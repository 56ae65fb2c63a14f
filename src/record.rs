//! Per-service circuit record and state transitions.
//!
//! One [`CircuitRecord`] exists per service name. It owns the rolling
//! counters, the bounded response-time window, and the admission state
//! machine:
//!
//! - **Closed**: every call is admitted
//! - **Open**: calls are rejected until `next_retry_time`; the first call at
//!   or past the deadline flips the circuit to half-open and rides through as
//!   the first trial
//! - **HalfOpen**: up to `half_open_max_requests` trials are admitted;
//!   `success_threshold` successes close the circuit, overshooting the trial
//!   budget reopens it
//!
//! Every method takes the current time as a parameter, so transitions are
//! testable without sleeping or real I/O. Callers serialize access through
//! the owning [`crate::registry::ServiceCircuit`] lock.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::CircuitConfig;
use crate::error::ErrorKind;
use crate::health;
use crate::state::CircuitState;

/// Current time as seconds since UNIX epoch
#[inline]
pub(crate) fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Why a call was rejected without running the protected operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailFastReason {
    /// Circuit is open and the retry deadline has not passed
    CircuitOpen,
    /// The half-open probe window already admitted its maximum trials
    TooManyHalfOpenTrials,
}

impl fmt::Display for FailFastReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailFastReason::CircuitOpen => write!(f, "circuit open"),
            FailFastReason::TooManyHalfOpenTrials => write!(f, "too many half-open trials"),
        }
    }
}

/// Admission decision for one call, evaluated before the operation runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admit,
    Reject(FailFastReason),
}

/// Mutable per-service breaker state.
///
/// Lifetime counters (`failure_count`, `success_count`, `total_requests`)
/// only ever grow; `consecutive_failures` resets on success. The response
/// time window holds successful calls only, bounded to `window_size` with
/// FIFO eviction.
#[derive(Debug)]
pub struct CircuitRecord {
    state: CircuitState,
    failure_count: u64,
    success_count: u64,
    total_requests: u64,
    consecutive_failures: u32,
    last_failure_time: f64,
    last_state_change: f64,
    next_retry_time: f64,
    response_times: VecDeque<f64>,
    error_kinds: HashMap<ErrorKind, u64>,
    health_score: u8,
    half_open_requests: u32,
    half_open_successes: u32,
    // Gates the open-window warn log so repeated rejections stay quiet.
    // Never consulted by admission logic.
    fail_fast_notified: bool,
}

impl CircuitRecord {
    pub fn new(now: f64) -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            total_requests: 0,
            consecutive_failures: 0,
            last_failure_time: 0.0,
            last_state_change: now,
            next_retry_time: 0.0,
            response_times: VecDeque::new(),
            error_kinds: HashMap::new(),
            health_score: 100,
            half_open_requests: 0,
            half_open_successes: 0,
            fail_fast_notified: false,
        }
    }

    // -- accessors ---------------------------------------------------------

    pub fn state(&self) -> CircuitState {
        self.state
    }

    pub fn health_score(&self) -> u8 {
        self.health_score
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count
    }

    pub fn success_count(&self) -> u64 {
        self.success_count
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn last_failure_time(&self) -> f64 {
        self.last_failure_time
    }

    pub fn last_state_change(&self) -> f64 {
        self.last_state_change
    }

    pub fn next_retry_time(&self) -> f64 {
        self.next_retry_time
    }

    pub fn response_times(&self) -> &VecDeque<f64> {
        &self.response_times
    }

    pub fn error_kinds(&self) -> &HashMap<ErrorKind, u64> {
        &self.error_kinds
    }

    pub fn half_open_requests(&self) -> u32 {
        self.half_open_requests
    }

    pub fn half_open_successes(&self) -> u32 {
        self.half_open_successes
    }

    /// Whether the score sits below the informational degraded threshold
    pub fn is_degraded(&self, config: &CircuitConfig) -> bool {
        self.health_score < config.degraded_threshold
    }

    // -- admission ---------------------------------------------------------

    /// Decide whether one call may run, applying open→half-open recovery and
    /// the half-open trial budget.
    pub fn admit(&mut self, service: &str, config: &CircuitConfig, now: f64) -> Admission {
        match self.state {
            CircuitState::Closed => Admission::Admit,
            CircuitState::Open => {
                if now < self.next_retry_time {
                    if !self.fail_fast_notified {
                        tracing::warn!(
                            service,
                            retry_at = self.next_retry_time,
                            "circuit open, failing fast"
                        );
                        self.fail_fast_notified = true;
                    }
                    Admission::Reject(FailFastReason::CircuitOpen)
                } else {
                    tracing::info!(service, "circuit transitioning to half-open");
                    self.transition_to_half_open(now);
                    // The probe call itself is trial number one.
                    self.half_open_requests = 1;
                    Admission::Admit
                }
            }
            CircuitState::HalfOpen => {
                self.half_open_requests += 1;
                if self.half_open_requests > config.half_open_max_requests {
                    tracing::warn!(
                        service,
                        trials = self.half_open_requests,
                        max = config.half_open_max_requests,
                        "half-open trial budget exhausted, reopening circuit"
                    );
                    self.transition_to_open(now, config);
                    Admission::Reject(FailFastReason::TooManyHalfOpenTrials)
                } else {
                    Admission::Admit
                }
            }
        }
    }

    // -- outcome application -----------------------------------------------

    /// Record a successful call that took `elapsed_secs`.
    pub fn record_success(
        &mut self,
        service: &str,
        config: &CircuitConfig,
        now: f64,
        elapsed_secs: f64,
    ) {
        self.total_requests += 1;
        self.success_count += 1;
        self.response_times.push_back(elapsed_secs);
        if self.response_times.len() > config.window_size {
            self.response_times.pop_front();
        }
        self.consecutive_failures = 0;
        self.recompute_health(config);

        if self.state == CircuitState::HalfOpen {
            self.half_open_successes += 1;
            tracing::debug!(
                service,
                successes = self.half_open_successes,
                threshold = config.success_threshold,
                "half-open trial succeeded"
            );
            if self.half_open_successes >= config.success_threshold {
                tracing::info!(service, health = self.health_score, "service recovered, closing circuit");
                self.transition_to_closed(now);
            }
        }
    }

    /// Record a failed call of the given kind.
    ///
    /// The open check is shared between Closed and HalfOpen: one severe
    /// failure during a probe window can reopen the circuit immediately.
    pub fn record_failure(
        &mut self,
        service: &str,
        config: &CircuitConfig,
        now: f64,
        elapsed_secs: f64,
        kind: ErrorKind,
    ) {
        self.total_requests += 1;
        self.failure_count += 1;
        self.consecutive_failures += 1;
        self.last_failure_time = now;
        *self.error_kinds.entry(kind).or_insert(0) += 1;
        self.recompute_health(config);

        tracing::debug!(
            service,
            %kind,
            health = self.health_score,
            response_secs = elapsed_secs,
            "request failed"
        );

        let should_open = self.consecutive_failures >= config.max_failures
            || self.health_score < config.health_threshold;
        if should_open && self.state != CircuitState::Open {
            tracing::warn!(
                service,
                consecutive_failures = self.consecutive_failures,
                health = self.health_score,
                "opening circuit, health too low or too many failures"
            );
            self.transition_to_open(now, config);
        }
    }

    // -- transitions -------------------------------------------------------
    // All `state` mutations live here; no other code path touches it.

    fn transition_to_open(&mut self, now: f64, config: &CircuitConfig) {
        self.next_retry_time = now + config.reset_timeout_secs;
        self.last_state_change = now;
        self.half_open_requests = 0;
        self.half_open_successes = 0;
        self.fail_fast_notified = false;
        self.state = CircuitState::Open;
    }

    fn transition_to_half_open(&mut self, now: f64) {
        self.consecutive_failures = 0;
        self.last_state_change = now;
        self.half_open_requests = 0;
        self.half_open_successes = 0;
        self.fail_fast_notified = false;
        self.state = CircuitState::HalfOpen;
    }

    fn transition_to_closed(&mut self, now: f64) {
        self.last_state_change = now;
        self.half_open_requests = 0;
        self.half_open_successes = 0;
        self.state = CircuitState::Closed;
    }

    fn recompute_health(&mut self, config: &CircuitConfig) {
        self.health_score = health::health_score(
            self.total_requests,
            self.success_count,
            self.consecutive_failures,
            &self.response_times,
            config.slow_response_threshold_secs,
        );
    }
}
