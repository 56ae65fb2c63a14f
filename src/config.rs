//! Circuit breaker configuration.
//!
//! Configs deserialize from YAML with per-field defaults, so a partial
//! document overrides exactly the named fields and nothing else:
//!
//! ```yaml
//! max_failures: 3
//! reset_timeout_secs: 15.0
//! health_threshold: 40
//! ```
//!
//! Every numeric field is range-checked by [`CircuitConfig::validate`] before
//! a circuit record is constructed; a bad value fails loudly at setup time,
//! never at call time.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DEGRADED_THRESHOLD, DEFAULT_HALF_OPEN_MAX_REQUESTS, DEFAULT_HEALTH_THRESHOLD,
    DEFAULT_MAX_FAILURES, DEFAULT_RESET_TIMEOUT_SECS, DEFAULT_SLOW_RESPONSE_THRESHOLD_SECS,
    DEFAULT_SUCCESS_THRESHOLD, DEFAULT_WINDOW_SIZE,
};
use crate::error::ConfigError;

fn default_max_failures() -> u32 {
    DEFAULT_MAX_FAILURES
}

fn default_reset_timeout_secs() -> f64 {
    DEFAULT_RESET_TIMEOUT_SECS
}

fn default_success_threshold() -> u32 {
    DEFAULT_SUCCESS_THRESHOLD
}

fn default_slow_response_threshold_secs() -> f64 {
    DEFAULT_SLOW_RESPONSE_THRESHOLD_SECS
}

fn default_health_threshold() -> u8 {
    DEFAULT_HEALTH_THRESHOLD
}

fn default_degraded_threshold() -> u8 {
    DEFAULT_DEGRADED_THRESHOLD
}

fn default_window_size() -> usize {
    DEFAULT_WINDOW_SIZE
}

fn default_half_open_max_requests() -> u32 {
    DEFAULT_HALF_OPEN_MAX_REQUESTS
}

/// Per-service circuit breaker configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitConfig {
    /// Consecutive failures that open the circuit
    #[serde(default = "default_max_failures")]
    pub max_failures: u32,
    /// How long an open circuit waits before admitting a probe (seconds)
    #[serde(default = "default_reset_timeout_secs")]
    pub reset_timeout_secs: f64,
    /// Half-open successes required to close the circuit
    #[serde(default = "default_success_threshold")]
    pub success_threshold: u32,
    /// Mean response time above this counts against the health score (seconds)
    #[serde(default = "default_slow_response_threshold_secs")]
    pub slow_response_threshold_secs: f64,
    /// Health score below which a failure opens the circuit
    #[serde(default = "default_health_threshold")]
    pub health_threshold: u8,
    /// Health score below which the service is considered degraded
    /// (informational only)
    #[serde(default = "default_degraded_threshold")]
    pub degraded_threshold: u8,
    /// Number of recent response times kept for health scoring
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Maximum trial requests admitted per half-open probe window
    #[serde(default = "default_half_open_max_requests")]
    pub half_open_max_requests: u32,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            max_failures: DEFAULT_MAX_FAILURES,
            reset_timeout_secs: DEFAULT_RESET_TIMEOUT_SECS,
            success_threshold: DEFAULT_SUCCESS_THRESHOLD,
            slow_response_threshold_secs: DEFAULT_SLOW_RESPONSE_THRESHOLD_SECS,
            health_threshold: DEFAULT_HEALTH_THRESHOLD,
            degraded_threshold: DEFAULT_DEGRADED_THRESHOLD,
            window_size: DEFAULT_WINDOW_SIZE,
            half_open_max_requests: DEFAULT_HALF_OPEN_MAX_REQUESTS,
        }
    }
}

impl CircuitConfig {
    /// Range-check every numeric field.
    ///
    /// Counts and durations must be strictly positive; the two health
    /// thresholds are percentages and must sit in 0-100.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_failures == 0 {
            return Err(ConfigError::NonPositive {
                field: "max_failures",
                value: 0.0,
            });
        }
        if !(self.reset_timeout_secs > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "reset_timeout_secs",
                value: self.reset_timeout_secs,
            });
        }
        if self.success_threshold == 0 {
            return Err(ConfigError::NonPositive {
                field: "success_threshold",
                value: 0.0,
            });
        }
        if !(self.slow_response_threshold_secs > 0.0) {
            return Err(ConfigError::NonPositive {
                field: "slow_response_threshold_secs",
                value: self.slow_response_threshold_secs,
            });
        }
        if self.health_threshold > 100 {
            return Err(ConfigError::OutOfRange {
                field: "health_threshold",
                value: self.health_threshold,
            });
        }
        if self.degraded_threshold > 100 {
            return Err(ConfigError::OutOfRange {
                field: "degraded_threshold",
                value: self.degraded_threshold,
            });
        }
        if self.window_size == 0 {
            return Err(ConfigError::NonPositive {
                field: "window_size",
                value: 0.0,
            });
        }
        if self.half_open_max_requests == 0 {
            return Err(ConfigError::NonPositive {
                field: "half_open_max_requests",
                value: 0.0,
            });
        }
        Ok(())
    }
}
