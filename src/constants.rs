// Constants module - centralized default values for configuration
//
// This module defines all default values used throughout the codebase.
// Using constants instead of magic numbers improves maintainability
// and makes it easier to understand and modify defaults.

// =============================================================================
// Circuit breaker defaults
// =============================================================================

/// Default number of consecutive failures before circuit opens
pub const DEFAULT_MAX_FAILURES: u32 = 5;

/// Default cooldown before an open circuit admits a probe (seconds)
pub const DEFAULT_RESET_TIMEOUT_SECS: f64 = 30.0;

/// Default number of half-open successes to close circuit
pub const DEFAULT_SUCCESS_THRESHOLD: u32 = 3;

/// Default response time above which a request counts as slow (seconds)
pub const DEFAULT_SLOW_RESPONSE_THRESHOLD_SECS: f64 = 3.0;

/// Default health score below which a failure opens the circuit
pub const DEFAULT_HEALTH_THRESHOLD: u8 = 30;

/// Default health score below which a service is considered degraded
/// (informational only, never drives admission)
pub const DEFAULT_DEGRADED_THRESHOLD: u8 = 70;

/// Default number of recent response times kept for health scoring
pub const DEFAULT_WINDOW_SIZE: usize = 100;

/// Default maximum trial requests admitted in half-open state
pub const DEFAULT_HALF_OPEN_MAX_REQUESTS: u32 = 5;

// =============================================================================
// Health score weights
// =============================================================================

/// Maximum points contributed by the success rate
pub const SUCCESS_RATE_WEIGHT: f64 = 80.0;

/// Points deducted per consecutive failure
pub const FAILURE_PENALTY_STEP: f64 = 10.0;

/// Cap on the consecutive-failure penalty
pub const MAX_FAILURE_PENALTY: f64 = 20.0;

/// Points deducted per second of mean latency above the slow threshold
pub const SLOW_PENALTY_STEP: f64 = 10.0;

/// Cap on the latency penalty
pub const MAX_SLOW_PENALTY: f64 = 10.0;
