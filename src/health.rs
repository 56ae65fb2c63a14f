//! Health Score Calculation
//!
//! Turns a circuit's rolling counters into a 0-100 score:
//! - success rate contributes up to 80 points
//! - consecutive failures deduct 10 points each, capped at 20
//! - mean latency above the slow threshold deducts 10 points per second, capped at 10
//!
//! A record with no requests scores 100. Once any request has been counted the
//! achievable ceiling is 80: the success-rate weight intentionally caps the
//! score so a service that has seen traffic never reads as pristine.

use std::collections::VecDeque;

use crate::constants::{
    FAILURE_PENALTY_STEP, MAX_FAILURE_PENALTY, MAX_SLOW_PENALTY, SLOW_PENALTY_STEP,
    SUCCESS_RATE_WEIGHT,
};

/// Compute the health score for a circuit's current counters.
///
/// Pure function of the inputs; the caller recomputes after every completed
/// request and stores the result on the record.
pub fn health_score(
    total_requests: u64,
    success_count: u64,
    consecutive_failures: u32,
    response_times: &VecDeque<f64>,
    slow_response_threshold_secs: f64,
) -> u8 {
    if total_requests == 0 {
        return 100;
    }

    let success_rate = success_count as f64 / total_requests as f64;
    let base_score = success_rate * SUCCESS_RATE_WEIGHT;

    let failure_penalty =
        (f64::from(consecutive_failures) * FAILURE_PENALTY_STEP).min(MAX_FAILURE_PENALTY);

    let time_penalty = if response_times.is_empty() {
        0.0
    } else {
        let mean = response_times.iter().sum::<f64>() / response_times.len() as f64;
        if mean <= slow_response_threshold_secs {
            0.0
        } else {
            ((mean - slow_response_threshold_secs) * SLOW_PENALTY_STEP).min(MAX_SLOW_PENALTY)
        }
    };

    (base_score - failure_penalty - time_penalty).max(0.0).round() as u8
}
