// End-to-end breaker scenarios driven through the public executor API.
// Unit tests for each component live in #[cfg(test)] modules next to the code;
// these tests exercise the full admission → call → bookkeeping loop with real
// timing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use fusegate::breaker::{CallOutcome, CircuitBreaker};
use fusegate::config::CircuitConfig;
use fusegate::error::{CallError, ErrorKind};
use fusegate::record::FailFastReason;
use fusegate::state::CircuitState;

fn fast_cycle_config() -> CircuitConfig {
    CircuitConfig {
        max_failures: 3,
        reset_timeout_secs: 0.2,
        success_threshold: 3,
        health_threshold: 0,
        ..Default::default()
    }
}

async fn succeed() -> Result<&'static str, CallError> {
    Ok("ok")
}

async fn explode() -> Result<&'static str, CallError> {
    Err(CallError::connection("connection refused"))
}

#[tokio::test]
async fn full_open_half_open_closed_cycle() {
    let breaker = CircuitBreaker::new();
    breaker.configure("payment-api", fast_cycle_config()).unwrap();

    // Trip the circuit with consecutive failures.
    for _ in 0..3 {
        let outcome = breaker.call("payment-api", explode).await;
        assert!(outcome.is_failure());
    }
    assert_eq!(
        breaker.snapshot("payment-api").unwrap().state,
        CircuitState::Open
    );

    // While open, every call is rejected with the same structured outcome
    // and the operation never runs.
    let counted = Arc::new(AtomicU32::new(0));
    for _ in 0..4 {
        let counted = Arc::clone(&counted);
        let outcome = breaker
            .call("payment-api", move || async move {
                counted.fetch_add(1, Ordering::SeqCst);
                Ok::<&str, CallError>("ok")
            })
            .await;
        match outcome {
            CallOutcome::FailFast {
                reason,
                circuit_state,
                ..
            } => {
                assert_eq!(reason, FailFastReason::CircuitOpen);
                assert_eq!(circuit_state, CircuitState::Open);
            }
            other => panic!("expected fail-fast while open, got {:?}", other),
        }
    }
    assert_eq!(counted.load(Ordering::SeqCst), 0);

    // Past the reset timeout the next call rides through as the probe.
    tokio::time::sleep(Duration::from_millis(250)).await;
    let probe = breaker.call("payment-api", succeed).await;
    assert!(probe.is_success());
    assert_eq!(probe.circuit_state(), CircuitState::HalfOpen);

    // Two more successes reach the threshold and close the circuit.
    breaker.call("payment-api", succeed).await;
    let closing = breaker.call("payment-api", succeed).await;
    assert_eq!(closing.circuit_state(), CircuitState::Closed);
    assert_eq!(
        breaker.snapshot("payment-api").unwrap().state,
        CircuitState::Closed
    );
}

#[tokio::test]
async fn half_open_trial_budget_reopens_circuit() {
    let breaker = CircuitBreaker::new();
    breaker
        .configure(
            "flaky-api",
            CircuitConfig {
                max_failures: 1,
                reset_timeout_secs: 0.05,
                success_threshold: 100,
                half_open_max_requests: 5,
                health_threshold: 0,
                ..Default::default()
            },
        )
        .unwrap();

    breaker.call("flaky-api", explode).await;
    assert_eq!(
        breaker.snapshot("flaky-api").unwrap().state,
        CircuitState::Open
    );
    tokio::time::sleep(Duration::from_millis(80)).await;

    // Five trials are admitted: the probe plus four.
    for i in 0..5 {
        let outcome = breaker.call("flaky-api", succeed).await;
        assert!(outcome.is_success(), "trial {} should run", i + 1);
        assert_eq!(outcome.circuit_state(), CircuitState::HalfOpen);
    }

    // The sixth overshoots the budget: rejected, circuit reopened, fresh
    // retry deadline.
    let outcome = breaker.call("flaky-api", succeed).await;
    match outcome {
        CallOutcome::FailFast {
            reason,
            circuit_state,
            ..
        } => {
            assert_eq!(reason, FailFastReason::TooManyHalfOpenTrials);
            assert_eq!(circuit_state, CircuitState::Open);
        }
        other => panic!("expected half-open overshoot, got {:?}", other),
    }
}

#[tokio::test]
async fn severe_failure_during_probe_reopens_immediately() {
    let breaker = CircuitBreaker::new();
    breaker
        .configure(
            "fragile-api",
            CircuitConfig {
                max_failures: 5,
                reset_timeout_secs: 0.05,
                ..Default::default()
            },
        )
        .unwrap();

    // Health bottoms out with no banked successes, so the circuit opens on
    // the first failure and one failed probe reopens it.
    breaker.call("fragile-api", explode).await;
    assert_eq!(
        breaker.snapshot("fragile-api").unwrap().state,
        CircuitState::Open
    );

    tokio::time::sleep(Duration::from_millis(80)).await;
    let probe = breaker.call("fragile-api", explode).await;
    assert!(probe.is_failure());
    assert_eq!(probe.circuit_state(), CircuitState::Open);
}

#[tokio::test]
async fn concurrent_callers_share_one_record() {
    let breaker = CircuitBreaker::new();

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let breaker = breaker.clone();
            tokio::spawn(async move {
                breaker
                    .call("shared-api", || async {
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        Ok::<u32, CallError>(7)
                    })
                    .await
            })
        })
        .collect();

    for result in futures::future::join_all(tasks).await {
        assert!(result.unwrap().is_success());
    }

    let snapshot = breaker.snapshot("shared-api").unwrap();
    assert_eq!(snapshot.total_requests, 16);
    assert_eq!(snapshot.success_count, 16);
    assert_eq!(snapshot.state, CircuitState::Closed);
}

#[tokio::test]
async fn slow_call_does_not_block_other_callers() {
    let breaker = CircuitBreaker::new();

    let slow = {
        let breaker = breaker.clone();
        tokio::spawn(async move {
            breaker
                .call("mixed-api", || async {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    Ok::<&str, CallError>("slow")
                })
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    // The record lock is released while the slow call is in flight.
    let started = Instant::now();
    let fast = breaker.call("mixed-api", succeed).await;
    assert!(fast.is_success());
    assert!(
        started.elapsed() < Duration::from_millis(100),
        "fast call waited on the slow one"
    );

    assert!(slow.await.unwrap().is_success());
}

#[tokio::test]
async fn services_fail_independently() {
    let breaker = CircuitBreaker::new();

    breaker.call("broken-api", explode).await;
    assert_eq!(
        breaker.snapshot("broken-api").unwrap().state,
        CircuitState::Open
    );

    // The sibling service is untouched by the broken one.
    let outcome = breaker.call("healthy-api", succeed).await;
    assert!(outcome.is_success());
    assert_eq!(
        breaker.snapshot("healthy-api").unwrap().state,
        CircuitState::Closed
    );
}

#[tokio::test]
async fn abandoned_call_is_recorded_as_cancelled() {
    let breaker = CircuitBreaker::new();
    for _ in 0..20 {
        breaker.call("slow-api", succeed).await;
    }

    let call = breaker.call("slow-api", || async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok::<&str, CallError>("never")
    });
    let raced = tokio::time::timeout(Duration::from_millis(20), call).await;
    assert!(raced.is_err());

    let snapshot = breaker.snapshot("slow-api").unwrap();
    assert_eq!(snapshot.error_kinds[&ErrorKind::Cancelled], 1);
    assert_eq!(snapshot.total_requests, 21);
}

#[tokio::test]
async fn yaml_config_drives_breaker_behavior() {
    let yaml = r#"
max_failures: 2
reset_timeout_secs: 60.0
health_threshold: 0
"#;
    let config: CircuitConfig = serde_yaml::from_str(yaml).unwrap();
    config.validate().unwrap();

    let breaker = CircuitBreaker::new();
    breaker.configure("configured-api", config).unwrap();

    breaker.call("configured-api", explode).await;
    assert_eq!(
        breaker.snapshot("configured-api").unwrap().state,
        CircuitState::Closed
    );
    breaker.call("configured-api", explode).await;
    assert_eq!(
        breaker.snapshot("configured-api").unwrap().state,
        CircuitState::Open
    );
}

#[tokio::test]
async fn snapshots_feed_a_dashboard() {
    let breaker = CircuitBreaker::new();
    breaker
        .configure(
            "api-b",
            CircuitConfig {
                max_failures: 2,
                health_threshold: 0,
                ..Default::default()
            },
        )
        .unwrap();

    breaker.call("api-a", succeed).await;
    breaker.call("api-b", explode).await;
    breaker
        .call("api-b", || async {
            Err::<&str, CallError>(CallError::timeout("deadline"))
        })
        .await;

    let snapshots = breaker.snapshots();
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[0].service, "api-a");
    assert_eq!(snapshots[1].service, "api-b");

    let json = serde_json::to_value(&snapshots).unwrap();
    assert_eq!(json[0]["state"], "closed");
    assert_eq!(json[0]["health_score"], 80);
    assert_eq!(json[1]["state"], "open");
    assert_eq!(json[1]["error_kinds"]["connection"], 1);
    assert_eq!(json[1]["error_kinds"]["timeout"], 1);
    assert_eq!(json[1]["failure_count"], 2);
}

#[tokio::test]
async fn lifetime_counters_survive_state_cycles() {
    let breaker = CircuitBreaker::new();
    breaker
        .configure(
            "cycling-api",
            CircuitConfig {
                max_failures: 1,
                reset_timeout_secs: 0.05,
                success_threshold: 1,
                health_threshold: 0,
                ..Default::default()
            },
        )
        .unwrap();

    for _ in 0..3 {
        breaker.call("cycling-api", explode).await;
        tokio::time::sleep(Duration::from_millis(80)).await;
        let probe = breaker.call("cycling-api", succeed).await;
        assert_eq!(probe.circuit_state(), CircuitState::Closed);
    }

    let snapshot = breaker.snapshot("cycling-api").unwrap();
    assert_eq!(snapshot.total_requests, 6);
    assert_eq!(snapshot.failure_count, 3);
    assert_eq!(snapshot.success_count, 3);
}
