//! Integration tests for the dispatch engine
//!
//! These tests verify:
//! - Capability filtering: backends that do not declare a capability are never called
//! - First-success stops at the first answer, empty answers included
//! - Failure reporting lists every attempt in call order
//! - Pass-through returns the backend error unchanged
//! - Best-of-N fan-out, limits and rankings
//! - Per-backend timeouts, caller cancellation and live registry changes

use crate::mock_infrastructure::{create_test_fork, MockNode};
use beacon_core::{
    backend::{BackendError, BeaconNode, Capability},
    dispatch::{
        DispatchConfig, DispatchEngine, DispatchError, Dispatched, HighestBy, Majority, Strategy,
    },
    registry::CapabilityRegistry,
    types::{Fork, StateId},
};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio_util::sync::CancellationToken;

fn engine_with(nodes: &[(&str, &Arc<MockNode>)], backend_timeout_ms: u64) -> DispatchEngine {
    let registry = Arc::new(CapabilityRegistry::new());
    for (identity, node) in nodes {
        let node: Arc<dyn BeaconNode> = (*node).clone();
        registry.register(*identity, node);
    }
    let config = DispatchConfig { backend_timeout_ms, ..DispatchConfig::default() };
    DispatchEngine::new(registry, config)
}

async fn fetch_fork(
    engine: &DispatchEngine,
    strategy: &Strategy<Fork>,
    cancel: &CancellationToken,
) -> Result<Dispatched<Fork>, DispatchError> {
    engine
        .execute(Capability::Fork, strategy, cancel, |handle| async move {
            handle.node().fork(StateId::Head).await
        })
        .await
}

async fn fetch_version(
    engine: &DispatchEngine,
    strategy: &Strategy<String>,
) -> Result<Dispatched<String>, DispatchError> {
    let cancel = CancellationToken::new();
    engine
        .execute(Capability::NodeVersion, strategy, &cancel, |handle| async move {
            handle.node().node_version().await.map(Some)
        })
        .await
}

#[tokio::test]
async fn test_unsupported_capability_calls_no_backend() {
    let a = Arc::new(MockNode::new().with_version(Ok("Lighthouse/v5.3.0".to_string())));
    let b = Arc::new(MockNode::new().with_version(Ok("Teku/v24.10.0".to_string())));
    let engine = engine_with(&[("a", &a), ("b", &b)], 1000);

    let result = fetch_fork(&engine, &Strategy::FirstSuccess, &CancellationToken::new()).await;

    assert_eq!(result.unwrap_err(), DispatchError::Unsupported { capability: Capability::Fork });
    assert_eq!(a.total_calls() + b.total_calls(), 0, "no backend should be called");
}

#[tokio::test]
async fn test_undeclared_backend_is_skipped() {
    let a = Arc::new(MockNode::new().with_version(Ok("Lighthouse/v5.3.0".to_string())));
    let b = Arc::new(MockNode::new().with_fork(Ok(Some(create_test_fork(5, 1)))));
    let engine = engine_with(&[("a", &a), ("b", &b)], 1000);

    let dispatched =
        fetch_fork(&engine, &Strategy::FirstSuccess, &CancellationToken::new()).await.unwrap();

    assert_eq!(dispatched.backend.as_ref(), "b");
    assert!(dispatched.failures.is_empty(), "skipping is not a failure");
    assert_eq!(a.calls(Capability::Fork), 0);
}

#[tokio::test]
async fn test_first_success_stops_at_empty_answer() {
    let a = Arc::new(MockNode::new().with_fork(Err(BackendError::Timeout)));
    let b = Arc::new(MockNode::new().with_fork(Ok(None)));
    let c = Arc::new(MockNode::new().with_fork(Ok(Some(create_test_fork(7, 2)))));
    let engine = engine_with(&[("a", &a), ("b", &b), ("c", &c)], 1000);

    let dispatched =
        fetch_fork(&engine, &Strategy::FirstSuccess, &CancellationToken::new()).await.unwrap();

    assert_eq!(dispatched.value, None, "the empty answer from b is the result");
    assert_eq!(dispatched.backend.as_ref(), "b");
    assert_eq!(dispatched.failures.len(), 1);
    assert_eq!(dispatched.failures[0].backend.as_ref(), "a");
    assert_eq!(a.calls(Capability::Fork), 1);
    assert_eq!(b.calls(Capability::Fork), 1);
    assert_eq!(c.calls(Capability::Fork), 0, "c must never be invoked");
}

#[tokio::test]
async fn test_all_failed_lists_attempts_in_order() {
    let a = Arc::new(MockNode::new().with_fork(Err(BackendError::Timeout)));
    let b = Arc::new(
        MockNode::new().with_fork(Err(BackendError::Http(503, "unavailable".to_string()))),
    );
    let engine = engine_with(&[("a", &a), ("b", &b)], 1000);

    let err = fetch_fork(&engine, &Strategy::FirstSuccess, &CancellationToken::new())
        .await
        .unwrap_err();

    let attempts = err.attempts();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0].backend.as_ref(), "a");
    assert_eq!(attempts[0].error, BackendError::Timeout);
    assert_eq!(attempts[1].backend.as_ref(), "b");
    assert_eq!(attempts[1].error, BackendError::Http(503, "unavailable".to_string()));

    let message = err.to_string();
    assert!(message.contains("a: request timeout"), "unexpected message: {message}");
    assert!(message.contains("b: HTTP error 503"), "unexpected message: {message}");
}

#[tokio::test]
async fn test_pass_through_returns_error_verbatim() {
    let a = Arc::new(
        MockNode::new().with_fork(Err(BackendError::Http(500, "internal".to_string()))),
    );
    let b = Arc::new(MockNode::new().with_fork(Ok(Some(create_test_fork(1, 1)))));
    let engine = engine_with(&[("a", &a), ("b", &b)], 1000);

    let err = fetch_fork(&engine, &Strategy::PassThrough, &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err, DispatchError::Backend(BackendError::Http(500, "internal".to_string())));
    assert_eq!(b.calls(Capability::Fork), 0, "pass-through never fails over");
}

#[tokio::test]
async fn test_best_of_n_picks_highest_ranked_answer() {
    let a = Arc::new(MockNode::new().with_fork(Ok(Some(create_test_fork(10, 1)))));
    let b = Arc::new(
        MockNode::new().with_fork(Err(BackendError::InvalidResponse("bad hex".to_string()))),
    );
    let c = Arc::new(MockNode::new().with_fork(Ok(Some(create_test_fork(30, 3)))));
    let d = Arc::new(MockNode::new().with_fork(Ok(Some(create_test_fork(20, 2)))));
    let engine = engine_with(&[("a", &a), ("b", &b), ("c", &c), ("d", &d)], 1000);

    let strategy = Strategy::best_of(4, HighestBy(|fork: &Fork| fork.epoch));
    let dispatched = fetch_fork(&engine, &strategy, &CancellationToken::new()).await.unwrap();

    assert_eq!(dispatched.value.map(|f| f.epoch), Some(30));
    assert_eq!(dispatched.backend.as_ref(), "c");
    assert_eq!(dispatched.failures.len(), 1, "decode failure is reported, not fatal");
    assert_eq!(dispatched.failures[0].backend.as_ref(), "b");
}

#[tokio::test]
async fn test_best_of_n_respects_limit() {
    let nodes: Vec<Arc<MockNode>> = (0..4)
        .map(|i| Arc::new(MockNode::new().with_fork(Ok(Some(create_test_fork(i, 1))))))
        .collect();
    let engine = engine_with(
        &[("a", &nodes[0]), ("b", &nodes[1]), ("c", &nodes[2]), ("d", &nodes[3])],
        1000,
    );

    let strategy = Strategy::best_of(2, HighestBy(|fork: &Fork| fork.epoch));
    let dispatched = fetch_fork(&engine, &strategy, &CancellationToken::new()).await.unwrap();

    assert_eq!(dispatched.backend.as_ref(), "b");
    let calls: Vec<usize> = nodes.iter().map(|n| n.calls(Capability::Fork)).collect();
    assert_eq!(calls, vec![1, 1, 0, 0], "only the first two backends are consulted");
}

#[tokio::test]
async fn test_best_of_n_majority_prefers_earliest_agreeing_backend() {
    let a = Arc::new(MockNode::new().with_version(Ok("Prysm/v5.1.0".to_string())));
    let b = Arc::new(MockNode::new().with_version(Ok("Lighthouse/v5.3.0".to_string())));
    let c = Arc::new(MockNode::new().with_version(Ok("Lighthouse/v5.3.0".to_string())));
    let engine = engine_with(&[("a", &a), ("b", &b), ("c", &c)], 1000);

    let dispatched = fetch_version(&engine, &Strategy::best_of(3, Majority)).await.unwrap();

    assert_eq!(dispatched.value.as_deref(), Some("Lighthouse/v5.3.0"));
    assert_eq!(dispatched.backend.as_ref(), "b");
}

#[tokio::test]
async fn test_best_of_n_all_failed() {
    let a = Arc::new(MockNode::new().with_version(Err(BackendError::Timeout)));
    let b = Arc::new(
        MockNode::new().with_version(Err(BackendError::ConnectionFailed("refused".to_string()))),
    );
    let engine = engine_with(&[("a", &a), ("b", &b)], 1000);

    let err = fetch_version(&engine, &Strategy::best_of(2, Majority)).await.unwrap_err();

    assert!(matches!(err, DispatchError::AllFailed { capability: Capability::NodeVersion, .. }));
    let backends: Vec<&str> = err.attempts().iter().map(|a| a.backend.as_ref()).collect();
    assert_eq!(backends, vec!["a", "b"]);
}

#[tokio::test]
async fn test_best_of_n_empty_answers_lose_to_present_ones() {
    let a = Arc::new(MockNode::new().with_fork(Ok(None)));
    let b = Arc::new(MockNode::new().with_fork(Ok(Some(create_test_fork(12, 2)))));
    let engine = engine_with(&[("a", &a), ("b", &b)], 1000);

    let strategy = Strategy::best_of(2, HighestBy(|fork: &Fork| fork.epoch));
    let dispatched = fetch_fork(&engine, &strategy, &CancellationToken::new()).await.unwrap();

    assert_eq!(dispatched.value.map(|f| f.epoch), Some(12));
    assert_eq!(dispatched.backend.as_ref(), "b");
}

#[tokio::test]
async fn test_best_of_n_all_empty_returns_earliest_empty() {
    let a = Arc::new(MockNode::new().with_fork(Ok(None)).with_delay(Duration::from_millis(50)));
    let b = Arc::new(MockNode::new().with_fork(Ok(None)));
    let engine = engine_with(&[("a", &a), ("b", &b)], 1000);

    let strategy = Strategy::best_of(2, HighestBy(|fork: &Fork| fork.epoch));
    let dispatched = fetch_fork(&engine, &strategy, &CancellationToken::new()).await.unwrap();

    assert_eq!(dispatched.value, None);
    assert_eq!(dispatched.backend.as_ref(), "a", "registration order, not completion order");
}

#[tokio::test]
async fn test_cancellation_stops_best_of_n_fan_out() {
    let nodes: Vec<Arc<MockNode>> = (0..3)
        .map(|i| {
            Arc::new(
                MockNode::new()
                    .with_fork(Ok(Some(create_test_fork(i, 1))))
                    .with_delay(Duration::from_secs(5)),
            )
        })
        .collect();
    let engine = engine_with(&[("a", &nodes[0]), ("b", &nodes[1]), ("c", &nodes[2])], 10_000);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let start = Instant::now();
    let strategy = Strategy::best_of(3, HighestBy(|fork: &Fork| fork.epoch));
    let err = fetch_fork(&engine, &strategy, &cancel).await.unwrap_err();

    assert_eq!(err, DispatchError::Cancelled { capability: Capability::Fork });
    assert!(start.elapsed() < Duration::from_secs(2));
    let calls: Vec<usize> = nodes.iter().map(|n| n.calls(Capability::Fork)).collect();
    assert_eq!(calls, vec![1, 1, 1], "every backend was invoked before cancellation");
}

#[tokio::test]
async fn test_slow_backend_times_out_and_next_is_tried() {
    let slow = Arc::new(
        MockNode::new()
            .with_fork(Ok(Some(create_test_fork(1, 1))))
            .with_delay(Duration::from_secs(5)),
    );
    let fast = Arc::new(MockNode::new().with_fork(Ok(Some(create_test_fork(2, 2)))));
    let engine = engine_with(&[("slow", &slow), ("fast", &fast)], 100);

    let start = Instant::now();
    let dispatched =
        fetch_fork(&engine, &Strategy::FirstSuccess, &CancellationToken::new()).await.unwrap();

    assert_eq!(dispatched.backend.as_ref(), "fast");
    assert_eq!(dispatched.failures[0].error, BackendError::Timeout);
    assert!(start.elapsed() < Duration::from_secs(2), "timeout should bound the slow backend");
}

#[tokio::test]
async fn test_cancellation_stops_waiting() {
    let slow = Arc::new(
        MockNode::new()
            .with_fork(Ok(Some(create_test_fork(1, 1))))
            .with_delay(Duration::from_secs(5)),
    );
    let engine = engine_with(&[("slow", &slow)], 10_000);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let start = Instant::now();
    let err = fetch_fork(&engine, &Strategy::FirstSuccess, &cancel).await.unwrap_err();

    assert_eq!(err, DispatchError::Cancelled { capability: Capability::Fork });
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_registry_changes_apply_to_next_dispatch() {
    let engine = engine_with(&[], 1000);
    let cancel = CancellationToken::new();

    let err = fetch_fork(&engine, &Strategy::FirstSuccess, &cancel).await.unwrap_err();
    assert_eq!(err, DispatchError::Unsupported { capability: Capability::Fork });

    let node = Arc::new(MockNode::new().with_fork(Ok(Some(create_test_fork(9, 1)))));
    engine.registry().register("late", node.clone());

    let dispatched = fetch_fork(&engine, &Strategy::FirstSuccess, &cancel).await.unwrap();
    assert_eq!(dispatched.backend.as_ref(), "late");

    assert!(engine.registry().remove("late"));
    let err = fetch_fork(&engine, &Strategy::FirstSuccess, &cancel).await.unwrap_err();
    assert_eq!(err, DispatchError::Unsupported { capability: Capability::Fork });
}

#[tokio::test]
async fn test_failed_backend_is_not_evicted() {
    let flaky = Arc::new(
        MockNode::new()
            .with_fork(Ok(Some(create_test_fork(3, 1))))
            .failing_first(1, BackendError::Network("reset".to_string())),
    );
    let engine = engine_with(&[("flaky", &flaky)], 1000);
    let cancel = CancellationToken::new();

    let first = fetch_fork(&engine, &Strategy::FirstSuccess, &cancel).await;
    assert!(first.is_err());
    assert_eq!(engine.registry().len(), 1, "failure must not remove the backend");

    let second = fetch_fork(&engine, &Strategy::FirstSuccess, &cancel).await.unwrap();
    assert_eq!(second.value.map(|f| f.epoch), Some(3));
    assert_eq!(flaky.calls(Capability::Fork), 2);
}
