//! Tests for the Pipeline Router
//!
//! These tests verify:
//! - Replies resolve requests in enqueue order
//! - A reply with nothing queued is a protocol violation
//! - Cancellation and teardown of outstanding requests

use std::sync::{Arc, Mutex};
use std::time::Duration;

use gibson::pipeline::{PendingReply, PipelineRouter, Reply, Resolver};
use gibson::{GibsonError, Value};

// =============================================================================
// Helper Functions
// =============================================================================

/// Resolver that records `(tag, reply)` into a shared log
fn recorder(log: &Arc<Mutex<Vec<(u32, Reply)>>>, tag: u32) -> Resolver {
    let log = Arc::clone(log);
    Box::new(move |reply| log.lock().unwrap().push((tag, reply)))
}

fn text(s: &str) -> Reply {
    Ok(Value::Text(s.to_string()))
}

// =============================================================================
// Ordering Tests
// =============================================================================

#[test]
fn test_resolves_in_fifo_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut router = PipelineRouter::new();

    for tag in 0..5 {
        router.enqueue(3, recorder(&log, tag));
    }
    assert_eq!(router.len(), 5);

    for i in 0..5 {
        router.resolve_next(text(&format!("reply {}", i))).unwrap();
    }

    let log = log.lock().unwrap();
    let tags: Vec<u32> = log.iter().map(|(t, _)| *t).collect();
    assert_eq!(tags, vec![0, 1, 2, 3, 4]);
    for (tag, reply) in log.iter() {
        assert_eq!(reply.as_ref().unwrap(), &Value::Text(format!("reply {}", tag)));
    }
}

#[test]
fn test_resolve_returns_opcode() {
    let mut router = PipelineRouter::new();
    let (a, _ra) = PendingReply::channel();
    let (b, _rb) = PendingReply::channel();
    router.enqueue(1, a);
    router.enqueue(18, b);

    assert_eq!(router.peek_opcode(), Some(1));
    assert_eq!(router.resolve_next(text("x")).unwrap(), 1);
    assert_eq!(router.resolve_next(text("y")).unwrap(), 18);
    assert!(router.is_empty());
}

#[test]
fn test_errors_are_delivered_to_the_request() {
    let mut router = PipelineRouter::new();
    let (resolver, reply) = PendingReply::channel();
    router.enqueue(3, resolver);

    router
        .resolve_next(Err(GibsonError::ConnectionClosed))
        .unwrap();

    assert!(matches!(reply.wait(), Err(GibsonError::ConnectionClosed)));
}

// =============================================================================
// Violation Tests
// =============================================================================

#[test]
fn test_reply_on_empty_queue_is_violation() {
    let mut router = PipelineRouter::new();

    let err = router.resolve_next(text("stray")).unwrap_err();
    assert!(matches!(err, GibsonError::ProtocolViolation(_)));
    assert!(err.is_fatal());
}

#[test]
fn test_extra_reply_after_queue_drains() {
    let mut router = PipelineRouter::new();
    let (resolver, _reply) = PendingReply::channel();
    router.enqueue(3, resolver);

    assert!(router.resolve_next(text("ok")).is_ok());
    assert!(matches!(
        router.resolve_next(text("extra")),
        Err(GibsonError::ProtocolViolation(_))
    ));
}

// =============================================================================
// Cancellation / Teardown Tests
// =============================================================================

#[test]
fn test_cancel_last_removes_newest() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut router = PipelineRouter::new();
    router.enqueue(1, recorder(&log, 1));
    router.enqueue(2, recorder(&log, 2));

    let cancelled = router.cancel_last().unwrap();
    assert_eq!(cancelled.opcode, 2);
    assert_eq!(router.len(), 1);

    router.resolve_next(text("a")).unwrap();
    let log = log.lock().unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].0, 1);
}

#[test]
fn test_fail_all_resolves_everything_in_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut router = PipelineRouter::new();
    for tag in 0..3 {
        router.enqueue(3, recorder(&log, tag));
    }

    let failed = router.fail_all(|| GibsonError::ConnectionClosed);

    assert_eq!(failed, 3);
    assert!(router.is_empty());
    let log = log.lock().unwrap();
    let tags: Vec<u32> = log.iter().map(|(t, _)| *t).collect();
    assert_eq!(tags, vec![0, 1, 2]);
    assert!(log
        .iter()
        .all(|(_, r)| matches!(r, Err(GibsonError::ConnectionClosed))));
}

#[test]
fn test_fail_all_on_empty_queue() {
    let mut router = PipelineRouter::new();
    assert_eq!(router.fail_all(|| GibsonError::ConnectionClosed), 0);
}

// =============================================================================
// Reply Handle Tests
// =============================================================================

#[test]
fn test_pending_reply_try_take() {
    let (resolver, reply) = PendingReply::channel();
    assert!(reply.try_take().is_none());

    resolver(Ok(Value::Integer(9)));
    assert_eq!(reply.try_take().unwrap().unwrap(), Value::Integer(9));
}

#[test]
fn test_pending_reply_timeout() {
    let (_resolver, reply) = PendingReply::channel();

    let result = reply.wait_timeout(Duration::from_millis(20));
    assert!(matches!(result, Err(GibsonError::Timeout)));
}

#[test]
fn test_dropped_resolver_means_closed() {
    let (resolver, reply) = PendingReply::channel();
    drop(resolver);

    assert!(matches!(reply.wait(), Err(GibsonError::ConnectionClosed)));
}

#[test]
fn test_resolver_tolerates_dropped_handle() {
    let (resolver, reply) = PendingReply::channel();
    drop(reply);

    // Must not panic
    resolver(Ok(Value::Integer(1)));
}
