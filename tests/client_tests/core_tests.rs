//! Tests for ClientCore
//!
//! These tests verify, against an in-memory transport:
//! - Request bytes written for each send
//! - Pipelined replies resolve in send order, however they are chunked
//! - Decode and server errors reach only their own request
//! - Protocol violations and transport teardown

use std::io;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};

use gibson::pipeline::{PendingReply, Reply};
use gibson::protocol::{encode_reply, encode_request, REPL_ERR_NOT_FOUND, REPL_KVAL, REPL_OK, REPL_VAL};
use gibson::{ClientCore, DecodeError, GibsonError, Transport, Value};

const PLAIN: u8 = 0;
const NUMBER: u8 = 2;

// =============================================================================
// Helper Types
// =============================================================================

/// Records writes; can be told to fail them
#[derive(Default)]
struct MockTransport {
    written: Vec<u8>,
    connected: bool,
    fail_writes: bool,
    disconnects: usize,
}

impl MockTransport {
    fn connected() -> Self {
        Self {
            connected: true,
            ..Self::default()
        }
    }
}

impl Transport for MockTransport {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock write failure"));
        }
        self.written.extend_from_slice(buf);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn disconnect(&mut self) {
        self.connected = false;
        self.disconnects += 1;
    }
}

/// Blocks any write ending in `b"big"` until the gate opens
struct GatedTransport {
    started: Sender<()>,
    gate: Receiver<()>,
}

impl Transport for GatedTransport {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        if buf.ends_with(b"big") {
            let _ = self.started.send(());
            let _ = self.gate.recv();
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn disconnect(&mut self) {}
}

fn setup_core() -> ClientCore<MockTransport> {
    ClientCore::new(MockTransport::connected())
}

fn text_reply(s: &str) -> Vec<u8> {
    encode_reply(REPL_VAL, PLAIN, s.as_bytes()).to_vec()
}

// =============================================================================
// Send Tests
// =============================================================================

#[test]
fn test_send_writes_encoded_request() {
    let core = setup_core();

    let _reply = core.query(3, b"mykey").unwrap();
    let _reply2 = core.query(19, b"").unwrap();

    let mut expected = encode_request(3, b"mykey").to_vec();
    expected.extend_from_slice(&encode_request(19, b""));
    assert_eq!(core.transport().written, expected);
    assert_eq!(core.pending(), 2);
}

#[test]
fn test_send_when_disconnected_does_not_enqueue() {
    let core = ClientCore::new(MockTransport::default());

    let result = core.query(3, b"key");

    assert!(matches!(result, Err(GibsonError::NotConnected)));
    assert_eq!(core.pending(), 0);
    assert!(core.transport().written.is_empty());
}

#[test]
fn test_failed_write_tears_connection_down() {
    let core = setup_core();
    let first = core.query(3, b"a").unwrap();
    let second = core.query(3, b"b").unwrap();

    core.transport().fail_writes = true;
    let result = core.query(3, b"c");

    assert!(matches!(result, Err(GibsonError::Io(_))));
    assert!(!core.is_connected());
    assert_eq!(core.transport().disconnects, 1);
    assert_eq!(core.pending(), 0);

    // Replies can no longer be matched, so earlier requests fail too
    assert!(matches!(first.wait(), Err(GibsonError::ConnectionClosed)));
    assert!(matches!(second.wait(), Err(GibsonError::ConnectionClosed)));

    core.transport().fail_writes = false;
    assert!(matches!(core.query(3, b"d"), Err(GibsonError::NotConnected)));
}

#[test]
fn test_failed_write_discards_partial_reply() {
    let core = setup_core();
    let _reply = core.query(3, b"a").unwrap();
    core.on_bytes(&text_reply("partial")[..5]).unwrap();
    assert_eq!(core.buffered_len(), 5);

    core.transport().fail_writes = true;
    assert!(core.query(3, b"b").is_err());

    assert_eq!(core.buffered_len(), 0);
}

#[test]
fn test_failed_write_does_not_call_resolver() {
    let core = setup_core();
    core.transport().fail_writes = true;

    let called = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&called);
    let result = core.send(3, b"k", Box::new(move |_| *flag.lock().unwrap() = true));

    assert!(result.is_err());
    assert!(!*called.lock().unwrap());
}

// =============================================================================
// Pipelining Tests
// =============================================================================

#[test]
fn test_pipelined_replies_in_one_chunk() {
    let core = setup_core();
    let order = Arc::new(Mutex::new(Vec::new()));

    for i in 0..4u32 {
        let order = Arc::clone(&order);
        core.send(3, format!("k{}", i).as_bytes(), Box::new(move |reply: Reply| {
            order.lock().unwrap().push((i, reply.unwrap()));
        }))
        .unwrap();
    }

    // Mixed payload sizes, all delivered at once
    let mut stream = text_reply("");
    stream.extend_from_slice(&text_reply(&"x".repeat(10_000)));
    stream.extend_from_slice(&encode_reply(REPL_VAL, NUMBER, &(1i64 << 40).to_le_bytes()));
    stream.extend_from_slice(&encode_reply(REPL_OK, PLAIN, b""));

    assert_eq!(core.on_bytes(&stream).unwrap(), 4);
    assert_eq!(core.pending(), 0);

    let order = order.lock().unwrap();
    let tags: Vec<u32> = order.iter().map(|(i, _)| *i).collect();
    assert_eq!(tags, vec![0, 1, 2, 3]);
    assert_eq!(order[0].1, Value::Text(String::new()));
    assert_eq!(order[1].1, Value::Text("x".repeat(10_000)));
    assert_eq!(order[2].1, Value::Integer(1 << 40));
    assert!(order[3].1.as_bytes().unwrap().is_empty());
}

#[test]
fn test_pipelined_replies_byte_by_byte() {
    let core = setup_core();
    let replies: Vec<PendingReply> = (0..3).map(|_| core.query(3, b"k").unwrap()).collect();

    let mut stream = text_reply("one");
    stream.extend_from_slice(&text_reply("two"));
    stream.extend_from_slice(&text_reply("three"));

    let mut resolved = 0;
    for byte in &stream {
        resolved += core.on_bytes(std::slice::from_ref(byte)).unwrap();
    }
    assert_eq!(resolved, 3);

    let values: Vec<Value> = replies.into_iter().map(|r| r.wait().unwrap()).collect();
    assert_eq!(
        values,
        vec![
            Value::Text("one".to_string()),
            Value::Text("two".to_string()),
            Value::Text("three".to_string()),
        ]
    );
}

#[test]
fn test_partial_reply_keeps_request_pending() {
    let core = setup_core();
    let reply = core.query(3, b"k").unwrap();
    let bytes = text_reply("value");

    assert_eq!(core.on_bytes(&bytes[..5]).unwrap(), 0);
    assert_eq!(core.pending(), 1);
    assert_eq!(core.buffered_len(), 5);
    assert!(reply.try_take().is_none());

    assert_eq!(core.on_bytes(&bytes[5..]).unwrap(), 1);
    assert_eq!(reply.wait().unwrap(), Value::Text("value".to_string()));
}

#[test]
fn test_replies_delivered_while_write_blocks() {
    let (started_tx, started_rx) = channel::bounded(1);
    let (gate_tx, gate_rx) = channel::bounded(1);
    let core = Arc::new(ClientCore::new(GatedTransport {
        started: started_tx,
        gate: gate_rx,
    }));

    let early = core.query(3, b"k").unwrap();

    let writer = {
        let core = Arc::clone(&core);
        thread::spawn(move || core.query(1, b"0 k big").map(|_| ()))
    };
    started_rx.recv_timeout(Duration::from_secs(5)).unwrap();

    // The writer is parked inside write_all; the read side must still run
    let (done_tx, done_rx) = channel::bounded(1);
    {
        let core = Arc::clone(&core);
        thread::spawn(move || {
            let _ = done_tx.send(core.on_bytes(&text_reply("early")));
        });
    }
    let resolved = done_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("reply delivery waited on a blocked write");
    assert_eq!(resolved.unwrap(), 1);
    assert_eq!(early.wait().unwrap(), Value::Text("early".to_string()));

    gate_tx.send(()).unwrap();
    writer.join().unwrap().unwrap();
    assert_eq!(core.pending(), 1);
}

// =============================================================================
// Error Routing Tests
// =============================================================================

#[test]
fn test_errors_go_to_their_own_request() {
    let core = setup_core();
    let r1 = core.query(3, b"missing").unwrap();
    let r2 = core.query(3, b"weird").unwrap();
    let r3 = core.query(11, b"prefix").unwrap();

    let mut stream = encode_reply(REPL_ERR_NOT_FOUND, PLAIN, b"").to_vec();
    stream.extend_from_slice(&encode_reply(REPL_VAL, 0x33, b"??"));
    let mut map = 1u32.to_le_bytes().to_vec();
    map.extend_from_slice(&1u32.to_le_bytes());
    map.extend_from_slice(b"k");
    map.push(PLAIN);
    map.extend_from_slice(&1u32.to_le_bytes());
    map.extend_from_slice(b"v");
    stream.extend_from_slice(&encode_reply(REPL_KVAL, PLAIN, &map));

    assert_eq!(core.on_bytes(&stream).unwrap(), 3);

    assert!(matches!(
        r1.wait(),
        Err(GibsonError::Server { code: REPL_ERR_NOT_FOUND, .. })
    ));
    assert!(matches!(
        r2.wait(),
        Err(GibsonError::Decode(DecodeError::UnknownEncoding(0x33)))
    ));
    let value = r3.wait().unwrap();
    assert_eq!(value.as_map().unwrap().get("k"), Some(&Value::Text("v".to_string())));
    assert!(core.is_connected());
}

#[test]
fn test_stray_reply_is_protocol_violation() {
    let core = setup_core();

    let err = core.on_bytes(&text_reply("nobody asked")).unwrap_err();

    assert!(matches!(err, GibsonError::ProtocolViolation(_)));
}

#[test]
fn test_violation_after_valid_replies() {
    let core = setup_core();
    let reply = core.query(3, b"k").unwrap();

    let mut stream = text_reply("expected");
    stream.extend_from_slice(&text_reply("extra"));

    assert!(matches!(
        core.on_bytes(&stream),
        Err(GibsonError::ProtocolViolation(_))
    ));
    assert_eq!(reply.wait().unwrap(), Value::Text("expected".to_string()));
}

// =============================================================================
// Teardown Tests
// =============================================================================

#[test]
fn test_transport_closed_fails_pending() {
    let core = setup_core();
    let replies: Vec<PendingReply> = (0..3).map(|_| core.query(3, b"k").unwrap()).collect();
    core.on_bytes(&text_reply("first")).unwrap();
    core.on_bytes(&text_reply("half")[..4]).unwrap();

    let failed = core.on_transport_closed();

    assert_eq!(failed, 2);
    assert_eq!(core.pending(), 0);
    assert_eq!(core.buffered_len(), 0);
    assert!(!core.is_connected());
    assert_eq!(core.transport().disconnects, 1);

    let mut replies = replies.into_iter();
    assert!(replies.next().unwrap().wait().is_ok());
    for reply in replies {
        assert!(matches!(reply.wait(), Err(GibsonError::ConnectionClosed)));
    }
}

#[test]
fn test_send_after_close_is_not_connected() {
    let core = setup_core();
    core.on_transport_closed();

    assert!(matches!(
        core.query(19, b""),
        Err(GibsonError::NotConnected)
    ));
}
