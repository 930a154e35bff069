//! Pending request handles
//!
//! A request is answered through its resolver exactly once. The channel
//! form hands the caller a [`PendingReply`] to block on.

use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, TryRecvError};

use crate::error::{GibsonError, Result};
use crate::protocol::Value;

/// Outcome delivered to a request
pub type Reply = Result<Value>;

/// Callback invoked with the reply of one request
pub type Resolver = Box<dyn FnOnce(Reply) + Send + 'static>;

/// A request waiting for its reply
pub struct PendingRequest {
    /// Opcode the request was sent with
    pub opcode: u16,

    resolver: Resolver,
}

impl PendingRequest {
    pub fn new(opcode: u16, resolver: Resolver) -> Self {
        Self { opcode, resolver }
    }

    /// Consume the request, handing it its reply
    pub fn resolve(self, reply: Reply) {
        (self.resolver)(reply)
    }
}

impl std::fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingRequest")
            .field("opcode", &self.opcode)
            .finish_non_exhaustive()
    }
}

/// Receiving side of a one-shot reply channel
#[derive(Debug)]
pub struct PendingReply {
    rx: Receiver<Reply>,
}

impl PendingReply {
    /// Create a resolver and the handle that observes it
    pub fn channel() -> (Resolver, PendingReply) {
        let (tx, rx) = channel::bounded(1);
        let resolver: Resolver = Box::new(move |reply| {
            // The caller may have dropped its handle; nobody is left to tell.
            let _ = tx.send(reply);
        });
        (resolver, PendingReply { rx })
    }

    /// Block until the reply arrives
    pub fn wait(self) -> Reply {
        self.rx.recv().unwrap_or(Err(GibsonError::ConnectionClosed))
    }

    /// Block until the reply arrives or `timeout` elapses
    ///
    /// The request stays queued after a timeout; its reply is discarded when
    /// it eventually arrives.
    pub fn wait_timeout(self, timeout: Duration) -> Reply {
        match self.rx.recv_timeout(timeout) {
            Ok(reply) => reply,
            Err(RecvTimeoutError::Timeout) => Err(GibsonError::Timeout),
            Err(RecvTimeoutError::Disconnected) => Err(GibsonError::ConnectionClosed),
        }
    }

    /// Take the reply if it has already arrived
    pub fn try_take(&self) -> Option<Reply> {
        match self.rx.try_recv() {
            Ok(reply) => Some(reply),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(GibsonError::ConnectionClosed)),
        }
    }
}
