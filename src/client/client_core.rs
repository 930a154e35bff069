//! Client Core
//!
//! Composes codec, reassembler, value decoder and router over one
//! [`Transport`].
//!
//! ## Locking
//! ```text
//! send ──► transport lock ──► inbound lock (enqueue only) ──► write_all
//! on_bytes ─────────────────► inbound lock (reassemble, decode, resolve)
//! ```
//! The transport lock is held across enqueue and write so queue order always
//! matches wire order. The read side never takes it, so a blocking write
//! cannot stall the delivery of replies.

use parking_lot::{Mutex, MutexGuard};

use crate::error::{GibsonError, Result};
use crate::pipeline::{PendingReply, PipelineRouter, Resolver};
use crate::protocol::{decode_frame, encode_request, StreamReassembler};
use super::Transport;

/// Protocol state of one connection
pub struct ClientCore<T: Transport> {
    /// Outbound byte pipe
    transport: Mutex<T>,

    /// Read-side state
    inbound: Mutex<Inbound>,
}

struct Inbound {
    /// Inbound bytes not yet framed
    reassembler: StreamReassembler,

    /// Requests waiting for replies
    router: PipelineRouter,
}

impl Inbound {
    /// Discard buffered bytes and fail everything pending
    fn fail_pending(&mut self) -> usize {
        self.reassembler.clear();
        self.router.fail_all(|| GibsonError::ConnectionClosed)
    }
}

impl<T: Transport> ClientCore<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Mutex::new(transport),
            inbound: Mutex::new(Inbound {
                reassembler: StreamReassembler::new(),
                router: PipelineRouter::new(),
            }),
        }
    }

    /// Send a request whose reply goes to `resolver`.
    ///
    /// Fails with [`GibsonError::NotConnected`] without queueing when the
    /// transport is down.
    ///
    /// A failed write may leave part of a frame on the wire, after which
    /// replies can no longer be matched to requests. The connection is torn
    /// down: this request is dequeued without calling `resolver`, every
    /// earlier request fails with [`GibsonError::ConnectionClosed`] and the
    /// write error is returned.
    pub fn send(&self, opcode: u16, payload: &[u8], resolver: Resolver) -> Result<()> {
        let mut transport = self.transport.lock();
        if !transport.is_connected() {
            return Err(GibsonError::NotConnected);
        }

        let pending = {
            let mut inbound = self.inbound.lock();
            inbound.router.enqueue(opcode, resolver);
            inbound.router.len()
        };
        let frame = encode_request(opcode, payload);

        if let Err(e) = transport.write_all(&frame) {
            tracing::warn!("Write of opcode {} failed, dropping connection: {}", opcode, e);
            transport.disconnect();

            let mut inbound = self.inbound.lock();
            inbound.router.cancel_last();
            let failed = inbound.fail_pending();
            if failed > 0 {
                tracing::debug!("Failed {} pending requests after write error", failed);
            }
            return Err(e.into());
        }

        tracing::trace!(
            "Sent opcode {} ({} payload bytes, {} pending)",
            opcode,
            payload.len(),
            pending
        );
        Ok(())
    }

    /// Send a request and get a handle to wait on its reply
    pub fn query(&self, opcode: u16, payload: &[u8]) -> Result<PendingReply> {
        let (resolver, reply) = PendingReply::channel();
        self.send(opcode, payload, resolver)?;
        Ok(reply)
    }

    /// Feed bytes read from the transport.
    ///
    /// Every frame completed by `chunk` is decoded and resolves the oldest
    /// pending request. Returns how many requests were resolved.
    /// [`GibsonError::ProtocolViolation`] means the connection must be torn
    /// down.
    pub fn on_bytes(&self, chunk: &[u8]) -> Result<usize> {
        let mut inbound = self.inbound.lock();
        let Inbound { reassembler, router } = &mut *inbound;
        let mut resolved = 0;

        for frame in reassembler.feed(chunk) {
            let frame = frame?;
            let reply = decode_frame(&frame);
            tracing::trace!(
                "Reply code {} encoding {} ({} bytes)",
                frame.code,
                frame.encoding,
                frame.len()
            );

            if let Err(e) = router.resolve_next(reply) {
                tracing::warn!("Unexpected reply code {}: {}", frame.code, e);
                return Err(e);
            }
            resolved += 1;
        }

        Ok(resolved)
    }

    /// The transport went away. Fails every pending request with
    /// [`GibsonError::ConnectionClosed`] and returns how many there were.
    ///
    /// Waits for a write in progress; shut the socket down first to abort it.
    pub fn on_transport_closed(&self) -> usize {
        self.transport.lock().disconnect();

        let failed = self.inbound.lock().fail_pending();
        if failed > 0 {
            tracing::debug!("Connection closed with {} pending requests", failed);
        }
        failed
    }

    /// Number of requests waiting for a reply
    pub fn pending(&self) -> usize {
        self.inbound.lock().router.len()
    }

    /// Bytes received but not yet forming a complete frame
    pub fn buffered_len(&self) -> usize {
        self.inbound.lock().reassembler.buffered_len()
    }

    pub fn is_connected(&self) -> bool {
        self.transport.lock().is_connected()
    }

    /// Exclusive access to the transport; blocks sends while held
    pub fn transport(&self) -> MutexGuard<'_, T> {
        self.transport.lock()
    }
}
