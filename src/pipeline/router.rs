//! Pipeline Router
//!
//! Matches replies to requests strictly first-in first-out. The protocol
//! puts no request id in a reply, so send order is the only correlation.

use std::collections::VecDeque;

use crate::error::{GibsonError, Result};
use super::pending::{PendingRequest, Reply, Resolver};

/// Ordered queue of outstanding requests
#[derive(Debug, Default)]
pub struct PipelineRouter {
    queue: VecDeque<PendingRequest>,
}

impl PipelineRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a request. Must happen before or together with writing it.
    pub fn enqueue(&mut self, opcode: u16, resolver: Resolver) {
        self.queue.push_back(PendingRequest::new(opcode, resolver));
    }

    /// Hand `reply` to the oldest outstanding request.
    ///
    /// Returns the opcode of the resolved request. A reply with nothing
    /// queued is a [`GibsonError::ProtocolViolation`]; correlation of every
    /// later reply is unknown from that point on.
    pub fn resolve_next(&mut self, reply: Reply) -> Result<u16> {
        let request = self.queue.pop_front().ok_or_else(|| {
            GibsonError::ProtocolViolation("reply received with no pending request".to_string())
        })?;

        let opcode = request.opcode;
        request.resolve(reply);
        Ok(opcode)
    }

    /// Remove the most recently queued request without resolving it.
    ///
    /// Used when writing that request failed, so no reply will come for it.
    pub fn cancel_last(&mut self) -> Option<PendingRequest> {
        self.queue.pop_back()
    }

    /// Resolve every outstanding request with an error built by `make_err`,
    /// oldest first. Returns how many were failed.
    pub fn fail_all<F>(&mut self, mut make_err: F) -> usize
    where
        F: FnMut() -> GibsonError,
    {
        let count = self.queue.len();
        while let Some(request) = self.queue.pop_front() {
            request.resolve(Err(make_err()));
        }
        count
    }

    /// Opcode of the request the next reply belongs to
    pub fn peek_opcode(&self) -> Option<u16> {
        self.queue.front().map(|r| r.opcode)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
