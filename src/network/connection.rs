//! Connection Reader
//!
//! Drives the read side of a connection on its own thread.

use std::io::{ErrorKind, Read};
use std::sync::Arc;

use crossbeam::channel::Sender;

use crate::client::ClientCore;
use crate::config::Endpoint;
use super::stream::{Stream, StreamTransport};

/// Shared protocol state of a connection
pub(crate) type SharedCore = Arc<ClientCore<StreamTransport>>;

/// Connection lifecycle notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Connected to the endpoint
    Connected(Endpoint),

    /// Peer closed the connection, or it was closed locally
    Closed,

    /// No data arrived within the read timeout
    Timeout,

    /// Transport failure
    Error(String),

    /// A reply arrived with no pending request; the connection was dropped
    ProtocolViolation(String),
}

/// Reads chunks from `stream` and feeds them into the core until the
/// connection ends. Pending requests are then failed and the ending is
/// reported on `events`.
pub(crate) fn run_reader(
    mut stream: Stream,
    core: SharedCore,
    events: Sender<ConnectionEvent>,
    buffer_size: usize,
) {
    let peer_addr = stream.peer_addr();
    tracing::debug!("Reader started for {}", peer_addr);

    let mut buf = vec![0u8; buffer_size];
    let event = loop {
        let n = match stream.read(&mut buf) {
            Ok(0) => {
                tracing::debug!("Server {} closed the connection", peer_addr);
                break ConnectionEvent::Closed;
            }
            Ok(n) => n,
            Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(ref e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                // Read timeout (Windows uses TimedOut instead of WouldBlock)
                tracing::debug!("Read timeout for {}", peer_addr);
                break ConnectionEvent::Timeout;
            }
            Err(ref e)
                if e.kind() == ErrorKind::ConnectionReset
                    || e.kind() == ErrorKind::ConnectionAborted =>
            {
                tracing::debug!("Connection to {} reset: {}", peer_addr, e);
                break ConnectionEvent::Closed;
            }
            Err(e) => {
                tracing::warn!("Error reading from {}: {}", peer_addr, e);
                break ConnectionEvent::Error(e.to_string());
            }
        };

        tracing::trace!("Read {} bytes from {}", n, peer_addr);

        if let Err(e) = core.on_bytes(&buf[..n]) {
            tracing::warn!("Dropping connection to {}: {}", peer_addr, e);
            break ConnectionEvent::ProtocolViolation(e.to_string());
        }
    };

    // Unblocks a writer stuck on a peer that stopped reading, so teardown
    // can take the transport.
    let _ = stream.shutdown();
    let failed = core.on_transport_closed();
    tracing::debug!(
        "Reader for {} stopped ({:?}, {} requests failed)",
        peer_addr,
        event,
        failed
    );

    // Nobody listening for events is fine
    let _ = events.send(event);
}
