//! Blocking Client
//!
//! A connection to one Gibson server. Requests may be pipelined from any
//! thread; replies are read on a dedicated reader thread and delivered in
//! request order.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver};

use crate::client::ClientCore;
use crate::config::{Config, Endpoint};
use crate::error::Result;
use crate::pipeline::{PendingReply, Resolver};
use crate::protocol::{serialize_args, Command, Value};
use super::connection::{run_reader, ConnectionEvent, SharedCore};
use super::stream::{Stream, StreamTransport};

/// Client for a single server connection
///
/// Resolvers run on the reader thread while the read side is locked, so a
/// resolver must not call back into the same `Client`.
pub struct Client {
    /// Protocol state shared with the reader thread
    core: SharedCore,

    /// Extra handle on the socket, for shutting it down while a write blocks
    control: Stream,

    /// Lifecycle notifications
    events: Receiver<ConnectionEvent>,

    /// Where we are connected to
    endpoint: Endpoint,

    /// Reader thread, joined on drop
    reader: Option<JoinHandle<()>>,
}

impl Client {
    /// Connect to the configured endpoint and start the reader thread
    pub fn connect(config: Config) -> Result<Self> {
        let stream = Stream::connect(&config)?;
        let read_stream = stream.try_clone()?;
        let control = stream.try_clone()?;
        tracing::debug!("Connected to {} ({})", config.endpoint, stream.peer_addr());

        let core: SharedCore = Arc::new(ClientCore::new(StreamTransport::new(stream)));
        let (events_tx, events_rx) = channel::unbounded();
        let _ = events_tx.send(ConnectionEvent::Connected(config.endpoint.clone()));

        let reader_core = Arc::clone(&core);
        let buffer_size = config.read_buffer_size.max(1);
        let reader = thread::Builder::new()
            .name("gibson-reader".to_string())
            .spawn(move || run_reader(read_stream, reader_core, events_tx, buffer_size))?;

        Ok(Self {
            core,
            control,
            events: events_rx,
            endpoint: config.endpoint,
            reader: Some(reader),
        })
    }

    /// Connect to an endpoint string with default settings
    pub fn open(endpoint: &str) -> Result<Self> {
        Self::connect(Config::builder().endpoint_str(endpoint)?.build())
    }

    // =========================================================================
    // Raw Requests
    // =========================================================================

    /// Send a raw request; `resolver` gets the reply
    pub fn send(&self, opcode: u16, payload: &[u8], resolver: Resolver) -> Result<()> {
        self.core.send(opcode, payload, resolver)
    }

    /// Send a raw request and get a handle on its reply
    pub fn query_raw(&self, opcode: u16, payload: &[u8]) -> Result<PendingReply> {
        self.core.query(opcode, payload)
    }

    /// Send a command with space separated arguments
    pub fn query(&self, command: Command, args: &[&str]) -> Result<PendingReply> {
        self.query_raw(command.opcode(), &serialize_args(args))
    }

    /// Send a command and wait for its reply
    pub fn execute(&self, command: Command, args: &[&str]) -> Result<Value> {
        self.query(command, args)?.wait()
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Store `value` under `key`; `ttl` of 0 never expires
    pub fn set(&self, key: &str, value: &str, ttl: u32) -> Result<Value> {
        self.execute(Command::Set, &[&ttl.to_string(), key, value])
    }

    pub fn ttl(&self, key: &str, ttl: u32) -> Result<Value> {
        self.execute(Command::Ttl, &[key, &ttl.to_string()])
    }

    pub fn get(&self, key: &str) -> Result<Value> {
        self.execute(Command::Get, &[key])
    }

    pub fn del(&self, key: &str) -> Result<Value> {
        self.execute(Command::Del, &[key])
    }

    pub fn inc(&self, key: &str) -> Result<Value> {
        self.execute(Command::Inc, &[key])
    }

    pub fn dec(&self, key: &str) -> Result<Value> {
        self.execute(Command::Dec, &[key])
    }

    /// Lock `key` against writes for `seconds`
    pub fn lock(&self, key: &str, seconds: u32) -> Result<Value> {
        self.execute(Command::Lock, &[key, &seconds.to_string()])
    }

    pub fn unlock(&self, key: &str) -> Result<Value> {
        self.execute(Command::Unlock, &[key])
    }

    pub fn mset(&self, prefix: &str, value: &str) -> Result<Value> {
        self.execute(Command::MSet, &[prefix, value])
    }

    pub fn mttl(&self, prefix: &str, ttl: u32) -> Result<Value> {
        self.execute(Command::MTtl, &[prefix, &ttl.to_string()])
    }

    pub fn mget(&self, prefix: &str) -> Result<Value> {
        self.execute(Command::MGet, &[prefix])
    }

    pub fn mdel(&self, prefix: &str) -> Result<Value> {
        self.execute(Command::MDel, &[prefix])
    }

    pub fn minc(&self, prefix: &str) -> Result<Value> {
        self.execute(Command::MInc, &[prefix])
    }

    pub fn mdec(&self, prefix: &str) -> Result<Value> {
        self.execute(Command::MDec, &[prefix])
    }

    pub fn mlock(&self, prefix: &str, seconds: u32) -> Result<Value> {
        self.execute(Command::MLock, &[prefix, &seconds.to_string()])
    }

    pub fn munlock(&self, prefix: &str) -> Result<Value> {
        self.execute(Command::MUnlock, &[prefix])
    }

    pub fn count(&self, prefix: &str) -> Result<Value> {
        self.execute(Command::Count, &[prefix])
    }

    pub fn stats(&self) -> Result<Value> {
        self.execute(Command::Stats, &[])
    }

    pub fn ping(&self) -> Result<Value> {
        self.execute(Command::Ping, &[])
    }

    pub fn sizeof(&self, key: &str) -> Result<Value> {
        self.execute(Command::SizeOf, &[key])
    }

    pub fn msizeof(&self, prefix: &str) -> Result<Value> {
        self.execute(Command::MSizeOf, &[prefix])
    }

    pub fn encof(&self, key: &str) -> Result<Value> {
        self.execute(Command::EncOf, &[key])
    }

    pub fn keys(&self, prefix: &str) -> Result<Value> {
        self.execute(Command::Keys, &[prefix])
    }

    /// Read one metadata field (`size`, `encoding`, `access`, ...) of `key`
    pub fn meta(&self, key: &str, field: &str) -> Result<Value> {
        self.execute(Command::Meta, &[key, field])
    }

    /// Ask the server to end the session. No reply is expected.
    pub fn end(&self) -> Result<()> {
        self.send(Command::End.opcode(), &[], Box::new(|_| {}))
    }

    // =========================================================================
    // Connection State
    // =========================================================================

    /// Lifecycle event stream
    pub fn events(&self) -> Receiver<ConnectionEvent> {
        self.events.clone()
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn is_connected(&self) -> bool {
        self.core.is_connected()
    }

    /// Requests sent but not yet answered
    pub fn pending(&self) -> usize {
        self.core.pending()
    }

    /// Close the connection. Pending requests fail with
    /// [`GibsonError::ConnectionClosed`](crate::GibsonError::ConnectionClosed).
    pub fn close(&self) {
        tracing::debug!("Closing connection to {}", self.endpoint);
        // The peer may already be gone
        let _ = self.control.shutdown();
        self.core.on_transport_closed();
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.close();
        if let Some(reader) = self.reader.take() {
            if reader.join().is_err() {
                tracing::warn!("Reader thread for {} panicked", self.endpoint);
            }
        }
    }
}
