//! Transport abstraction
//!
//! The byte pipe a [`ClientCore`](super::ClientCore) writes requests to.
//! Inbound bytes are pushed into the core by whoever owns the read side.

use std::io;

/// Outbound side of a connection
pub trait Transport {
    /// Write a whole request frame
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Whether requests can still be written
    fn is_connected(&self) -> bool;

    /// Tear the connection down. Idempotent.
    fn disconnect(&mut self);
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        (**self).write_all(buf)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn disconnect(&mut self) {
        (**self).disconnect()
    }
}
