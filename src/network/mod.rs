//! Network Module
//!
//! Socket connections to a Gibson server.
//!
//! ## Architecture
//! - One reader thread per connection feeding the client core
//! - Requests written directly from the calling thread
//! - Lifecycle changes reported as `ConnectionEvent`s

mod client;
mod connection;
mod stream;

pub use client::Client;
pub use connection::ConnectionEvent;
pub use stream::{Stream, StreamTransport};
