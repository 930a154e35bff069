//! Client Module
//!
//! Transport-independent request/reply engine.

mod client_core;
mod transport;

pub use client_core::ClientCore;
pub use transport::Transport;
