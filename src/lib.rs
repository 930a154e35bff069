//! # Gibson client
//!
//! A pipelined client for the Gibson cache server binary protocol with:
//! - Request encoding and reply header framing
//! - Reassembly of replies split or merged arbitrarily by the transport
//! - Typed decoding of text, 64-bit integer and key/value map replies
//! - Strict FIFO correlation of replies to pipelined requests
//! - TCP and Unix domain socket connections
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Client (network)                          │
//! │           callers ──send──►      ◄──read── reader thread     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     ClientCore                               │
//! └──────┬───────────────────┬────────────────────┬─────────────┘
//!        │                   │                    │
//!        ▼                   ▼                    ▼
//!  ┌───────────┐    ┌─────────────────┐   ┌────────────────┐
//!  │   Codec   │    │   Reassembler   │   │ PipelineRouter │
//!  │ (encode)  │    │ (bytes→frames)  │   │  (FIFO queue)  │
//!  └───────────┘    └────────┬────────┘   └────────────────┘
//!                            │
//!                            ▼
//!                   ┌─────────────────┐
//!                   │  Value decoder  │
//!                   └─────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod pipeline;
pub mod client;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{DecodeError, GibsonError, Result};
pub use config::{Config, Endpoint};
pub use client::{ClientCore, Transport};
pub use network::{Client, ConnectionEvent};
pub use pipeline::{PendingReply, Reply, Resolver};
pub use protocol::{Command, Value, ValueMap};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of the Gibson client
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
