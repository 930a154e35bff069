//! Pipeline Module
//!
//! Outstanding request bookkeeping.
//!
//! ## Model
//! - Every request is queued with a resolver before its bytes are written
//! - Each reply resolves the queue head
//! - Replies with an empty queue are fatal to the connection

mod pending;
mod router;

pub use pending::{PendingReply, PendingRequest, Reply, Resolver};
pub use router::PipelineRouter;
