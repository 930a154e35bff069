//! Protocol Module
//!
//! Defines the Gibson binary wire protocol as seen from the client.
//!
//! ## Request Format
//! ```text
//! ┌──────────┬───────────┬─────────────────────────────┐
//! │ Len (4)  │ Opcode(2) │         Payload             │
//! └──────────┴───────────┴─────────────────────────────┘
//! ```
//!
//! ## Reply Format
//! ```text
//! ┌──────────┬────────┬──────────┬─────────────────────────────┐
//! │ Code (2) │ Enc (1)│ Len (4)  │         Payload             │
//! └──────────┴────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ## Reply Codes
//! - 0..=4: errors (generic, not found, not a number, out of memory, locked)
//! - 5: OK
//! - 6: value, decoded per encoding (PLAIN text or NUMBER)
//! - 7: key/value map
//!
//! Replies carry no request id; they arrive in request order.

mod codec;
mod command;
mod reassembler;
mod reply;
mod value;

pub use codec::{
    encode_reply, encode_request, encode_request_into, try_decode_header, Frame, FrameHeader,
    HEADER_SIZE, REQUEST_HEADER_SIZE,
};
pub use command::{serialize_args, Command};
pub use reassembler::{Frames, StreamReassembler};
pub use reply::{
    error_message, Encoding, ReplyKind, REPL_ERR, REPL_ERR_LOCKED, REPL_ERR_MEM, REPL_ERR_NAN,
    REPL_ERR_NOT_FOUND, REPL_KVAL, REPL_OK, REPL_VAL,
};
pub use value::{decode, decode_frame, decode_scalar, i64_from_words, Value, ValueMap};
