//! Reply definitions
//!
//! Reply codes, value encodings and the server error table.

/// Generic error
pub const REPL_ERR: u16 = 0;
/// Key not found
pub const REPL_ERR_NOT_FOUND: u16 = 1;
/// Value is not a number
pub const REPL_ERR_NAN: u16 = 2;
/// Server is out of memory
pub const REPL_ERR_MEM: u16 = 3;
/// Item is locked
pub const REPL_ERR_LOCKED: u16 = 4;
/// Success with no value
pub const REPL_OK: u16 = 5;
/// Single value
pub const REPL_VAL: u16 = 6;
/// Key/value map
pub const REPL_KVAL: u16 = 7;

/// How a reply code asks its payload to be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// Error reply; payload is kept raw
    Error,
    /// Scalar value, decoded per encoding
    Value,
    /// Map of key to scalar value
    Map,
    /// Anything else; payload is returned as opaque bytes
    Opaque,
}

impl ReplyKind {
    /// Classify a reply code
    pub fn of(code: u16) -> Self {
        match code {
            c if c < REPL_OK => ReplyKind::Error,
            REPL_VAL => ReplyKind::Value,
            REPL_KVAL => ReplyKind::Map,
            _ => ReplyKind::Opaque,
        }
    }
}

/// Message for an error reply code, `None` if the code is not in the table
pub fn error_message(code: u16) -> Option<&'static str> {
    match code {
        REPL_ERR => Some("Generic error while executing the query."),
        REPL_ERR_NOT_FOUND => Some("Invalid key, item not found."),
        REPL_ERR_NAN => Some("Invalid value, not a number."),
        REPL_ERR_MEM => Some("Gibson server is out of memory."),
        REPL_ERR_LOCKED => Some("The item is locked."),
        _ => None,
    }
}

/// Value encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Encoding {
    /// Raw text
    Plain = 0x00,
    /// LZF compressed, only used inside the server
    Lzf = 0x01,
    /// Little-endian signed integer, 4 or 8 bytes
    Number = 0x02,
}

impl Encoding {
    /// Decode an encoding byte. Returns `None` for unknown values.
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Encoding::Plain),
            0x01 => Some(Encoding::Lzf),
            0x02 => Some(Encoding::Number),
            _ => None,
        }
    }
}
