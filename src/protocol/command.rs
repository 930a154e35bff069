//! Command definitions
//!
//! The static opcode table for every request the server understands.

/// Builds `Command` and its lookup helpers from one opcode table.
macro_rules! define_commands {
    ( $( $(#[$meta:meta])* $variant:ident = $opcode:literal, $name:literal; )* ) => {
        /// Request opcodes
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u16)]
        pub enum Command {
            $( $(#[$meta])* $variant = $opcode, )*
        }

        impl Command {
            /// Every command, in opcode order
            pub const ALL: &'static [Command] = &[ $( Command::$variant, )* ];

            /// Look up a command by opcode. Returns `None` for unknown opcodes.
            pub fn from_opcode(opcode: u16) -> Option<Self> {
                match opcode {
                    $( $opcode => Some(Command::$variant), )*
                    _ => None,
                }
            }

            /// Wire name, upper case
            pub fn name(self) -> &'static str {
                match self {
                    $( Command::$variant => $name, )*
                }
            }
        }
    };
}

define_commands! {
    /// `SET <ttl> <key> <value>`
    Set     = 1,   "SET";
    /// `TTL <key> <ttl>`
    Ttl     = 2,   "TTL";
    /// `GET <key>`
    Get     = 3,   "GET";
    /// `DEL <key>`
    Del     = 4,   "DEL";
    /// `INC <key>`
    Inc     = 5,   "INC";
    /// `DEC <key>`
    Dec     = 6,   "DEC";
    /// `LOCK <key> <seconds>`
    Lock    = 7,   "LOCK";
    /// `UNLOCK <key>`
    Unlock  = 8,   "UNLOCK";
    /// `MSET <prefix> <value>`
    MSet    = 9,   "MSET";
    /// `MTTL <prefix> <ttl>`
    MTtl    = 10,  "MTTL";
    /// `MGET <prefix>`
    MGet    = 11,  "MGET";
    /// `MDEL <prefix>`
    MDel    = 12,  "MDEL";
    /// `MINC <prefix>`
    MInc    = 13,  "MINC";
    /// `MDEC <prefix>`
    MDec    = 14,  "MDEC";
    /// `MLOCK <prefix> <seconds>`
    MLock   = 15,  "MLOCK";
    /// `MUNLOCK <prefix>`
    MUnlock = 16,  "MUNLOCK";
    /// `COUNT <prefix>`
    Count   = 17,  "COUNT";
    /// `STATS`
    Stats   = 18,  "STATS";
    /// `PING`
    Ping    = 19,  "PING";
    /// `SIZEOF <key>`
    SizeOf  = 20,  "SIZEOF";
    /// `MSIZEOF <prefix>`
    MSizeOf = 21,  "MSIZEOF";
    /// `ENCOF <key>`
    EncOf   = 22,  "ENCOF";
    /// `KEYS <prefix>`
    Keys    = 23,  "KEYS";
    /// `META <key> <field>`
    Meta    = 24,  "META";
    /// `END` (server closes the connection)
    End     = 255, "END";
}

impl Command {
    /// Opcode sent on the wire
    #[inline]
    pub fn opcode(self) -> u16 {
        self as u16
    }

    /// Look up a command by name, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|cmd| cmd.name().eq_ignore_ascii_case(name))
    }
}

/// Serialize command arguments into a request payload.
///
/// Arguments are joined by a single space, so `SET 0 key value` is sent as
/// the payload `0 key value`.
pub fn serialize_args<S: AsRef<str>>(args: &[S]) -> Vec<u8> {
    let len = args.iter().map(|a| a.as_ref().len()).sum::<usize>() + args.len().saturating_sub(1);
    let mut payload = Vec::with_capacity(len);
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            payload.push(b' ');
        }
        payload.extend_from_slice(arg.as_ref().as_bytes());
    }
    payload
}
