//! Wire format shared by the position server and its clients.
//!
//! Every datagram carries exactly one message: a single opcode byte followed by
//! an opcode-specific payload. There is no length prefix; the datagram boundary
//! is the message boundary.
//!
//! | Opcode              | Value | Direction     | Payload                       |
//! |---------------------|-------|---------------|-------------------------------|
//! | `Handshake`         | 1     | client→server | `[client_id]`                 |
//! | `HandshakeResponse` | 2     | server→client | `[client_id]`                 |
//! | `PositionUpdate`    | 3     | client→server | `[client_id, x, y]`           |
//! | `PositionResponse`  | 4     | server→client | `[other_id, x, y]` repeated   |

use std::fmt;

/// Well-known UDP port the server listens on
pub const DEFAULT_PORT: u16 = 25565;

/// Size of the server's receive buffer. Longer datagrams are truncated by the read.
pub const MAX_DATAGRAM_SIZE: usize = 32;

/// Opcode byte plus at least one payload byte
pub const MIN_MESSAGE_LEN: usize = 2;

/// Length of one `[id, x, y]` entry in a position broadcast
pub const POSITION_ENTRY_LEN: usize = 3;

/// Identifier chosen by the client itself and carried in every request
pub type ClientId = u8;

/// Last reported location of a client on the 256x256 grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub x: u8,
    pub y: u8,
}

impl Coordinate {
    pub const ORIGIN: Coordinate = Coordinate { x: 0, y: 0 };

    pub fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Handshake = 0x1,
    HandshakeResponse = 0x2,
    PositionUpdate = 0x3,
    PositionResponse = 0x4,
}

impl Opcode {
    /// Maps a raw opcode byte to a known opcode, `None` for anything else
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            x if x == Opcode::Handshake as u8 => Some(Opcode::Handshake),
            x if x == Opcode::HandshakeResponse as u8 => Some(Opcode::HandshakeResponse),
            x if x == Opcode::PositionUpdate as u8 => Some(Opcode::PositionUpdate),
            x if x == Opcode::PositionResponse as u8 => Some(Opcode::PositionResponse),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Returned when a datagram is too short to hold an opcode and a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeError {
    pub len: usize,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "payload too short: got {} bytes, need at least {}",
            self.len, MIN_MESSAGE_LEN
        )
    }
}

impl std::error::Error for DecodeError {}

/// One protocol message, built per datagram and never persisted
///
/// The opcode is kept as a raw byte so that unknown opcodes survive decoding
/// and can be rejected by whoever interprets the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub opcode: u8,
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(opcode: Opcode, payload: Vec<u8>) -> Self {
        Self {
            opcode: opcode.as_byte(),
            payload,
        }
    }

    pub fn handshake(id: ClientId) -> Self {
        Self::new(Opcode::Handshake, vec![id])
    }

    pub fn position_update(id: ClientId, coord: Coordinate) -> Self {
        Self::new(Opcode::PositionUpdate, vec![id, coord.x, coord.y])
    }

    /// The known opcode this message carries, if any
    pub fn kind(&self) -> Option<Opcode> {
        Opcode::from_byte(self.opcode)
    }

    /// Serializes to `[opcode] ++ payload`
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.payload.len() + 1);
        out.push(self.opcode);
        out.extend_from_slice(&self.payload);
        out
    }

    /// Splits a datagram into opcode and payload without validating the opcode
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        if buf.len() < MIN_MESSAGE_LEN {
            return Err(DecodeError { len: buf.len() });
        }
        Ok(Self {
            opcode: buf[0],
            payload: buf[1..].to_vec(),
        })
    }
}

/// Reads the `[id, x, y]` entries of a position broadcast payload
///
/// A trailing partial entry is ignored.
pub fn parse_positions(payload: &[u8]) -> Vec<(ClientId, Coordinate)> {
    payload
        .chunks_exact(POSITION_ENTRY_LEN)
        .map(|entry| (entry[0], Coordinate::new(entry[1], entry[2])))
        .collect()
}

/// Hex rendering of a payload for diagnostics
pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
