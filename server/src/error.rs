//! Error types for the position server
//!
//! None of these are ever sent to a peer; the protocol has no error reply and a
//! rejected request is observed remotely only as silence.

use shared::{ClientId, DecodeError};
use std::fmt;
use std::net::SocketAddr;

/// Why a single datagram was dropped without a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Datagram or payload too short for the fields its opcode requires
    Malformed { opcode: Option<u8>, len: usize },
    /// Handshake for an id that is already in the position store
    DuplicateRegistration { id: ClientId },
    /// Decoded fine but no handler exists for this opcode
    UnknownOpcode(u8),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::Malformed {
                opcode: Some(opcode),
                len,
            } => write!(
                f,
                "malformed request: opcode {:02x} with {} byte payload",
                opcode, len
            ),
            ProtocolError::Malformed { opcode: None, len } => {
                write!(f, "malformed request: {} byte datagram", len)
            }
            ProtocolError::DuplicateRegistration { id } => {
                write!(f, "player {} is already present", id)
            }
            ProtocolError::UnknownOpcode(opcode) => write!(f, "unknown opcode {:02x}", opcode),
        }
    }
}

impl std::error::Error for ProtocolError {}

impl From<DecodeError> for ProtocolError {
    fn from(err: DecodeError) -> Self {
        ProtocolError::Malformed {
            opcode: None,
            len: err.len,
        }
    }
}

/// Failures of the server process itself
#[derive(Debug)]
pub enum ServerError {
    /// The listen socket could not be bound; fatal at startup
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    Io(std::io::Error),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Bind { addr, source } => {
                write!(f, "failed to bind UDP socket on {}: {}", addr, source)
            }
            ServerError::Io(err) => write!(f, "socket error: {}", err),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerError::Bind { source, .. } => Some(source),
            ServerError::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Io(err)
    }
}
