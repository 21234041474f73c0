//! Runtime settings resolved by the server binary

use clap::ValueEnum;
use shared::{Opcode, DEFAULT_PORT};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Opcode stamped on the reply to a position update
///
/// Deployed clients expect the handshake-response value here, even though the
/// protocol declares a dedicated position-response opcode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum PositionReplyOpcode {
    /// Reply with `HandshakeResponse` (2), wire compatible with existing clients
    #[default]
    Legacy,
    /// Reply with `PositionResponse` (4)
    Declared,
}

impl PositionReplyOpcode {
    pub fn opcode(self) -> Opcode {
        match self {
            PositionReplyOpcode::Legacy => Opcode::HandshakeResponse,
            PositionReplyOpcode::Declared => Opcode::PositionResponse,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub position_reply: PositionReplyOpcode,
}

impl ServerConfig {
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            position_reply: PositionReplyOpcode::default(),
        }
    }

    pub fn with_position_reply(mut self, position_reply: PositionReplyOpcode) -> Self {
        self.position_reply = position_reply;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::new(
            IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            DEFAULT_PORT,
        ))
    }
}
