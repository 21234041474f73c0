//! Server network layer: UDP receive loop and per-datagram handler tasks

use crate::config::ServerConfig;
use crate::error::{ProtocolError, ServerError};
use crate::protocol::ProtocolHandler;
use crate::store::PositionStore;
use log::{debug, error, info};
use shared::{hex, Message, MAX_DATAGRAM_SIZE};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;

/// Position server bound to a UDP socket
pub struct Server {
    socket: Arc<UdpSocket>,
    handler: ProtocolHandler,
}

impl Server {
    /// Binds the listen socket; failure here is the only fatal error
    pub async fn bind(config: &ServerConfig) -> Result<Self, ServerError> {
        Self::with_store(config, PositionStore::new()).await
    }

    /// Binds the listen socket around an existing store
    pub async fn with_store(
        config: &ServerConfig,
        store: PositionStore,
    ) -> Result<Self, ServerError> {
        let socket = UdpSocket::bind(config.bind_addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: config.bind_addr,
                source,
            })?;

        Ok(Server {
            socket: Arc::new(socket),
            handler: ProtocolHandler::new(store, config.position_reply),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.socket.local_addr()?)
    }

    pub fn store(&self) -> &PositionStore {
        self.handler.store()
    }

    /// Reads datagrams forever, spawning one handler task per datagram
    ///
    /// The loop never waits on a handler. Receive errors and undecodable
    /// datagrams are logged and skipped.
    pub async fn run(&self) -> Result<(), ServerError> {
        info!("Server listening on {}", self.local_addr()?);

        let mut buffer = [0u8; MAX_DATAGRAM_SIZE];

        loop {
            let (len, addr) = match self.socket.recv_from(&mut buffer).await {
                Ok(received) => received,
                Err(e) => {
                    error!("UDP packet dropped due to error: {}", e);
                    // Back off so a persistent socket error does not spin the loop
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    continue;
                }
            };

            let message = match Message::decode(&buffer[..len]) {
                Ok(message) => message,
                Err(e) => {
                    let e = ProtocolError::from(e);
                    error!("UDP packet from {} dropped: {}", addr, e);
                    continue;
                }
            };

            let socket = Arc::clone(&self.socket);
            let handler = self.handler.clone();
            tokio::spawn(async move {
                handle_datagram(&socket, &handler, message, addr).await;
            });
        }
    }
}

/// Runs the handler for one message and sends its reply, if any, to `addr`
async fn handle_datagram(
    socket: &UdpSocket,
    handler: &ProtocolHandler,
    message: Message,
    addr: SocketAddr,
) {
    debug!(
        "Received message with opcode {:02x} from {}",
        message.opcode, addr
    );

    let reply = match handler.handle(&message).await {
        Ok(reply) => reply,
        Err(e) => {
            error!("Request from {} dropped: {}", addr, e);
            return;
        }
    };

    match socket.send_to(&reply.encode(), addr).await {
        Ok(_) => debug!("Response sent to {}, data = {}", addr, hex(&reply.payload)),
        Err(e) => error!("Response to {} failed: {}", addr, e),
    }
}
