//! Interprets one decoded message against the position store
//!
//! Each datagram is handled on its own. The only per-client state is whether
//! the client id is present in the store, so there is no session to look up and
//! no ordering between messages to maintain. A call performs at most one store
//! mutation and yields at most one reply; sending that reply is left to the
//! network layer.

use crate::config::PositionReplyOpcode;
use crate::error::ProtocolError;
use crate::store::PositionStore;
use log::{debug, trace};
use shared::{hex, Coordinate, Message, Opcode, POSITION_ENTRY_LEN};

/// Applies client requests to the store and builds the matching replies
#[derive(Debug, Clone)]
pub struct ProtocolHandler {
    store: PositionStore,
    position_reply: PositionReplyOpcode,
}

impl ProtocolHandler {
    pub fn new(store: PositionStore, position_reply: PositionReplyOpcode) -> Self {
        Self {
            store,
            position_reply,
        }
    }

    pub fn store(&self) -> &PositionStore {
        &self.store
    }

    /// Handles one message, returning the reply to send back to its source
    ///
    /// An error means the datagram is dropped and nothing is sent.
    pub async fn handle(&self, message: &Message) -> Result<Message, ProtocolError> {
        match message.kind() {
            Some(Opcode::Handshake) => self.handle_handshake(message).await,
            Some(Opcode::PositionUpdate) => self.handle_position_update(message).await,
            _ => Err(ProtocolError::UnknownOpcode(message.opcode)),
        }
    }

    /// Registers the claimed id at the origin and echoes it back
    async fn handle_handshake(&self, message: &Message) -> Result<Message, ProtocolError> {
        debug!("opcode = handshake, data = {}", hex(&message.payload));

        let Some(&id) = message.payload.first() else {
            return Err(ProtocolError::Malformed {
                opcode: Some(message.opcode),
                len: 0,
            });
        };

        if !self.store.register(id).await {
            return Err(ProtocolError::DuplicateRegistration { id });
        }
        debug!(
            "Registered player {} ({} players)",
            id,
            self.store.len().await
        );

        Ok(Message::new(Opcode::HandshakeResponse, vec![id]))
    }

    /// Records the reported position and replies with everyone else's
    ///
    /// Unknown ids are registered implicitly. The write and the snapshot are
    /// separate lock sections, so the reply may or may not include updates
    /// applied concurrently by other handlers.
    async fn handle_position_update(&self, message: &Message) -> Result<Message, ProtocolError> {
        debug!("opcode = position, data = {}", hex(&message.payload));

        let &[id, x, y, ..] = message.payload.as_slice() else {
            return Err(ProtocolError::Malformed {
                opcode: Some(message.opcode),
                len: message.payload.len(),
            });
        };

        self.store.set(id, Coordinate::new(x, y)).await;

        let positions = self.store.get_all().await;
        let mut payload = Vec::with_capacity(positions.len() * POSITION_ENTRY_LEN);
        for (other_id, coord) in positions {
            if other_id == id {
                continue;
            }
            trace!("position data: player {} at {}", other_id, coord);
            payload.extend_from_slice(&[other_id, coord.x, coord.y]);
        }

        Ok(Message::new(self.position_reply.opcode(), payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::parse_positions;
    use tokio_test::assert_ok;

    fn handler() -> ProtocolHandler {
        ProtocolHandler::new(PositionStore::new(), PositionReplyOpcode::Legacy)
    }

    fn sorted_entries(reply: &Message) -> Vec<(u8, Coordinate)> {
        let mut entries = parse_positions(&reply.payload);
        entries.sort_by_key(|(id, _)| *id);
        entries
    }

    #[tokio::test]
    async fn test_handshake_registers_at_origin() {
        let handler = handler();

        let reply = assert_ok!(handler.handle(&Message::handshake(7)).await);

        assert_eq!(reply.encode(), vec![2, 7]);
        assert_eq!(handler.store().get(7).await, Some(Coordinate::ORIGIN));
        assert_eq!(handler.store().len().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_handshake_is_rejected() {
        let handler = handler();
        handler.store().set(7, Coordinate::new(10, 20)).await;

        let result = handler.handle(&Message::handshake(7)).await;

        assert_eq!(result, Err(ProtocolError::DuplicateRegistration { id: 7 }));
        assert_eq!(handler.store().get(7).await, Some(Coordinate::new(10, 20)));
        assert_eq!(handler.store().len().await, 1);
    }

    #[tokio::test]
    async fn test_handshake_ignores_extra_payload() {
        let handler = handler();
        let message = Message::new(Opcode::Handshake, vec![3, 99, 99]);

        let reply = assert_ok!(handler.handle(&message).await);

        assert_eq!(reply.payload, vec![3]);
        assert_eq!(handler.store().get(3).await, Some(Coordinate::ORIGIN));
    }

    #[tokio::test]
    async fn test_handshake_empty_payload_is_malformed() {
        let handler = handler();
        let message = Message::new(Opcode::Handshake, Vec::new());

        let result = handler.handle(&message).await;

        assert_eq!(
            result,
            Err(ProtocolError::Malformed {
                opcode: Some(1),
                len: 0
            })
        );
        assert!(handler.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_position_update_short_payload_is_malformed() {
        let handler = handler();
        handler.store().set(1, Coordinate::new(4, 4)).await;

        for payload in [vec![], vec![1], vec![1, 2]] {
            let len = payload.len();
            let message = Message::new(Opcode::PositionUpdate, payload);
            let result = handler.handle(&message).await;
            assert_eq!(
                result,
                Err(ProtocolError::Malformed {
                    opcode: Some(3),
                    len
                })
            );
        }

        assert_eq!(handler.store().get(1).await, Some(Coordinate::new(4, 4)));
        assert_eq!(handler.store().len().await, 1);
    }

    #[tokio::test]
    async fn test_position_update_sole_client_gets_empty_reply() {
        let handler = handler();
        assert_ok!(handler.handle(&Message::handshake(7)).await);

        let update = Message::position_update(7, Coordinate::new(10, 20));
        let reply = assert_ok!(handler.handle(&update).await);

        assert_eq!(reply.encode(), vec![2]);
        assert_eq!(handler.store().get(7).await, Some(Coordinate::new(10, 20)));
    }

    #[tokio::test]
    async fn test_position_update_excludes_sender() {
        let handler = handler();
        handler.store().set(1, Coordinate::new(1, 1)).await;
        handler.store().set(2, Coordinate::new(2, 2)).await;
        handler.store().set(3, Coordinate::new(3, 3)).await;

        let update = Message::position_update(2, Coordinate::new(50, 60));
        let reply = assert_ok!(handler.handle(&update).await);

        assert_eq!(reply.payload.len(), 6);
        assert_eq!(
            sorted_entries(&reply),
            vec![(1, Coordinate::new(1, 1)), (3, Coordinate::new(3, 3))]
        );
        assert_eq!(handler.store().get(2).await, Some(Coordinate::new(50, 60)));
    }

    #[tokio::test]
    async fn test_position_update_registers_unknown_id() {
        let handler = handler();
        handler.store().set(9, Coordinate::ORIGIN).await;

        let update = Message::position_update(5, Coordinate::new(7, 8));
        let reply = assert_ok!(handler.handle(&update).await);

        assert!(handler.store().contains(5).await);
        assert_eq!(sorted_entries(&reply), vec![(9, Coordinate::ORIGIN)]);
    }

    #[tokio::test]
    async fn test_position_update_ignores_trailing_bytes() {
        let handler = handler();
        let message = Message::new(Opcode::PositionUpdate, vec![4, 11, 12, 13, 14]);

        assert_ok!(handler.handle(&message).await);

        assert_eq!(handler.store().get(4).await, Some(Coordinate::new(11, 12)));
        assert_eq!(handler.store().len().await, 1);
    }

    #[tokio::test]
    async fn test_declared_position_reply_opcode() {
        let handler = ProtocolHandler::new(PositionStore::new(), PositionReplyOpcode::Declared);
        handler.store().set(9, Coordinate::new(3, 4)).await;

        let update = Message::position_update(7, Coordinate::new(1, 2));
        let reply = assert_ok!(handler.handle(&update).await);

        assert_eq!(reply.encode(), vec![4, 9, 3, 4]);

        let handshake = assert_ok!(handler.handle(&Message::handshake(1)).await);
        assert_eq!(handshake.opcode, 2);
    }

    #[tokio::test]
    async fn test_unknown_opcodes_are_rejected() {
        let handler = handler();

        for opcode in [0u8, 2, 4, 5, 0xFF] {
            let message = Message {
                opcode,
                payload: vec![1, 2, 3],
            };
            let result = handler.handle(&message).await;
            assert_eq!(result, Err(ProtocolError::UnknownOpcode(opcode)));
        }

        assert!(handler.store().is_empty().await);
    }

    #[tokio::test]
    async fn test_two_client_session() {
        let handler = handler();

        let reply = assert_ok!(handler.handle(&Message::handshake(7)).await);
        assert_eq!(reply.encode(), vec![2, 7]);

        let update = Message::position_update(7, Coordinate::new(10, 20));
        let reply = assert_ok!(handler.handle(&update).await);
        assert_eq!(reply.encode(), vec![2]);

        let reply = assert_ok!(handler.handle(&Message::handshake(9)).await);
        assert_eq!(reply.encode(), vec![2, 9]);
        assert_eq!(handler.store().get(7).await, Some(Coordinate::new(10, 20)));
        assert_eq!(handler.store().get(9).await, Some(Coordinate::ORIGIN));

        let update = Message::position_update(7, Coordinate::new(1, 2));
        let reply = assert_ok!(handler.handle(&update).await);
        assert_eq!(reply.encode(), vec![2, 9, 0, 0]);
        assert_eq!(handler.store().get(7).await, Some(Coordinate::new(1, 2)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_position_updates() {
        let handler = handler();

        let handles: Vec<_> = (0..64u8)
            .map(|id| {
                let handler = handler.clone();
                tokio::spawn(async move {
                    let update = Message::position_update(id, Coordinate::new(id, id / 2));
                    handler.handle(&update).await
                })
            })
            .collect();

        for handle in handles {
            let reply = assert_ok!(handle.await.unwrap());
            assert_eq!(reply.payload.len() % POSITION_ENTRY_LEN, 0);
        }

        assert_eq!(handler.store().len().await, 64);
        for id in 0..64u8 {
            assert_eq!(
                handler.store().get(id).await,
                Some(Coordinate::new(id, id / 2))
            );
        }
    }
}
