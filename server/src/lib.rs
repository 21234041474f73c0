//! # Position Server Library
//!
//! This library provides the authoritative position-synchronization server for
//! the multiplayer client. Clients register with a handshake, then repeatedly
//! report their own coordinates and receive the coordinates of every other
//! connected client in reply.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Positions
//! The server keeps the definitive last-known coordinate of every client in a
//! single in-memory store. Clients report where they are; the server records it
//! and tells them where everyone else is.
//!
//! ### Request Handling
//! Each datagram is one request and is handled on its own:
//! - Handshakes register a client id at the origin
//! - Position updates overwrite the sender's coordinate and return all others
//! - Malformed, duplicate or unknown requests are logged and dropped
//!
//! ## Architecture Design
//!
//! ### Task Per Datagram
//! The receive loop decodes each datagram and spawns an independent task to
//! handle it, without waiting for it to finish. Tasks run in parallel and in no
//! particular order; the position store is the only state they share.
//!
//! ### UDP-Based Communication
//! The protocol is connectionless and best-effort. There is no retransmission,
//! ordering or error reply: a rejected request is observed by the client as
//! silence, and any resend policy belongs to the client.
//!
//! ## Module Organization
//!
//! ### Store Module (`store`)
//! Thread-safe mapping from client id to coordinate behind one exclusive lock.
//!
//! ### Protocol Module (`protocol`)
//! Applies a decoded message to the store and builds the reply.
//!
//! ### Network Module (`network`)
//! Socket binding, the receive loop and reply transmission.
//!
//! ### Config and Error Modules (`config`, `error`)
//! Bind address and reply-opcode policy; protocol and server error types.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Bind on 0.0.0.0:25565 and reply to position updates with opcode 2
//!     let server = Server::bind(&ServerConfig::default()).await?;
//!
//!     // Runs until the process is stopped:
//!     // - Receives one datagram at a time
//!     // - Spawns a handler task per datagram
//!     // - Sends each reply back to the datagram's source address
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod network;
pub mod protocol;
pub mod store;
