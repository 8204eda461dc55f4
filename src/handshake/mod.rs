//! Websocket opening handshake.
//!
//! From [RFC-6455 Section 4.2](https://datatracker.ietf.org/doc/html/rfc6455#section-4.2):
//!
//! When a client starts a WebSocket connection, it sends its part of the
//! opening handshake.  The server must parse at least part of this
//! handshake in order to obtain the necessary information to generate
//! the server part of the handshake.
//!
//! If the server chooses to accept the incoming connection, it MUST
//! reply with a valid HTTP response.
//!
//! Example:
//!
//! ```text
//! HTTP/1.1 101 Switching Protocols
//! Upgrade: websocket
//! Connection: Upgrade
//! Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=
//! ```
//!

pub mod key;
pub mod request;
pub mod response;
pub mod server;

pub use key::derive_accept_key;
pub use request::UpgradeRequest;
pub use server::Server;

/// 258EAFA5-E914-47DA-95CA-C5AB0DC85B11
pub const GUID: &[u8] = b"258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Max number of headers parsed from a request head.
pub const MAX_ALLOW_HEADERS: usize = 32;

/// Max size of a request head accepted by [`Server::accept`].
pub const MAX_HEAD_SIZE: usize = 0x2000;
