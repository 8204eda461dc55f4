//! Plain websocket implementation for server applications.
//!
//! Implements the server side of [RFC-6455](https://datatracker.ietf.org/doc/html/rfc6455):
//! the http upgrade handshake, the frame codec, and the message state
//! machine, over plain blocking IO. No event loop, no internal threads,
//! no extensions.
//!
//! A connection is obtained from [`handshake::Server::accept`], after
//! which [`conn::Conn::receive`] and [`conn::Conn::send`] exchange
//! complete messages. Control frames (close, ping, pong) are handled
//! between data frames; their default behavior can be replaced with
//! the `on_close` / `on_ping` / `on_pong` handlers.

pub mod close;
pub mod conn;
pub mod error;
pub mod frame;
pub mod handshake;
pub mod role;
