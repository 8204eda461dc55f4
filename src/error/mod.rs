#![allow(missing_docs)]
//! Errors

mod handshake;
mod protocol;

pub use handshake::HandshakeError;
pub use protocol::ProtocolError;

use std::fmt::{Display, Formatter};

use crate::close::CloseEvent;

#[derive(Debug)]
pub enum Error {
    Handshake(HandshakeError),

    Protocol(ProtocolError),

    Close(CloseEvent),

    Io(std::io::Error),
}

impl From<HandshakeError> for Error {
    fn from(e: HandshakeError) -> Self { Error::Handshake(e) }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self { Error::Protocol(e) }
}

impl From<CloseEvent> for Error {
    fn from(e: CloseEvent) -> Self { Error::Close(e) }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error { Error::Io(e) }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use Error::*;
        match self {
            Handshake(e) => write!(f, "Handshake error: {} (http {})", e, e.status()),
            Protocol(e) => write!(f, "Protocol error: {} (close code {})", e, e.close_code()),
            Close(e) => write!(f, "Connection closed: {}", e),
            Io(e) => write!(f, "Io error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use Error::*;

        match self {
            Handshake(e) => e.source(),
            Protocol(e) => e.source(),
            Close(_) => None,
            Io(e) => e.source(),
        }
    }
}

impl Error {
    /// The close event, if this is a close error.
    #[inline]
    pub const fn as_close(&self) -> Option<&CloseEvent> {
        match self {
            Error::Close(e) => Some(e),
            _ => None,
        }
    }
}
