use std::fmt::{Display, Formatter};

/// Rejections of the http upgrade request.
///
/// Each rejection names the http status written back to the client
/// before the error returns, see [`status`](Self::status).
#[derive(Debug)]
pub enum HandshakeError {
    /// Request method is not GET.
    HttpMethod,

    /// Request is not http/1.1.
    HttpVersion,

    /// `Connection` header does not contain the `upgrade` token.
    Connection,

    /// `Upgrade` header does not contain `websocket`.
    Upgrade,

    /// `Sec-WebSocket-Version` header is not `13`.
    SecWebSocketVersion,

    /// `Sec-WebSocket-Key` header is not base64 for 16 bytes.
    SecWebSocketKey,

    /// Request origin not allowed.
    Origin,

    /// Client sent data before the handshake completed.
    Pipelining,

    /// Not enough data to parse.
    NotEnoughData,

    /// Not enough space to read or write to.
    NotEnoughCapacity,

    /// Malformed http head.
    Httparse(httparse::Error),
}

impl HandshakeError {
    /// The http status this rejection is answered with.
    pub const fn status(&self) -> u16 {
        use HandshakeError::*;
        match self {
            HttpMethod => 405,
            Upgrade => 426,
            Origin => 403,
            _ => 400,
        }
    }
}

impl Display for HandshakeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use HandshakeError::*;
        match self {
            HttpMethod => write!(f, "Request method is not GET"),
            HttpVersion => write!(f, "Illegal http version"),
            Connection => write!(f, "Missing or illegal connection header"),
            Upgrade => write!(f, "Missing or illegal upgrade header"),
            SecWebSocketVersion => write!(f, "Missing or illegal sec-websocket-version"),
            SecWebSocketKey => {
                write!(f, "Sec-websocket-key is not a base64-encoded 16-byte value")
            }
            Origin => write!(f, "Request origin not allowed"),
            Pipelining => write!(f, "Http pipelining is not supported"),
            NotEnoughData => write!(f, "Not enough data to parse"),
            NotEnoughCapacity => write!(f, "Not enough space to read or write to"),
            Httparse(e) => write!(f, "Http parse error: {}", e),
        }
    }
}

impl From<httparse::Error> for HandshakeError {
    fn from(e: httparse::Error) -> Self { HandshakeError::Httparse(e) }
}

impl std::error::Error for HandshakeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let HandshakeError::Httparse(e) = self {
            Some(e)
        } else {
            None
        }
    }
}
