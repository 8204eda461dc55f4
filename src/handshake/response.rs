//! Server handshake response.

/// Encode the `101 Switching Protocols` response.
///
/// The `Sec-WebSocket-Protocol` header is only present when a
/// subprotocol was negotiated.
pub fn encode_accept(accept_key: &str, subprotocol: Option<&str>) -> Vec<u8> {
    let mut buf = Vec::with_capacity(160);

    buf.extend_from_slice(
        b"HTTP/1.1 101 Switching Protocols\r\n\
        Upgrade: websocket\r\n\
        Connection: Upgrade\r\n\
        Sec-WebSocket-Accept: ",
    );
    buf.extend_from_slice(accept_key.as_bytes());
    buf.extend_from_slice(b"\r\n");

    if let Some(proto) = subprotocol {
        buf.extend_from_slice(b"Sec-WebSocket-Protocol: ");
        buf.extend_from_slice(proto.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    buf.extend_from_slice(b"\r\n");
    buf
}

/// Encode the http rejection written before a handshake error returns.
pub fn encode_reject(status: u16) -> Vec<u8> {
    let text = status_text(status);
    format!(
        "HTTP/1.1 {} {}\r\n\
        Content-Type: text/plain; charset=utf-8\r\n\
        Content-Length: {}\r\n\
        Connection: close\r\n\r\n\
        {}\n",
        status,
        text,
        text.len() + 1,
        text,
    )
    .into_bytes()
}

const fn status_text(status: u16) -> &'static str {
    match status {
        403 => "Forbidden",
        405 => "Method Not Allowed",
        426 => "Upgrade Required",
        500 => "Internal Server Error",
        _ => "Bad Request",
    }
}
