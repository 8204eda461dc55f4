//! Client upgrade request.
//!
//! From [RFC-6455 Section 4.1](https://datatracker.ietf.org/doc/html/rfc6455#section-4.1):
//!
//! Once a connection to the server has been established (including a
//! connection via a proxy or over a TLS-encrypted tunnel), the client
//! MUST send an opening handshake to the server.  The handshake consists
//! of an HTTP Upgrade request, along with a list of required and
//! optional header fields.
//!
//! Example:
//!
//! ```text
//! GET /path HTTP/1.1
//! Host: www.example.com
//! Upgrade: websocket
//! Connection: Upgrade
//! Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==
//! Sec-WebSocket-Version: 13
//! ```
//!

use crate::error::HandshakeError;

use super::MAX_ALLOW_HEADERS;
use super::key::check_sec_key;

/// Parsed upgrade request head.
///
/// Owns copies of the request line and of the header values the
/// handshake cares about; headers may repeat, in which case their
/// values are joined with commas as usual for http lists.
#[derive(Debug, Default)]
pub struct UpgradeRequest {
    pub method: String,
    pub path: String,
    pub host: String,
    pub connection: String,
    pub upgrade: String,
    pub version: String,
    pub sec_key: String,
    pub origin: String,
    /// Subprotocols offered by the client, in the client's order.
    pub protocols: Vec<String>,
}

impl UpgradeRequest {
    /// Parse a request head from the buffer, returns the request and
    /// the count of parsed bytes.
    ///
    /// While the buffer does not yet hold a complete head, a
    /// [`HandshakeError::NotEnoughData`] error is returned and the
    /// caller should read more data.
    pub fn parse(buf: &[u8]) -> Result<(Self, usize), HandshakeError> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_ALLOW_HEADERS];
        let mut parsed = httparse::Request::new(&mut headers);

        let head_len = match parsed.parse(buf)? {
            httparse::Status::Complete(n) => n,
            httparse::Status::Partial => return Err(HandshakeError::NotEnoughData),
        };

        // method, path and version are always present once complete
        // ref: https://docs.rs/httparse/latest/httparse/struct.Request.html
        if parsed.version.unwrap() != 1_u8 {
            return Err(HandshakeError::HttpVersion);
        }

        let mut request = UpgradeRequest {
            method: parsed.method.unwrap().to_owned(),
            path: parsed.path.unwrap().to_owned(),
            ..Default::default()
        };

        for hdr in parsed.headers.iter() {
            let value = String::from_utf8_lossy(hdr.value);
            let name = hdr.name;

            if name.eq_ignore_ascii_case("sec-websocket-protocol") {
                for proto in value.split(',') {
                    let proto = proto.trim();
                    if !proto.is_empty() {
                        request.protocols.push(proto.to_owned());
                    }
                }
                continue;
            }

            let slot = if name.eq_ignore_ascii_case("host") {
                &mut request.host
            } else if name.eq_ignore_ascii_case("connection") {
                &mut request.connection
            } else if name.eq_ignore_ascii_case("upgrade") {
                &mut request.upgrade
            } else if name.eq_ignore_ascii_case("sec-websocket-version") {
                &mut request.version
            } else if name.eq_ignore_ascii_case("sec-websocket-key") {
                &mut request.sec_key
            } else if name.eq_ignore_ascii_case("origin") {
                &mut request.origin
            } else {
                continue;
            };

            if slot.is_empty() {
                *slot = value.into_owned();
            } else {
                slot.push_str(", ");
                slot.push_str(&value);
            }
        }

        Ok((request, head_len))
    }

    /// Apply the acceptance checks, in order.
    ///
    /// The http status answering a failed check is carried by the
    /// returned [`HandshakeError`].
    pub fn validate(&self) -> Result<(), HandshakeError> {
        if self.method != "GET" {
            return Err(HandshakeError::HttpMethod);
        }

        if !token_list_contains(&self.connection, "upgrade") {
            return Err(HandshakeError::Connection);
        }

        if !token_list_contains(&self.upgrade, "websocket") {
            return Err(HandshakeError::Upgrade);
        }

        if self.version.trim() != "13" {
            return Err(HandshakeError::SecWebSocketVersion);
        }

        if !check_sec_key(self.sec_key.as_bytes()) {
            return Err(HandshakeError::SecWebSocketKey);
        }

        Ok(())
    }

    /// Default origin policy: an empty `Origin` is allowed, otherwise
    /// its host part must equal the `Host` header.
    pub fn same_origin(&self) -> bool {
        if self.origin.is_empty() {
            return true;
        }

        let rest = match self.origin.split_once("://") {
            Some((_, rest)) => rest,
            None => return false,
        };
        let host = rest.split('/').next().unwrap_or(rest);

        host.eq_ignore_ascii_case(&self.host)
    }
}

/// Whether a comma-separated header value contains the token,
/// case-insensitively.
fn token_list_contains(value: &str, token: &str) -> bool {
    value.split(',').any(|t| t.trim().eq_ignore_ascii_case(token))
}
