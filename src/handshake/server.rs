//! Server-side handshake.

use std::io::{Read, Write};
use std::time::Duration;

use log::debug;

use super::request::UpgradeRequest;
use super::response;
use super::key::derive_accept_key;
use super::MAX_HEAD_SIZE;

use crate::conn::{Conn, Deadline};
use crate::error::{Error, HandshakeError};
use crate::role;

/// Websocket server configuration.
///
/// A single `Server` value may accept any number of connections.
#[derive(Default)]
pub struct Server {
    /// Write deadline applied while the handshake response is sent,
    /// cleared again once the handshake completes. `None` disables it.
    pub handshake_timeout: Option<Duration>,

    /// Origin acceptance predicate. When absent the same-origin policy
    /// of [`UpgradeRequest::same_origin`] applies.
    pub check_origin: Option<Box<dyn Fn(&UpgradeRequest) -> bool + Send + Sync>>,

    /// Subprotocols supported by this server. The first one the client
    /// offers (in the client's order) is selected; an empty list
    /// negotiates no subprotocol.
    pub subprotocols: Vec<String>,
}

impl Server {
    /// Accept an incoming upgrade request and return the connection.
    ///
    /// Reads the http request head from the stream, applies the
    /// acceptance checks, and writes the `101 Switching Protocols`
    /// response. On a rejected handshake the http error response is
    /// written to the stream before the error returns; the stream
    /// itself is returned to the caller's ownership by being dropped.
    pub fn accept<IO>(&self, mut io: IO) -> Result<Conn<IO, role::Server>, Error>
    where
        IO: Read + Write + Deadline,
    {
        let mut buf = vec![0_u8; MAX_HEAD_SIZE];
        let mut end = 0;

        let (request, head_len) = loop {
            if end == buf.len() {
                return Err(self.reject(io, HandshakeError::NotEnoughCapacity));
            }

            let n = io.read(&mut buf[end..])?;

            // EOF, no more data
            if n == 0 {
                return Err(HandshakeError::NotEnoughData.into());
            }
            end += n;

            match UpgradeRequest::parse(&buf[..end]) {
                Ok(x) => break x,
                Err(HandshakeError::NotEnoughData) => continue,
                Err(e) => return Err(self.reject(io, e)),
            }
        };

        if let Err(e) = request.validate() {
            return Err(self.reject(io, e));
        }

        let allowed = match &self.check_origin {
            Some(check) => check(&request),
            None => request.same_origin(),
        };
        if !allowed {
            return Err(self.reject(io, HandshakeError::Origin));
        }

        // data following the request head would have to be websocket
        // frames sent before the handshake completed
        if end > head_len {
            return Err(self.reject(io, HandshakeError::Pipelining));
        }

        let subprotocol = self.select_subprotocol(&request);
        let accept_key = derive_accept_key(request.sec_key.as_bytes());
        let resp = response::encode_accept(&accept_key, subprotocol.as_deref());

        if self.handshake_timeout.is_some() {
            io.set_write_deadline(self.handshake_timeout)?;
        }

        io.write_all(&resp)?;
        io.flush()?;

        if self.handshake_timeout.is_some() {
            io.set_write_deadline(None)?;
        }

        debug!(
            "handshake complete: path {:?}, subprotocol {:?}",
            request.path, subprotocol
        );

        let mut conn = Conn::from_stream(io);
        if let Some(proto) = subprotocol {
            conn.set_subprotocol(proto);
        }
        Ok(conn)
    }

    /// First client-offered protocol present in the server list.
    fn select_subprotocol(&self, request: &UpgradeRequest) -> Option<String> {
        if self.subprotocols.is_empty() {
            return None;
        }
        request
            .protocols
            .iter()
            .find(|p| self.subprotocols.iter().any(|s| s == *p))
            .cloned()
    }

    fn reject<IO: Read + Write>(&self, mut io: IO, e: HandshakeError) -> Error {
        let resp = response::encode_reject(e.status());
        // the rejection is best effort, the handshake error wins
        let _ = io.write_all(&resp);
        let _ = io.flush();

        debug!("handshake rejected: {} (http {})", e, e.status());
        Error::Handshake(e)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Result;

    pub const REQUEST: &[u8] = b"GET /ws HTTP/1.1\r\n\
        Host: www.example.com\r\n\
        Upgrade: websocket\r\n\
        Connection: Upgrade\r\n\
        Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
        Sec-WebSocket-Version: 13\r\n\r\n";

    /// In-memory stream with a scripted read side and a capturing
    /// write side, handing out at most `rlimit` bytes per read.
    pub struct ScriptedStream {
        pub rbuf: Vec<u8>,
        pub wbuf: Vec<u8>,
        pub rlimit: usize,
        pub cursor: usize,
    }

    impl ScriptedStream {
        pub fn new(rbuf: Vec<u8>, rlimit: usize) -> Self {
            Self {
                rbuf,
                wbuf: Vec::new(),
                rlimit,
                cursor: 0,
            }
        }
    }

    impl Read for ScriptedStream {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
            let left = self.rbuf.len() - self.cursor;
            let n = left.min(self.rlimit).min(buf.len());
            buf[..n].copy_from_slice(&self.rbuf[self.cursor..self.cursor + n]);
            self.cursor += n;
            Ok(n)
        }
    }

    impl Write for ScriptedStream {
        fn write(&mut self, buf: &[u8]) -> Result<usize> {
            self.wbuf.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<()> { Ok(()) }
    }

    impl Deadline for ScriptedStream {
        fn set_read_deadline(&mut self, _: Option<Duration>) -> Result<()> { Ok(()) }
        fn set_write_deadline(&mut self, _: Option<Duration>) -> Result<()> { Ok(()) }
    }

    #[test]
    fn server_accept() {
        for rlimit in 1..=64 {
            let io = ScriptedStream::new(REQUEST.to_vec(), rlimit);
            let conn = Server::default().accept(io).unwrap();

            assert_eq!(conn.subprotocol(), "");
            let sent = &conn.get_ref().wbuf;
            let text = std::str::from_utf8(sent).unwrap();
            assert!(text.starts_with("HTTP/1.1 101 Switching Protocols\r\n"));
            assert!(text.contains("Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n"));
            assert!(!text.contains("Sec-WebSocket-Protocol"));
        }
    }

    #[test]
    fn server_accept_subprotocol() {
        let request = String::from_utf8_lossy(REQUEST)
            .replace("\r\n\r\n", "\r\nSec-WebSocket-Protocol: chat.v2, chat.v1\r\n\r\n");
        let io = ScriptedStream::new(request.into_bytes(), 64);

        let server = Server {
            subprotocols: vec!["chat.v1".into(), "chat.v2".into()],
            ..Default::default()
        };
        let conn = server.accept(io).unwrap();

        // client order decides
        assert_eq!(conn.subprotocol(), "chat.v2");
        let text = String::from_utf8_lossy(&conn.get_ref().wbuf).into_owned();
        assert!(text.contains("Sec-WebSocket-Protocol: chat.v2\r\n"));
    }

    #[test]
    fn server_reject() {
        macro_rules! rejects {
            ($request: expr, $status: expr) => {{
                let io = ScriptedStream::new($request.into_bytes(), 64);
                let err = Server::default().accept(io).unwrap_err();
                match err {
                    Error::Handshake(e) => assert_eq!(e.status(), $status),
                    e => panic!("unexpected error: {}", e),
                }
            }};
        }

        let template = String::from_utf8_lossy(REQUEST).into_owned();

        rejects!(template.replace("GET", "DELETE"), 405);
        rejects!(template.replace("Connection: Upgrade", "Connection: close"), 400);
        rejects!(template.replace("Upgrade: websocket", "Upgrade: h2c"), 426);
        rejects!(template.replace("Version: 13", "Version: 9"), 400);
        rejects!(template.replace("dGhlIHNhbXBsZSBub25jZQ==", "short"), 400);
        rejects!(
            template.replace("\r\n\r\n", "\r\nOrigin: https://evil.example\r\n\r\n"),
            403
        );
    }

    #[test]
    fn reject_writes_response() {
        let request = String::from_utf8_lossy(REQUEST).replace("GET", "POST");
        let mut io = ScriptedStream::new(request.into_bytes(), 64);

        // keep the stream to inspect what was written
        let err = {
            let io = &mut io;
            Server::default().accept(io).unwrap_err()
        };
        assert!(matches!(err, Error::Handshake(HandshakeError::HttpMethod)));
        assert!(io.wbuf.starts_with(b"HTTP/1.1 405 Method Not Allowed\r\n"));
    }

    #[test]
    fn pipelining_rejected() {
        let mut request = REQUEST.to_vec();
        // a frame head pushed right behind the handshake
        request.extend_from_slice(&[0x82, 0x80, 1, 2, 3, 4]);

        let io = ScriptedStream::new(request, usize::MAX);
        let err = Server::default().accept(io).unwrap_err();
        assert!(matches!(err, Error::Handshake(HandshakeError::Pipelining)));
    }
}
