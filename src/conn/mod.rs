//! Websocket connection.
//!
//! [`Conn`] composes the frame codec with the message state machine:
//! [`receive`](Conn::receive) returns complete data messages, draining
//! interleaved control frames on the way, and [`send`](Conn::send)
//! writes data messages (fragmented to the write buffer size) and
//! control frames.
//!
//! A connection is not safe for concurrent use. At most one reader and
//! one writer may call into it at any moment, which the `&mut self`
//! receivers enforce; there is no internal locking.

mod ctrl;
mod deadline;
mod read;
mod write;

pub use deadline::Deadline;

use std::fmt;
use std::io::{BufReader, Read, Write};
use std::time::Duration;

use crate::close::CloseEvent;
use crate::error::Error;
use crate::frame::{OpCode, MAX_HEAD_LEN};
use crate::role;
use crate::role::RoleHelper;

/// Minimum size of the read and write buffers.
pub const MIN_BUF_SIZE: usize = 512;

/// Default size of the read and write buffers.
pub const DEFAULT_BUF_SIZE: usize = 4096;

/// Default cap on the total payload of a single message, 64 MiB.
pub const DEFAULT_READ_LIMIT: u64 = 64 * 1024 * 1024;

/// Kind of a complete data message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsgKind {
    /// Utf-8 encoded text.
    Text,
    /// Opaque bytes.
    Binary,
}

impl MsgKind {
    /// The opcode starting a message of this kind.
    #[inline]
    pub const fn opcode(self) -> OpCode {
        match self {
            MsgKind::Text => OpCode::Text,
            MsgKind::Binary => OpCode::Binary,
        }
    }
}

/// Handler invoked with a received ping or pong payload.
pub type CtrlHandler<IO, Role> =
    Box<dyn FnMut(&mut Conn<IO, Role>, &[u8]) -> Result<(), Error> + Send>;

/// Handler invoked with a received close event.
pub type CloseHandler<IO, Role> =
    Box<dyn FnMut(&mut Conn<IO, Role>, &CloseEvent) -> Result<(), Error> + Send>;

/// Websocket connection over a blocking byte stream.
///
/// Reads go through an owned [`BufReader`]; writes go through a
/// reusable frame buffer straight to the stream.
pub struct Conn<IO, Role = role::Server> {
    io: BufReader<IO>,
    write_buf: Vec<u8>,
    frame_payload_max: usize,
    subprotocol: String,
    read_limit: u64,
    peer_close: Option<CloseEvent>,
    on_close: Option<CloseHandler<IO, Role>>,
    on_ping: Option<CtrlHandler<IO, Role>>,
    on_pong: Option<CtrlHandler<IO, Role>>,
}

impl<IO: Read + Write, Role: RoleHelper> Conn<IO, Role> {
    /// Create a connection over an established stream, without a
    /// handshake, with default buffer sizes.
    pub fn from_stream(io: IO) -> Self {
        Self::with_capacity(io, DEFAULT_BUF_SIZE, DEFAULT_BUF_SIZE)
    }

    /// Create a connection with explicit buffer sizes.
    ///
    /// Sizes below [`MIN_BUF_SIZE`] are raised to it. Outgoing data
    /// messages fragment into frames of `write_buf - 14` payload
    /// bytes, reserving the worst-case frame head.
    pub fn with_capacity(io: IO, read_buf: usize, write_buf: usize) -> Self {
        let read_buf = read_buf.max(MIN_BUF_SIZE);
        let write_buf = write_buf.max(MIN_BUF_SIZE);

        Conn {
            io: BufReader::with_capacity(read_buf, io),
            write_buf: Vec::with_capacity(write_buf),
            frame_payload_max: write_buf - MAX_HEAD_LEN,
            subprotocol: String::new(),
            read_limit: DEFAULT_READ_LIMIT,
            peer_close: None,
            on_close: None,
            on_ping: None,
            on_pong: None,
        }
    }
}

impl<IO, Role> Conn<IO, Role> {
    /// The subprotocol negotiated during the handshake, or an empty
    /// string.
    #[inline]
    pub fn subprotocol(&self) -> &str { &self.subprotocol }

    #[inline]
    pub(crate) fn set_subprotocol(&mut self, proto: String) { self.subprotocol = proto }

    /// Cap the total payload of a single incoming message. The check
    /// fires while the message streams in, not after it is buffered.
    #[inline]
    pub fn set_read_limit(&mut self, limit: u64) { self.read_limit = limit }

    /// Install the close handler.
    ///
    /// It replaces the default behavior of echoing the received close
    /// frame back. Either way the pending [`receive`](Conn::receive)
    /// ends with [`Error::Close`] afterwards.
    pub fn on_close<F>(&mut self, handler: F)
    where
        F: FnMut(&mut Self, &CloseEvent) -> Result<(), Error> + Send + 'static,
    {
        self.on_close = Some(Box::new(handler));
    }

    /// Install the ping handler, replacing the default pong reply.
    pub fn on_ping<F>(&mut self, handler: F)
    where
        F: FnMut(&mut Self, &[u8]) -> Result<(), Error> + Send + 'static,
    {
        self.on_ping = Some(Box::new(handler));
    }

    /// Install the pong handler. Unsolicited pongs are absorbed by
    /// default.
    pub fn on_pong<F>(&mut self, handler: F)
    where
        F: FnMut(&mut Self, &[u8]) -> Result<(), Error> + Send + 'static,
    {
        self.on_pong = Some(Box::new(handler));
    }

    /// Get the underlying stream.
    ///
    /// Reading or writing through it directly corrupts the framing.
    #[inline]
    pub fn get_ref(&self) -> &IO { self.io.get_ref() }

    /// Get the underlying stream, mutably.
    #[inline]
    pub fn get_mut(&mut self) -> &mut IO { self.io.get_mut() }

    /// Consume the connection, returning the underlying stream and
    /// discarding buffered data.
    #[inline]
    pub fn into_inner(self) -> IO { self.io.into_inner() }

    /// Tear down the connection by dropping the underlying stream.
    ///
    /// No close frame is sent; to perform a closing handshake, send
    /// one with [`send`](Conn::send) first.
    #[inline]
    pub fn close(self) {}
}

impl<IO: Deadline, Role> Conn<IO, Role> {
    /// Bound the blocking time of reads and writes.
    #[inline]
    pub fn set_deadline(&mut self, timeout: Option<Duration>) -> std::io::Result<()> {
        self.io.get_mut().set_deadline(timeout)
    }

    /// Bound the blocking time of reads.
    #[inline]
    pub fn set_read_deadline(&mut self, timeout: Option<Duration>) -> std::io::Result<()> {
        self.io.get_mut().set_read_deadline(timeout)
    }

    /// Bound the blocking time of writes.
    #[inline]
    pub fn set_write_deadline(&mut self, timeout: Option<Duration>) -> std::io::Result<()> {
        self.io.get_mut().set_write_deadline(timeout)
    }
}

impl<IO, Role> fmt::Debug for Conn<IO, Role> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conn")
            .field("subprotocol", &self.subprotocol)
            .field("read_limit", &self.read_limit)
            .field("peer_close", &self.peer_close)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::frame::{apply_mask, Fin, FrameHead, Mask, PayloadLen};
    use std::io::Result;

    /// In-memory stream: scripted reads from `rbuf` in chunks of at
    /// most `rlimit` bytes, writes captured in `wbuf`.
    pub struct LimitReadWriter {
        pub rbuf: Vec<u8>,
        pub wbuf: Vec<u8>,
        pub rlimit: usize,
        pub cursor: usize,
    }

    impl LimitReadWriter {
        pub fn new(rbuf: Vec<u8>, rlimit: usize) -> Self {
            Self {
                rbuf,
                wbuf: Vec::new(),
                rlimit,
                cursor: 0,
            }
        }
    }

    impl Read for LimitReadWriter {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
            let left = self.rbuf.len() - self.cursor;
            let n = left.min(self.rlimit).min(buf.len());
            buf[..n].copy_from_slice(&self.rbuf[self.cursor..self.cursor + n]);
            self.cursor += n;
            Ok(n)
        }
    }

    impl Write for LimitReadWriter {
        fn write(&mut self, buf: &[u8]) -> Result<usize> {
            self.wbuf.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<()> { Ok(()) }
    }

    /// Build one wire frame, masking the payload when a key is given.
    pub fn make_frame(fin: Fin, opcode: OpCode, mask: Mask, payload: &[u8]) -> Vec<u8> {
        let head = FrameHead::new(fin, opcode, mask, PayloadLen::from_num(payload.len() as u64));

        let mut frame = vec![0_u8; MAX_HEAD_LEN];
        let head_len = head.encode(&mut frame).unwrap();
        frame.truncate(head_len);
        frame.extend_from_slice(payload);

        if let Mask::Key(key) = mask {
            apply_mask(key, 0, &mut frame[head_len..]);
        }
        frame
    }

    /// A client-masked frame with a fixed key.
    pub fn masked_frame(fin: Fin, opcode: OpCode, payload: &[u8]) -> Vec<u8> {
        make_frame(fin, opcode, Mask::Key([0x11, 0x39, 0x7a, 0x56]), payload)
    }

    /// Server-side connection fed with scripted frames.
    pub fn server_conn(frames: Vec<u8>, rlimit: usize) -> Conn<LimitReadWriter, role::Server> {
        Conn::from_stream(LimitReadWriter::new(frames, rlimit))
    }
}
