//! Message assembly.
//!
//! [`Conn::receive`] drives a two-state machine: waiting for a data
//! frame, then streaming one message across its continuation frames.
//! Control frames may arrive between any two frames of a fragmented
//! message and are acted on in wire order before the message returns.

use std::io::{BufRead, Read, Write};

use super::{Conn, MsgKind, DEFAULT_BUF_SIZE};

use crate::error::{Error, ProtocolError};
use crate::frame::{apply_mask, FrameHead, Mask, OpCode};
use crate::role::RoleHelper;

/// Bound on consecutive empty continuation frames within one message.
/// A peer pumping zero-length fragments forever would otherwise spin
/// the assembler without any progress.
pub(crate) const MAX_EMPTY_CONTINUATIONS: u32 = 128;

impl<IO: Read + Write, Role: RoleHelper> Conn<IO, Role> {
    /// Receive the next complete data message.
    ///
    /// Blocks until a whole text or binary message arrived. Control
    /// frames received on the way are handled first, see
    /// [`handle_control`](Conn::handle_control); a close frame ends
    /// the call with [`Error::Close`], and the same close error is
    /// returned again on any later call.
    pub fn receive(&mut self) -> Result<(MsgKind, Vec<u8>), Error> {
        if let Some(event) = &self.peer_close {
            return Err(Error::Close(event.clone()));
        }

        // wait for the start of a data message
        let head = loop {
            let head = self.next_frame_head()?;
            if head.opcode.is_control() {
                self.handle_control(&head)?;
                continue;
            }
            break head;
        };

        let kind = match head.opcode {
            OpCode::Text => MsgKind::Text,
            OpCode::Binary => MsgKind::Binary,
            _ => return Err(ProtocolError::ContinuationWithoutStart.into()),
        };

        // the declared length already passed the limit check
        let mut payload = Vec::with_capacity(head.length.to_num() as usize);
        let mut reader = MessageReader::new(self, &head);

        loop {
            let old = payload.len();
            payload.resize(old + DEFAULT_BUF_SIZE, 0);
            let n = reader.read(&mut payload[old..])?;
            payload.truncate(old + n);
            if n == 0 {
                break;
            }
        }

        // utf-8 is checked once, over the assembled message
        if kind == MsgKind::Text && std::str::from_utf8(&payload).is_err() {
            return Err(ProtocolError::InvalidUtf8.into());
        }

        Ok((kind, payload))
    }

    /// Read the next frame head and apply the connection-level checks:
    /// mask direction by role, and the read limit against the declared
    /// length.
    pub(crate) fn next_frame_head(&mut self) -> Result<FrameHead, Error> {
        let head = FrameHead::read_from(&mut self.io)?;

        match (Role::READ_MASKED, head.mask) {
            (true, Mask::None) => return Err(ProtocolError::NotMasked.into()),
            (false, Mask::Key(_)) => return Err(ProtocolError::UnexpectedMask.into()),
            _ => {}
        }

        // a data frame longer than the read limit can never complete;
        // fail before its payload is consumed
        if head.opcode.is_data() && head.length.to_num() > self.read_limit {
            return Err(ProtocolError::MessageTooBig.into());
        }

        Ok(head)
    }
}

/// Streaming reader over the frames of one data message.
///
/// Carries the per-message state the assembler needs between chunks:
/// bytes left in the current frame, whether the final fragment was
/// seen, the current mask key with its running position (a frame may
/// be consumed across any number of reads), the emitted-byte total
/// for the read limit, and the empty-continuation counter.
struct MessageReader<'c, IO, Role> {
    conn: &'c mut Conn<IO, Role>,
    remaining: u64,
    eof: bool,
    mask: Mask,
    mask_pos: usize,
    emitted: u64,
    empty_cont: u32,
}

impl<'c, IO: Read + Write, Role: RoleHelper> MessageReader<'c, IO, Role> {
    fn new(conn: &'c mut Conn<IO, Role>, head: &FrameHead) -> Self {
        MessageReader {
            conn,
            remaining: head.length.to_num(),
            eof: head.fin.is_final(),
            mask: head.mask,
            mask_pos: 0,
            emitted: 0,
            empty_cont: 0,
        }
    }

    /// Pull the next chunk of message payload. Returns 0 only once the
    /// message is complete.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        while self.remaining == 0 {
            if self.eof {
                return Ok(0);
            }
            self.advance()?;
        }

        let avail = self.conn.io.fill_buf()?;
        if avail.is_empty() {
            return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
        }

        let n = (buf.len() as u64).min(avail.len() as u64).min(self.remaining) as usize;
        buf[..n].copy_from_slice(&avail[..n]);
        self.conn.io.consume(n);

        if let Mask::Key(key) = self.mask {
            apply_mask(key, self.mask_pos, &mut buf[..n]);
        }
        self.mask_pos += n;
        self.remaining -= n as u64;
        self.emitted += n as u64;

        // the head check normally fires first; this catches a limit
        // lowered mid-message
        if self.emitted > self.conn.read_limit {
            return Err(ProtocolError::MessageTooBig.into());
        }

        Ok(n)
    }

    /// Step over the boundary to the next frame of this message,
    /// handling interleaved control frames.
    fn advance(&mut self) -> Result<(), Error> {
        loop {
            let head = self.conn.next_frame_head()?;

            if head.opcode.is_control() {
                self.conn.handle_control(&head)?;
                continue;
            }

            if head.opcode != OpCode::Continue {
                return Err(ProtocolError::InterruptedMessage.into());
            }

            let len = head.length.to_num();

            if len == 0 && !head.fin.is_final() {
                self.empty_cont += 1;
                if self.empty_cont > MAX_EMPTY_CONTINUATIONS {
                    return Err(ProtocolError::EmptyContinuationFlood.into());
                }
            } else {
                self.empty_cont = 0;
            }

            if self.emitted + len > self.conn.read_limit {
                return Err(ProtocolError::MessageTooBig.into());
            }

            self.remaining = len;
            self.eof = head.fin.is_final();
            self.mask = head.mask;
            self.mask_pos = 0;
            return Ok(());
        }
    }
}
