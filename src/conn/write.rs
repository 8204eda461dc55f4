//! Message and frame writing.

use std::io::{Read, Write};

use super::Conn;

use crate::error::{Error, ProtocolError};
use crate::frame::{apply_mask, Fin, FrameHead, Mask, OpCode, PayloadLen};
use crate::frame::{CONTROL_MAX_PAYLOAD, MAX_HEAD_LEN};
use crate::role::RoleHelper;

impl<IO: Read + Write, Role: RoleHelper> Conn<IO, Role> {
    /// Send one message.
    ///
    /// Text and binary payloads are fragmented into frames sized by
    /// the write buffer. Close, ping and pong are written as single
    /// frames and their payload must not exceed 125 bytes; a close
    /// body is taken verbatim (2-byte code plus optional utf-8
    /// reason). Continuation is not a message kind and is rejected.
    pub fn send(&mut self, kind: OpCode, payload: &[u8]) -> Result<(), Error> {
        match kind {
            OpCode::Text | OpCode::Binary => self.send_data(kind, payload),
            OpCode::Close | OpCode::Ping | OpCode::Pong => self.send_control(kind, payload),
            OpCode::Continue => Err(ProtocolError::UnsupportedKind.into()),
        }
    }

    fn send_control(&mut self, opcode: OpCode, payload: &[u8]) -> Result<(), Error> {
        if payload.len() > CONTROL_MAX_PAYLOAD {
            return Err(ProtocolError::ControlTooLong.into());
        }
        self.write_frame(Fin::Y, opcode, payload)
    }

    fn send_data(&mut self, opcode: OpCode, payload: &[u8]) -> Result<(), Error> {
        let max = self.frame_payload_max;
        let mut offset = 0;
        let mut opcode = opcode;

        loop {
            let chunk = (payload.len() - offset).min(max);
            let fin = if offset + chunk == payload.len() {
                Fin::Y
            } else {
                Fin::N
            };

            self.write_frame(fin, opcode, &payload[offset..offset + chunk])?;

            offset += chunk;
            if offset == payload.len() {
                return Ok(());
            }
            opcode = OpCode::Continue;
        }
    }

    /// Serialise one frame into the write buffer and push it to the
    /// stream in a single flush. The caller's payload is left
    /// untouched; masking happens on the buffered copy.
    fn write_frame(&mut self, fin: Fin, opcode: OpCode, payload: &[u8]) -> Result<(), Error> {
        let mask = Role::write_mask();
        let head = FrameHead::new(fin, opcode, mask, PayloadLen::from_num(payload.len() as u64));

        self.write_buf.clear();
        self.write_buf.resize(MAX_HEAD_LEN, 0);
        let head_len = head.encode(&mut self.write_buf)?;
        self.write_buf.truncate(head_len);
        self.write_buf.extend_from_slice(payload);

        if let Mask::Key(key) = mask {
            apply_mask(key, 0, &mut self.write_buf[head_len..]);
        }

        let io = self.io.get_mut();
        io.write_all(&self.write_buf)?;
        io.flush()?;
        Ok(())
    }
}
