//! Control frame handling.
//!
//! [RFC-6455 Section 5.5](https://datatracker.ietf.org/doc/html/rfc6455#section-5.5)

use std::io::{Read, Write};

use log::{debug, trace};

use super::Conn;

use crate::close::{CloseCode, CloseEvent};
use crate::error::{Error, ProtocolError};
use crate::frame::{apply_mask, FrameHead, Mask, OpCode, CONTROL_MAX_PAYLOAD};
use crate::role::RoleHelper;

impl<IO: Read + Write, Role: RoleHelper> Conn<IO, Role> {
    /// Consume and act on one control frame whose head was just read.
    ///
    /// Ping answers with a pong carrying the same payload, pong is
    /// absorbed, close validates its body, echoes it, and surfaces as
    /// [`Error::Close`]. Each default can be replaced by the
    /// corresponding handler; a handler error ends the read loop.
    pub(crate) fn handle_control(&mut self, head: &FrameHead) -> Result<(), Error> {
        // head checks cap control payloads at 125 bytes
        let len = head.length.to_num() as usize;
        let mut storage = [0_u8; CONTROL_MAX_PAYLOAD];
        let payload = &mut storage[..len];

        self.io.read_exact(payload)?;
        if let Mask::Key(key) = head.mask {
            apply_mask(key, 0, payload);
        }

        trace!("control frame: {:?}, {} bytes", head.opcode, len);

        match head.opcode {
            OpCode::Ping => {
                if let Some(mut handler) = self.on_ping.take() {
                    let res = handler(self, payload);
                    self.on_ping = Some(handler);
                    res
                } else {
                    self.send(OpCode::Pong, payload)
                }
            }
            OpCode::Pong => {
                if let Some(mut handler) = self.on_pong.take() {
                    let res = handler(self, payload);
                    self.on_pong = Some(handler);
                    res
                } else {
                    Ok(())
                }
            }
            OpCode::Close => self.handle_close(payload),
            _ => unreachable!("not a control opcode"),
        }
    }

    fn handle_close(&mut self, body: &[u8]) -> Result<(), Error> {
        let event = parse_close_body(body)?;
        debug!("close received: {}", event);

        if let Some(mut handler) = self.on_close.take() {
            let res = handler(self, &event);
            self.on_close = Some(handler);
            res?;
        } else {
            // echo the body; a synthesised 1005 goes back empty
            let mut echo = Vec::with_capacity(body.len());
            if event.code != CloseCode::NO_STATUS {
                echo.extend_from_slice(&event.code.0.to_be_bytes());
                echo.extend_from_slice(event.reason.as_bytes());
            }
            self.send(OpCode::Close, &echo)?;
        }

        self.peer_close = Some(event.clone());
        Err(Error::Close(event))
    }
}

/// Split a close frame body into code and reason.
///
/// An empty body stands for "no status received" (1005). A one byte
/// body cannot carry a status code. Longer bodies must start with a
/// code that is allowed on the wire, followed by a utf-8 reason.
pub(crate) fn parse_close_body(body: &[u8]) -> Result<CloseEvent, ProtocolError> {
    match body.len() {
        0 => Ok(CloseEvent::new(CloseCode::NO_STATUS, String::new())),
        1 => Err(ProtocolError::BadCloseFrame),
        _ => {
            let code = CloseCode(u16::from_be_bytes([body[0], body[1]]));
            if !code.is_allowed_on_wire() {
                return Err(ProtocolError::DisallowedCloseCode(code.0));
            }
            let reason = std::str::from_utf8(&body[2..])
                .map_err(|_| ProtocolError::BadCloseReason)?
                .to_owned();
            Ok(CloseEvent::new(code, reason))
        }
    }
}
