//! Websocket data frame.
//!
//! [RFC-6455 Section5](https://datatracker.ietf.org/doc/html/rfc6455#section-5)
//!
//! ```text
//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |F|R|R|R| opcode|M| Payload len |    Extended payload length    |
//! |I|S|S|S|  (4)  |A|     (7)     |             (16/64)           |
//! |N|V|V|V|       |S|             |   (if payload len==126/127)   |
//! | |1|2|3|       |K|             |                               |
//! +-+-+-+-+-------+-+-------------+ - - - - - - - - - - - - - - - +
//! |     Extended payload length continued, if payload len == 127  |
//! + - - - - - - - - - - - - - - - +-------------------------------+
//! |                               |Masking-key, if MASK set to 1  |
//! +-------------------------------+-------------------------------+
//! | Masking-key (continued)       |          Payload Data         |
//! +-------------------------------- - - - - - - - - - - - - - - - +
//! :                     Payload Data continued ...                :
//! + - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - +
//! |                     Payload Data continued ...                |
//! +---------------------------------------------------------------+
//! ```
//!

pub mod flag;
pub mod length;
pub mod mask;

pub use flag::{Fin, OpCode};
pub use length::PayloadLen;
pub use mask::{apply_mask, new_mask_key, Mask};

use std::io::Read;

use crate::error::{Error, ProtocolError};

/// Max frame head size: fixed(2) + extended length(8) + mask key(4).
pub const MAX_HEAD_LEN: usize = 14;

/// Control frames carry at most this much payload and are never
/// fragmented.
pub const CONTROL_MAX_PAYLOAD: usize = 125;

/// Websocket frame head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHead {
    pub fin: Fin,
    pub opcode: OpCode,
    pub mask: Mask,
    pub length: PayloadLen,
}

#[allow(clippy::len_without_is_empty)]
impl FrameHead {
    /// Constructor.
    #[inline]
    pub const fn new(fin: Fin, opcode: OpCode, mask: Mask, length: PayloadLen) -> Self {
        Self {
            fin,
            opcode,
            mask,
            length,
        }
    }

    /// Number of bytes this head occupies on the wire.
    #[inline]
    pub const fn len(&self) -> usize {
        let ext = match self.length {
            PayloadLen::Standard(_) => 0,
            PayloadLen::Extended1(_) => 2,
            PayloadLen::Extended2(_) => 8,
        };
        let key = match self.mask {
            Mask::Key(_) => 4,
            Mask::None => 0,
        };
        2 + ext + key
    }

    /// Encode to the provided buffer, returns the count of written bytes.
    /// The caller should ensure the buffer is large enough, otherwise a
    /// [`ProtocolError::NotEnoughCapacity`] error will be returned.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, ProtocolError> {
        if buf.len() < self.len() {
            return Err(ProtocolError::NotEnoughCapacity);
        }

        // fin, opcode
        buf[0] = self.fin as u8 | self.opcode as u8;

        // mask, payload length
        buf[1] = self.mask.to_flag() | self.length.to_flag();

        let mut n = 2;

        // extended payload length
        match self.length {
            PayloadLen::Standard(_) => {}
            PayloadLen::Extended1(v) => {
                buf[2..4].copy_from_slice(&v.to_be_bytes());
                n += 2;
            }
            PayloadLen::Extended2(v) => {
                buf[2..10].copy_from_slice(&v.to_be_bytes());
                n += 8;
            }
        };

        // mask key
        if let Mask::Key(key) = self.mask {
            buf[n..n + 4].copy_from_slice(&key);
            n += 4;
        }

        Ok(n)
    }

    /// Parse from the provided buffer, returns [`FrameHead`] and the count
    /// of read bytes if the parse succeeds.
    /// If there is not enough data to parse, a
    /// [`ProtocolError::NotEnoughData`] error will be returned.
    pub fn decode(buf: &[u8]) -> Result<(Self, usize), ProtocolError> {
        if buf.len() < 2 {
            return Err(ProtocolError::NotEnoughData);
        }

        let b0 = buf[0];
        let b1 = buf[1];

        // no extensions are negotiated
        if b0 & 0x70 != 0 {
            return Err(ProtocolError::RsvBitsSet);
        }

        let fin = Fin::from_flag(b0);
        let opcode = OpCode::from_flag(b0)?;

        let mut n = 2;
        let mut length = PayloadLen::from_flag(b1);

        match length {
            PayloadLen::Standard(_) => {}
            PayloadLen::Extended1(_) => {
                if buf.len() < n + 2 {
                    return Err(ProtocolError::NotEnoughData);
                }
                length = PayloadLen::from_byte2([buf[2], buf[3]]);
                n += 2;
            }
            PayloadLen::Extended2(_) => {
                if buf.len() < n + 8 {
                    return Err(ProtocolError::NotEnoughData);
                }
                length = PayloadLen::from_byte8([
                    buf[2], buf[3], buf[4], buf[5], buf[6], buf[7], buf[8], buf[9],
                ]);
                n += 8;
            }
        };

        let mask = if Mask::flag_set(b1) {
            if buf.len() < n + 4 {
                return Err(ProtocolError::NotEnoughData);
            }
            let key = [buf[n], buf[n + 1], buf[n + 2], buf[n + 3]];
            n += 4;
            Mask::Key(key)
        } else {
            Mask::None
        };

        Ok((
            FrameHead {
                fin,
                opcode,
                mask,
                length,
            },
            n,
        ))
    }

    /// Read and parse a frame head from the stream.
    ///
    /// Reads the 2-byte fixed head, then the extended length and the
    /// mask key as the flags demand. Every read retries short reads
    /// until the field is complete.
    ///
    /// Besides the structural checks of [`decode`](Self::decode), the
    /// control frame shape rules are enforced here: a control frame
    /// with the fin flag clear, or with a payload over
    /// [`CONTROL_MAX_PAYLOAD`] bytes, fails with
    /// [`ProtocolError::BadControlFrame`].
    pub fn read_from<R: Read>(r: &mut R) -> Result<Self, Error> {
        let mut fixed = [0_u8; 2];
        r.read_exact(&mut fixed)?;

        // no extensions are negotiated
        if fixed[0] & 0x70 != 0 {
            return Err(ProtocolError::RsvBitsSet.into());
        }

        let fin = Fin::from_flag(fixed[0]);
        let opcode = OpCode::from_flag(fixed[0])?;

        let mut length = PayloadLen::from_flag(fixed[1]);
        match length {
            PayloadLen::Standard(_) => {}
            PayloadLen::Extended1(_) => {
                let mut ext = [0_u8; 2];
                r.read_exact(&mut ext)?;
                length = PayloadLen::from_byte2(ext);
            }
            PayloadLen::Extended2(_) => {
                let mut ext = [0_u8; 8];
                r.read_exact(&mut ext)?;
                length = PayloadLen::from_byte8(ext);
            }
        };

        let mask = if Mask::flag_set(fixed[1]) {
            let mut key = [0_u8; 4];
            r.read_exact(&mut key)?;
            Mask::Key(key)
        } else {
            Mask::None
        };

        if opcode.is_control() && (!fin.is_final() || length.to_num() > CONTROL_MAX_PAYLOAD as u64)
        {
            return Err(ProtocolError::BadControlFrame.into());
        }

        Ok(FrameHead {
            fin,
            opcode,
            mask,
            length,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::{Read, Result};

    /// Hands out one byte per read call.
    struct OneByte<'a> {
        buf: &'a [u8],
        pos: usize,
    }

    impl<'a> Read for OneByte<'a> {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
            if self.pos == self.buf.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.buf[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    #[test]
    fn frame_head() {
        let heads = [
            FrameHead::new(
                Fin::Y,
                OpCode::Binary,
                Mask::Key(mask::new_mask_key()),
                PayloadLen::from_num(4096),
            ),
            FrameHead::new(Fin::N, OpCode::Text, Mask::None, PayloadLen::from_num(64)),
            FrameHead::new(
                Fin::Y,
                OpCode::Close,
                Mask::Key(mask::new_mask_key()),
                PayloadLen::from_num(2),
            ),
        ];

        for head in heads {
            let mut buf = [0_u8; MAX_HEAD_LEN];

            let encode_n = head.encode(&mut buf).unwrap();
            assert_eq!(encode_n, head.len());

            let (head2, decode_n) = FrameHead::decode(&buf).unwrap();
            assert_eq!(encode_n, decode_n);
            assert_eq!(head, head2);

            let head3 = FrameHead::read_from(&mut OneByte {
                buf: &buf[..encode_n],
                pos: 0,
            })
            .unwrap();
            assert_eq!(head, head3);
        }
    }

    #[test]
    fn head_len_encoding() {
        // 7-bit, 16-bit and 64-bit length encodings at their boundaries
        for (len, head_len) in [
            (0, 2),
            (1, 2),
            (125, 2),
            (126, 4),
            (65535, 4),
            (65536, 10),
            (1 << 20, 10),
        ] {
            let head =
                FrameHead::new(Fin::Y, OpCode::Binary, Mask::None, PayloadLen::from_num(len));
            assert_eq!(head.len(), head_len);

            let mut buf = [0_u8; MAX_HEAD_LEN];
            let n = head.encode(&mut buf).unwrap();
            assert_eq!(n, head_len);

            let (head2, _) = FrameHead::decode(&buf).unwrap();
            assert_eq!(head2.length.to_num(), len);
        }
    }

    #[test]
    fn not_enough_capacity() {
        let head = FrameHead::new(
            Fin::Y,
            OpCode::Binary,
            Mask::Key([1, 2, 3, 4]),
            PayloadLen::from_num(70000),
        );
        let mut buf = [0_u8; 8];
        assert_eq!(head.encode(&mut buf), Err(ProtocolError::NotEnoughCapacity));
    }

    #[test]
    fn not_enough_data() {
        let head = FrameHead::new(
            Fin::Y,
            OpCode::Binary,
            Mask::Key([1, 2, 3, 4]),
            PayloadLen::from_num(70000),
        );
        let mut buf = [0_u8; MAX_HEAD_LEN];
        let n = head.encode(&mut buf).unwrap();

        for cut in 0..n {
            assert_eq!(
                FrameHead::decode(&buf[..cut]),
                Err(ProtocolError::NotEnoughData)
            );
        }
    }

    #[test]
    fn rsv_bits() {
        for b0 in [0x40, 0x20, 0x10, 0x70] {
            let buf = [0x80 | b0 | 0x02, 0x00];
            assert_eq!(FrameHead::decode(&buf), Err(ProtocolError::RsvBitsSet));

            let err = FrameHead::read_from(&mut OneByte { buf: &buf, pos: 0 }).unwrap_err();
            assert!(matches!(
                err,
                crate::error::Error::Protocol(ProtocolError::RsvBitsSet)
            ));
        }
    }

    #[test]
    fn control_frame_shape() {
        // fragmented ping
        let buf = [0x09, 0x00];
        let err = FrameHead::read_from(&mut OneByte { buf: &buf, pos: 0 }).unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Protocol(ProtocolError::BadControlFrame)
        ));

        // ping with a 16-bit length
        let buf = [0x89, 126, 0x00, 126];
        let err = FrameHead::read_from(&mut OneByte { buf: &buf, pos: 0 }).unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Protocol(ProtocolError::BadControlFrame)
        ));
    }
}
