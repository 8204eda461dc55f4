use std::fmt::{Display, Formatter};

use crate::close::CloseCode;

/// Protocol violations defined by RFC-6455 Section 5 - Section 8.
///
/// Each violation is fatal for the connection and names the close code
/// it must fail the connection with, see [`close_code`](Self::close_code).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// Rsv bits set without a negotiated extension.
    RsvBitsSet,

    /// Opcode is one of the reserved values.
    UnknownOpCode,

    /// Control frame fragmented or longer than 125 bytes.
    BadControlFrame,

    /// Server received an unmasked frame.
    NotMasked,

    /// Client received a masked frame.
    UnexpectedMask,

    /// Continuation frame without a preceding data frame.
    ContinuationWithoutStart,

    /// New data frame while a fragmented message is incomplete.
    InterruptedMessage,

    /// Too many empty continuation frames in one message.
    EmptyContinuationFlood,

    /// Close frame body of exactly one byte.
    BadCloseFrame,

    /// Close code that must not appear on the wire.
    DisallowedCloseCode(u16),

    /// Close reason is not valid utf-8.
    BadCloseReason,

    /// Text message payload is not valid utf-8.
    InvalidUtf8,

    /// Message payload exceeds the read limit.
    MessageTooBig,

    /// Outgoing control payload longer than 125 bytes.
    ControlTooLong,

    /// Caller supplied a kind that cannot start a message.
    UnsupportedKind,

    /// Not enough data to parse.
    NotEnoughData,

    /// Not enough space to write to.
    NotEnoughCapacity,
}

impl ProtocolError {
    /// The close code this violation fails the connection with.
    pub const fn close_code(&self) -> CloseCode {
        use ProtocolError::*;
        match self {
            InvalidUtf8 | ControlTooLong => CloseCode::INVALID_PAYLOAD,
            MessageTooBig => CloseCode::TOO_BIG,
            UnsupportedKind => CloseCode::UNSUPPORTED,
            NotEnoughCapacity => CloseCode::INTERNAL_ERROR,
            _ => CloseCode::PROTOCOL_ERROR,
        }
    }
}

impl Display for ProtocolError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use ProtocolError::*;
        match self {
            RsvBitsSet => write!(f, "Rsv bits not negotiated"),
            UnknownOpCode => write!(f, "Unknown opcode"),
            BadControlFrame => write!(f, "Illegal control frame"),
            NotMasked => write!(f, "Client must mask"),
            UnexpectedMask => write!(f, "Server must not mask"),
            ContinuationWithoutStart => write!(f, "Continuation without start"),
            InterruptedMessage => write!(f, "New message while waiting for continuation"),
            EmptyContinuationFlood => write!(f, "Too many empty continuation frames"),
            BadCloseFrame => write!(f, "Close body too short"),
            DisallowedCloseCode(code) => write!(f, "Close code {} not allowed on wire", code),
            BadCloseReason => write!(f, "Close reason is not valid utf-8"),
            InvalidUtf8 => write!(f, "Text message is not valid utf-8"),
            MessageTooBig => write!(f, "Message exceeds the read limit"),
            ControlTooLong => write!(f, "Control payload over 125 bytes"),
            UnsupportedKind => write!(f, "Unsupported message kind"),
            NotEnoughData => write!(f, "Not enough data to parse"),
            NotEnoughCapacity => write!(f, "Not enough space to write to"),
        }
    }
}

// use default impl
impl std::error::Error for ProtocolError {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn violation_codes() {
        assert_eq!(ProtocolError::RsvBitsSet.close_code(), CloseCode::PROTOCOL_ERROR);
        assert_eq!(ProtocolError::NotMasked.close_code(), CloseCode::PROTOCOL_ERROR);
        assert_eq!(ProtocolError::InvalidUtf8.close_code(), CloseCode::INVALID_PAYLOAD);
        assert_eq!(ProtocolError::MessageTooBig.close_code(), CloseCode::TOO_BIG);
        assert_eq!(ProtocolError::DisallowedCloseCode(999).close_code(), CloseCode::PROTOCOL_ERROR);
    }
}
