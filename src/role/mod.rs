//! Websocket client or server role.
//!
//! The role fixes the mask direction of the codec both ways: frames
//! from client to server must be masked, frames from server to client
//! must not be ([RFC-6455 Section 5.1](https://datatracker.ietf.org/doc/html/rfc6455#section-5.1)).

use crate::frame::Mask;
use crate::frame::mask::new_mask_key;

/// Client or server marker.
pub trait RoleHelper {
    /// Whether incoming frames must carry a mask.
    const READ_MASKED: bool;

    /// Mask applied to an outgoing frame.
    fn write_mask() -> Mask;
}

/// Client marker.
pub trait ClientRole: RoleHelper {}

/// Server marker.
pub trait ServerRole: RoleHelper {}

/// Standard client.
pub struct Client;

/// Standard server.
pub struct Server;

impl RoleHelper for Client {
    const READ_MASKED: bool = false;

    /// Client masks every outgoing frame with a fresh random key.
    #[inline]
    fn write_mask() -> Mask { Mask::Key(new_mask_key()) }
}

impl RoleHelper for Server {
    const READ_MASKED: bool = true;

    /// Server must not mask the payload.
    #[inline]
    fn write_mask() -> Mask { Mask::None }
}

impl ClientRole for Client {}
impl ServerRole for Server {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mask_direction() {
        assert!(Server::READ_MASKED);
        assert!(!Client::READ_MASKED);

        assert_eq!(Server::write_mask(), Mask::None);
        assert!(matches!(Client::write_mask(), Mask::Key(_)));
    }

    #[test]
    fn fresh_client_keys() {
        // per-frame keys must not repeat in any obvious way
        let keys: Vec<_> = (0..32).filter_map(|_| Client::write_mask().key()).collect();
        assert!(keys.windows(2).any(|w| w[0] != w[1]));
    }
}
