//! Key exchange.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha1::{Digest, Sha1};

use super::GUID;

/// Derive `sec-websocket-accept` from `sec-websocket-key`.
#[inline]
pub fn derive_accept_key(sec_key: &[u8]) -> String {
    let mut sha1 = Sha1::new();
    sha1.update(sec_key);
    sha1.update(GUID);
    STANDARD.encode(sha1.finalize())
}

/// Check that a `sec-websocket-key` value is base64 for exactly 16 bytes.
#[inline]
pub fn check_sec_key(sec_key: &[u8]) -> bool {
    matches!(STANDARD.decode(sec_key), Ok(v) if v.len() == 16)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn derive_sec_key() {
        assert_eq!(
            derive_accept_key(b"dGhlIHNhbXBsZSBub25jZQ=="),
            "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
        );
    }

    #[test]
    fn sec_key_shape() {
        assert!(check_sec_key(b"dGhlIHNhbXBsZSBub25jZQ=="));

        // empty, not base64, wrong decoded size
        assert!(!check_sec_key(b""));
        assert!(!check_sec_key(b"not base64!!"));
        assert!(!check_sec_key(b"dGhlIHNhbXBsZQ=="));
    }
}
