//! Password-keyed authenticated encryption envelope.
//!
//! Blobs are laid out as `nonce (12 bytes) ‖ ciphertext ‖ tag (16 bytes)`
//! using ChaCha20-Poly1305. The key is SHA-256 of the password, with no
//! stored salt, so the same password always yields the same key.
//!
//! Files written with the legacy AES-EAX layout cannot be opened.

use crate::error::{LedgerError, Result};
use chacha20poly1305::aead::{Aead, KeyInit, OsRng};
use chacha20poly1305::{AeadCore, ChaCha20Poly1305, Key, Nonce};
use sha2::{Digest, Sha256};

/// Length of the derived key in bytes
pub const KEY_LEN: usize = 32;

/// ChaCha20-Poly1305 nonce length in bytes
pub const NONCE_LEN: usize = 12;

/// Poly1305 tag length in bytes
pub const TAG_LEN: usize = 16;

/// Derive the cipher key from a password
pub fn derive_key(password: &str) -> [u8; KEY_LEN] {
    Sha256::digest(password.as_bytes()).into()
}

/// Encrypt `plaintext` under the password-derived key with a fresh nonce
pub fn seal(plaintext: &[u8], password: &str) -> Result<Vec<u8>> {
    let key = derive_key(password);
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));
    let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| LedgerError::Io(std::io::Error::other(format!("Encryption failed: {e}"))))?;

    let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Decrypt and authenticate a blob produced by [`seal`].
///
/// Any authentication failure, including a truncated blob, is reported as
/// [`LedgerError::Decryption`]; no plaintext is returned in that case.
pub fn open(blob: &[u8], password: &str) -> Result<Vec<u8>> {
    if blob.len() < NONCE_LEN + TAG_LEN {
        return Err(LedgerError::Decryption);
    }

    let (nonce, ciphertext) = blob.split_at(NONCE_LEN);
    let key = derive_key(password);
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| LedgerError::Decryption)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key_is_deterministic() {
        assert_eq!(derive_key("hunter2"), derive_key("hunter2"));
        assert_ne!(derive_key("hunter2"), derive_key("hunter3"));
        assert_eq!(derive_key("").len(), KEY_LEN);
    }

    #[test]
    fn test_seal_open() {
        let blob = seal(b"ledger payload", "secret").unwrap();
        assert_eq!(blob.len(), NONCE_LEN + b"ledger payload".len() + TAG_LEN);
        assert_eq!(open(&blob, "secret").unwrap(), b"ledger payload");
    }

    #[test]
    fn test_fresh_nonce_per_seal() {
        let a = seal(b"same", "pw").unwrap();
        let b = seal(b"same", "pw").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_password() {
        let blob = seal(b"ledger payload", "secret").unwrap();
        assert!(matches!(open(&blob, "guess"), Err(LedgerError::Decryption)));
    }

    #[test]
    fn test_tampered_blob() {
        let mut blob = seal(b"ledger payload", "secret").unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0x01;
        assert!(matches!(open(&blob, "secret"), Err(LedgerError::Decryption)));

        let mut blob = seal(b"ledger payload", "secret").unwrap();
        blob[NONCE_LEN] ^= 0x80;
        assert!(matches!(open(&blob, "secret"), Err(LedgerError::Decryption)));
    }

    #[test]
    fn test_truncated_blob() {
        assert!(matches!(open(&[], "secret"), Err(LedgerError::Decryption)));
        assert!(matches!(
            open(&[0u8; NONCE_LEN + TAG_LEN - 1], "secret"),
            Err(LedgerError::Decryption)
        ));
    }

    #[test]
    fn test_legacy_aes_layout_is_rejected() {
        // nonce(16) | tag(16) | ciphertext
        let mut blob = vec![7u8; 32];
        blob.extend_from_slice(br#"{"hourly_price":10.0}"#);
        assert!(matches!(open(&blob, "secret"), Err(LedgerError::Decryption)));
    }
}
