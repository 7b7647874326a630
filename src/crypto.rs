//! Pre-shared-key envelope for message payloads.
//!
//! Both ends hold the same passphrase; the AEAD key is its SHA-256
//! digest, so there is no key exchange on the air. Each message is
//! sealed with AES-256-GCM under a fresh 12-byte nonce and shipped as
//! base64(nonce | ciphertext | tag), keeping the envelope inside the
//! text-only acoustic transport.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Key, Nonce};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use sha2::{Digest, Sha256};

use crate::error::{ChatError, Result};
use crate::{NONCE_LEN, TAG_LEN};

/// Derive the AEAD key from the shared passphrase. Deterministic: the
/// same passphrase always yields the same key.
pub fn derive_key(passphrase: &str) -> [u8; 32] {
    Sha256::digest(passphrase.as_bytes()).into()
}

/// Seal `plaintext` into a transportable envelope.
pub fn encrypt(plaintext: &[u8], passphrase: &str) -> Result<String> {
    let key = derive_key(passphrase);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let sealed = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| ChatError::Encryption)?;

    let mut wire = Vec::with_capacity(NONCE_LEN + sealed.len());
    wire.extend_from_slice(nonce.as_slice());
    wire.extend_from_slice(&sealed);
    Ok(BASE64.encode(wire))
}

/// Open an envelope received off the air.
///
/// Fails with [`ChatError::MalformedEnvelope`] when the text does not
/// decode to at least nonce plus tag, and with
/// [`ChatError::AuthenticationFailure`] when the tag check fails (wrong
/// passphrase or corrupted payload). Never returns incorrect plaintext.
pub fn decrypt(wire_text: &str, passphrase: &str) -> Result<Vec<u8>> {
    let bytes = BASE64
        .decode(wire_text.trim())
        .map_err(|_| ChatError::MalformedEnvelope)?;
    if bytes.len() < NONCE_LEN + TAG_LEN {
        return Err(ChatError::MalformedEnvelope);
    }

    let (nonce, sealed) = bytes.split_at(NONCE_LEN);
    let key = derive_key(passphrase);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
    cipher
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| ChatError::AuthenticationFailure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let plain = "squawk 7700".as_bytes();
        let wire = encrypt(plain, "hunter2").unwrap();
        assert_eq!(decrypt(&wire, "hunter2").unwrap(), plain);
    }

    #[test]
    fn key_derivation_is_deterministic() {
        assert_eq!(derive_key("alpha"), derive_key("alpha"));
        assert_ne!(derive_key("alpha"), derive_key("bravo"));
    }

    #[test]
    fn envelope_length_invariant() {
        for len in [0usize, 1, 17, 98] {
            let plain = vec![0x5a; len];
            let wire = encrypt(&plain, "k").unwrap();
            let raw = BASE64.decode(&wire).unwrap();
            assert_eq!(raw.len(), NONCE_LEN + len + TAG_LEN);
        }
    }

    #[test]
    fn nonces_are_fresh_per_message() {
        let a = encrypt(b"same", "k").unwrap();
        let b = encrypt(b"same", "k").unwrap();
        let nonce_a = &BASE64.decode(&a).unwrap()[..NONCE_LEN];
        let nonce_b = &BASE64.decode(&b).unwrap()[..NONCE_LEN];
        assert_ne!(nonce_a, nonce_b);
    }

    #[test]
    fn wrong_passphrase_fails_authentication() {
        let wire = encrypt(b"secret", "right").unwrap();
        assert!(matches!(
            decrypt(&wire, "wrong"),
            Err(ChatError::AuthenticationFailure)
        ));
    }

    #[test]
    fn short_envelope_is_malformed() {
        // 27 raw bytes is one short of nonce + minimum tag.
        let short = BASE64.encode(vec![0u8; NONCE_LEN + TAG_LEN - 1]);
        assert!(matches!(
            decrypt(&short, "k"),
            Err(ChatError::MalformedEnvelope)
        ));
    }

    #[test]
    fn garbage_text_is_malformed() {
        assert!(matches!(
            decrypt("not base64 at all!", "k"),
            Err(ChatError::MalformedEnvelope)
        ));
    }

    #[test]
    fn tampering_never_yields_wrong_plaintext() {
        let plain = b"integrity matters";
        let wire = encrypt(plain, "k").unwrap();
        let bytes = wire.as_bytes();

        for index in 0..bytes.len() {
            for bit in 0..8 {
                let mut tampered = bytes.to_vec();
                tampered[index] ^= 1 << bit;
                let Ok(tampered) = String::from_utf8(tampered) else {
                    continue;
                };
                if tampered == wire {
                    continue;
                }
                match decrypt(&tampered, "k") {
                    Err(ChatError::AuthenticationFailure)
                    | Err(ChatError::MalformedEnvelope) => {}
                    Ok(recovered) => {
                        // Base64 tolerates some bit flips in padding
                        // positions; the payload must still be intact.
                        assert_eq!(recovered, plain);
                    }
                    Err(other) => panic!("unexpected error: {other}"),
                }
            }
        }
    }
}
