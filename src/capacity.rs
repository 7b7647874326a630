//! On-air byte cost of a message under the current encryption mode.
//!
//! Used for the live byte indicator and as the hard gate before every
//! transmission; the acoustic channel carries at most
//! [`MAX_ON_AIR_BYTES`] bytes of text per message.

use crate::{MAX_ON_AIR_BYTES, NONCE_LEN, TAG_LEN};

/// Number of bytes actually carried over the acoustic channel for a
/// message of `plain_len` UTF-8 bytes.
///
/// Plaintext travels verbatim. An encrypted message grows to the sealed
/// envelope (nonce, ciphertext, tag) expanded by the transport encoding:
/// four output characters per started three-byte group.
pub fn on_air_bytes(plain_len: usize, encrypted: bool) -> usize {
    if !encrypted {
        return plain_len;
    }
    let raw = NONCE_LEN + plain_len + TAG_LEN;
    4 * raw.div_ceil(3)
}

/// Whether a message of `plain_len` plaintext bytes fits the channel.
pub fn fits_channel(plain_len: usize, encrypted: bool) -> bool {
    on_air_bytes(plain_len, encrypted) <= MAX_ON_AIR_BYTES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plaintext_is_carried_verbatim() {
        for len in [0, 1, 5, 170, 500] {
            assert_eq!(on_air_bytes(len, false), len);
        }
    }

    #[test]
    fn encrypted_cost_matches_envelope_expansion() {
        for len in 0..=300 {
            let raw = NONCE_LEN + len + TAG_LEN;
            assert_eq!(on_air_bytes(len, true), 4 * raw.div_ceil(3));
        }
        // Empty plaintext still pays for nonce and tag: 4 * ceil(28/3).
        assert_eq!(on_air_bytes(0, true), 40);
    }

    #[test]
    fn encrypted_cost_is_monotonic() {
        let mut previous = 0;
        for len in 0..=400 {
            let cost = on_air_bytes(len, true);
            assert!(cost >= previous);
            previous = cost;
        }
    }

    #[test]
    fn gate_boundaries() {
        assert!(fits_channel(5, false));
        assert!(fits_channel(170, false));
        assert!(!fits_channel(171, false));

        // 170 plaintext bytes encrypted expand to 4 * ceil(198/3) = 264.
        assert_eq!(on_air_bytes(170, true), 264);
        assert!(!fits_channel(170, true));
    }

    #[test]
    fn largest_encrypted_payload() {
        // The biggest plaintext whose envelope still fits 170 bytes.
        let max = (0..=170).filter(|&l| fits_channel(l, true)).max();
        assert_eq!(max, Some(98));
        assert!(!fits_channel(99, true));
    }
}
