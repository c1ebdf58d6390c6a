//! SecureTar key derivation.
//!
//! The KDF is bespoke and must be reproduced bit-for-bit:
//! - `key = SHA256^100(passphrase)`, truncated to 16 bytes
//! - `iv = SHA256^100(key[..16] ++ iv_seed)`, truncated to 16 bytes
//!
//! where `SHA256^100` is one hash of the input followed by 99 re-hashes of
//! the 32-byte digest. There is no authentication tag in the format, so an
//! approximation would not fail loudly; it would silently decrypt garbage.

use sha2::{Digest, Sha256};

use super::{IV_SIZE, KEY_SIZE};

/// Number of SHA-256 rounds applied to both the key and the IV.
pub const KDF_ROUNDS: usize = 100;

/// Derive the AES-128 key and CBC initialization vector from a passphrase
/// and the 16-byte IV seed stored in the secure header.
///
/// Deterministic and pure; key material is recomputed per archive and never
/// persisted.
pub fn derive_key_iv(passphrase: &[u8], iv_seed: &[u8; IV_SIZE]) -> ([u8; KEY_SIZE], [u8; IV_SIZE]) {
    let mut digest = Sha256::digest(passphrase);
    for _ in 1..KDF_ROUNDS {
        digest = Sha256::digest(digest);
    }
    let mut key = [0u8; KEY_SIZE];
    key.copy_from_slice(&digest[..KEY_SIZE]);

    let mut hasher = Sha256::new();
    hasher.update(key);
    hasher.update(iv_seed);
    let mut digest = hasher.finalize();
    for _ in 1..KDF_ROUNDS {
        digest = Sha256::digest(digest);
    }
    let mut iv = [0u8; IV_SIZE];
    iv.copy_from_slice(&digest[..IV_SIZE]);

    (key, iv)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: [u8; IV_SIZE] = [
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d,
        0x0e, 0x0f,
    ];

    #[test]
    fn test_derive_is_deterministic() {
        let (key1, iv1) = derive_key_iv(b"secret", &SEED);
        let (key2, iv2) = derive_key_iv(b"secret", &SEED);
        assert_eq!(key1, key2);
        assert_eq!(iv1, iv2);
    }

    #[test]
    fn test_different_passphrases_different_outputs() {
        let (key1, iv1) = derive_key_iv(b"hello", &SEED);
        let (key2, iv2) = derive_key_iv(b"world", &SEED);
        assert_ne!(key1, key2);
        assert_ne!(iv1, iv2);
    }

    #[test]
    fn test_different_seeds_different_iv() {
        let mut other = SEED;
        other[0] ^= 0xff;
        let (key1, iv1) = derive_key_iv(b"hello", &SEED);
        let (key2, iv2) = derive_key_iv(b"hello", &other);
        // The seed only feeds the IV half of the derivation.
        assert_eq!(key1, key2);
        assert_ne!(iv1, iv2);
    }

    #[test]
    fn test_key_is_truncated_hundred_round_digest() {
        let mut digest = Sha256::digest(b"secret");
        for _ in 0..99 {
            digest = Sha256::digest(digest);
        }
        let (key, _) = derive_key_iv(b"secret", &SEED);
        assert_eq!(key, digest[..KEY_SIZE]);
    }

    #[test]
    fn test_iv_chains_from_truncated_key() {
        let (key, iv) = derive_key_iv(b"secret", &SEED);
        let mut seeded = Vec::with_capacity(KEY_SIZE + IV_SIZE);
        seeded.extend_from_slice(&key);
        seeded.extend_from_slice(&SEED);
        let mut digest = Sha256::digest(&seeded);
        for _ in 0..99 {
            digest = Sha256::digest(digest);
        }
        assert_eq!(iv, digest[..IV_SIZE]);
    }
}
