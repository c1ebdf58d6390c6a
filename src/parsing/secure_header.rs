//! Secure header parser.
//!
//! A protected blob starts with a fixed 48-byte header:
//!
//! | Offset | Size | Field | Value |
//! |--------|------|---------------------|-------------------------------|
//! | 0 | 9 | magic | `"SecureTar"` |
//! | 9 | 1 | version | `0x02` |
//! | 10 | 6 | reserved | all zero |
//! | 16 | 16 | unused | not validated |
//! | 32 | 16 | iv_seed | feeds the key derivation |
//!
//! The first 16 bytes are compared exactly; any mismatch rejects the archive
//! before decryption is attempted.

use std::io::Read;

use crate::error::{BackupError, Result};

/// Total secure header size in bytes.
pub const SECURE_HEADER_SIZE: usize = 48;

/// Magic, version and reserved bytes, compared as one 16-byte unit.
pub const SECURE_MAGIC: [u8; 16] = *b"SecureTar\x02\x00\x00\x00\x00\x00\x00";

/// IV seed size in bytes.
pub const IV_SEED_SIZE: usize = 16;

/// Validated secure header of a protected blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecureTarHeader {
    iv_seed: [u8; IV_SEED_SIZE],
}

impl SecureTarHeader {
    /// Consume exactly 48 bytes from `reader` and validate them.
    ///
    /// Leaves the reader positioned at the first ciphertext byte. A short
    /// read or a mismatched magic/version prefix fails with
    /// [`BackupError::InvalidProtectedHeader`].
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut raw = [0u8; SECURE_HEADER_SIZE];
        reader
            .read_exact(&mut raw)
            .map_err(|_| BackupError::InvalidProtectedHeader)?;
        Self::parse(&raw)
    }

    /// Parse a 48-byte secure header from a buffer.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.len() < SECURE_HEADER_SIZE || raw[..SECURE_MAGIC.len()] != SECURE_MAGIC {
            return Err(BackupError::InvalidProtectedHeader);
        }
        let mut iv_seed = [0u8; IV_SEED_SIZE];
        iv_seed.copy_from_slice(&raw[32..SECURE_HEADER_SIZE]);
        Ok(Self { iv_seed })
    }

    /// The 16-byte IV seed carried in the header's last 16 bytes.
    pub fn iv_seed(&self) -> &[u8; IV_SEED_SIZE] {
        &self.iv_seed
    }
}
