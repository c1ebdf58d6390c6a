//! Cryptographic support for protected SecureTar backups.
//!
//! SecureTar protects the inner archive with:
//! - AES-128-CBC encryption, no padding beyond block alignment
//! - A bespoke iterated SHA-256 key derivation (100 rounds), not PBKDF2
//! - A 16-byte IV seed carried in the secure header
//! - No password verification (a wrong passphrase produces garbage)

mod cbc_reader;
mod kdf;

pub use cbc_reader::CbcDecryptReader;
pub use kdf::{derive_key_iv, KDF_ROUNDS};

/// AES cipher block size in bytes. Ciphertext streams must be an exact
/// multiple of this.
pub const BLOCK_SIZE: usize = 16;

/// Derived AES key size in bytes (AES-128).
pub const KEY_SIZE: usize = 16;

/// Initialization vector size in bytes.
pub const IV_SIZE: usize = 16;
