//! Error types for SecureTar backup decoding.
//!
//! This module provides the [`BackupError`] type which covers all possible
//! errors that can occur when parsing, decrypting, or extracting SecureTar
//! backup archives.
//!
//! ## Error Categories
//!
//! | Category | Errors | Description |
//! |----------|--------|-------------|
//! | Format | [`InvalidArchive`], [`InvalidManifest`] | File is not a valid backup archive |
//! | Encryption | [`InvalidProtectedHeader`], [`InvalidProtectedArchive`], [`InvalidPadding`] | Protected-stream violations |
//! | Misuse | [`BufferTooSmall`], [`InvalidIv`] | Decryptor misconfiguration |
//! | Compression | [`Decompression`] | Inner stream is not valid gzip |
//! | I/O | [`Io`] | Read/write errors |
//!
//! [`InvalidArchive`]: BackupError::InvalidArchive
//! [`InvalidManifest`]: BackupError::InvalidManifest
//! [`InvalidProtectedHeader`]: BackupError::InvalidProtectedHeader
//! [`InvalidProtectedArchive`]: BackupError::InvalidProtectedArchive
//! [`InvalidPadding`]: BackupError::InvalidPadding
//! [`BufferTooSmall`]: BackupError::BufferTooSmall
//! [`InvalidIv`]: BackupError::InvalidIv
//! [`Decompression`]: BackupError::Decompression
//! [`Io`]: BackupError::Io

use std::fmt;
use std::io;

/// Error type for backup decode operations.
///
/// Any error aborts the archive currently being processed; there is no retry
/// and no rollback of files already written. Callers iterating multiple input
/// archives report the error and move on to the next input.
///
/// Note that the format carries no MAC or AEAD tag, so a wrong passphrase is
/// not detected here. It surfaces as downstream tar or gzip parse failures,
/// or as garbage output.
#[derive(Debug)]
pub enum BackupError {
    /// The outer container violates the expected structure.
    ///
    /// The outer archive must hold exactly two entries in order: a manifest
    /// named `backup.json` of at most 4096 bytes, then a blob entry of at
    /// least 1024 bytes (16-byte aligned when the backup is protected).
    /// The `&str` names the check that failed.
    InvalidArchive(&'static str),

    /// The manifest entry is not a JSON object.
    InvalidManifest(serde_json::Error),

    /// The 48-byte secure header is truncated or its magic/version bytes
    /// do not match `"SecureTar"` version 2.
    InvalidProtectedHeader,

    /// A protected blob could not be opened for decryption.
    InvalidProtectedArchive,

    /// The ciphertext stream length is not a multiple of the cipher block
    /// size (16 bytes).
    ///
    /// The format uses no padding scheme beyond block alignment, so a
    /// trailing partial block means the stream is truncated or corrupt.
    InvalidPadding,

    /// The caller's read buffer cannot hold a single cipher block.
    ///
    /// The streaming decryptor works in whole 16-byte blocks and requires
    /// every read request to have room for at least one.
    BufferTooSmall {
        /// Number of bytes needed.
        needed: usize,
        /// Number of bytes available.
        have: usize,
    },

    /// The configured IV seed is shorter than one cipher block.
    InvalidIv {
        /// Number of seed bytes provided.
        have: usize,
    },

    /// The inner stream is not valid gzip.
    Decompression(&'static str),

    /// An I/O error occurred.
    ///
    /// Wraps [`std::io::Error`] for file system and stream operations.
    Io(io::Error),
}

impl fmt::Display for BackupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArchive(reason) => write!(f, "invalid backup archive: {}", reason),
            Self::InvalidManifest(e) => write!(f, "invalid backup manifest: {}", e),
            Self::InvalidProtectedHeader => write!(f, "invalid secure header"),
            Self::InvalidProtectedArchive => write!(f, "invalid protected archive"),
            Self::InvalidPadding => write!(f, "ciphertext length is not block aligned"),
            Self::BufferTooSmall { needed, have } => {
                write!(f, "read buffer too small: need {} bytes, have {}", needed, have)
            }
            Self::InvalidIv { have } => {
                write!(f, "invalid iv seed: need 16 bytes, have {}", have)
            }
            Self::Decompression(reason) => write!(f, "decompression failed: {}", reason),
            Self::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for BackupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::InvalidManifest(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for BackupError {
    /// Converts an I/O error, recovering a [`BackupError`] that crossed the
    /// `std::io::Read` seam inside the streaming decryptor.
    fn from(e: io::Error) -> Self {
        match e.downcast::<BackupError>() {
            Ok(inner) => inner,
            Err(e) => Self::Io(e),
        }
    }
}

impl From<BackupError> for io::Error {
    fn from(e: BackupError) -> Self {
        match e {
            BackupError::Io(inner) => inner,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

impl From<serde_json::Error> for BackupError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidManifest(e)
    }
}

pub type Result<T> = std::result::Result<T, BackupError>;
