//! Streaming decoder for SecureTar backup archives.
//!
//! A SecureTar backup is a tar container holding a `backup.json` manifest and
//! one blob: the inner tar archive, optionally AES-128-CBC encrypted behind a
//! 48-byte secure header and optionally gzip compressed. This crate recovers
//! the manifest and extracts the full directory tree, decrypting and
//! decompressing as a composed stream without ever buffering the archive in
//! memory.
//!
//! Decode only: creating such archives is out of scope, as is recovering
//! anything from corrupted ciphertext beyond reporting the failure.
//!
//! ## Pipeline
//!
//! ```text
//! outer tar ─► manifest ─► blob ─► [decrypt] ─► [gunzip] ─► inner tar ─► files
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use securetar_stream::BackupDecoder;
//! use std::path::Path;
//!
//! let decoder = BackupDecoder::new("hunter2").with_output_dir("/tmp/restore");
//! let report = decoder.decode(Path::new("core_2024.tar"))?;
//! println!("{} files, {} bytes", report.files_written, report.bytes_written);
//! # Ok::<(), securetar_stream::BackupError>(())
//! ```

pub mod crypto;
pub mod error;
pub mod extract;
pub mod parsing;
pub mod pipeline;

pub use error::{BackupError, Result};
pub use pipeline::{BackupDecoder, DecodeReport};

// Lower-level building blocks, public for custom decode flows.
pub use crypto::{derive_key_iv, CbcDecryptReader};
pub use extract::{materialize_entry, Materialized};
pub use parsing::{Manifest, SecureTarHeader};
