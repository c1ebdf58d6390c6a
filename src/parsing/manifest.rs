//! Backup manifest parser.
//!
//! The first outer entry, `backup.json`, is an open-ended JSON object. Only
//! two fields govern decoding:
//!
//! - `protected` (bool, default false) — inner stream is AES-128-CBC encrypted
//! - `compressed` (bool, default false) — inner stream is gzip compressed
//!
//! Unknown fields are preserved opaquely and re-serialized for display, but
//! never interpreted.

use serde_json::{Map, Value};

use crate::error::Result;

/// Expected final path component of the manifest entry.
pub const MANIFEST_NAME: &str = "backup.json";

/// Maximum manifest entry size in bytes.
pub const MANIFEST_MAX_SIZE: u64 = 4096;

/// Parsed backup manifest.
///
/// Read once per archive and immutable afterwards; discarded once the
/// pipeline has taken its decode decisions and emitted the display output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    fields: Map<String, Value>,
}

impl Manifest {
    /// Parse a manifest from raw JSON bytes.
    ///
    /// Anything other than a JSON object fails with
    /// [`InvalidManifest`](crate::BackupError::InvalidManifest).
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let fields: Map<String, Value> = serde_json::from_slice(raw)?;
        Ok(Self { fields })
    }

    /// Whether the inner stream is encrypted. Missing or wrong-typed means
    /// unprotected.
    pub fn protected(&self) -> bool {
        self.flag("protected")
    }

    /// Whether the inner stream is gzip compressed. Missing or wrong-typed
    /// means uncompressed.
    pub fn compressed(&self) -> bool {
        self.flag("compressed")
    }

    fn flag(&self, name: &str) -> bool {
        matches!(self.fields.get(name), Some(Value::Bool(true)))
    }

    /// Look up an arbitrary manifest field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Re-serialize the manifest, unknown fields included, for display.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.fields).unwrap_or_default()
    }
}
