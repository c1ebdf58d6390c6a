//! Parsers for the structures embedded in a SecureTar backup.
//!
//! The outer container carries two control structures the decode pipeline
//! needs before it can touch the inner archive:
//!
//! | Structure | Where | Parser |
//! |-----------|-------|--------|
//! | Manifest | first outer entry, `backup.json` | [`Manifest`] |
//! | Secure header | first 48 bytes of a protected blob | [`SecureTarHeader`] |

mod manifest;
mod secure_header;

pub use manifest::{Manifest, MANIFEST_MAX_SIZE, MANIFEST_NAME};
pub use secure_header::{SecureTarHeader, IV_SEED_SIZE, SECURE_HEADER_SIZE, SECURE_MAGIC};
