//! Materialization of inner archive entries onto the filesystem.
//!
//! Entries are consumed one at a time in archive order and dispatched by
//! kind. The failure policy is deliberate and explicit:
//!
//! | Kind | Action | Failure policy |
//! |--------------|-----------------------------------|----------------|
//! | Regular file | create/truncate + stream copy | fatal for the archive |
//! | Directory | `create_dir_all` | best effort |
//! | Symlink | link to declared non-empty target | best effort |
//! | Other | skipped | — |
//!
//! Destination paths join the output root with the entry path stripped of a
//! single leading separator. No `..`-segment normalization is performed; the
//! format is assumed to come from a trusted producer (see DESIGN.md).

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tar::Entry;
use tracing::info;

use crate::error::Result;

/// What materializing one entry did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Materialized {
    /// A regular file was written.
    File {
        /// Destination path.
        path: PathBuf,
        /// Payload bytes copied.
        bytes: u64,
    },
    /// A directory was created (or already existed).
    Directory(PathBuf),
    /// A symlink was attempted (best effort).
    Symlink(PathBuf),
    /// Entry kind is not extracted.
    Skipped,
}

/// Write one inner archive entry under `output_root`.
///
/// File I/O failures are terminal for the whole archive and propagate as
/// [`BackupError`]; directory and symlink failures are swallowed.
pub fn materialize_entry<R: Read>(entry: &mut Entry<'_, R>, output_root: &Path) -> Result<Materialized> {
    let name = entry.path()?.into_owned();
    let dest = output_root.join(strip_leading_separator(&name));
    let entry_type = entry.header().entry_type();

    if entry_type.is_file() {
        if let Some(parent) = dest.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let mut file = File::create(&dest)?;
        let bytes = io::copy(entry, &mut file)?;
        info!(bytes, path = %dest.display(), "extracted file");
        return Ok(Materialized::File { path: dest, bytes });
    }

    if entry_type.is_dir() {
        let _ = fs::create_dir_all(&dest);
        return Ok(Materialized::Directory(dest));
    }

    if entry_type.is_symlink() {
        if let Ok(Some(target)) = entry.link_name() {
            if !target.as_os_str().is_empty() {
                make_symlink(&target, &dest);
                return Ok(Materialized::Symlink(dest));
            }
        }
        return Ok(Materialized::Skipped);
    }

    Ok(Materialized::Skipped)
}

/// Strip a single leading path separator, nothing more.
fn strip_leading_separator(path: &Path) -> &Path {
    path.strip_prefix("/").unwrap_or(path)
}

#[cfg(unix)]
fn make_symlink(target: &Path, dest: &Path) {
    let _ = std::os::unix::fs::symlink(target, dest);
}

#[cfg(not(unix))]
fn make_symlink(_target: &Path, _dest: &Path) {}
