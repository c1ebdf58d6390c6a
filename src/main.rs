//! Command-line frontend for the SecureTar backup decoder.
//!
//! Decodes each input archive in turn; a failure on one input is logged and
//! processing continues with the next. The exit code reflects whether any
//! input failed.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use securetar_stream::BackupDecoder;

#[derive(Parser)]
#[command(
    name = "securetar",
    version,
    about = "Decode SecureTar backup archives"
)]
struct Cli {
    /// Passphrase for protected archives (ignored for unprotected ones)
    passphrase: String,

    /// Backup archives to decode
    #[arg(required = true)]
    backups: Vec<PathBuf>,

    /// Extract under this directory instead of the current one
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut decoder = BackupDecoder::new(cli.passphrase);
    if let Some(dir) = cli.output {
        decoder = decoder.with_output_dir(dir);
    }

    let mut failed = false;
    for backup in &cli.backups {
        match decoder.decode(backup) {
            Ok(report) => info!(
                backup = %backup.display(),
                root = %report.output_root.display(),
                files = report.files_written,
                bytes = report.bytes_written,
                "backup decoded"
            ),
            Err(err) => {
                failed = true;
                error!(backup = %backup.display(), %err, "decode failed");
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
