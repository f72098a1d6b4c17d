//! Crash-safe download, verification, and installation.
//!
//! Bytes land in a temporary file co-located with the destination (falling
//! back to the system temp directory when the destination rejects the
//! write), are verified against an expected digest when one is configured,
//! and are promoted into place by an atomic rename. The destination is
//! never left partially written: the temporary file is removed on every
//! failure path.
//!
//! Transient transport failures are retried with linear backoff. A digest
//! mismatch is not transient: retrying would fetch the same bytes, so it
//! ends the download immediately.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use super::digest::{Sha512Digest, compute_sha512};
use super::transport::{Transport, TransportError};
use crate::sink::write_log_line;

/// Retry budget and backoff schedule for one download.
#[derive(Debug, Clone)]
pub struct DownloadPolicy {
    /// Maximum number of GET attempts.
    pub attempts: u32,
    /// Base backoff unit; attempt `n` sleeps `n × backoff_unit` after
    /// failing.
    pub backoff_unit: Duration,
}

impl Default for DownloadPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff_unit: Duration::from_millis(800),
        }
    }
}

impl DownloadPolicy {
    /// Backoff delay after a failed attempt (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff_unit.saturating_mul(attempt)
    }
}

/// Errors arising from the download-verify-install sequence.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// The transfer failed; retried up to the attempt budget.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The downloaded bytes do not match the expected digest.
    #[error("SHA-512 mismatch for {filename}: expected {expected}, got {actual}")]
    DigestMismatch {
        /// Filename of the artifact being verified.
        filename: String,
        /// The digest the source declared.
        expected: String,
        /// The digest computed from the downloaded bytes.
        actual: String,
    },

    /// An I/O operation failed while staging or installing the file.
    #[error("I/O error during install: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// A digest mismatch indicates tampering or a wrong artifact; the same
    /// bytes would come back, so it is not transient.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::DigestMismatch { .. })
    }
}

/// Download `url` to `dest`, verifying against `expected` when supplied.
///
/// Up to [`DownloadPolicy::attempts`] attempts are made; each failed
/// attempt is logged to `log` and followed by a linear backoff sleep.
/// On success the destination file exists, is complete, and matches the
/// expected digest; on failure the destination is untouched and no
/// temporary file remains.
///
/// # Errors
///
/// Returns the last transient error when the attempt budget is exhausted,
/// or [`DownloadError::DigestMismatch`] immediately on a failed
/// verification.
pub fn download_verified(
    transport: &dyn Transport,
    policy: &DownloadPolicy,
    url: &str,
    dest: &Path,
    expected: Option<&Sha512Digest>,
    log: &mut dyn Write,
) -> Result<(), DownloadError> {
    let parent = dest.parent().ok_or_else(|| {
        DownloadError::Io(std::io::Error::other(format!(
            "destination {} has no parent directory",
            dest.display()
        )))
    })?;
    fs::create_dir_all(parent)?;

    let mut last: Option<DownloadError> = None;
    for attempt in 1..=policy.attempts {
        match attempt_once(transport, url, dest, parent, expected) {
            Ok(()) => return Ok(()),
            Err(err) if !err.is_transient() => return Err(err),
            Err(err) => {
                let delay = policy.delay_for(attempt);
                write_log_line(
                    log,
                    format!(
                        "Download hiccup ({err}), retrying in {}ms",
                        delay.as_millis()
                    ),
                );
                last = Some(err);
                std::thread::sleep(delay);
            }
        }
    }
    Err(last.unwrap_or_else(|| {
        DownloadError::Io(std::io::Error::other("no download attempts configured"))
    }))
}

/// One download attempt: stage to a temporary file, verify, promote.
fn attempt_once(
    transport: &dyn Transport,
    url: &str,
    dest: &Path,
    dest_dir: &Path,
    expected: Option<&Sha512Digest>,
) -> Result<(), DownloadError> {
    // Temp in the target directory; if blocked, use the system temp dir.
    // The temp file is removed on drop along every failure path below.
    let tmp = tempfile::Builder::new()
        .prefix("dl-")
        .suffix(".tmp")
        .tempfile_in(dest_dir)
        .or_else(|_| tempfile::Builder::new().prefix("dl-").suffix(".tmp").tempfile())?;

    transport.fetch_to_file(url, tmp.path())?;

    if let Some(expected) = expected {
        let actual = compute_sha512(tmp.path())?;
        if actual != *expected {
            return Err(DownloadError::DigestMismatch {
                filename: filename_of(dest),
                expected: expected.as_str().to_owned(),
                actual: actual.as_str().to_owned(),
            });
        }
    }

    match tmp.persist(dest) {
        Ok(_) => Ok(()),
        // Rename can fail across filesystems (system-temp fallback); degrade
        // to a copy, which loses atomicity but not completeness.
        Err(persist_err) => {
            fs::copy(persist_err.file.path(), dest)?;
            Ok(())
        }
    }
}

/// Display-friendly filename of the destination path.
fn filename_of(dest: &Path) -> String {
    dest.file_name()
        .map_or_else(|| dest.display().to_string(), |n| n.to_string_lossy().into_owned())
}

#[cfg(test)]
#[path = "download_tests.rs"]
mod tests;
