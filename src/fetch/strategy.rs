//! Acquisition strategy variants and the per-rule fallback pipeline.
//!
//! A strategy is one way of locating and downloading a candidate file:
//! an exact-version index lookup, a filtered-latest index lookup, or a
//! direct URL. A rule's pipeline tries its strategies in declared order
//! and returns the first successfully installed file; each failure is
//! logged before the next strategy runs.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::DateTime;

use super::digest::{DigestError, Sha512Digest};
use super::download::{DownloadError, DownloadPolicy, download_verified};
use super::index::{
    IndexError, VersionFile, VersionRecord, fetch_filtered_versions, fetch_version,
    loaders_contain,
};
use super::selection::choose_file;
use super::transport::Transport;
use crate::sink::write_log_line;

/// Shared context for strategy execution.
pub struct FetchContext<'a> {
    /// Transport used for index metadata and payload requests.
    pub transport: &'a dyn Transport,
    /// Retry budget and backoff schedule for downloads.
    pub policy: &'a DownloadPolicy,
    /// Directory artifacts are installed into.
    pub dest_dir: &'a Path,
}

/// One way of locating and downloading a candidate file for a rule.
#[derive(Debug, Clone)]
pub enum Strategy {
    /// Look up one exact version record on the index.
    ModrinthExact {
        /// Project identifier on the index.
        project: String,
        /// Exact version identifier to fetch.
        version: String,
        /// Loader tag the version record must declare.
        required_loader: String,
    },
    /// List versions filtered by loader and game version, pick the latest.
    ModrinthFiltered {
        /// Project identifier on the index.
        project: String,
        /// Loader tag used in the server-side filter.
        loader: String,
        /// Game version used in the server-side filter.
        game_version: String,
        /// Loader tag each candidate must declare (second, stricter filter).
        required_loader: String,
    },
    /// Download a known URL directly, bypassing the index.
    Direct {
        /// Download URL, already template-expanded.
        url: String,
        /// Explicit target filename; derived from the URL when absent.
        filename: Option<String>,
        /// Expected SHA-512 digest, when the source publishes one.
        sha512: Option<String>,
        /// Substring the resolved filename must contain; guards against a
        /// misconfigured or redirected URL.
        expect_contains: Option<String>,
    },
}

/// A downloadable file selected by a strategy.
///
/// Transient: consumed immediately by the download step.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Download URL.
    pub url: String,
    /// Target filename under the destination directory.
    pub filename: String,
    /// Expected content digest, when one is available.
    pub sha512: Option<Sha512Digest>,
}

/// Errors raised by a single strategy attempt.
#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    /// Index metadata could not be fetched or parsed.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// The exact version record does not declare the required loader.
    #[error("version {version} does not list required loader {required}")]
    LoaderMismatch {
        /// The version identifier that was looked up.
        version: String,
        /// The loader tag that was required.
        required: String,
    },

    /// The filtered version list came back empty.
    #[error("no versions for {project} matching the loader and game version filter")]
    NoResults {
        /// The project identifier that was listed.
        project: String,
    },

    /// No listed version declares the required loader.
    #[error("no version with loader {required}")]
    NoMatchingVersion {
        /// The loader tag that was required.
        required: String,
    },

    /// A version record lists no usable file.
    #[error("no downloadable file in the selected version")]
    NoFile,

    /// A publish timestamp could not be parsed.
    #[error("invalid publish timestamp {value}: {source}")]
    Timestamp {
        /// The raw timestamp value.
        value: String,
        /// The underlying parse failure.
        source: chrono::ParseError,
    },

    /// The resolved filename failed a configured or structural guard.
    #[error("unexpected filename: {filename}")]
    UnexpectedFilename {
        /// The filename that was rejected.
        filename: String,
    },

    /// An expected digest was malformed.
    #[error(transparent)]
    Digest(#[from] DigestError),

    /// The download-verify-install sequence failed.
    #[error(transparent)]
    Download(#[from] DownloadError),
}

impl Strategy {
    /// Short identity used in log lines when this strategy fails.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::ModrinthExact { version, .. } => format!("modrinth_exact({version})"),
            Self::ModrinthFiltered {
                loader,
                game_version,
                ..
            } => format!("modrinth_filtered({loader},{game_version})"),
            Self::Direct { url, .. } => format!("direct({url})"),
        }
    }

    /// Attempt to produce an installed artifact in `ctx.dest_dir`.
    ///
    /// # Errors
    ///
    /// Returns a [`StrategyError`] describing why this strategy could not
    /// produce a verified file; the caller decides whether a fallback
    /// strategy runs.
    pub fn attempt(
        &self,
        ctx: &FetchContext<'_>,
        log: &mut dyn Write,
    ) -> Result<PathBuf, StrategyError> {
        let candidate = self.resolve(ctx)?;
        install_candidate(ctx, &candidate, log)
    }

    /// Resolve this strategy to one candidate file without downloading it.
    fn resolve(&self, ctx: &FetchContext<'_>) -> Result<Candidate, StrategyError> {
        match self {
            Self::ModrinthExact {
                project,
                version,
                required_loader,
            } => {
                let record = fetch_version(ctx.transport, project, version)?;
                if !loaders_contain(&record.loaders, required_loader) {
                    return Err(StrategyError::LoaderMismatch {
                        version: version.clone(),
                        required: required_loader.clone(),
                    });
                }
                let file = choose_file(&record.files, required_loader)
                    .ok_or(StrategyError::NoFile)?;
                candidate_from_file(file)
            }
            Self::ModrinthFiltered {
                project,
                loader,
                game_version,
                required_loader,
            } => {
                let records =
                    fetch_filtered_versions(ctx.transport, project, loader, game_version)?;
                if records.is_empty() {
                    return Err(StrategyError::NoResults {
                        project: project.clone(),
                    });
                }
                let newest = newest_with_loader(&records, required_loader)?
                    .ok_or_else(|| StrategyError::NoMatchingVersion {
                        required: required_loader.clone(),
                    })?;
                let file = choose_file(&newest.files, required_loader)
                    .ok_or(StrategyError::NoFile)?;
                candidate_from_file(file)
            }
            Self::Direct {
                url,
                filename,
                sha512,
                expect_contains,
            } => {
                let resolved = filename
                    .as_deref()
                    .filter(|f| !f.trim().is_empty())
                    .map_or_else(|| last_path_segment(url), str::to_owned);
                if let Some(fragment) = expect_contains {
                    if !contains_ignore_case(&resolved, fragment) {
                        return Err(StrategyError::UnexpectedFilename { filename: resolved });
                    }
                }
                let digest = sha512
                    .as_deref()
                    .filter(|d| !d.trim().is_empty())
                    .map(Sha512Digest::try_from)
                    .transpose()?;
                Ok(Candidate {
                    url: url.clone(),
                    filename: resolved,
                    sha512: digest,
                })
            }
        }
    }
}

/// Download a resolved candidate into the destination directory.
fn install_candidate(
    ctx: &FetchContext<'_>,
    candidate: &Candidate,
    log: &mut dyn Write,
) -> Result<PathBuf, StrategyError> {
    if !is_safe_filename(&candidate.filename) {
        return Err(StrategyError::UnexpectedFilename {
            filename: candidate.filename.clone(),
        });
    }
    let dest = ctx.dest_dir.join(&candidate.filename);
    download_verified(
        ctx.transport,
        ctx.policy,
        &candidate.url,
        &dest,
        candidate.sha512.as_ref(),
        log,
    )?;
    Ok(dest)
}

/// Build a candidate from an index file entry, validating its digest.
fn candidate_from_file(file: &VersionFile) -> Result<Candidate, StrategyError> {
    let digest = file
        .hashes
        .sha512
        .as_deref()
        .map(Sha512Digest::try_from)
        .transpose()?;
    Ok(Candidate {
        url: file.url.clone(),
        filename: file.filename.clone(),
        sha512: digest,
    })
}

/// Pick the record with the most recent publish timestamp among those
/// declaring the required loader. Strictly-later replaces the current
/// best, so the first record seen wins exact ties.
fn newest_with_loader<'a>(
    records: &'a [VersionRecord],
    required_loader: &str,
) -> Result<Option<&'a VersionRecord>, StrategyError> {
    let mut newest: Option<(&VersionRecord, DateTime<chrono::FixedOffset>)> = None;
    for record in records {
        if !loaders_contain(&record.loaders, required_loader) {
            continue;
        }
        let published = DateTime::parse_from_rfc3339(&record.date_published).map_err(|source| {
            StrategyError::Timestamp {
                value: record.date_published.clone(),
                source,
            }
        })?;
        match &newest {
            Some((_, best)) if published <= *best => {}
            _ => newest = Some((record, published)),
        }
    }
    Ok(newest.map(|(record, _)| record))
}

/// Last path segment of a URL, ignoring any query or fragment.
///
/// # Examples
///
/// ```
/// use modfetch::fetch::strategy::last_path_segment;
///
/// assert_eq!(last_path_segment("https://example.test/dist/x-1.21.8.jar"), "x-1.21.8.jar");
/// assert_eq!(last_path_segment("https://example.test/dist/x.jar?token=abc"), "x.jar");
/// ```
#[must_use]
pub fn last_path_segment(url: &str) -> String {
    let without_fragment = url.split('#').next().unwrap_or(url);
    let without_query = without_fragment.split('?').next().unwrap_or(without_fragment);
    without_query
        .rsplit('/')
        .next()
        .unwrap_or(without_query)
        .to_owned()
}

/// Case-insensitive substring test.
fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}

/// Reject filenames that would escape the destination directory.
fn is_safe_filename(filename: &str) -> bool {
    !filename.is_empty()
        && !filename.contains('/')
        && !filename.contains('\\')
        && filename != "."
        && filename != ".."
}

/// Raised when every strategy in a rule's pipeline has been exhausted.
#[derive(Debug, thiserror::Error)]
#[error("no valid source found for {rule}")]
pub struct NoValidSource {
    /// Display name of the rule that failed.
    pub rule: String,
}

/// Run a rule's fallback pipeline: try each strategy in declared order and
/// return the first installed artifact path.
///
/// Each strategy failure is logged with the strategy's identity before the
/// next strategy runs.
///
/// # Errors
///
/// Returns [`NoValidSource`] when every strategy has failed.
pub fn run_pipeline(
    rule_name: &str,
    pipeline: &[Strategy],
    ctx: &FetchContext<'_>,
    log: &mut dyn Write,
) -> Result<PathBuf, NoValidSource> {
    for strategy in pipeline {
        match strategy.attempt(ctx, log) {
            Ok(path) => return Ok(path),
            Err(err) => {
                write_log_line(
                    log,
                    format!("{rule_name} strategy failed ({}): {err}", strategy.name()),
                );
            }
        }
    }
    Err(NoValidSource {
        rule: rule_name.to_owned(),
    })
}

#[cfg(test)]
#[path = "strategy_tests.rs"]
mod tests;
