//! Package-index resolution layer.
//!
//! Builds Modrinth v2 API URLs, performs the two read-only metadata calls
//! the strategies need (a single version record, a filtered version list),
//! and deserialises the responses into validated models.

use serde::Deserialize;

use super::transport::{Transport, TransportError};

/// Base URL of the package-index API.
pub const INDEX_API: &str = "https://api.modrinth.com/v2";

/// A version record returned by the index.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionRecord {
    /// Loader tags this version declares (e.g. `neoforge`, `fabric`).
    #[serde(default)]
    pub loaders: Vec<String>,
    /// ISO-8601 publication timestamp.
    pub date_published: String,
    /// Downloadable files attached to this version.
    #[serde(default)]
    pub files: Vec<VersionFile>,
}

/// One downloadable file within a version record.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionFile {
    /// Download URL for this file.
    pub url: String,
    /// Filename the index publishes for this file.
    pub filename: String,
    /// Whether the index flags this file as the primary one.
    #[serde(default)]
    pub primary: bool,
    /// Content digests the index publishes for this file.
    #[serde(default)]
    pub hashes: FileHashes,
}

/// Content digests attached to a version file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileHashes {
    /// Hex-encoded SHA-512 digest, when published.
    pub sha512: Option<String>,
}

/// Errors arising from index metadata calls.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The metadata request failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The index response was not the expected JSON document.
    #[error("index response parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Build the URL for a single version record lookup.
///
/// # Examples
///
/// ```
/// use modfetch::fetch::index::version_url;
///
/// assert_eq!(
///     version_url("sodium", "mc1.21.8-0.6.13-neoforge"),
///     "https://api.modrinth.com/v2/project/sodium/version/mc1.21.8-0.6.13-neoforge",
/// );
/// ```
#[must_use]
pub fn version_url(project: &str, version: &str) -> String {
    format!("{INDEX_API}/project/{project}/version/{version}")
}

/// Build the URL for a version list filtered by loader and game version.
///
/// The index expects both query parameters as JSON-array-shaped strings,
/// so the values are wrapped in URL-encoded `["…"]` brackets.
///
/// # Examples
///
/// ```
/// use modfetch::fetch::index::filtered_versions_url;
///
/// assert_eq!(
///     filtered_versions_url("sodium", "neoforge", "1.21.8"),
///     concat!(
///         "https://api.modrinth.com/v2/project/sodium/version",
///         "?loaders=%5B%22neoforge%22%5D&game_versions=%5B%221.21.8%22%5D",
///     ),
/// );
/// ```
#[must_use]
pub fn filtered_versions_url(project: &str, loader: &str, game_version: &str) -> String {
    format!(
        "{INDEX_API}/project/{project}/version?loaders=%5B%22{}%22%5D&game_versions=%5B%22{}%22%5D",
        encode_component(loader),
        encode_component(game_version),
    )
}

/// Percent-encode the characters the index's values can realistically
/// contain; loader tags and game versions are plain tokens apart from
/// the occasional space in a snapshot name.
fn encode_component(value: &str) -> String {
    value.replace(' ', "%20")
}

/// Fetch the single version record for `{project, version}`.
///
/// # Errors
///
/// Returns an error if the request fails or the response does not parse.
pub fn fetch_version(
    transport: &dyn Transport,
    project: &str,
    version: &str,
) -> Result<VersionRecord, IndexError> {
    let body = transport.fetch_text(&version_url(project, version))?;
    Ok(serde_json::from_str(&body)?)
}

/// Fetch the version list for `project`, filtered server-side by loader
/// and game version.
///
/// # Errors
///
/// Returns an error if the request fails or the response does not parse.
pub fn fetch_filtered_versions(
    transport: &dyn Transport,
    project: &str,
    loader: &str,
    game_version: &str,
) -> Result<Vec<VersionRecord>, IndexError> {
    let body = transport.fetch_text(&filtered_versions_url(project, loader, game_version))?;
    Ok(serde_json::from_str(&body)?)
}

/// Case-insensitive membership test over a version's loader tags.
#[must_use]
pub fn loaders_contain(loaders: &[String], required: &str) -> bool {
    loaders.iter().any(|l| l.eq_ignore_ascii_case(required))
}
