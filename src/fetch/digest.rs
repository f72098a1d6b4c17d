//! SHA-512 digest newtype and file hashing.
//!
//! The package index publishes SHA-512 digests for downloadable files;
//! direct sources may configure one. Validates that a digest is a
//! 128-character hexadecimal string and normalises it to lowercase so that
//! comparisons are case-insensitive.

use sha2::{Digest, Sha512};
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Expected length of a hex-encoded SHA-512 digest.
const DIGEST_HEX_LEN: usize = 128;

/// A validated hex-encoded SHA-512 digest, stored lowercase.
///
/// # Examples
///
/// ```
/// use modfetch::fetch::digest::Sha512Digest;
///
/// let hex = "AB".repeat(64);
/// let digest = Sha512Digest::try_from(hex.as_str()).unwrap();
/// assert_eq!(digest.as_str(), "ab".repeat(64));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sha512Digest(String);

impl Sha512Digest {
    /// Return the digest as a lowercase hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Sha512Digest {
    type Error = DigestError;

    fn try_from(value: &str) -> Result<Self, DigestError> {
        validate_sha512(value)?;
        Ok(Self(value.to_ascii_lowercase()))
    }
}

impl AsRef<str> for Sha512Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha512Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors arising from digest validation.
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    /// The value is not a well-formed hex-encoded SHA-512 digest.
    #[error("invalid SHA-512 digest: {reason}")]
    Invalid {
        /// Description of the malformation.
        reason: String,
    },
}

/// Validate that `value` is a hex-encoded SHA-512 digest.
fn validate_sha512(value: &str) -> Result<(), DigestError> {
    if value.len() != DIGEST_HEX_LEN {
        return Err(DigestError::Invalid {
            reason: format!(
                "expected {DIGEST_HEX_LEN} hex characters, got {}",
                value.len()
            ),
        });
    }
    if let Some(bad) = value.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(DigestError::Invalid {
            reason: format!("non-hex character '{bad}'"),
        });
    }
    Ok(())
}

/// Compute the SHA-512 digest of a file.
///
/// Reads the file at `path` in chunks and returns the lowercase hex digest
/// as a validated [`Sha512Digest`].
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn compute_sha512(path: &Path) -> std::io::Result<Sha512Digest> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha512::new();
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    // sha2 emits 128 lowercase hex characters, so the invariant holds by
    // construction.
    Ok(Sha512Digest(format!("{:x}", hasher.finalize())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// SHA-512 of the ASCII bytes `abc` (FIPS 180-2 test vector).
    const ABC_SHA512: &str = concat!(
        "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a",
        "2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f",
    );

    #[test]
    fn accepts_valid_hex_and_normalises_case() {
        let upper = ABC_SHA512.to_ascii_uppercase();
        let digest = Sha512Digest::try_from(upper.as_str()).expect("valid digest");
        assert_eq!(digest.as_str(), ABC_SHA512);
    }

    #[rstest]
    #[case::too_short("abcdef")]
    #[case::too_long(&"a".repeat(129))]
    #[case::non_hex(&format!("{}g", "a".repeat(127)))]
    fn rejects_malformed_values(#[case] value: &str) {
        assert!(Sha512Digest::try_from(value).is_err());
    }

    #[test]
    fn equal_digests_compare_equal_across_case() {
        let lower = Sha512Digest::try_from(ABC_SHA512).expect("valid");
        let upper = Sha512Digest::try_from(ABC_SHA512.to_ascii_uppercase().as_str())
            .expect("valid");
        assert_eq!(lower, upper);
    }

    #[test]
    fn computes_known_digest() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("payload");
        std::fs::write(&path, b"abc").expect("write payload");
        let digest = compute_sha512(&path).expect("hash file");
        assert_eq!(digest.as_str(), ABC_SHA512);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert!(compute_sha512(&dir.path().join("absent")).is_err());
    }
}
