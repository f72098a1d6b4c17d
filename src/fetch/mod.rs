//! Artifact resolution, download, verification, and installation.
//!
//! # Sub-modules
//!
//! - [`digest`] — SHA-512 digest newtype (`Sha512Digest`) and file hashing.
//! - [`download`] — Retrying download with verification and atomic install.
//! - [`index`] — Package-index URL construction and response models.
//! - [`selection`] — Candidate file selection precedence.
//! - [`strategy`] — Acquisition strategy variants and the fallback pipeline.
//! - [`transport`] — HTTP transport trait and `ureq` implementation.

pub mod digest;
pub mod download;
pub mod index;
pub mod selection;
pub mod strategy;
pub mod transport;
