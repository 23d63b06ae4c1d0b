//! PID and sharded-path utilities.
//!
//! Fedora repositories do not store objects under human-readable names. Every FOXML record and
//! every managed datastream lives at a path derived from the MD5 digest of a *canonical URI*
//! built from the identifier.
//!
//! This crate provides:
//! - [`CanonicalUri`]: the `info:fedora/...` form of an identifier.
//! - [`ObjectDigest`]: the 32 lowercase hex character digest of a canonical URI.
//! - [`ShardLayout`]: how a digest is split into directory segments.
//! - [`PathResolver`]: the full identifier-to-relative-path derivation.
//!
//! ## Resolution
//! For an identifier `id`:
//! 1. every `+` becomes `/`
//! 2. the result is prefixed with `info:fedora/`
//! 3. the MD5 digest `D` of that URI is taken (lowercase hex)
//! 4. `D` is split into shard directories
//! 5. the URI is percent-encoded, then every `_` becomes `%5F`
//!
//! Example, using the default [`ShardLayout::Split`] layout:
//! `test:1` -> `79/da/7bd9527b7ce9730d6a112a86755e/info%3Afedora%2Ftest%3A1`
//!
//! ## Shard layouts
//! Repositories written by different storage engine versions disagree on the layout:
//! - `split`: `D[0..2]/D[2..4]/D[4..32]`
//! - `#` patterns such as `##`: each `#` takes the next digest character, so `##` gives
//!   `D[0..2]`.
//!
//! The layout must match whatever wrote the repository to disk. Check it against a known object
//! before trusting negative results.
//!
//! Resolution never fails and never touches the filesystem.

mod resolver;

pub use resolver::{
    resolve, CanonicalUri, ObjectDigest, PathResolver, Resolution, ShardLayout, ShardPattern,
    CANONICAL_URI_PREFIX, LEGACY_SHARD_PATTERN,
};

/// Error type for PID operations.
///
/// Only configuration-time and parsing operations can fail; resolution itself is total.
#[derive(Debug, thiserror::Error)]
pub enum PidError {
    /// A shard layout string or pattern was rejected
    #[error("Invalid shard layout: {0}")]
    InvalidLayout(String),

    /// A digest string was not 32 lowercase hex characters
    #[error("Invalid digest: {0}")]
    InvalidDigest(String),
}

/// Result type for PID operations.
pub type PidResult<T> = Result<T, PidError>;
