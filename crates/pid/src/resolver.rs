//! Internal implementation of PID resolution.
//!
//! Everything here is a pure function of its inputs. No type in this module holds interior
//! mutability, so all of them are `Send + Sync` and can be shared freely between threads.

use crate::{PidError, PidResult};
use md5::{Digest, Md5};
use std::{fmt, str::FromStr};

/// Prefix every identifier is placed under to build its canonical URI.
pub const CANONICAL_URI_PREFIX: &str = "info:fedora/";

/// The placeholder pattern used by older Akubra-backed repositories.
pub const LEGACY_SHARD_PATTERN: &str = "##";

/// The `info:fedora/` form of an identifier.
///
/// Built with [`CanonicalUri::from_identifier`]; any input string is accepted, including the
/// empty string.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CanonicalUri(String);

impl CanonicalUri {
    /// Builds the canonical URI, replacing every `+` in `identifier` with `/`.
    pub fn from_identifier(identifier: &str) -> Self {
        let normalized = identifier.replace('+', "/");
        Self(format!("{CANONICAL_URI_PREFIX}{normalized}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// MD5 digest of the URI's UTF-8 bytes.
    pub fn digest(&self) -> ObjectDigest {
        ObjectDigest::of(self.0.as_bytes())
    }

    /// Percent-encodes the URI for use as a file name.
    ///
    /// Bytes outside `A-Za-z0-9-._~` are escaped as `%XX`. The storage engine additionally
    /// treats `_` as reserved, so it is escaped to `%5F` afterwards.
    pub fn encoded(&self) -> String {
        urlencoding::encode(&self.0).replace('_', "%5F")
    }
}

impl fmt::Display for CanonicalUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalUri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A 32 character lowercase hex MD5 digest.
///
/// The digest only spreads objects evenly across shard directories. It carries no integrity or
/// security meaning.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectDigest(String);

impl ObjectDigest {
    /// Length of the hex form.
    pub const HEX_LEN: usize = 32;

    /// Hashes `bytes` with MD5.
    pub fn of(bytes: &[u8]) -> Self {
        Self(hex::encode(Md5::digest(bytes)))
    }

    /// Validates a digest supplied from outside, for example a shard directory name read back
    /// from disk.
    ///
    /// # Errors
    ///
    /// Returns [`PidError::InvalidDigest`] unless `input` is exactly 32 lowercase hex characters.
    pub fn parse(input: &str) -> PidResult<Self> {
        if Self::is_canonical(input) {
            return Ok(Self(input.to_owned()));
        }
        Err(PidError::InvalidDigest(format!(
            "digest must be 32 lowercase hex characters, got: '{}'",
            input
        )))
    }

    /// Returns true if `input` is 32 characters of `0-9a-f`.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == Self::HEX_LEN
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ObjectDigest {
    type Err = PidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectDigest::parse(s)
    }
}

/// A validated `#` placeholder pattern, for example `##` or `##/##`.
///
/// Rules:
/// - only `#` and `/` characters
/// - at least one and at most 32 `#`
/// - no empty segments (no leading, trailing or doubled `/`)
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ShardPattern(String);

impl ShardPattern {
    /// # Errors
    ///
    /// Returns [`PidError::InvalidLayout`] if the pattern breaks any of the rules above.
    pub fn parse(pattern: &str) -> PidResult<Self> {
        if pattern.chars().any(|c| c != '#' && c != '/') {
            return Err(PidError::InvalidLayout(format!(
                "pattern may only contain '#' and '/', got: '{}'",
                pattern
            )));
        }

        let placeholders = pattern.chars().filter(|&c| c == '#').count();
        if placeholders == 0 || placeholders > ObjectDigest::HEX_LEN {
            return Err(PidError::InvalidLayout(format!(
                "pattern must contain between 1 and {} '#', got: '{}'",
                ObjectDigest::HEX_LEN,
                pattern
            )));
        }

        if pattern.split('/').any(str::is_empty) {
            return Err(PidError::InvalidLayout(format!(
                "pattern must not contain empty segments, got: '{}'",
                pattern
            )));
        }

        Ok(Self(pattern.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn fill(&self, digest: &ObjectDigest) -> String {
        let mut hex = digest.as_str().chars();
        self.0
            .chars()
            .map(|c| match c {
                '#' => hex.next().unwrap_or('#'),
                other => other,
            })
            .collect()
    }
}

/// How a digest is turned into shard directories.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ShardLayout {
    /// `D[0..2]/D[2..4]/D[4..32]`.
    #[default]
    Split,

    /// Each `#` of the pattern takes the next digest character.
    Pattern(ShardPattern),
}

impl ShardLayout {
    /// The two character layout written by older Akubra-backed repositories.
    pub fn legacy() -> Self {
        Self::Pattern(ShardPattern(LEGACY_SHARD_PATTERN.to_owned()))
    }

    /// Builds a pattern layout.
    ///
    /// # Errors
    ///
    /// See [`ShardPattern::parse`].
    pub fn pattern(pattern: &str) -> PidResult<Self> {
        ShardPattern::parse(pattern).map(Self::Pattern)
    }

    /// Returns the `/`-separated shard directories for `digest`.
    pub fn shard(&self, digest: &ObjectDigest) -> String {
        match self {
            Self::Split => {
                let hex = digest.as_str();
                format!("{}/{}/{}", &hex[0..2], &hex[2..4], &hex[4..])
            }
            Self::Pattern(pattern) => pattern.fill(digest),
        }
    }
}

impl fmt::Display for ShardLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Split => f.write_str("split"),
            Self::Pattern(pattern) => f.write_str(pattern.as_str()),
        }
    }
}

impl FromStr for ShardLayout {
    type Err = PidError;

    /// Accepts `split` (or `2/2/28`) and any valid `#` pattern.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "split" | "2/2/28" => Ok(Self::Split),
            other if other.contains('#') => Self::pattern(other),
            other => Err(PidError::InvalidLayout(format!(
                "expected 'split' or a '#' pattern such as '{}', got: '{}'",
                LEGACY_SHARD_PATTERN, other
            ))),
        }
    }
}

/// Every intermediate value of one resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Resolution {
    pub identifier: String,
    pub canonical_uri: CanonicalUri,
    pub digest: ObjectDigest,
    pub shard_path: String,
    pub encoded_uri: String,
    pub relative_path: String,
}

/// Resolves identifiers to repository-relative storage paths under a fixed [`ShardLayout`].
///
/// The resolver holds only its layout; build it once at startup and share it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathResolver {
    layout: ShardLayout,
}

impl PathResolver {
    pub fn new(layout: ShardLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &ShardLayout {
        &self.layout
    }

    /// Returns `<shard-path>/<encoded-uri>` for `identifier`.
    ///
    /// Any string is accepted. The same input always yields the same output.
    pub fn resolve(&self, identifier: &str) -> String {
        self.explain(identifier).relative_path
    }

    /// Like [`PathResolver::resolve`], keeping the intermediate values.
    pub fn explain(&self, identifier: &str) -> Resolution {
        let canonical_uri = CanonicalUri::from_identifier(identifier);
        let digest = canonical_uri.digest();
        let shard_path = self.layout.shard(&digest);
        let encoded_uri = canonical_uri.encoded();
        let relative_path = format!("{shard_path}/{encoded_uri}");

        Resolution {
            identifier: identifier.to_owned(),
            canonical_uri,
            digest,
            shard_path,
            encoded_uri,
            relative_path,
        }
    }
}

/// Resolves `identifier` with the default [`ShardLayout::Split`] layout.
pub fn resolve(identifier: &str) -> String {
    PathResolver::default().resolve(identifier)
}

#[cfg(feature = "serde")]
mod serde_impls {
    use super::{CanonicalUri, ObjectDigest, ShardLayout};
    use serde::Deserialize;

    impl serde::Serialize for CanonicalUri {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            serializer.serialize_str(self.as_str())
        }
    }

    impl serde::Serialize for ObjectDigest {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            serializer.serialize_str(self.as_str())
        }
    }

    impl<'de> Deserialize<'de> for ObjectDigest {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            let s = String::deserialize(deserializer)?;
            ObjectDigest::parse(&s).map_err(serde::de::Error::custom)
        }
    }

    impl serde::Serialize for ShardLayout {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            serializer.collect_str(self)
        }
    }

    impl<'de> Deserialize<'de> for ShardLayout {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(serde::de::Error::custom)
        }
    }
}
