//! Record types shared between the metadata reader and the locator.

use std::borrow::Borrow;
use std::collections::BTreeMap;

/// Errors that can occur when creating validated record types.
#[derive(Debug, thiserror::Error)]
pub enum TypeError {
    /// The datastream identifier was empty or contained only whitespace
    #[error("Datastream ID cannot be empty")]
    EmptyDatastreamId,

    /// The datastream identifier contained whitespace
    #[error("Datastream ID cannot contain whitespace: '{0}'")]
    DatastreamIdWhitespace(String),

    /// The FOXML `CONTROL_GROUP` attribute was not one of `X`, `M`, `E` or `R`
    #[error("Unknown control group: '{0}'")]
    UnknownControlGroup(String),
}

/// A datastream identifier such as `OBJ`, `PDF` or `DC`.
///
/// The input is trimmed of leading and trailing whitespace during construction. Empty input and
/// input with interior whitespace are rejected.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DatastreamId(String);

impl DatastreamId {
    /// Creates a new `DatastreamId` from the given input.
    ///
    /// # Errors
    ///
    /// Returns [`TypeError::EmptyDatastreamId`] for empty or blank input and
    /// [`TypeError::DatastreamIdWhitespace`] when whitespace remains after trimming.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TypeError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TypeError::EmptyDatastreamId);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(TypeError::DatastreamIdWhitespace(trimmed.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DatastreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for DatastreamId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for DatastreamId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for DatastreamId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl serde::Serialize for DatastreamId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for DatastreamId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        DatastreamId::new(&s).map_err(serde::de::Error::custom)
    }
}

/// How a datastream's content is held by the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlGroup {
    /// `X`: XML embedded in the FOXML record itself
    Inline,
    /// `M`: content file in the datastream store
    Managed,
    /// `E`: content referenced by URL
    External,
    /// `R`: client redirected to a URL
    Redirect,
}

impl ControlGroup {
    /// Parses the single-letter FOXML code.
    pub fn from_code(code: &str) -> Result<Self, TypeError> {
        match code.trim() {
            "X" => Ok(Self::Inline),
            "M" => Ok(Self::Managed),
            "E" => Ok(Self::External),
            "R" => Ok(Self::Redirect),
            other => Err(TypeError::UnknownControlGroup(other.to_owned())),
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Inline => "X",
            Self::Managed => "M",
            Self::External => "E",
            Self::Redirect => "R",
        }
    }
}

/// One datastream of an object, as described by its metadata record.
///
/// `filename` is itself an identifier (for example `test:1+OBJ+OBJ.0`) and must be resolved
/// again to find the content file.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DatastreamRecord {
    pub datastream_id: DatastreamId,
    pub filename: String,
    pub control_group: ControlGroup,
    pub version_id: Option<String>,
    pub label: Option<String>,
    pub mime_type: Option<String>,
    pub size: Option<u64>,
}

/// The datastreams of one object keyed by identifier.
///
/// Built fresh for every metadata read and owned by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct DatastreamSet(BTreeMap<DatastreamId, DatastreamRecord>);

impl DatastreamSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `record`, replacing and returning any earlier record with the same identifier.
    pub fn insert(&mut self, record: DatastreamRecord) -> Option<DatastreamRecord> {
        self.0.insert(record.datastream_id.clone(), record)
    }

    pub fn get(&self, datastream_id: &str) -> Option<&DatastreamRecord> {
        self.0.get(datastream_id)
    }

    pub fn contains(&self, datastream_id: &str) -> bool {
        self.0.contains_key(datastream_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Records in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &DatastreamRecord> {
        self.0.values()
    }
}

impl FromIterator<DatastreamRecord> for DatastreamSet {
    fn from_iter<I: IntoIterator<Item = DatastreamRecord>>(iter: I) -> Self {
        let mut set = Self::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}

impl IntoIterator for DatastreamSet {
    type Item = DatastreamRecord;
    type IntoIter = std::collections::btree_map::IntoValues<DatastreamId, DatastreamRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_values()
    }
}
