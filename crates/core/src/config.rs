//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Nothing in the core reads environment variables while handling a
//! lookup; the `*_from_env_value` helpers only turn already-read values into typed settings.

use crate::paths::{DatastreamStoreDir, ObjectStoreDir};
use crate::{CoreError, CoreResult};
use fedora_pid::ShardLayout;
use std::path::{Component, Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoreConfig {
    data_dir: PathBuf,
    object_store_dir: String,
    datastream_store_dir: String,
    shard_layout: ShardLayout,
}

impl CoreConfig {
    /// Create a new `CoreConfig` with the default store directory names.
    ///
    /// `data_dir` must be absolute; there is no default repository location.
    pub fn new(data_dir: PathBuf, shard_layout: ShardLayout) -> CoreResult<Self> {
        if !data_dir.is_absolute() {
            return Err(CoreError::InvalidConfig(format!(
                "data directory must be an absolute path, got: {}",
                data_dir.display()
            )));
        }

        Ok(Self {
            data_dir,
            object_store_dir: ObjectStoreDir::NAME.to_owned(),
            datastream_store_dir: DatastreamStoreDir::NAME.to_owned(),
            shard_layout,
        })
    }

    /// Replace the store directory names.
    ///
    /// Each name must be a single, normal path component (no separators, `.` or `..`).
    pub fn with_store_dirs(
        mut self,
        object_store_dir: impl Into<String>,
        datastream_store_dir: impl Into<String>,
    ) -> CoreResult<Self> {
        let object_store_dir = object_store_dir.into();
        let datastream_store_dir = datastream_store_dir.into();
        validate_store_dir_name(&object_store_dir)?;
        validate_store_dir_name(&datastream_store_dir)?;

        self.object_store_dir = object_store_dir;
        self.datastream_store_dir = datastream_store_dir;
        Ok(self)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn object_store_dir(&self) -> PathBuf {
        self.data_dir.join(&self.object_store_dir)
    }

    pub fn datastream_store_dir(&self) -> PathBuf {
        self.data_dir.join(&self.datastream_store_dir)
    }

    pub fn shard_layout(&self) -> &ShardLayout {
        &self.shard_layout
    }
}

fn validate_store_dir_name(name: &str) -> CoreResult<()> {
    let mut components = Path::new(name).components();
    let single_component = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );

    if single_component && !name.contains(|c: char| c == '/' || c == '\\') {
        return Ok(());
    }

    Err(CoreError::InvalidConfig(format!(
        "store directory must be a single directory name, got: '{}'",
        name
    )))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the repository base directory from an optional string value.
///
/// The value is required: `None` or blank input is an error.
pub fn data_dir_from_env_value(value: Option<String>) -> CoreResult<PathBuf> {
    non_blank(value).map(PathBuf::from).ok_or_else(|| {
        CoreError::InvalidConfig("repository data directory is not configured".into())
    })
}

/// Parse the shard layout from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`ShardLayout::Split`].
pub fn shard_layout_from_env_value(value: Option<String>) -> CoreResult<ShardLayout> {
    let parsed = non_blank(value)
        .map(|v| v.parse::<ShardLayout>())
        .transpose()?;

    Ok(parsed.unwrap_or_default())
}

/// Parse a store directory name, falling back to `default` when unset or blank.
pub fn store_dir_from_env_value(value: Option<String>, default: &str) -> String {
    non_blank(value).unwrap_or_else(|| default.to_owned())
}
