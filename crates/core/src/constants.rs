//! Constants used throughout the core crate.
//!
//! Directory names and environment variable names live here so that every front end reads the
//! same configuration keys.

/// Datastreams reported when the caller does not ask for specific ones.
pub const DEFAULT_DATASTREAMS: [&str; 2] = ["OBJ", "PDF"];

/// Environment variable holding the repository base directory.
pub const DATA_DIR_ENV: &str = "FEDORA_DATA_DIR";

/// Environment variable selecting the shard layout (`split` or a `#` pattern).
pub const SHARD_LAYOUT_ENV: &str = "FEDORA_SHARD_LAYOUT";

/// Environment variable overriding the object store directory name.
pub const OBJECT_STORE_ENV: &str = "FEDORA_OBJECT_STORE";

/// Environment variable overriding the datastream store directory name.
pub const DATASTREAM_STORE_ENV: &str = "FEDORA_DATASTREAM_STORE";
