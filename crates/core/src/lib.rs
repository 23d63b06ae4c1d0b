//! # Fedora Locate Core
//!
//! Configuration, storage path assembly and lookup services for locating files inside a
//! Fedora-Commons object store.
//!
//! This crate contains pure path composition plus the lookup flow around a metadata reader:
//! - [`CoreConfig`]: base directory, store directory names and shard layout, resolved once
//! - [`paths::StoragePaths`]: `<data_dir>/<store>/<resolver output>`
//! - [`LocatorService`]: FOXML record path, datastream listing and datastream lookup
//!
//! **No front-end concerns**: argument parsing, HTTP handling and display formatting belong in the
//! CLI and server binaries.

pub mod config;
pub mod constants;
mod error;
pub mod locator;
pub mod paths;

pub use config::CoreConfig;
pub use error::{CoreError, CoreResult};
pub use locator::{DatastreamLocation, DatastreamLookup, LocatorService, ObjectLocation};

pub use fedora_foxml::{FoxmlReader, MetadataError, MetadataReader, UnreadableCause};
pub use fedora_pid::{resolve, PathResolver, Resolution, ShardLayout};
pub use fedora_types::{ControlGroup, DatastreamId, DatastreamRecord, DatastreamSet};
