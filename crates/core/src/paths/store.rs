//! Object and datastream store paths.
//!
//! A stored file lives at:
//! ```text
//! <data_dir>/
//!     objectStore/
//!         <shard>/.../<encoded-uri>        FOXML record of a PID
//!     datastreamStore/
//!         <shard>/.../<encoded-uri>        content of a datastream version
//! ```
//!
//! The `<shard>/.../<encoded-uri>` part is the output of
//! [`PathResolver::resolve`](fedora_pid::PathResolver::resolve). Its `/`-separated segments are
//! pushed one by one so the platform separator is used.

use crate::config::CoreConfig;
use fedora_pid::{PathResolver, Resolution};
use std::path::{Path, PathBuf};

/// Default directory holding FOXML metadata records.
#[derive(Debug, Clone, Copy)]
pub struct ObjectStoreDir;

impl ObjectStoreDir {
    pub const NAME: &'static str = "objectStore";
}

/// Default directory holding managed datastream content.
#[derive(Debug, Clone, Copy)]
pub struct DatastreamStoreDir;

impl DatastreamStoreDir {
    pub const NAME: &'static str = "datastreamStore";
}

/// Appends a resolver output to `store_dir`, one segment at a time.
pub fn join_resolved(store_dir: &Path, relative: &str) -> PathBuf {
    let mut path = store_dir.to_path_buf();
    for segment in relative.split('/') {
        path.push(segment);
    }
    path
}

/// Absolute store paths for one configured repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    object_store: PathBuf,
    datastream_store: PathBuf,
    resolver: PathResolver,
}

impl StoragePaths {
    pub fn new(config: &CoreConfig) -> Self {
        Self {
            object_store: config.object_store_dir(),
            datastream_store: config.datastream_store_dir(),
            resolver: PathResolver::new(config.shard_layout().clone()),
        }
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Repository-relative path of `identifier`.
    pub fn relative(&self, identifier: &str) -> String {
        self.resolver.resolve(identifier)
    }

    pub fn explain(&self, identifier: &str) -> Resolution {
        self.resolver.explain(identifier)
    }

    /// Absolute path of the FOXML record for `pid`.
    pub fn object_path(&self, pid: &str) -> PathBuf {
        join_resolved(&self.object_store, &self.relative(pid))
    }

    /// Absolute path of the content file named by a datastream `filename`.
    pub fn datastream_path(&self, filename: &str) -> PathBuf {
        join_resolved(&self.datastream_store, &self.relative(filename))
    }

    /// Relative and absolute datastream store paths of `filename`, resolving it once.
    pub fn datastream_paths(&self, filename: &str) -> (String, PathBuf) {
        let relative = self.relative(filename);
        let path = join_resolved(&self.datastream_store, &relative);
        (relative, path)
    }
}
