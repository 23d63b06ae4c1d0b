//! On-disk path definitions for repository artefacts.
//!
//! This module composes absolute filesystem paths for metadata records and datastream content.
//! It contains **no I/O logic** and **no hashing** - hashing belongs to `fedora-pid`.

pub mod store;

pub use store::{join_resolved, DatastreamStoreDir, ObjectStoreDir, StoragePaths};
