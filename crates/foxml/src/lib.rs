//! Fedora FOXML Metadata Reader
//!
//! This crate reads an object's FOXML metadata record and reports the datastreams whose content
//! lives in the repository's datastream store.
//!
//! ## Object Store Layout
//!
//! Metadata records and content files are stored under hash-derived names (see `fedora-pid`):
//!
//! ```text
//! <data_dir>/
//! ├── objectStore/
//! │   └── 79/da/7bd9…/info%3Afedora%2Ftest%3A1          # FOXML record
//! └── datastreamStore/
//!     └── e9/1a/c17f…/info%3Afedora%2Ftest%3A1%2FOBJ%2FOBJ.0
//! ```
//!
//! A managed datastream's current version names its content file through
//! `<contentLocation TYPE="INTERNAL_ID" REF="test:1+OBJ+OBJ.0"/>`. That `REF` is reported as the
//! record's `filename` and is resolved again by the caller.
//!
//! ## Failure model
//!
//! A record that does not exist is [`MetadataError::NotFound`]. Every other failure (permissions,
//! invalid UTF-8, invalid XML, missing required attributes) is [`MetadataError::Unreadable`].
//! Neither is transient, so callers should not retry.
//!
//! ## Example Usage
//!
//! ```no_run
//! use fedora_foxml::{FoxmlReader, MetadataReader};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let reader = FoxmlReader::new();
//! let record = Path::new(
//!     "/usr/local/fedora/data/objectStore/79/da/7bd9527b7ce9730d6a112a86755e/info%3Afedora%2Ftest%3A1",
//! );
//! let datastreams = reader.read_datastreams(record)?;
//! if let Some(obj) = datastreams.get("OBJ") {
//!     println!("OBJ content id: {}", obj.filename);
//! }
//! # Ok(())
//! # }
//! ```

mod constants;
mod foxml;

pub use constants::FOXML_NAMESPACE;
pub use fedora_types::{ControlGroup, DatastreamId, DatastreamRecord, DatastreamSet};
pub use foxml::FoxmlReader;

use std::path::{Path, PathBuf};

/// Reads the datastream set of one object from its metadata record.
pub trait MetadataReader {
    /// # Errors
    ///
    /// [`MetadataError::NotFound`] when `path` does not exist, [`MetadataError::Unreadable`]
    /// for anything else that prevents a complete read.
    fn read_datastreams(&self, path: &Path) -> Result<DatastreamSet, MetadataError>;
}

impl<R: MetadataReader + ?Sized> MetadataReader for &R {
    fn read_datastreams(&self, path: &Path) -> Result<DatastreamSet, MetadataError> {
        (**self).read_datastreams(path)
    }
}

/// Errors that can occur while reading a metadata record
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// The metadata record does not exist
    #[error("Metadata record not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The metadata record exists but could not be read or parsed
    #[error("Metadata record unreadable: {}: {cause}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        cause: UnreadableCause,
    },
}

impl MetadataError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Path of the record that failed.
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound { path } | Self::Unreadable { path, .. } => path,
        }
    }
}

/// Why a metadata record could not be read
#[derive(Debug, thiserror::Error)]
pub enum UnreadableCause {
    /// I/O error other than "not found"
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not well-formed XML
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Well-formed XML that is not a usable FOXML record
    #[error("invalid FOXML: {0}")]
    Structure(String),
}
