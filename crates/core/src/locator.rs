//! Object and datastream lookup.
//!
//! [`LocatorService`] ties the path resolver to a [`MetadataReader`]:
//!
//! 1. the PID is resolved to its FOXML record under the object store
//! 2. the reader lists the object's datastreams
//! 3. each datastream `filename` is resolved again under the datastream store
//!
//! The service keeps no state between calls, never retries, and never logs. Reader failures are
//! returned unchanged inside [`CoreError::Metadata`](crate::CoreError::Metadata). A datastream
//! that the object does not have is reported as [`DatastreamLookup::NoSuchDatastream`], which is
//! a normal answer rather than an error.

use crate::config::CoreConfig;
use crate::paths::StoragePaths;
use crate::CoreResult;
use fedora_foxml::MetadataReader;
use fedora_pid::Resolution;
use fedora_types::{DatastreamRecord, DatastreamSet};
use serde::Serialize;
use std::path::PathBuf;

/// Where one datastream's current content lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatastreamLocation {
    pub record: DatastreamRecord,
    /// Resolver output for `record.filename`.
    pub relative_path: String,
    /// Absolute path under the datastream store.
    pub path: PathBuf,
}

/// Result of asking for a single datastream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatastreamLookup {
    Found(DatastreamLocation),
    NoSuchDatastream,
}

impl DatastreamLookup {
    pub fn found(self) -> Option<DatastreamLocation> {
        match self {
            Self::Found(location) => Some(location),
            Self::NoSuchDatastream => None,
        }
    }
}

/// Metadata record path plus every listed datastream of one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectLocation {
    pub pid: String,
    pub metadata_path: PathBuf,
    pub datastreams: Vec<DatastreamLocation>,
}

impl ObjectLocation {
    pub fn datastream(&self, datastream_id: &str) -> DatastreamLookup {
        self.datastreams
            .iter()
            .find(|location| location.record.datastream_id.as_str() == datastream_id)
            .cloned()
            .map_or(DatastreamLookup::NoSuchDatastream, DatastreamLookup::Found)
    }
}

/// Locates metadata records and datastream content for PIDs.
#[derive(Debug, Clone)]
pub struct LocatorService<R> {
    paths: StoragePaths,
    reader: R,
}

impl<R: MetadataReader> LocatorService<R> {
    pub fn new(config: &CoreConfig, reader: R) -> Self {
        Self {
            paths: StoragePaths::new(config),
            reader,
        }
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    /// Repository-relative path of `identifier`.
    pub fn resolve(&self, identifier: &str) -> String {
        self.paths.relative(identifier)
    }

    pub fn explain(&self, identifier: &str) -> Resolution {
        self.paths.explain(identifier)
    }

    /// Absolute path of the FOXML record for `pid`.
    pub fn object_path(&self, pid: &str) -> PathBuf {
        self.paths.object_path(pid)
    }

    /// Absolute path of the content named by a datastream `filename`.
    pub fn datastream_path(&self, filename: &str) -> PathBuf {
        self.paths.datastream_path(filename)
    }

    /// Reads the datastream set of `pid` from its metadata record.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Metadata`](crate::CoreError::Metadata) carrying the reader's error
    /// unchanged.
    pub fn list_datastreams(&self, pid: &str) -> CoreResult<DatastreamSet> {
        let metadata_path = self.object_path(pid);
        Ok(self.reader.read_datastreams(&metadata_path)?)
    }

    /// Locates one datastream of `pid`.
    ///
    /// # Errors
    ///
    /// Only metadata read failures are errors; a missing datastream is
    /// [`DatastreamLookup::NoSuchDatastream`].
    pub fn locate_datastream(
        &self,
        pid: &str,
        datastream_id: &str,
    ) -> CoreResult<DatastreamLookup> {
        let datastreams = self.list_datastreams(pid)?;

        Ok(match datastreams.get(datastream_id) {
            Some(record) => DatastreamLookup::Found(self.locate_record(record.clone())),
            None => DatastreamLookup::NoSuchDatastream,
        })
    }

    /// Locates the metadata record and every listed datastream of `pid`.
    pub fn locate_object(&self, pid: &str) -> CoreResult<ObjectLocation> {
        let metadata_path = self.object_path(pid);
        let datastreams = self.reader.read_datastreams(&metadata_path)?;

        Ok(ObjectLocation {
            pid: pid.to_owned(),
            metadata_path,
            datastreams: datastreams
                .into_iter()
                .map(|record| self.locate_record(record))
                .collect(),
        })
    }

    fn locate_record(&self, record: DatastreamRecord) -> DatastreamLocation {
        let (relative_path, path) = self.paths.datastream_paths(&record.filename);
        DatastreamLocation {
            record,
            relative_path,
            path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CoreError;
    use fedora_foxml::{FoxmlReader, MetadataError};
    use fedora_pid::ShardLayout;
    use fedora_types::{ControlGroup, DatastreamId};
    use std::cell::RefCell;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// Returns a fixed datastream set and remembers which paths were requested.
    struct FixedReader {
        datastreams: DatastreamSet,
        requested: RefCell<Vec<PathBuf>>,
    }

    impl FixedReader {
        fn new(entries: &[(&str, &str)]) -> Self {
            let datastreams = entries
                .iter()
                .map(|(id, filename)| DatastreamRecord {
                    datastream_id: DatastreamId::new(id).unwrap(),
                    filename: (*filename).to_owned(),
                    control_group: ControlGroup::Managed,
                    version_id: None,
                    label: None,
                    mime_type: None,
                    size: None,
                })
                .collect();
            Self {
                datastreams,
                requested: RefCell::new(Vec::new()),
            }
        }
    }

    impl MetadataReader for FixedReader {
        fn read_datastreams(&self, path: &Path) -> Result<DatastreamSet, MetadataError> {
            self.requested.borrow_mut().push(path.to_path_buf());
            Ok(self.datastreams.clone())
        }
    }

    struct MissingReader;

    impl MetadataReader for MissingReader {
        fn read_datastreams(&self, path: &Path) -> Result<DatastreamSet, MetadataError> {
            Err(MetadataError::NotFound {
                path: path.to_path_buf(),
            })
        }
    }

    fn config(data_dir: &Path) -> CoreConfig {
        CoreConfig::new(data_dir.to_path_buf(), ShardLayout::Split).unwrap()
    }

    fn data_dir() -> PathBuf {
        PathBuf::from("/usr/local/fedora/data")
    }

    #[test]
    fn locate_datastream_resolves_each_filename() {
        let reader = FixedReader::new(&[("OBJ", "test:1+OBJ"), ("PDF", "test:1+PDF+1")]);
        let service = LocatorService::new(&config(&data_dir()), &reader);

        let obj = service.locate_datastream("test:1", "OBJ").unwrap().found().unwrap();
        let pdf = service.locate_datastream("test:1", "PDF").unwrap().found().unwrap();

        assert_eq!(
            obj.relative_path,
            "51/b3/bc87c922104a896f8cba5cd308b9/info%3Afedora%2Ftest%3A1%2FOBJ"
        );
        assert_eq!(
            pdf.relative_path,
            "af/4d/1f9e7e7395653bc9d94eb8f10819/info%3Afedora%2Ftest%3A1%2FPDF%2F1"
        );
        assert_ne!(obj.path, pdf.path);
        assert!(obj.path.starts_with(data_dir().join("datastreamStore")));
    }

    #[test]
    fn missing_datastream_is_not_an_error() {
        let reader = FixedReader::new(&[("OBJ", "test:1+OBJ"), ("PDF", "test:1+PDF+1")]);
        let service = LocatorService::new(&config(&data_dir()), &reader);

        let lookup = service.locate_datastream("test:1", "TEXT").unwrap();

        assert_eq!(lookup, DatastreamLookup::NoSuchDatastream);
    }

    #[test]
    fn reader_is_given_the_object_store_path() {
        let reader = FixedReader::new(&[]);
        let service = LocatorService::new(&config(&data_dir()), &reader);

        service.list_datastreams("test:1").unwrap();

        assert_eq!(
            reader.requested.borrow().as_slice(),
            &[data_dir()
                .join("objectStore")
                .join("79")
                .join("da")
                .join("7bd9527b7ce9730d6a112a86755e")
                .join("info%3Afedora%2Ftest%3A1")]
        );
    }

    #[test]
    fn reader_errors_pass_through_unchanged() {
        let service = LocatorService::new(&config(&data_dir()), MissingReader);

        let err = service.locate_datastream("test:1", "OBJ").unwrap_err();

        match err {
            CoreError::Metadata(MetadataError::NotFound { path }) => {
                assert_eq!(path, service.object_path("test:1"));
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn metadata_error_message_is_verbatim() {
        let service = LocatorService::new(&config(&data_dir()), MissingReader);
        let expected = MetadataError::NotFound {
            path: service.object_path("test:1"),
        }
        .to_string();

        let err = service.locate_object("test:1").unwrap_err();

        assert_eq!(err.to_string(), expected);
        assert!(err.as_metadata().unwrap().is_not_found());
    }

    #[test]
    fn locate_object_lists_every_datastream() {
        let reader = FixedReader::new(&[("OBJ", "test:1+OBJ"), ("PDF", "test:1+PDF+1")]);
        let service = LocatorService::new(&config(&data_dir()), &reader);

        let object = service.locate_object("test:1").unwrap();

        assert_eq!(object.pid, "test:1");
        assert_eq!(object.metadata_path, service.object_path("test:1"));
        assert_eq!(object.datastreams.len(), 2);
        assert!(matches!(object.datastream("OBJ"), DatastreamLookup::Found(_)));
        assert_eq!(object.datastream("TEXT"), DatastreamLookup::NoSuchDatastream);
    }

    #[test]
    fn end_to_end_with_foxml_on_disk() {
        let dir = TempDir::new().unwrap();
        let service = LocatorService::new(&config(dir.path()), FoxmlReader::new());

        let record_path = service.object_path("demo:5");
        fs::create_dir_all(record_path.parent().unwrap()).unwrap();
        fs::write(
            &record_path,
            r#"<foxml:digitalObject VERSION="1.1" PID="demo:5"
                 xmlns:foxml="info:fedora/fedora-system:def/foxml#">
               <foxml:datastream ID="OBJ" CONTROL_GROUP="M">
                 <foxml:datastreamVersion ID="OBJ.0" MIMETYPE="image/jpeg">
                   <foxml:contentLocation TYPE="INTERNAL_ID" REF="demo:5+OBJ+OBJ.0"/>
                 </foxml:datastreamVersion>
               </foxml:datastream>
             </foxml:digitalObject>"#,
        )
        .unwrap();

        let obj = service
            .locate_datastream("demo:5", "OBJ")
            .unwrap()
            .found()
            .unwrap();

        assert_eq!(obj.record.mime_type.as_deref(), Some("image/jpeg"));
        assert_eq!(obj.path, service.datastream_path("demo:5+OBJ+OBJ.0"));
        assert!(obj.path.starts_with(dir.path().join("datastreamStore")));
        assert_eq!(
            service.locate_datastream("demo:5", "PDF").unwrap(),
            DatastreamLookup::NoSuchDatastream
        );
    }

    #[test]
    fn end_to_end_missing_record() {
        let dir = TempDir::new().unwrap();
        let service = LocatorService::new(&config(dir.path()), FoxmlReader::new());

        let err = service.list_datastreams("demo:404").unwrap_err();

        assert!(matches!(
            err,
            CoreError::Metadata(MetadataError::NotFound { .. })
        ));
    }
}
