//! FOXML 1.1 reader implementation
//!
//! The reader is stateless: every call opens the file, parses it in full and returns a fresh
//! [`DatastreamSet`]. Nothing is cached between calls.
//!
//! # Selection rules
//!
//! - Each `datastream` element must carry `ID` and a known `CONTROL_GROUP`; otherwise the
//!   record is unreadable.
//! - The current version is the last `datastreamVersion` child in document order (Fedora appends
//!   new versions).
//! - Only a current version with `contentLocation TYPE="INTERNAL_ID"` has a file in the
//!   datastream store. Inline and external datastreams are skipped.
//!
//! Elements are matched by local name so records written with an unusual namespace prefix (or
//! none) still parse.

use crate::constants::{
    ATTR_CONTROL_GROUP, ATTR_ID, ATTR_LABEL, ATTR_MIMETYPE, ATTR_REF, ATTR_SIZE, ATTR_TYPE,
    CONTENT_LOCATION, DATASTREAM, DATASTREAM_VERSION, DIGITAL_OBJECT, INTERNAL_ID,
};
use crate::{MetadataError, MetadataReader, UnreadableCause};
use fedora_types::{ControlGroup, DatastreamId, DatastreamRecord, DatastreamSet};
use roxmltree::{Document, Node};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Reads FOXML metadata records from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FoxmlReader;

impl FoxmlReader {
    pub fn new() -> Self {
        Self
    }

    /// Parses FOXML held in memory.
    ///
    /// # Errors
    ///
    /// Returns [`UnreadableCause::Xml`] for malformed XML and [`UnreadableCause::Structure`]
    /// when the document is not a usable FOXML record.
    pub fn parse_str(&self, xml: &str) -> Result<DatastreamSet, UnreadableCause> {
        let document = Document::parse(xml)?;
        let root = document.root_element();

        if root.tag_name().name() != DIGITAL_OBJECT {
            return Err(UnreadableCause::Structure(format!(
                "root element must be {}, got {}",
                DIGITAL_OBJECT,
                root.tag_name().name()
            )));
        }

        let mut datastreams = DatastreamSet::new();
        for node in child_elements(root, DATASTREAM) {
            if let Some(record) = read_datastream(node)? {
                datastreams.insert(record);
            }
        }

        tracing::debug!(count = datastreams.len(), "parsed FOXML datastreams");
        Ok(datastreams)
    }
}

impl MetadataReader for FoxmlReader {
    fn read_datastreams(&self, path: &Path) -> Result<DatastreamSet, MetadataError> {
        let xml = match fs::read_to_string(path) {
            Ok(xml) => xml,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(MetadataError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => {
                return Err(MetadataError::Unreadable {
                    path: path.to_path_buf(),
                    cause: UnreadableCause::Io(e),
                });
            }
        };

        self.parse_str(&xml)
            .map_err(|cause| MetadataError::Unreadable {
                path: path.to_path_buf(),
                cause,
            })
    }
}

fn child_elements<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |child| child.is_element() && child.tag_name().name() == name)
}

fn required_attribute<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str, UnreadableCause> {
    node.attribute(name).ok_or_else(|| {
        UnreadableCause::Structure(format!(
            "{} element is missing the {} attribute",
            node.tag_name().name(),
            name
        ))
    })
}

fn read_datastream(node: Node<'_, '_>) -> Result<Option<DatastreamRecord>, UnreadableCause> {
    let id = required_attribute(node, ATTR_ID)?;
    let datastream_id = DatastreamId::new(id)
        .map_err(|e| UnreadableCause::Structure(format!("datastream ID: {e}")))?;
    let control_group = ControlGroup::from_code(required_attribute(node, ATTR_CONTROL_GROUP)?)
        .map_err(|e| UnreadableCause::Structure(format!("datastream {datastream_id}: {e}")))?;

    if control_group != ControlGroup::Managed {
        tracing::debug!(
            %datastream_id,
            control_group = control_group.code(),
            "skipping unmanaged datastream"
        );
        return Ok(None);
    }

    let Some(version) = child_elements(node, DATASTREAM_VERSION).last() else {
        tracing::warn!(%datastream_id, "managed datastream has no versions");
        return Ok(None);
    };

    let location = child_elements(version, CONTENT_LOCATION)
        .find(|location| location.attribute(ATTR_TYPE) == Some(INTERNAL_ID));
    let Some(filename) = location.and_then(|location| location.attribute(ATTR_REF)) else {
        tracing::warn!(%datastream_id, "managed datastream has no internal content location");
        return Ok(None);
    };

    Ok(Some(DatastreamRecord {
        datastream_id,
        filename: filename.to_owned(),
        control_group,
        version_id: version.attribute(ATTR_ID).map(str::to_owned),
        label: version.attribute(ATTR_LABEL).map(str::to_owned),
        mime_type: version.attribute(ATTR_MIMETYPE).map(str::to_owned),
        size: version
            .attribute(ATTR_SIZE)
            .and_then(|size| size.trim().parse().ok()),
    }))
}
