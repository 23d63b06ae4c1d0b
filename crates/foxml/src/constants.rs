//! FOXML element and attribute names.

/// FOXML 1.1 namespace URI.
pub const FOXML_NAMESPACE: &str = "info:fedora/fedora-system:def/foxml#";

pub(crate) const DIGITAL_OBJECT: &str = "digitalObject";
pub(crate) const DATASTREAM: &str = "datastream";
pub(crate) const DATASTREAM_VERSION: &str = "datastreamVersion";
pub(crate) const CONTENT_LOCATION: &str = "contentLocation";

pub(crate) const ATTR_ID: &str = "ID";
pub(crate) const ATTR_CONTROL_GROUP: &str = "CONTROL_GROUP";
pub(crate) const ATTR_LABEL: &str = "LABEL";
pub(crate) const ATTR_MIMETYPE: &str = "MIMETYPE";
pub(crate) const ATTR_SIZE: &str = "SIZE";
pub(crate) const ATTR_TYPE: &str = "TYPE";
pub(crate) const ATTR_REF: &str = "REF";

/// `contentLocation` type of content held in the datastream store.
pub(crate) const INTERNAL_ID: &str = "INTERNAL_ID";
