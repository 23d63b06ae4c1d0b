use fedora_foxml::MetadataError;
use fedora_pid::PidError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Layout(#[from] PidError),
    /// Reader failures are surfaced exactly as the reader reported them.
    #[error(transparent)]
    Metadata(#[from] MetadataError),
}

impl CoreError {
    /// The underlying metadata failure, if this error came from the reader.
    pub fn as_metadata(&self) -> Option<&MetadataError> {
        match self {
            Self::Metadata(e) => Some(e),
            _ => None,
        }
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
