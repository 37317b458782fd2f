use crate::store::SolutionId;

#[derive(Debug, thiserror::Error)]
pub enum KbError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("index {index} is out of bounds for {len} custom solutions")]
    OutOfBounds { index: usize, len: usize },
    #[error("no custom solution with id {0}")]
    NotFound(SolutionId),
    #[error("invalid solution id: {0}")]
    InvalidId(String),

    #[error("failed to read local slot: {0}")]
    SlotRead(std::io::Error),
    #[error("failed to write local slot: {0}")]
    SlotWrite(kb_files::FilesError),
    #[error("local slot store lock poisoned")]
    SlotPoisoned,
    #[error("failed to serialize solutions: {0}")]
    Serialization(serde_json::Error),

    #[error("remote mirror unavailable: {0}")]
    RemoteUnavailable(String),
    #[error("remote returned data that could not be read: {0}")]
    InvalidRemoteData(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to load base collection from {source_name}: {reason}")]
    BaseCollection { source_name: String, reason: String },
}

pub type KbResult<T> = std::result::Result<T, KbError>;
