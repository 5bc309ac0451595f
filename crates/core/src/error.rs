#[derive(Debug, thiserror::Error)]
pub enum TaleError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("tale not found")]
    NotFound,
    #[error("forbidden")]
    Forbidden,
    #[error("story generation failed: {0}")]
    Generation(String),
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to create tale directory: {0}")]
    TaleDirCreation(std::io::Error),
    #[error("failed to write tale file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read tale file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to remove tale directory: {0}")]
    DirRemove(std::io::Error),
    #[error("failed to serialize tale: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize tale: {0}")]
    Deserialization(serde_json::Error),
}

impl From<fable_types::TextError> for TaleError {
    fn from(err: fable_types::TextError) -> Self {
        TaleError::InvalidInput(err.to_string())
    }
}

pub type TaleResult<T> = std::result::Result<T, TaleError>;
