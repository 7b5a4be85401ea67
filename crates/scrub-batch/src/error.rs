//! Error types for the batch pipeline

use scrub_extract::ExtractError;
use thiserror::Error;

/// Result type for per-file processing
pub type Result<T> = std::result::Result<T, ProcessingError>;

/// Errors raised by an [`ObjectStore`](crate::storage::ObjectStore)
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Object not found: {store_id}/{key}")]
    NotFound { store_id: String, key: String },

    /// Throttling, timeouts, connection resets; worth retrying
    #[error("Transient storage failure: {0}")]
    Transient(String),

    /// Access denied, invalid keys and other failures retrying will not fix
    #[error("Storage failure: {0}")]
    Permanent(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    pub fn not_found(store_id: &str, key: &str) -> Self {
        Self::NotFound {
            store_id: store_id.to_string(),
            key: key.to_string(),
        }
    }

    /// Whether the failure is expected to clear up on its own
    pub fn is_transient(&self) -> bool {
        match self {
            StorageError::Transient(_) => true,
            StorageError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
            ),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

/// Why a single file could not be processed
#[derive(Error, Debug)]
pub enum ProcessingError {
    /// The upload itself is unacceptable (type, size); routed to quarantine
    #[error("{0}")]
    Validation(String),

    #[error("Transient storage failure: {0}")]
    TransientStorage(StorageError),

    #[error("Permanent storage failure: {0}")]
    PermanentStorage(StorageError),

    /// Text could not be extracted; routed to quarantine
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unexpected failure: {0}")]
    Unknown(String),
}

impl ProcessingError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::Unknown(msg.into())
    }

    /// Whether the file belongs in quarantine rather than an error result
    pub fn should_quarantine(&self) -> bool {
        matches!(
            self,
            ProcessingError::Validation(_) | ProcessingError::Extraction(_)
        )
    }
}

impl From<StorageError> for ProcessingError {
    fn from(err: StorageError) -> Self {
        if err.is_transient() {
            ProcessingError::TransientStorage(err)
        } else {
            ProcessingError::PermanentStorage(err)
        }
    }
}

/// Errors loading or validating [`BatchSettings`](crate::settings::BatchSettings)
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_classification() {
        assert!(StorageError::Transient("throttled".into()).is_transient());
        assert!(!StorageError::Permanent("denied".into()).is_transient());
        assert!(!StorageError::not_found("in", "a.txt").is_transient());
        assert!(StorageError::Io(std::io::ErrorKind::TimedOut.into()).is_transient());
        assert!(!StorageError::Io(std::io::ErrorKind::PermissionDenied.into()).is_transient());
    }

    #[test]
    fn test_processing_error_from_storage() {
        let err: ProcessingError = StorageError::Transient("slow down".into()).into();
        assert!(matches!(err, ProcessingError::TransientStorage(_)));

        let err: ProcessingError = StorageError::not_found("in", "a.txt").into();
        assert!(matches!(err, ProcessingError::PermanentStorage(_)));
        assert!(!err.should_quarantine());
    }

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = ProcessingError::validation("File is empty");
        assert_eq!(err.to_string(), "File is empty");
        assert!(err.should_quarantine());
    }
}
