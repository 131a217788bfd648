use thiserror::Error;

/// Errors raised by the booking client.
///
/// A payment the service reports as failed, or a poll loop that runs out of
/// attempts, is not an error: both are `BookingOutcome`s.
#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Not authenticated: please login first")]
    Unauthenticated,
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Submission failed: {0}")]
    SubmissionError(String),
    #[error("Payment status check failed: {0}")]
    PollError(String),
    #[error("A payment attempt is already in progress")]
    AttemptInProgress,
    #[error("Service error ({status}): {message}")]
    ServiceError { status: u16, message: String },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    StorageError(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

impl BookingError {
    /// Whether the user can reasonably try the same action again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BookingError::ValidationError(_)
                | BookingError::SubmissionError(_)
                | BookingError::PollError(_)
                | BookingError::HttpError(_)
                | BookingError::ServiceError { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BookingError>;
