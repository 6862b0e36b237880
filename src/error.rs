//! Error taxonomy crossing the core boundary.
//!
//! Every failure mode the engine, executor, or pool can produce is collapsed
//! into a single [`CoreError`] so that transports (HTTP handlers, message
//! consumers, tests) can match on a stable `code()` instead of parsing error
//! strings.

use thiserror::Error;

/// Stable, transport-independent error code. Matches the taxonomy in the
/// boundary contract one-to-one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    JobNotFound,
    NoStock,
    UnknownAlgorithm,
    AlgorithmMismatch,
    ValidationError,
    QueueFull,
    WorkerCrash,
    Timeout,
    Cancelled,
    ShuttingDown,
    InternalError,
}

impl ErrorCode {
    /// The wire-level string used in `error.code` of the optimization response.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::JobNotFound => "JOB_NOT_FOUND",
            ErrorCode::NoStock => "NO_STOCK",
            ErrorCode::UnknownAlgorithm => "UNKNOWN_ALGORITHM",
            ErrorCode::AlgorithmMismatch => "ALGORITHM_MISMATCH",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::QueueFull => "QUEUE_FULL",
            ErrorCode::WorkerCrash => "WORKER_CRASH",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::Cancelled => "CANCELLED",
            ErrorCode::ShuttingDown => "SHUTTING_DOWN",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

/// Errors produced anywhere in the cutting-stock core.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("job {0} not found")]
    JobNotFound(String),

    #[error("no candidate stock available for job {0}")]
    NoStock(String),

    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("algorithm {algorithm} cannot run on a {job_dimensionality} job")]
    AlgorithmMismatch {
        algorithm: String,
        job_dimensionality: String,
    },

    #[error("invalid parameter {field}: {message}")]
    ValidationError { field: String, message: String },

    #[error("worker pool queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    #[error("worker crashed while executing task {task_id}")]
    WorkerCrash { task_id: String },

    #[error("task {task_id} timed out after {elapsed_ms}ms")]
    Timeout { task_id: String, elapsed_ms: u64 },

    #[error("task {task_id} was cancelled")]
    Cancelled { task_id: String },

    #[error("worker pool is shutting down")]
    ShuttingDown,

    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::JobNotFound(_) => ErrorCode::JobNotFound,
            CoreError::NoStock(_) => ErrorCode::NoStock,
            CoreError::UnknownAlgorithm(_) => ErrorCode::UnknownAlgorithm,
            CoreError::AlgorithmMismatch { .. } => ErrorCode::AlgorithmMismatch,
            CoreError::ValidationError { .. } => ErrorCode::ValidationError,
            CoreError::QueueFull { .. } => ErrorCode::QueueFull,
            CoreError::WorkerCrash { .. } => ErrorCode::WorkerCrash,
            CoreError::Timeout { .. } => ErrorCode::Timeout,
            CoreError::Cancelled { .. } => ErrorCode::Cancelled,
            CoreError::ShuttingDown => ErrorCode::ShuttingDown,
            CoreError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Whether a caller may retry this error as-is (no input change needed).
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::QueueFull { .. })
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_matches_wire_string() {
        let err = CoreError::QueueFull { capacity: 256 };
        assert_eq!(err.code().as_str(), "QUEUE_FULL");
        assert!(err.is_retryable());
    }

    #[test]
    fn job_not_found_is_not_retryable() {
        let err = CoreError::JobNotFound("abc".into());
        assert!(!err.is_retryable());
    }
}
