//! Error types for ragbench evaluation runs

use thiserror::Error;

/// Main error type for ragbench operations
#[derive(Error, Debug)]
pub enum RagbenchError {
    /// Batch input rejected before any retrieval call was made
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A single retrieval call exceeded its deadline
    #[error("Retrieval timed out after {timeout_ms}ms for query '{query}'")]
    RetrievalTimeout { query: String, timeout_ms: u64 },

    /// The retriever capability returned an error
    #[error("Retriever failed for query '{query}': {message}")]
    RetrieverFailure { query: String, message: String },

    /// Retriever output broke its ordering/length/uniqueness contract
    #[error("Malformed result for query '{query}': {reason}")]
    MalformedResult { query: String, reason: String },

    /// Too many retriever failures for the score to mean anything
    #[error("Batch aborted: {failed} of {total} retrieval calls failed (limit {max_failure_rate:.2})")]
    BatchAborted {
        failed: usize,
        total: usize,
        max_failure_rate: f64,
    },

    /// Batch interrupted before every case was dispatched
    #[error("Batch cancelled: {completed} of {total} cases completed")]
    Cancelled { completed: usize, total: usize },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for RagbenchError {
    fn from(err: serde_json::Error) -> Self {
        RagbenchError::Serialization(err.to_string())
    }
}

impl RagbenchError {
    /// Whether the error aborts a whole batch rather than a single case
    pub fn is_batch_fatal(&self) -> bool {
        !matches!(
            self,
            RagbenchError::RetrievalTimeout { .. } | RagbenchError::RetrieverFailure { .. }
        )
    }
}

/// Result type alias for ragbench operations
pub type RagbenchResult<T> = Result<T, RagbenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RagbenchError::InvalidInput("no cases supplied".to_string());
        assert_eq!(err.to_string(), "Invalid input: no cases supplied");

        let err = RagbenchError::MalformedResult {
            query: "covid boosters".to_string(),
            reason: "duplicate id 'doc_4'".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed result for query 'covid boosters': duplicate id 'doc_4'"
        );

        let err = RagbenchError::BatchAborted {
            failed: 3,
            total: 4,
            max_failure_rate: 0.5,
        };
        assert_eq!(
            err.to_string(),
            "Batch aborted: 3 of 4 retrieval calls failed (limit 0.50)"
        );
    }

    #[test]
    fn test_batch_fatal_classification() {
        let timeout = RagbenchError::RetrievalTimeout {
            query: "q".to_string(),
            timeout_ms: 10,
        };
        assert!(!timeout.is_batch_fatal());
        assert!(RagbenchError::InvalidInput("k = 0".to_string()).is_batch_fatal());
    }
}
