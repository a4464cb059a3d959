use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Cannot resolve {capability} for '{key}'")]
    ResolutionError { capability: String, key: String },

    #[error("{capability} already registered for '{key}'")]
    DuplicateRegistration { capability: String, key: String },

    #[error("Connection to {endpoint} failed: {message}")]
    ConnectionError { endpoint: String, message: String },

    #[error("Query timed out after {millis}ms")]
    QueryTimeout { millis: u64 },

    #[error("Query failed: {message}")]
    QueryError { message: String },
}

impl EtlError {
    /// 連線失敗與逾時可重試，其餘錯誤直接回報
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EtlError::ConnectionError { .. } | EtlError::QueryTimeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        let connection = EtlError::ConnectionError {
            endpoint: "db1:28015".to_string(),
            message: "refused".to_string(),
        };
        assert!(connection.is_retryable());
        assert!(EtlError::QueryTimeout { millis: 5000 }.is_retryable());
        assert!(!EtlError::QueryError {
            message: "bad term".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_sub_second_timeout_message() {
        let err = EtlError::QueryTimeout { millis: 250 };
        assert_eq!(err.to_string(), "Query timed out after 250ms");
    }

    #[test]
    fn test_resolution_error_message() {
        let err = EtlError::ResolutionError {
            capability: "writer".to_string(),
            key: "orders".to_string(),
        };
        assert_eq!(err.to_string(), "Cannot resolve writer for 'orders'");
    }
}
