use thiserror::Error;

/// Core error types for resource reconciliation primitives
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid resource type: {0}")]
    InvalidResourceType(String),

    #[error("Invalid resource ID {id:?}: {message}")]
    InvalidResourceId { id: String, message: String },

    #[error("Invalid path {path:?}: {message}")]
    InvalidPath { path: String, message: String },

    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("Invalid tags: {0}")]
    InvalidTags(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a new InvalidResourceType error
    pub fn invalid_resource_type(message: impl Into<String>) -> Self {
        Self::InvalidResourceType(message.into())
    }

    /// Create a new InvalidResourceId error
    pub fn invalid_resource_id(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResourceId {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Create a new InvalidPath error
    pub fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new InvalidIdentity error
    pub fn invalid_identity(message: impl Into<String>) -> Self {
        Self::InvalidIdentity(message.into())
    }

    /// Create a new InvalidTags error
    pub fn invalid_tags(message: impl Into<String>) -> Self {
        Self::InvalidTags(message.into())
    }

    /// Returns `true` if this error came from resolving a JSON path.
    pub fn is_path_error(&self) -> bool {
        matches!(self, Self::InvalidPath { .. })
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidResourceType(_)
            | Self::InvalidResourceId { .. }
            | Self::InvalidIdentity(_)
            | Self::InvalidTags(_) => ErrorCategory::Validation,
            Self::InvalidPath { .. } => ErrorCategory::Path,
            Self::JsonError(_) => ErrorCategory::Serialization,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Path,
    Serialization,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Validation => write!(f, "validation"),
            ErrorCategory::Path => write!(f, "path"),
            ErrorCategory::Serialization => write!(f, "serialization"),
        }
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::invalid_path("properties.subnets.3", "index 3 out of range");
        assert_eq!(
            err.to_string(),
            "Invalid path \"properties.subnets.3\": index 3 out of range"
        );

        let err = CoreError::invalid_resource_id("/foo", "missing subscription");
        assert_eq!(err.to_string(), "Invalid resource ID \"/foo\": missing subscription");
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            CoreError::invalid_resource_type("x").category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            CoreError::invalid_path("a", "b").category(),
            ErrorCategory::Path
        );
        assert!(CoreError::invalid_path("a", "b").is_path_error());
        assert_eq!(ErrorCategory::Serialization.to_string(), "serialization");
    }
}
