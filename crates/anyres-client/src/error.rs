//! Backend error taxonomy.
//!
//! The only distinction the lifecycle engine relies on is "not found" versus
//! everything else; the remaining variants carry enough context to be shown
//! to the user verbatim.

/// Errors surfaced by a [`crate::ResourceClient`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    /// The object does not exist on the backend.
    #[error("Resource not found: {resource_id}")]
    NotFound {
        /// Identifier of the missing object.
        resource_id: String,
    },

    /// The backend answered with a non-success status.
    #[error("Unexpected status {status} with error: {code}: {message}")]
    Response {
        /// HTTP-like status code.
        status: u16,
        /// Backend error code.
        code: String,
        /// Backend error message.
        message: String,
    },

    /// The request never got an answer.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// Structural definitions could not be loaded into a registry.
    #[error("Invalid resource definitions: {message}")]
    Definitions {
        /// Description of the loading failure.
        message: String,
    },

    /// An internal client error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl ClientError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(resource_id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_id: resource_id.into(),
        }
    }

    /// Creates a new `Response` error.
    #[must_use]
    pub fn response(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Response {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Transport` error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a new `Definitions` error.
    #[must_use]
    pub fn definitions(message: impl Into<String>) -> Self {
        Self::Definitions {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a `NotFound` error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Status code of the failed request, when the backend answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::Response { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Response { .. } => ErrorCategory::Response,
            Self::Transport { .. } => ErrorCategory::Transport,
            Self::Definitions { .. } | Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    Response,
    Transport,
    Internal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::NotFound => write!(f, "not_found"),
            ErrorCategory::Response => write!(f, "response"),
            ErrorCategory::Transport => write!(f, "transport"),
            ErrorCategory::Internal => write!(f, "internal"),
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(format!("JSON error: {err}"))
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found() {
        let err = ClientError::not_found("/subscriptions/000/resourceGroups/rg");
        assert!(err.is_not_found());
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(
            err.to_string(),
            "Resource not found: /subscriptions/000/resourceGroups/rg"
        );
    }

    #[test]
    fn test_response_error() {
        let err = ClientError::response(409, "Conflict", "operation in progress");
        assert!(!err.is_not_found());
        assert_eq!(err.status(), Some(409));
        assert_eq!(
            err.to_string(),
            "Unexpected status 409 with error: Conflict: operation in progress"
        );
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ClientError::transport("reset").category().to_string(), "transport");
        assert_eq!(ClientError::definitions("bad").category(), ErrorCategory::Internal);
        assert_eq!(ClientError::transport("reset").status(), None);
    }
}
