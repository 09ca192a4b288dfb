//! Lifecycle error types.
//!
//! Each variant carries the short summary shown to the user next to the
//! detailed message, and, where one applies, the configuration attribute the
//! error originates from.

use std::fmt;
use std::time::Duration;

use anyres_client::ClientError;
use anyres_config::ConfigError;
use anyres_core::CoreError;

/// Backend operation a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CheckExisting,
    CreateOrUpdate,
    Read,
    Delete,
    Import,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::CheckExisting => write!(f, "checking for presence of existing"),
            Operation::CreateOrUpdate => write!(f, "creating/updating"),
            Operation::Read => write!(f, "reading"),
            Operation::Delete => write!(f, "deleting"),
            Operation::Import => write!(f, "importing"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{message}")]
    InvalidConfiguration {
        attribute: Option<String>,
        message: String,
    },

    #[error("The argument \"{attribute}\" is required, but no definition was found.")]
    MissingArgument { attribute: String },

    #[error("The argument \"{attribute}\" is invalid: value: {value}, err: {message}")]
    InvalidJson {
        attribute: String,
        value: String,
        message: String,
    },

    #[error("parsing Resource ID {input:?}: {source}")]
    InvalidResourceId {
        input: String,
        #[source]
        source: CoreError,
    },

    #[error("The argument \"{attribute}\" is invalid: value: {value:?}, err: {source}")]
    InvalidPath {
        attribute: String,
        value: Vec<String>,
        #[source]
        source: CoreError,
    },

    #[error(
        "A resource with the ID {id:?} already exists - to be managed via this provider this resource needs to be imported into the state. Please see the resource documentation for {type_name:?} for more information.",
        type_name = crate::resource::RESOURCE_TYPE_NAME
    )]
    AlreadyExists { id: String },

    #[error("{operation} {resource}: {source}")]
    Backend {
        operation: Operation,
        resource: String,
        #[source]
        source: ClientError,
    },

    #[error("{operation} did not complete within {timeout:?}")]
    Timeout {
        operation: Operation,
        timeout: Duration,
    },

    #[error("loading resource definitions: {0}")]
    Registry(#[source] ClientError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ProviderError {
    pub fn invalid_configuration(attribute: Option<&str>, message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            attribute: attribute.map(str::to_string),
            message: message.into(),
        }
    }

    pub fn missing_argument(attribute: impl Into<String>) -> Self {
        Self::MissingArgument {
            attribute: attribute.into(),
        }
    }

    pub fn invalid_json(
        attribute: impl Into<String>,
        value: impl Into<String>,
        message: impl fmt::Display,
    ) -> Self {
        Self::InvalidJson {
            attribute: attribute.into(),
            value: value.into(),
            message: message.to_string(),
        }
    }

    pub fn invalid_resource_id(input: impl Into<String>, source: CoreError) -> Self {
        Self::InvalidResourceId {
            input: input.into(),
            source,
        }
    }

    pub fn invalid_path(attribute: impl Into<String>, value: &[String], source: CoreError) -> Self {
        Self::InvalidPath {
            attribute: attribute.into(),
            value: value.to_vec(),
            source,
        }
    }

    pub fn backend(operation: Operation, resource: impl fmt::Display, source: ClientError) -> Self {
        Self::Backend {
            operation,
            resource: resource.to_string(),
            source,
        }
    }

    /// Returns `true` if the backend reported the object as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Backend { source, .. } if source.is_not_found())
    }

    /// Short, user-facing title of the error.
    pub fn summary(&self) -> &'static str {
        match self {
            Self::InvalidConfiguration { .. } | Self::InvalidPath { .. } => "Invalid configuration",
            Self::MissingArgument { .. } => "Missing required argument",
            Self::InvalidJson { .. } => "Invalid JSON string",
            Self::InvalidResourceId { .. } => "Invalid Resource ID",
            Self::AlreadyExists { .. } => "Resource already exists",
            Self::Backend { operation, .. } => match operation {
                Operation::CreateOrUpdate => "Failed to create/update resource",
                Operation::Delete => "Failed to delete resource",
                Operation::CheckExisting | Operation::Read | Operation::Import => {
                    "Failed to retrieve resource"
                }
            },
            Self::Timeout { .. } => "Operation timed out",
            Self::Registry(_) | Self::Config(_) => "Invalid provider configuration",
        }
    }

    /// Configuration attribute the error originates from, when one applies.
    pub fn attribute(&self) -> Option<&str> {
        match self {
            Self::InvalidConfiguration { attribute, .. } => attribute.as_deref(),
            Self::MissingArgument { attribute }
            | Self::InvalidJson { attribute, .. }
            | Self::InvalidPath { attribute, .. } => Some(attribute),
            _ => None,
        }
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidConfiguration { .. }
            | Self::MissingArgument { .. }
            | Self::InvalidJson { .. }
            | Self::InvalidResourceId { .. }
            | Self::Registry(_)
            | Self::Config(_) => ErrorCategory::Configuration,
            Self::InvalidPath { .. } => ErrorCategory::Path,
            Self::AlreadyExists { .. } => ErrorCategory::Conflict,
            Self::Backend { source, .. } if source.is_not_found() => ErrorCategory::NotFound,
            Self::Backend { .. } => ErrorCategory::Backend,
            Self::Timeout { .. } => ErrorCategory::Timeout,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    NotFound,
    Conflict,
    Backend,
    Path,
    Timeout,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::NotFound => write!(f, "not_found"),
            ErrorCategory::Conflict => write!(f, "conflict"),
            ErrorCategory::Backend => write!(f, "backend"),
            ErrorCategory::Path => write!(f, "path"),
            ErrorCategory::Timeout => write!(f, "timeout"),
        }
    }
}

/// Result type alias for lifecycle operations
pub type Result<T> = std::result::Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_argument() {
        let err = ProviderError::missing_argument("parent_id");
        assert_eq!(
            err.to_string(),
            "The argument \"parent_id\" is required, but no definition was found."
        );
        assert_eq!(err.summary(), "Missing required argument");
        assert_eq!(err.attribute(), Some("parent_id"));
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_backend_error_context() {
        let err = ProviderError::backend(
            Operation::CreateOrUpdate,
            "Resource: (ResourceId \"/subscriptions/000/resourceGroups/rg\" / Api Version \"2021-04-01\")",
            ClientError::response(400, "BadRequest", "invalid location"),
        );
        assert_eq!(
            err.to_string(),
            "creating/updating Resource: (ResourceId \"/subscriptions/000/resourceGroups/rg\" / Api Version \"2021-04-01\"): Unexpected status 400 with error: BadRequest: invalid location"
        );
        assert_eq!(err.summary(), "Failed to create/update resource");
        assert_eq!(err.category(), ErrorCategory::Backend);
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_found_category() {
        let err = ProviderError::backend(Operation::Read, "x", ClientError::not_found("x"));
        assert!(err.is_not_found());
        assert_eq!(err.category().to_string(), "not_found");
    }

    #[test]
    fn test_path_error_names_attribute() {
        let err = ProviderError::invalid_path(
            "ignore_body_changes",
            &["properties.subnets.9".to_string()],
            CoreError::invalid_path("properties.subnets.9", "index 9 out of range"),
        );
        assert_eq!(err.category(), ErrorCategory::Path);
        assert_eq!(err.attribute(), Some("ignore_body_changes"));
        assert!(err.to_string().contains("index 9 out of range"));
    }
}
