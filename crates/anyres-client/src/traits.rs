//! The backend client contract.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ClientError;

/// A JSON-speaking backend addressed by canonical resource identifiers.
///
/// Implementations must be thread-safe (`Send + Sync`); the lifecycle engine
/// holds one shared instance for every resource it reconciles. Retries, if
/// any, belong to the implementation.
///
/// # Example
///
/// ```ignore
/// use anyres_client::{ClientError, ResourceClient};
///
/// async fn exists(client: &dyn ResourceClient, id: &str) -> Result<bool, ClientError> {
///     match client.get(id, "2023-04-01").await {
///         Ok(_) => Ok(true),
///         Err(err) if err.is_not_found() => Ok(false),
///         Err(err) => Err(err),
///     }
/// }
/// ```
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Fetches the live object.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the object does not exist.
    async fn get(&self, resource_id: &str, api_version: &str) -> Result<Value, ClientError>;

    /// Creates the object, or replaces it if it already exists, and returns
    /// the backend's view of it.
    async fn create_or_update(
        &self,
        resource_id: &str,
        api_version: &str,
        body: &Value,
    ) -> Result<Value, ClientError>;

    /// Deletes the object.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the object does not exist.
    async fn delete(&self, resource_id: &str, api_version: &str) -> Result<Value, ClientError>;
}
