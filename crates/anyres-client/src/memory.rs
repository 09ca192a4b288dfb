//! In-process backend.
//!
//! Objects live in a concurrent map keyed by the lower-cased resource
//! identifier. Every request is recorded so callers can assert on what was
//! sent, and a failure can be injected per request method.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::ClientError;
use crate::traits::ResourceClient;

/// Request methods of the backend protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestMethod {
    Get,
    Put,
    Delete,
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestMethod::Get => write!(f, "GET"),
            RequestMethod::Put => write!(f, "PUT"),
            RequestMethod::Delete => write!(f, "DELETE"),
        }
    }
}

/// One request as received by [`InMemoryResourceClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: RequestMethod,
    pub resource_id: String,
    pub api_version: String,
    /// Request body, `PUT` only.
    pub body: Option<Value>,
}

/// In-memory [`ResourceClient`].
///
/// `PUT` responses echo the request body with `id`, `name` and `type` filled
/// in; system-assigned identities get a stable `principalId` and the
/// client's `tenantId`.
#[derive(Debug)]
pub struct InMemoryResourceClient {
    objects: DashMap<String, Value>,
    requests: Mutex<Vec<RecordedRequest>>,
    /// One-shot failures, consumed by the next request of the method
    failures: DashMap<RequestMethod, ClientError>,
    latency: Option<Duration>,
    tenant_id: String,
}

impl Default for InMemoryResourceClient {
    fn default() -> Self {
        Self::new()
    }
}

fn storage_key(resource_id: &str) -> String {
    resource_id.trim_end_matches('/').to_lowercase()
}

impl InMemoryResourceClient {
    pub fn new() -> Self {
        Self {
            objects: DashMap::new(),
            requests: Mutex::new(Vec::new()),
            failures: DashMap::new(),
            latency: None,
            tenant_id: Uuid::new_v4().to_string(),
        }
    }

    /// Delays every request by `latency` before it is served.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Stores `value` as the live object without recording a request.
    pub fn insert_raw(&self, resource_id: &str, value: Value) {
        self.objects.insert(storage_key(resource_id), value);
    }

    /// Removes the live object without recording a request.
    pub fn remove_raw(&self, resource_id: &str) -> Option<Value> {
        self.objects.remove(&storage_key(resource_id)).map(|(_, v)| v)
    }

    pub fn object(&self, resource_id: &str) -> Option<Value> {
        self.objects
            .get(&storage_key(resource_id))
            .map(|entry| entry.value().clone())
    }

    pub fn contains(&self, resource_id: &str) -> bool {
        self.objects.contains_key(&storage_key(resource_id))
    }

    /// Makes the next request of `method` fail with `error`.
    pub fn fail_next(&self, method: RequestMethod, error: ClientError) {
        self.failures.insert(method, error);
    }

    /// Every request received so far, in arrival order.
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().await.clone()
    }

    /// Requests of one method, in arrival order.
    pub async fn requests_of(&self, method: RequestMethod) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .await
            .iter()
            .filter(|r| r.method == method)
            .cloned()
            .collect()
    }

    async fn receive(
        &self,
        method: RequestMethod,
        resource_id: &str,
        api_version: &str,
        body: Option<&Value>,
    ) -> Result<(), ClientError> {
        tracing::debug!(%method, resource_id, api_version, "in-memory backend request");
        self.requests.lock().await.push(RecordedRequest {
            method,
            resource_id: resource_id.to_string(),
            api_version: api_version.to_string(),
            body: body.cloned(),
        });
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        match self.failures.remove(&method) {
            Some((_, error)) => Err(error),
            None => Ok(()),
        }
    }

    fn respond(&self, resource_id: &str, body: &Value, existing: Option<&Value>) -> Value {
        let mut response = match body {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        let id = resource_id.trim_end_matches('/');
        let name = id.rsplit('/').next().unwrap_or_default();
        response.insert("id".to_string(), Value::String(id.to_string()));
        response.insert("name".to_string(), Value::String(name.to_string()));
        if let Ok(resource_type) = anyres_core::resource_type_of(id) {
            response.insert("type".to_string(), Value::String(resource_type));
        }

        if let Some(Value::Object(identity)) = response.get_mut("identity") {
            let system_assigned = identity
                .get("type")
                .and_then(Value::as_str)
                .is_some_and(|t| t.to_ascii_lowercase().contains("systemassigned"));
            if system_assigned {
                let principal_id = existing
                    .and_then(|v| v.pointer("/identity/principalId"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                identity.insert("principalId".to_string(), Value::String(principal_id));
                identity.insert(
                    "tenantId".to_string(),
                    Value::String(self.tenant_id.clone()),
                );
            } else {
                identity.remove("principalId");
                identity.remove("tenantId");
            }
        }
        Value::Object(response)
    }
}

#[async_trait]
impl ResourceClient for InMemoryResourceClient {
    async fn get(&self, resource_id: &str, api_version: &str) -> Result<Value, ClientError> {
        self.receive(RequestMethod::Get, resource_id, api_version, None)
            .await?;
        self.object(resource_id)
            .ok_or_else(|| ClientError::not_found(resource_id))
    }

    async fn create_or_update(
        &self,
        resource_id: &str,
        api_version: &str,
        body: &Value,
    ) -> Result<Value, ClientError> {
        self.receive(RequestMethod::Put, resource_id, api_version, Some(body))
            .await?;
        let existing = self.object(resource_id);
        let response = self.respond(resource_id, body, existing.as_ref());
        self.objects
            .insert(storage_key(resource_id), response.clone());
        Ok(response)
    }

    async fn delete(&self, resource_id: &str, api_version: &str) -> Result<Value, ClientError> {
        self.receive(RequestMethod::Delete, resource_id, api_version, None)
            .await?;
        match self.objects.remove(&storage_key(resource_id)) {
            Some(_) => Ok(Value::Null),
            None => Err(ClientError::not_found(resource_id)),
        }
    }
}
