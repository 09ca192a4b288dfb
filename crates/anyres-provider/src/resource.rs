//! The generic resource: apply, read, delete and import against the backend.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyres_core::{
    IdentityModel, IdentityType, ResourceId, UpdateOptions, expand_identity, flatten_identity,
    flatten_tags, normalize_location, normalize_value, override_with_paths, resource_type_of,
    same_location, split_api_version, update_object,
};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::attr::Attr;
use crate::body::{BodySource, expand_body, has_property, request_body};
use crate::error::{Operation, ProviderError, Result};
use crate::model::ResourceModel;
use crate::output::{flatten_output, flatten_output_payload};
use crate::provider::ProviderData;

/// Name under which the generic resource type is registered.
pub const RESOURCE_TYPE_NAME: &str = "anyres_resource";

/// Properties the import drops from the payload since they have their own arguments.
const IMPORT_STRIPPED_PROPERTIES: [&str; 4] = ["location", "tags", "name", "identity"];

/// Lifecycle handle of the generic resource type.
///
/// Cheap to clone; every clone shares the provider's client, registry and
/// lock table.
#[derive(Debug, Clone)]
pub struct GenericResource {
    data: Arc<ProviderData>,
}

impl GenericResource {
    pub(crate) fn new(data: Arc<ProviderData>) -> Self {
        Self { data }
    }

    pub(crate) fn data(&self) -> &ProviderData {
        &self.data
    }

    /// Creates the object described by `plan` and returns the new state.
    ///
    /// Fails with [`ProviderError::AlreadyExists`] if an object with the same
    /// id is already present on the server.
    pub async fn create(&self, plan: &ResourceModel) -> Result<ResourceModel> {
        let timeout = plan.timeouts.create(&self.data.timeouts);
        with_deadline(Operation::CreateOrUpdate, timeout, self.apply(plan, None)).await
    }

    /// Updates the object previously recorded as `prior` to match `plan`.
    pub async fn update(&self, plan: &ResourceModel, prior: &ResourceModel) -> Result<ResourceModel> {
        let timeout = plan.timeouts.create(&self.data.timeouts);
        with_deadline(Operation::CreateOrUpdate, timeout, self.apply(plan, Some(prior))).await
    }

    /// Refreshes `state` from the server. `Ok(None)` means the object is gone
    /// and should be dropped from state.
    pub async fn read(&self, state: &ResourceModel) -> Result<Option<ResourceModel>> {
        let timeout = state.timeouts.read(&self.data.timeouts);
        with_deadline(Operation::Read, timeout, self.refresh(state)).await
    }

    /// Deletes the object recorded in `state`. An object that is already gone
    /// counts as deleted.
    pub async fn delete(&self, state: &ResourceModel) -> Result<()> {
        let timeout = state.timeouts.delete(&self.data.timeouts);
        with_deadline(Operation::Delete, timeout, self.destroy(state)).await
    }

    /// Builds a state for an existing object from `import_id`, which is a
    /// resource id optionally followed by `?api-version=<version>`.
    ///
    /// Without an api version the newest one known to the registry is used.
    pub async fn import_state(&self, import_id: &str) -> Result<Option<ResourceModel>> {
        let timeout = self.data.timeouts.read();
        with_deadline(Operation::Import, timeout, self.import(import_id)).await
    }

    async fn apply(&self, plan: &ResourceModel, prior: Option<&ResourceModel>) -> Result<ResourceModel> {
        let name = plan
            .name
            .known()
            .ok_or_else(|| ProviderError::missing_argument("name"))?;
        let parent_id = plan
            .parent_id
            .known()
            .ok_or_else(|| ProviderError::missing_argument("parent_id"))?;
        let id = ResourceId::new(name, parent_id, &plan.resource_type, self.data.registry.as_ref())
            .map_err(|err| ProviderError::invalid_configuration(None, err.to_string()))?;
        let client = &self.data.client;

        if prior.is_none() {
            match client.get(id.id(), &id.api_version).await {
                Ok(_) => {
                    return Err(ProviderError::AlreadyExists {
                        id: id.id().to_string(),
                    });
                }
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(ProviderError::backend(Operation::CheckExisting, &id, err)),
            }
        }

        let mut body = request_body(plan)?;
        expand_body(&mut body, plan)?;

        if let Some(prior) = prior {
            if !has_property(&body, "identity")
                && prior
                    .identity
                    .known()
                    .is_some_and(|identity| identity.identity_type != IdentityType::None)
            {
                debug!(resource_id = %id.id(), "identity removed from configuration, disabling it");
                let none = expand_identity(&IdentityModel::new(IdentityType::None))
                    .map_err(|err| ProviderError::invalid_configuration(Some("identity"), err.to_string()))?;
                body.insert("identity".to_string(), none);
            }

            if !plan.ignore_body_changes.is_empty() {
                let existing = client
                    .get(id.id(), &id.api_version)
                    .await
                    .map_err(|err| ProviderError::backend(Operation::Read, &id, err))?;
                let merged = override_with_paths(&Value::Object(body), &existing, &plan.ignore_body_changes)
                    .map_err(|err| {
                        ProviderError::invalid_path("ignore_body_changes", &plan.ignore_body_changes, err)
                    })?;
                let merged = match &id.resource_def {
                    Some(def) => def.get_write_only(&normalize_value(&merged)),
                    None => merged,
                };
                body = match merged {
                    Value::Object(map) => map,
                    _ => Map::new(),
                };
            }
        }

        let response = {
            let _locks = self.data.locks.acquire_all(plan.locks.as_slice()).await;
            client
                .create_or_update(id.id(), &id.api_version, &Value::Object(body))
                .await
                .map_err(|err| ProviderError::backend(Operation::CreateOrUpdate, &id, err))?
        };

        let mut state = plan.clone();
        state.id = Attr::Known(id.id().to_string());
        state.output = Attr::Known(flatten_output(&response, &plan.response_export_values));
        state.output_payload = Attr::Known(flatten_output_payload(&response, &plan.response_export_values));
        if let Attr::Known(identity) = &mut state.identity {
            let reported = flatten_identity(response.get("identity"));
            identity.principal_id = reported.as_ref().and_then(|r| r.principal_id.clone());
            identity.tenant_id = reported.and_then(|r| r.tenant_id);
        }
        resolve_unknowns(&mut state, &response);

        info!(
            resource_id = %id.id(),
            api_version = %id.api_version,
            "resource {}",
            if prior.is_some() { "updated" } else { "created" }
        );
        Ok(state)
    }

    async fn refresh(&self, model: &ResourceModel) -> Result<Option<ResourceModel>> {
        let id = ResourceId::with_resource_type(
            model.id.value_str(),
            &model.resource_type,
            self.data.registry.as_ref(),
        )
        .map_err(|err| ProviderError::invalid_resource_id(model.id.value_str(), err))?;

        let response = match self.data.client.get(id.id(), &id.api_version).await {
            Ok(response) => response,
            Err(err) if err.is_not_found() => {
                info!(resource_id = %id.id(), "resource not found, removing from state");
                return Ok(None);
            }
            Err(err) => return Err(ProviderError::backend(Operation::Read, &id, err)),
        };

        let mut state = model.clone();
        state.name = Attr::Known(id.name.clone());
        state.parent_id = Attr::Known(id.parent_id.clone());
        state.resource_type = id.type_string();

        let request = request_body(model)?;

        if let Some(location) = response.get("location").and_then(Value::as_str)
            && !same_location(location, model.location.value_str())
        {
            state.location = Attr::Known(location.to_string());
        }

        let tags = flatten_tags(response.get("tags"));
        if !tags.is_empty() || state.tags.known().is_some_and(|t| !t.is_empty()) {
            state.tags = Attr::Known(tags);
        }

        if !has_property(&request, "identity") {
            state.identity = reconcile_identity(&model.identity, flatten_identity(response.get("identity")));
        }

        state.output = Attr::Known(flatten_output(&response, &model.response_export_values));
        state.output_payload = Attr::Known(flatten_output_payload(&response, &model.response_export_values));

        let response = if model.ignore_body_changes.is_empty() {
            response
        } else {
            override_with_paths(&response, &Value::Object(request.clone()), &model.ignore_body_changes)
                .map_err(|err| {
                    ProviderError::invalid_path("ignore_body_changes", &model.ignore_body_changes, err)
                })?
        };

        let options = UpdateOptions {
            ignore_casing: model.ignore_casing,
            ignore_missing_property: model.ignore_missing_property,
        };
        let observed = update_object(&Value::Object(request), &response, options);
        match BodySource::of(model) {
            BodySource::Body => state.body = Attr::Known(observed.to_string()),
            BodySource::Payload => state.payload = Attr::Known(observed),
            BodySource::Neither => {}
        }

        debug!(resource_id = %id.id(), "resource refreshed");
        Ok(Some(state))
    }

    async fn destroy(&self, model: &ResourceModel) -> Result<()> {
        let id = ResourceId::with_resource_type(
            model.id.value_str(),
            &model.resource_type,
            self.data.registry.as_ref(),
        )
        .map_err(|err| ProviderError::invalid_resource_id(model.id.value_str(), err))?;

        let _locks = self.data.locks.acquire_all(model.locks.as_slice()).await;
        match self.data.client.delete(id.id(), &id.api_version).await {
            Ok(_) => {
                info!(resource_id = %id.id(), "resource deleted");
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                info!(resource_id = %id.id(), "resource already absent");
                Ok(())
            }
            Err(err) => Err(ProviderError::backend(Operation::Delete, &id, err)),
        }
    }

    async fn import(&self, import_id: &str) -> Result<Option<ResourceModel>> {
        debug!(import_id, "importing resource");
        let registry = self.data.registry.as_ref();

        let input = match split_api_version(import_id) {
            (_, Some(_)) => import_id.to_string(),
            (id, None) => match resource_type_of(&id)
                .ok()
                .and_then(|resource_type| registry.latest_api_version(&resource_type))
            {
                Some(api_version) => {
                    debug!(%api_version, "no api-version given, using the latest known");
                    format!("{id}?api-version={api_version}")
                }
                None => import_id.to_string(),
            },
        };
        let id = ResourceId::with_api_version(&input, registry)
            .map_err(|err| ProviderError::invalid_resource_id(&input, err))?;

        let mut state = ResourceModel {
            id: Attr::Known(id.id().to_string()),
            name: Attr::Known(id.name.clone()),
            parent_id: Attr::Known(id.parent_id.clone()),
            resource_type: id.type_string(),
            output: Attr::Known("{}".to_string()),
            ..ResourceModel::default()
        };

        let response = match self.data.client.get(id.id(), &id.api_version).await {
            Ok(response) => response,
            Err(err) if err.is_not_found() => {
                info!(resource_id = %id.id(), "resource to import does not exist");
                return Ok(None);
            }
            Err(err) => return Err(ProviderError::backend(Operation::Read, &id, err)),
        };

        let payload = match &id.resource_def {
            Some(def) => {
                let mut payload =
                    def.without_write_only(&def.get_write_only(&normalize_value(&response)));
                if let Value::Object(map) = &mut payload {
                    for key in IMPORT_STRIPPED_PROPERTIES {
                        map.remove(key);
                    }
                }
                payload
            }
            None => response.clone(),
        };
        state.payload = Attr::Known(payload);

        if let Some(location) = response.get("location").and_then(Value::as_str) {
            state.location = Attr::Known(normalize_location(location));
        }
        let tags = flatten_tags(response.get("tags"));
        if !tags.is_empty() {
            state.tags = Attr::Known(tags);
        }
        if let Some(identity) = flatten_identity(response.get("identity")) {
            state.identity = Attr::Known(identity);
        }

        info!(resource_id = %id.id(), api_version = %id.api_version, "resource imported");
        Ok(Some(state))
    }
}

async fn with_deadline<T>(
    operation: Operation,
    timeout: Duration,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(%operation, ?timeout, "operation timed out");
            Err(ProviderError::Timeout { operation, timeout })
        }
    }
}

/// Fills attributes still unknown after apply from the server response.
fn resolve_unknowns(state: &mut ResourceModel, response: &Value) {
    if state.location.is_unknown() {
        state.location = match response.get("location").and_then(Value::as_str) {
            Some(location) => Attr::Known(location.to_string()),
            None => Attr::Null,
        };
    }
    if state.tags.is_unknown() {
        state.tags = match response.get("tags") {
            Some(Value::Object(_)) => Attr::Known(flatten_tags(response.get("tags"))),
            _ => Attr::Null,
        };
    }
    if state.identity.is_unknown() {
        state.identity = flatten_identity(response.get("identity")).into();
    }
}

/// Identity to record when the body does not declare one itself.
fn reconcile_identity(
    recorded: &Attr<IdentityModel>,
    reported: Option<IdentityModel>,
) -> Attr<IdentityModel> {
    match (recorded, reported) {
        (Attr::Known(recorded), None) if recorded.identity_type == IdentityType::None => {
            Attr::Known(recorded.clone())
        }
        (Attr::Known(_), None) => Attr::Null,
        (Attr::Known(recorded), Some(mut reported)) => {
            let both_empty = recorded.identity_ids_or_empty().is_empty()
                && reported.identity_ids_or_empty().is_empty();
            // the server lists ids in its own order; keep the recorded spelling
            if both_empty || recorded.same_identity_ids(&reported) {
                reported.identity_ids = recorded.identity_ids.clone();
            }
            Attr::Known(reported)
        }
        (_, Some(reported)) if reported.identity_type != IdentityType::None => Attr::Known(reported),
        _ => Attr::Null,
    }
}
