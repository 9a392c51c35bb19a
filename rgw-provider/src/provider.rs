//! RGW provider implementation
//!
//! Drives the user and quota lifecycles against the Admin Ops API. Every
//! operation validates locally first, performs its remote calls in order, and
//! only returns a state once the final read has been flattened and type
//! checked. Any failure aborts the operation and no state is returned.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info};
use rgw_admin::{AdminApi, AdminError, User};
use rgw_core::provider::{ProviderError, ProviderResult};
use rgw_core::resource::{Attributes, Resource, ResourceId, State, Value};
use rgw_core::schema::{ResourceSchema, TypeError};

use crate::config::{ConfigError, ProviderConfig};
use crate::identity::{compose_identity, parse_quota_identity, split_identity};
use crate::quota::{QuotaResourceSpec, flatten_quota, select_quota};
use crate::resources::{quota_schema, user_data_source_schema, user_schema};
use crate::user::{UserSpec, flatten_user};

/// RGW Provider
pub struct RgwProvider {
    api: Arc<dyn AdminApi>,
}

impl RgwProvider {
    /// Create a provider talking to the gateway described by `config`
    pub fn new(config: &ProviderConfig) -> Result<Self, ConfigError> {
        let client = config.build_client()?;
        info!("Configured RGW provider for {}", config.endpoint());
        Ok(Self::with_api(Arc::new(client)))
    }

    /// Create a provider on top of an existing Admin Ops implementation
    pub fn with_api(api: Arc<dyn AdminApi>) -> Self {
        Self { api }
    }

    // =========================================================================
    // Users
    // =========================================================================

    pub async fn create_user(&self, resource: Resource) -> ProviderResult<State> {
        let id = resource.id.clone();
        let schema = user_schema();
        let attrs = validated(&schema, &resource)?;
        let spec = UserSpec::from_attributes(&attrs).map_err(|e| invalid(&id, e))?;

        let request = spec.expand_create();
        debug!("Creating user {}", request.uid);
        let created = self
            .api
            .create_user(&request)
            .await
            .map_err(|e| remote_error(&id, "create user", e))?;

        let (_, created_id) = split_identity(&created.id);
        let user_id = if created_id.is_empty() {
            spec.user_id.as_str()
        } else {
            created_id
        };
        let identity = compose_identity(
            spec.tenant.as_deref().unwrap_or(&created.tenant),
            user_id,
        );
        info!("Created user {}", identity);

        self.read_user_as(id, &identity, schema.configured(&attrs))
            .await
    }

    pub async fn read_user(&self, state: State) -> ProviderResult<State> {
        let identity = user_identity(&state)?;
        let configured = user_schema().configured(&state.attributes);
        self.read_user_as(state.id, &identity, configured).await
    }

    pub async fn update_user(&self, from: State, to: Resource) -> ProviderResult<State> {
        let id = to.id.clone();
        let schema = user_schema();
        let attrs = validated(&schema, &to)?;
        reject_replacement(&schema, &id, &from.attributes, &attrs)?;

        let identity = user_identity(&from)?;
        let spec = UserSpec::from_attributes(&attrs).map_err(|e| invalid(&id, e))?;
        let request = spec.expand_modify(&identity, &from.attributes);
        debug!("Modifying user {}", identity);
        // The modify response is not trusted; the following read is.
        self.api
            .modify_user(&request)
            .await
            .map_err(|e| remote_error(&id, "modify user", e))?;
        info!("Updated user {}", identity);

        self.read_user_as(id, &identity, schema.configured(&attrs))
            .await
    }

    pub async fn delete_user(&self, state: State) -> ProviderResult<()> {
        let identity = user_identity(&state)?;
        let purge_data = UserSpec::from_attributes(&state.attributes)
            .map_err(|e| invalid(&state.id, e))?
            .purge();
        debug!("Removing user {} (purge-data: {:?})", identity, purge_data);
        self.api
            .remove_user(&identity, purge_data)
            .await
            .map_err(|e| remote_error(&state.id, "remove user", e))?;
        info!("Removed user {}", identity);
        Ok(())
    }

    /// Adopt an existing user from `tenant$user_id` or `user_id`
    pub async fn import_user(&self, id: ResourceId, identity: &str) -> ProviderResult<State> {
        let (tenant, user_id) = split_identity(identity);
        if user_id.is_empty() {
            return Err(
                ProviderError::new(format!("Invalid user identity '{}'", identity))
                    .for_resource(id),
            );
        }
        debug!("Importing user {}", identity);

        let mut state = State::imported(id, identity).with_attribute("user_id", user_id);
        if let Some(tenant) = tenant {
            state = state.with_attribute("tenant", tenant);
        }
        self.read_user(state).await
    }

    /// Look up an existing user without managing it
    pub async fn lookup_user(&self, resource: Resource) -> ProviderResult<State> {
        let id = resource.id.clone();
        let schema = user_data_source_schema();
        let attrs = validated(&schema, &resource)?;
        let user_id = attrs
            .get_string("user_id")
            .ok_or_else(|| {
                invalid(
                    &id,
                    TypeError::MissingRequired {
                        name: "user_id".to_string(),
                    },
                )
            })?;
        let identity = compose_identity(attrs.get_string("tenant").unwrap_or_default(), user_id);

        let user = self.fetch_user(&id, &identity).await?;
        let mut attributes = schema.configured(&attrs);
        attributes.extend(flatten_user(&user).into_attributes());
        checked_state(&schema, id, identity, attributes)
    }

    async fn fetch_user(&self, id: &ResourceId, identity: &str) -> ProviderResult<User> {
        debug!("Reading user {}", identity);
        self.api
            .get_user(identity)
            .await
            .map_err(|e| remote_error(id, "read user", e))
    }

    async fn read_user_as(
        &self,
        id: ResourceId,
        identity: &str,
        configured: HashMap<String, Value>,
    ) -> ProviderResult<State> {
        let user = self.fetch_user(&id, identity).await?;
        let mut attributes = configured;
        attributes.extend(flatten_user(&user).into_attributes());
        checked_state(&user_schema(), id, identity.to_string(), attributes)
    }

    // =========================================================================
    // Quotas
    // =========================================================================

    pub async fn create_quota(&self, resource: Resource) -> ProviderResult<State> {
        let id = resource.id.clone();
        let schema = quota_schema();
        let attrs = validated(&schema, &resource)?;
        let spec = QuotaResourceSpec::from_attributes(&attrs).map_err(|e| invalid(&id, e))?;

        self.set_quota(&id, &spec, false).await?;
        info!("Set quota {}", spec.identity());

        self.read_quota_as(id, &spec, schema.configured(&attrs))
            .await
    }

    pub async fn read_quota(&self, state: State) -> ProviderResult<State> {
        let spec = QuotaResourceSpec::from_attributes(&state.attributes)
            .map_err(|e| invalid(&state.id, e))?;
        let configured = quota_schema().configured(&state.attributes);
        self.read_quota_as(state.id, &spec, configured).await
    }

    pub async fn update_quota(&self, from: State, to: Resource) -> ProviderResult<State> {
        let id = to.id.clone();
        let schema = quota_schema();
        let attrs = validated(&schema, &to)?;
        reject_replacement(&schema, &id, &from.attributes, &attrs)?;

        let spec = QuotaResourceSpec::from_attributes(&attrs).map_err(|e| invalid(&id, e))?;
        self.set_quota(&id, &spec, false).await?;
        info!("Updated quota {}", spec.identity());

        self.read_quota_as(id, &spec, schema.configured(&attrs))
            .await
    }

    /// Disable the quota; the gateway has no way to remove it
    pub async fn delete_quota(&self, state: State) -> ProviderResult<()> {
        let spec = QuotaResourceSpec::from_attributes(&state.attributes)
            .map_err(|e| invalid(&state.id, e))?;
        self.set_quota(&state.id, &spec, true).await?;
        info!("Disabled quota {}", spec.identity());
        Ok(())
    }

    /// Adopt an existing quota from `<type>_<user_id>`
    pub async fn import_quota(&self, id: ResourceId, identity: &str) -> ProviderResult<State> {
        let (quota_type, user_id) = parse_quota_identity(identity).map_err(|e| {
            ProviderError::new(format!("Invalid quota identity: {}", e))
                .with_cause(e)
                .for_resource(id.clone())
        })?;
        debug!("Importing {} quota of {}", quota_type, user_id);

        let state = State::imported(id, identity)
            .with_attribute("user_id", user_id)
            .with_attribute("type", quota_type.as_str());
        self.read_quota(state).await
    }

    async fn set_quota(
        &self,
        id: &ResourceId,
        spec: &QuotaResourceSpec,
        disable: bool,
    ) -> ProviderResult<()> {
        let request = if disable {
            spec.expand_delete()
        } else {
            spec.expand()
        };
        debug!(
            "Setting {} quota of {} (enabled: {:?})",
            request.quota_type, request.uid, request.enabled
        );
        self.api
            .set_user_quota(&request)
            .await
            .map_err(|e| remote_error(id, "set quota", e))
    }

    async fn read_quota_as(
        &self,
        id: ResourceId,
        spec: &QuotaResourceSpec,
        configured: HashMap<String, Value>,
    ) -> ProviderResult<State> {
        let user = self.fetch_user(&id, &spec.user_id).await?;
        let quota = flatten_quota(
            select_quota(&user, spec.quota_type),
            spec.quota_type,
            &spec.user_id,
        );
        let mut attributes = configured;
        attributes.extend(quota.into_attributes());
        checked_state(&quota_schema(), id, spec.identity(), attributes)
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Caller attributes with schema defaults applied, validated
fn validated(
    schema: &ResourceSchema,
    resource: &Resource,
) -> ProviderResult<HashMap<String, Value>> {
    let mut attrs = resource.attributes.clone();
    schema.apply_defaults(&mut attrs);
    schema.validate(&attrs).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        ProviderError::new(format!("Invalid configuration: {}", messages.join("; ")))
            .for_resource(resource.id.clone())
    })?;
    Ok(attrs)
}

fn reject_replacement(
    schema: &ResourceSchema,
    id: &ResourceId,
    from: &HashMap<String, Value>,
    to: &HashMap<String, Value>,
) -> ProviderResult<()> {
    let changed = schema.replacement_attributes(from, to);
    if changed.is_empty() {
        return Ok(());
    }
    Err(ProviderError::new(format!(
        "Cannot update {} in place, the resource must be replaced",
        changed.join(", ")
    ))
    .for_resource(id.clone()))
}

/// Identity of a tracked user
///
/// A configured tenant always wins; otherwise the stored identity is used,
/// then the bare user id.
fn user_identity(state: &State) -> ProviderResult<String> {
    let user_id = state.attributes.get_string("user_id");
    if let Some(tenant) = state.attributes.get_string("tenant")
        && let Some(user_id) = user_id
    {
        return Ok(compose_identity(tenant, user_id));
    }
    state
        .identifier
        .clone()
        .filter(|s| !s.is_empty())
        .or_else(|| user_id.map(str::to_string))
        .ok_or_else(|| {
            ProviderError::new("User has no identity; it was never created or imported")
                .for_resource(state.id.clone())
        })
}

fn checked_state(
    schema: &ResourceSchema,
    id: ResourceId,
    identity: String,
    attributes: HashMap<String, Value>,
) -> ProviderResult<State> {
    schema
        .check_state(&attributes)
        .map_err(|e| invalid(&id, e))?;
    Ok(State::existing(id, attributes).with_identifier(identity))
}

fn invalid(id: &ResourceId, error: TypeError) -> ProviderError {
    ProviderError::new(format!("Invalid attributes: {}", error))
        .with_cause(error)
        .for_resource(id.clone())
}

fn remote_error(id: &ResourceId, action: &str, error: AdminError) -> ProviderError {
    let message = if error.is_not_found() {
        format!("Failed to {}: user does not exist ({})", action, error)
    } else {
        format!("Failed to {}: {}", action, error)
    };
    ProviderError::new(message)
        .with_cause(error)
        .for_resource(id.clone())
}
