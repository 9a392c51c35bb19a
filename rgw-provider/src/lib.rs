//! RGW Provider
//!
//! Manages Ceph Object Gateway users and quotas through the Admin Ops API.
//!
//! ## Module Structure
//!
//! - `config` - Provider settings and their environment fallbacks
//! - `identity` - Identity strings for users and quotas
//! - `resources` - Resource type definitions and schemas
//! - `user` / `quota` - Expansion into requests and flattening of responses
//! - `provider` - RgwProvider lifecycle operations

pub mod config;
pub mod identity;
pub mod provider;
pub mod quota;
pub mod resources;
pub mod user;

#[cfg(test)]
mod testing;

// Re-export main types
pub use config::{ConfigError, ProviderConfig, ProviderSettings};
pub use identity::{QuotaType, compose_identity, compose_quota_identity};
pub use provider::RgwProvider;

use rgw_core::provider::{BoxFuture, Provider, ProviderError, ProviderResult, ResourceType};
use rgw_core::resource::{Resource, ResourceId, State};

use resources::{QUOTA, USER, data_source_types, resource_types};

// =============================================================================
// Provider Trait Implementation
// =============================================================================

impl Provider for RgwProvider {
    fn name(&self) -> &'static str {
        "rgw"
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        resource_types()
    }

    fn data_source_types(&self) -> Vec<Box<dyn ResourceType>> {
        data_source_types()
    }

    fn read(&self, state: &State) -> BoxFuture<'_, ProviderResult<State>> {
        let state = state.clone();
        Box::pin(async move {
            match state.id.resource_type.as_str() {
                USER => self.read_user(state).await,
                QUOTA => self.read_quota(state).await,
                _ => Err(ProviderError::unknown_type(&state.id)),
            }
        })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move {
            match resource.id.resource_type.as_str() {
                USER => self.create_user(resource).await,
                QUOTA => self.create_quota(resource).await,
                _ => Err(ProviderError::unknown_type(&resource.id)),
            }
        })
    }

    fn update(&self, from: &State, to: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let from = from.clone();
        let to = to.clone();
        Box::pin(async move {
            match to.id.resource_type.as_str() {
                USER => self.update_user(from, to).await,
                QUOTA => self.update_quota(from, to).await,
                _ => Err(ProviderError::unknown_type(&to.id)),
            }
        })
    }

    fn delete(&self, state: &State) -> BoxFuture<'_, ProviderResult<()>> {
        let state = state.clone();
        Box::pin(async move {
            match state.id.resource_type.as_str() {
                USER => self.delete_user(state).await,
                QUOTA => self.delete_quota(state).await,
                _ => Err(ProviderError::unknown_type(&state.id)),
            }
        })
    }

    fn import(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move {
            match id.resource_type.as_str() {
                USER => self.import_user(id, &identifier).await,
                QUOTA => self.import_quota(id, &identifier).await,
                _ => Err(ProviderError::unknown_type(&id)),
            }
        })
    }

    fn read_data_source(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move {
            match resource.id.resource_type.as_str() {
                USER => self.lookup_user(resource).await,
                _ => Err(ProviderError::unknown_type(&resource.id)),
            }
        })
    }
}
