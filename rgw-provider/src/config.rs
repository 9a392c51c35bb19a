//! Provider configuration
//!
//! Each setting comes from an explicit value when one is given, otherwise
//! from its environment variable. A setting that is still empty after
//! resolution is a fatal error and no client is built.

use std::collections::HashMap;
use std::time::Duration;

use rgw_admin::{AdminError, RgwAdminClient};
use rgw_core::resource::{Attributes, Value};
use rgw_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use secrecy::SecretString;
use thiserror::Error;

pub const ENDPOINT_ENV: &str = "RGW_ENDPOINT";
pub const ACCESS_KEY_ENV: &str = "RGW_ACCESS_KEY";
pub const SECRET_KEY_ENV: &str = "RGW_SECRET_KEY";

/// Request timeout used when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised while configuring the provider
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "Unable to find {setting}: {setting} cannot be an empty string \
         (set it explicitly or via {env})"
    )]
    Missing {
        setting: &'static str,
        env: &'static str,
    },

    #[error("Invalid provider configuration: {0}")]
    Invalid(String),

    #[error("Unable to create API client: {0}")]
    Client(#[from] AdminError),
}

/// Provider settings as supplied by the caller, before resolution
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl ProviderSettings {
    /// Read settings from a provider configuration block
    pub fn from_attributes(attributes: &HashMap<String, Value>) -> Result<Self, ConfigError> {
        provider_schema().validate(attributes).map_err(|errors| {
            ConfigError::Invalid(
                errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        })?;

        let string = |key: &str| {
            attributes
                .attribute(key)
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        let timeout_secs = attributes
            .get_int("timeout")
            .map(|secs| {
                u64::try_from(secs)
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or_else(|| invalid_timeout(secs))
            })
            .transpose()?;

        Ok(Self {
            endpoint: string("endpoint"),
            access_key: string("access_key"),
            secret_key: string("secret_key"),
            timeout_secs,
        })
    }
}

fn invalid_timeout(secs: impl std::fmt::Display) -> ConfigError {
    ConfigError::Invalid(format!("timeout must be a positive number of seconds, got {}", secs))
}

/// Schema of the provider configuration block
pub fn provider_schema() -> ResourceSchema {
    ResourceSchema::new("provider")
        .with_description("Connection settings for the RGW Admin Ops API")
        .attribute(
            AttributeSchema::new("endpoint", AttributeType::String)
                .optional()
                .with_description(format!("Gateway URL, defaults to ${}", ENDPOINT_ENV)),
        )
        .attribute(
            AttributeSchema::new("access_key", AttributeType::String)
                .optional()
                .sensitive()
                .with_description(format!("Admin access key, defaults to ${}", ACCESS_KEY_ENV)),
        )
        .attribute(
            AttributeSchema::new("secret_key", AttributeType::String)
                .optional()
                .sensitive()
                .with_description(format!("Admin secret key, defaults to ${}", SECRET_KEY_ENV)),
        )
        .attribute(
            AttributeSchema::new("timeout", AttributeType::Int)
                .optional()
                .with_description("Request timeout in seconds"),
        )
}

/// Resolved, immutable provider configuration
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    endpoint: String,
    access_key: String,
    secret_key: SecretString,
    timeout: Duration,
}

impl ProviderConfig {
    /// Resolve settings against the process environment
    pub fn resolve(settings: ProviderSettings) -> Result<Self, ConfigError> {
        Self::resolve_with(settings, |name| std::env::var(name).ok())
    }

    /// Resolve settings using `lookup` for environment fallbacks
    pub fn resolve_with(
        settings: ProviderSettings,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let resolve = |value: Option<String>, setting: &'static str, env: &'static str| {
            let value = match value {
                Some(v) => v,
                None => lookup(env).unwrap_or_default(),
            };
            if value.is_empty() {
                Err(ConfigError::Missing { setting, env })
            } else {
                Ok(value)
            }
        };

        let endpoint = resolve(settings.endpoint, "endpoint", ENDPOINT_ENV)?;
        let access_key = resolve(settings.access_key, "access_key", ACCESS_KEY_ENV)?;
        let secret_key = resolve(settings.secret_key, "secret_key", SECRET_KEY_ENV)?;
        let timeout = match settings.timeout_secs {
            Some(0) => return Err(invalid_timeout(0)),
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            endpoint,
            access_key,
            secret_key: SecretString::from(secret_key),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Build the Admin Ops client for this configuration
    pub fn build_client(&self) -> Result<RgwAdminClient, ConfigError> {
        Ok(RgwAdminClient::new(
            &self.endpoint,
            self.access_key.clone(),
            self.secret_key.clone(),
            self.timeout,
        )?)
    }
}
