//! Identity strings used to track users and quotas
//!
//! - user: `"<user_id>"` or `"<tenant>$<user_id>"`
//! - quota: `"<quota_type>_<user_id>"`

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub const TENANT_SEPARATOR: char = '$';
pub const QUOTA_SEPARATOR: char = '_';

/// Errors parsing identity strings
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("Unknown quota type '{0}', expected 'user' or 'bucket'")]
    UnknownQuotaType(String),

    #[error("Malformed identity '{0}'")]
    Malformed(String),
}

/// Quota discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuotaType {
    User,
    Bucket,
}

impl QuotaType {
    pub const ALL: [QuotaType; 2] = [QuotaType::User, QuotaType::Bucket];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuotaType::User => "user",
            QuotaType::Bucket => "bucket",
        }
    }
}

impl fmt::Display for QuotaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuotaType {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(QuotaType::User),
            "bucket" => Ok(QuotaType::Bucket),
            other => Err(IdentityError::UnknownQuotaType(other.to_string())),
        }
    }
}

/// Compose a user identity; the tenant prefix is only added when non-empty
pub fn compose_identity(tenant: &str, user_id: &str) -> String {
    if tenant.is_empty() {
        user_id.to_string()
    } else {
        format!("{}{}{}", tenant, TENANT_SEPARATOR, user_id)
    }
}

/// Split a user identity into its optional tenant and the user id
pub fn split_identity(identity: &str) -> (Option<&str>, &str) {
    match identity.split_once(TENANT_SEPARATOR) {
        Some((tenant, user_id)) if !tenant.is_empty() => (Some(tenant), user_id),
        Some((_, user_id)) => (None, user_id),
        None => (None, identity),
    }
}

/// Compose the identity of a standalone quota resource
pub fn compose_quota_identity(quota_type: QuotaType, user_id: &str) -> String {
    format!("{}{}{}", quota_type, QUOTA_SEPARATOR, user_id)
}

/// Parse a quota identity back into its type and user id
///
/// The type never contains the separator, so the first one delimits it; the
/// user id may itself contain underscores.
pub fn parse_quota_identity(identity: &str) -> Result<(QuotaType, &str), IdentityError> {
    let (quota_type, user_id) = identity
        .split_once(QUOTA_SEPARATOR)
        .filter(|(_, user_id)| !user_id.is_empty())
        .ok_or_else(|| IdentityError::Malformed(identity.to_string()))?;
    Ok((quota_type.parse()?, user_id))
}
