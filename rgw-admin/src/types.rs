//! Admin Ops records
//!
//! Response records mirror the JSON emitted by `GET /admin/user`. Request
//! records keep every optional field as `Option` so an explicit `false` or
//! `0` is distinguishable from "not set"; only set fields become query
//! parameters.

use serde::{Deserialize, Serialize};

/// A gateway user as returned by the Admin Ops API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    /// User id, tenant-qualified (`tenant$uid`) for tenanted users
    #[serde(rename = "user_id")]
    pub id: String,
    pub tenant: String,
    pub display_name: String,
    pub email: String,
    pub suspended: Option<i64>,
    pub max_buckets: Option<i64>,
    pub subusers: Vec<SubuserSpec>,
    pub keys: Vec<UserKeySpec>,
    pub swift_keys: Vec<SwiftKeySpec>,
    pub caps: Vec<UserCapSpec>,
    pub op_mask: String,
    pub default_placement: String,
    pub default_storage_class: String,
    pub placement_tags: Vec<String>,
    pub bucket_quota: QuotaSpec,
    pub user_quota: QuotaSpec,
    #[serde(rename = "type")]
    pub user_type: String,
}

/// Subuser of a user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubuserSpec {
    pub id: String,
    pub permissions: String,
}

/// S3 key pair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserKeySpec {
    pub user: String,
    pub access_key: String,
    pub secret_key: String,
}

/// Swift key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwiftKeySpec {
    pub user: String,
    pub secret_key: String,
}

/// Administrative capability (e.g., `users=read`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserCapSpec {
    #[serde(rename = "type")]
    pub cap_type: String,
    pub perm: String,
}

/// Quota settings embedded in a user record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaSpec {
    pub enabled: Option<bool>,
    pub check_on_raw: bool,
    pub max_size: Option<i64>,
    pub max_size_kb: Option<i64>,
    pub max_objects: Option<i64>,
}

/// Parameters for creating or modifying a user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserRequest {
    /// Lookup key; `tenant$uid` for tenanted users
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub suspended: Option<i64>,
    pub max_buckets: Option<i64>,
    pub generate_key: Option<bool>,
    pub key_type: Option<String>,
    pub user_caps: Option<String>,
}

impl UserRequest {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            ..Default::default()
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Query parameters for the request, in a stable order
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("uid", self.uid.clone())];
        push_opt(&mut pairs, "display-name", self.display_name.as_ref());
        push_opt(&mut pairs, "email", self.email.as_ref());
        push_opt(&mut pairs, "suspended", self.suspended.as_ref());
        push_opt(&mut pairs, "max-buckets", self.max_buckets.as_ref());
        push_opt(&mut pairs, "generate-key", self.generate_key.as_ref());
        push_opt(&mut pairs, "key-type", self.key_type.as_ref());
        push_opt(&mut pairs, "user-caps", self.user_caps.as_ref());
        pairs
    }
}

/// Parameters for `PUT /admin/user?quota`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuotaRequest {
    pub uid: String,
    /// `user` or `bucket`
    pub quota_type: String,
    pub enabled: Option<bool>,
    pub check_on_raw: bool,
    pub max_size: Option<i64>,
    pub max_size_kb: Option<i64>,
    pub max_objects: Option<i64>,
}

impl QuotaRequest {
    /// Query parameters for the request, in a stable order
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("uid", self.uid.clone()),
            ("quota-type", self.quota_type.clone()),
        ];
        push_opt(&mut pairs, "enabled", self.enabled.as_ref());
        pairs.push(("check-on-raw", self.check_on_raw.to_string()));
        push_opt(&mut pairs, "max-size", self.max_size.as_ref());
        push_opt(&mut pairs, "max-size-kb", self.max_size_kb.as_ref());
        push_opt(&mut pairs, "max-objects", self.max_objects.as_ref());
        pairs
    }
}

fn push_opt<T: ToString>(
    pairs: &mut Vec<(&'static str, String)>,
    key: &'static str,
    value: Option<&T>,
) {
    if let Some(value) = value {
        pairs.push((key, value.to_string()));
    }
}
