//! Quota expansion and flattening
//!
//! Quotas have no lifecycle of their own on the gateway: they are part of the
//! user record and are written through `PUT /admin/user?quota`.

use std::collections::HashMap;

use rgw_admin::{QuotaRequest, QuotaSpec, User};
use rgw_core::resource::{Attributes, Value};
use rgw_core::schema::TypeError;

use crate::identity::{QuotaType, compose_quota_identity};

/// A standalone quota as declared by the caller
#[derive(Debug, Clone, PartialEq)]
pub struct QuotaResourceSpec {
    pub user_id: String,
    pub quota_type: QuotaType,
    pub enabled: Option<bool>,
    pub check_on_raw: bool,
    pub max_size: Option<i64>,
    pub max_size_kb: Option<i64>,
    pub max_objects: Option<i64>,
}

impl QuotaResourceSpec {
    /// Parse a validated attribute map with schema defaults applied
    pub fn from_attributes(attributes: &HashMap<String, Value>) -> Result<Self, TypeError> {
        let user_id = attributes
            .get_string("user_id")
            .ok_or_else(|| TypeError::MissingRequired {
                name: "user_id".to_string(),
            })?;
        let raw_type = attributes
            .get_string("type")
            .ok_or_else(|| TypeError::MissingRequired {
                name: "type".to_string(),
            })?;
        let quota_type = raw_type
            .parse::<QuotaType>()
            .map_err(|_| TypeError::InvalidEnumVariant {
                value: raw_type.to_string(),
                expected: QuotaType::ALL.iter().map(|t| t.to_string()).collect(),
            })?;

        Ok(Self {
            user_id: user_id.to_string(),
            quota_type,
            enabled: attributes.get_bool("enabled"),
            check_on_raw: attributes.get_bool("check_on_raw").unwrap_or(false),
            max_size: attributes.get_int("max_size"),
            max_size_kb: attributes.get_int("max_size_kb"),
            max_objects: attributes.get_int("max_objects"),
        })
    }

    /// `<type>_<user_id>`
    pub fn identity(&self) -> String {
        compose_quota_identity(self.quota_type, &self.user_id)
    }

    /// Request setting the quota as declared
    pub fn expand(&self) -> QuotaRequest {
        QuotaRequest {
            uid: self.user_id.clone(),
            quota_type: self.quota_type.to_string(),
            enabled: self.enabled,
            check_on_raw: self.check_on_raw,
            max_size: self.max_size,
            max_size_kb: self.max_size_kb,
            max_objects: self.max_objects,
        }
    }

    /// Request disabling the quota; limits are sent unchanged
    pub fn expand_delete(&self) -> QuotaRequest {
        QuotaRequest {
            enabled: Some(false),
            ..self.expand()
        }
    }
}

/// Quota sub-record of the given type
pub fn select_quota(user: &User, quota_type: QuotaType) -> &QuotaSpec {
    match quota_type {
        QuotaType::User => &user.user_quota,
        QuotaType::Bucket => &user.bucket_quota,
    }
}

/// Quota in attribute form
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedQuota {
    /// Owning identity, absent when unknown
    pub user_id: Option<String>,
    pub quota_type: QuotaType,
    pub enabled: bool,
    pub check_on_raw: bool,
    pub max_size: Option<i64>,
    pub max_size_kb: Option<i64>,
    pub max_objects: Option<i64>,
}

/// Flatten a quota sub-record, tagging it with its type and owner
pub fn flatten_quota(quota: &QuotaSpec, quota_type: QuotaType, owner: &str) -> FlattenedQuota {
    FlattenedQuota {
        user_id: (!owner.is_empty()).then(|| owner.to_string()),
        quota_type,
        enabled: quota.enabled.unwrap_or_default(),
        check_on_raw: quota.check_on_raw,
        max_size: quota.max_size,
        max_size_kb: quota.max_size_kb,
        max_objects: quota.max_objects,
    }
}

impl FlattenedQuota {
    pub fn into_attributes(self) -> HashMap<String, Value> {
        let mut attrs = HashMap::new();
        if let Some(user_id) = self.user_id {
            attrs.insert("user_id".to_string(), Value::String(user_id));
        }
        attrs.insert(
            "type".to_string(),
            Value::String(self.quota_type.to_string()),
        );
        attrs.insert("enabled".to_string(), Value::Bool(self.enabled));
        attrs.insert("check_on_raw".to_string(), Value::Bool(self.check_on_raw));
        for (key, value) in [
            ("max_size", self.max_size),
            ("max_size_kb", self.max_size_kb),
            ("max_objects", self.max_objects),
        ] {
            if let Some(value) = value {
                attrs.insert(key.to_string(), Value::Int(value));
            }
        }
        attrs
    }

    /// Nested form used inside a user
    pub fn into_value(self) -> Value {
        Value::Map(self.into_attributes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::quota_schema;

    fn declared(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        let mut attrs: HashMap<String, Value> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        quota_schema().apply_defaults(&mut attrs);
        attrs
    }

    #[test]
    fn expand_applies_defaults() {
        let spec = QuotaResourceSpec::from_attributes(&declared(&[
            ("user_id", Value::from("u1")),
            ("type", Value::from("user")),
            ("max_objects", Value::Int(100)),
        ]))
        .unwrap();
        assert_eq!(spec.identity(), "user_u1");

        let request = spec.expand();
        assert_eq!(request.uid, "u1");
        assert_eq!(request.quota_type, "user");
        assert_eq!(request.enabled, Some(true));
        assert!(!request.check_on_raw);
        assert_eq!(request.max_objects, Some(100));
        assert_eq!(request.max_size, None);
    }

    #[test]
    fn delete_disables_and_keeps_limits() {
        let spec = QuotaResourceSpec::from_attributes(&declared(&[
            ("user_id", Value::from("u1")),
            ("type", Value::from("bucket")),
            ("check_on_raw", Value::Bool(true)),
            ("max_size", Value::Int(1024)),
            ("max_objects", Value::Int(10)),
        ]))
        .unwrap();

        let request = spec.expand_delete();
        assert_eq!(request.enabled, Some(false));
        assert_eq!(
            request,
            QuotaRequest {
                enabled: Some(false),
                ..spec.expand()
            }
        );
        assert!(request.check_on_raw);
        assert_eq!(request.max_size, Some(1024));
    }

    #[test]
    fn user_quota_scenario() {
        let user = User {
            id: "u1".to_string(),
            user_quota: QuotaSpec {
                enabled: Some(true),
                max_size: Some(500),
                ..Default::default()
            },
            bucket_quota: QuotaSpec {
                enabled: Some(false),
                max_objects: Some(7),
                ..Default::default()
            },
            ..Default::default()
        };

        let flattened = flatten_quota(select_quota(&user, QuotaType::User), QuotaType::User, "u1");
        let attrs = flattened.into_attributes();
        assert_eq!(attrs.get("enabled"), Some(&Value::Bool(true)));
        assert_eq!(attrs.get("max_size"), Some(&Value::Int(500)));
        assert_eq!(attrs.get("user_id"), Some(&Value::from("u1")));
        assert_eq!(attrs.get("type"), Some(&Value::from("user")));
        assert!(!attrs.contains_key("max_objects"));
    }

    #[test]
    fn empty_owner_is_not_injected() {
        let flattened = flatten_quota(&QuotaSpec::default(), QuotaType::Bucket, "");
        assert_eq!(flattened.user_id, None);
        assert!(!flattened.enabled);
        assert!(!flattened.into_attributes().contains_key("user_id"));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let attrs = declared(&[
            ("user_id", Value::from("u1")),
            ("type", Value::from("object")),
        ]);
        assert!(matches!(
            QuotaResourceSpec::from_attributes(&attrs),
            Err(TypeError::InvalidEnumVariant { .. })
        ));
    }
}
