//! User expansion and flattening
//!
//! `UserSpec` is the caller's declaration parsed out of an attribute map and
//! expands into Admin Ops requests. `flatten_user` goes the other way, from
//! the gateway's record to typed records rendered back into attributes.

use std::collections::HashMap;

use rgw_admin::{SubuserSpec, SwiftKeySpec, User, UserCapSpec, UserKeySpec, UserRequest};
use rgw_core::resource::{Attributes, Value};
use rgw_core::schema::TypeError;

use crate::identity::{QuotaType, compose_identity, split_identity};
use crate::quota::{FlattenedQuota, flatten_quota, select_quota};

/// A user as declared by the caller
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserSpec {
    pub user_id: String,
    pub tenant: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub suspended: Option<i64>,
    pub max_buckets: Option<i64>,
    pub generate_key: Option<bool>,
    pub key_type: Option<String>,
    pub user_caps: Option<String>,
    pub purge_data: Option<i64>,
}

impl UserSpec {
    /// Parse a validated attribute map
    pub fn from_attributes(attributes: &HashMap<String, Value>) -> Result<Self, TypeError> {
        let user_id = attributes
            .get_string("user_id")
            .ok_or_else(|| TypeError::MissingRequired {
                name: "user_id".to_string(),
            })?;
        let string = |key: &str| {
            attributes
                .attribute(key)
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        Ok(Self {
            user_id: user_id.to_string(),
            tenant: attributes.get_string("tenant").map(str::to_string),
            display_name: string("display_name"),
            email: string("email"),
            suspended: attributes.get_int("suspended"),
            max_buckets: attributes.get_int("max_buckets"),
            generate_key: attributes.get_bool("generate_key"),
            key_type: string("key_type"),
            user_caps: string("user_caps"),
            purge_data: attributes.get_int("purge_data"),
        })
    }

    /// `tenant$user_id`, or the bare user id without a tenant
    pub fn identity(&self) -> String {
        compose_identity(self.tenant.as_deref().unwrap_or_default(), &self.user_id)
    }

    /// Request for `PUT /admin/user`
    pub fn expand_create(&self) -> UserRequest {
        self.expand(self.identity())
    }

    /// Request for `POST /admin/user` on the user tracked as `identity`
    ///
    /// `generate_key`, `key_type` and `user_caps` act once on the gateway, so
    /// they are only sent when they differ from the `previous` state.
    pub fn expand_modify(
        &self,
        identity: &str,
        previous: &HashMap<String, Value>,
    ) -> UserRequest {
        let previous_str = |key: &str| previous.attribute(key).and_then(Value::as_str);
        let mut request = self.expand(identity.to_string());
        if request.generate_key == previous.get_bool("generate_key") {
            request.generate_key = None;
        }
        if request.key_type.as_deref() == previous_str("key_type") {
            request.key_type = None;
        }
        if request.user_caps.as_deref() == previous_str("user_caps") {
            request.user_caps = None;
        }
        request
    }

    /// `purge-data` value for removal
    pub fn purge(&self) -> Option<i64> {
        self.purge_data
    }

    fn expand(&self, uid: String) -> UserRequest {
        UserRequest {
            uid,
            display_name: self.display_name.clone(),
            email: self.email.clone(),
            suspended: self.suspended,
            max_buckets: self.max_buckets,
            generate_key: self.generate_key,
            key_type: self.key_type.clone(),
            user_caps: self.user_caps.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedSubuser {
    pub id: String,
    pub permissions: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedKey {
    pub user: String,
    pub access_key: String,
    pub secret_key: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedSwiftKey {
    pub user: String,
    pub secret_key: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedCap {
    pub cap_type: String,
    pub perm: String,
}

/// Gateway user in attribute form
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedUser {
    pub user_id: String,
    pub tenant: String,
    pub display_name: String,
    pub email: String,
    pub suspended: Option<i64>,
    pub max_buckets: Option<i64>,
    pub subusers: Vec<FlattenedSubuser>,
    pub keys: Vec<FlattenedKey>,
    pub swift_keys: Vec<FlattenedSwiftKey>,
    pub caps: Vec<FlattenedCap>,
    pub op_mask: String,
    pub default_placement: String,
    pub default_storage_class: String,
    pub placement_tags: Vec<String>,
    pub bucket_quota: FlattenedQuota,
    pub user_quota: FlattenedQuota,
    pub user_type: String,
}

fn flatten_subuser(subuser: &SubuserSpec) -> FlattenedSubuser {
    FlattenedSubuser {
        id: subuser.id.clone(),
        permissions: subuser.permissions.clone(),
    }
}

fn flatten_key(key: &UserKeySpec) -> FlattenedKey {
    FlattenedKey {
        user: key.user.clone(),
        access_key: key.access_key.clone(),
        secret_key: key.secret_key.clone(),
    }
}

fn flatten_swift_key(key: &SwiftKeySpec) -> FlattenedSwiftKey {
    FlattenedSwiftKey {
        user: key.user.clone(),
        secret_key: key.secret_key.clone(),
    }
}

fn flatten_cap(cap: &UserCapSpec) -> FlattenedCap {
    FlattenedCap {
        cap_type: cap.cap_type.clone(),
        perm: cap.perm.clone(),
    }
}

/// Flatten a gateway user
///
/// The gateway reports tenanted ids as `tenant$uid`; `user_id` is always the
/// part after the separator. Nested quotas are owned by the full identity.
pub fn flatten_user(user: &User) -> FlattenedUser {
    let (id_tenant, user_id) = split_identity(&user.id);
    let tenant = if user.tenant.is_empty() {
        id_tenant.unwrap_or_default().to_string()
    } else {
        user.tenant.clone()
    };
    let owner = compose_identity(&tenant, user_id);

    FlattenedUser {
        user_id: user_id.to_string(),
        display_name: user.display_name.clone(),
        email: user.email.clone(),
        suspended: user.suspended,
        max_buckets: user.max_buckets,
        subusers: user.subusers.iter().map(flatten_subuser).collect(),
        keys: user.keys.iter().map(flatten_key).collect(),
        swift_keys: user.swift_keys.iter().map(flatten_swift_key).collect(),
        caps: user.caps.iter().map(flatten_cap).collect(),
        op_mask: user.op_mask.clone(),
        default_placement: user.default_placement.clone(),
        default_storage_class: user.default_storage_class.clone(),
        placement_tags: user.placement_tags.clone(),
        bucket_quota: flatten_quota(
            select_quota(user, QuotaType::Bucket),
            QuotaType::Bucket,
            &owner,
        ),
        user_quota: flatten_quota(select_quota(user, QuotaType::User), QuotaType::User, &owner),
        user_type: user.user_type.clone(),
        tenant,
    }
}

fn record<const N: usize>(fields: [(&str, Value); N]) -> Value {
    Value::Map(
        fields
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    )
}

impl FlattenedUser {
    /// Render into attributes; unset optional values stay absent
    pub fn into_attributes(self) -> HashMap<String, Value> {
        let mut attrs = HashMap::new();
        attrs.insert("user_id".to_string(), Value::String(self.user_id));
        if !self.tenant.is_empty() {
            attrs.insert("tenant".to_string(), Value::String(self.tenant));
        }
        attrs.insert("display_name".to_string(), Value::String(self.display_name));
        attrs.insert("email".to_string(), Value::String(self.email));
        if let Some(suspended) = self.suspended {
            attrs.insert("suspended".to_string(), Value::Int(suspended));
        }
        if let Some(max_buckets) = self.max_buckets {
            attrs.insert("max_buckets".to_string(), Value::Int(max_buckets));
        }

        let subusers = self
            .subusers
            .into_iter()
            .map(|s| {
                record([
                    ("id", Value::String(s.id)),
                    ("permissions", Value::String(s.permissions)),
                ])
            })
            .collect();
        attrs.insert("subusers".to_string(), Value::List(subusers));

        let keys = self
            .keys
            .into_iter()
            .map(|k| {
                record([
                    ("user", Value::String(k.user)),
                    ("access_key", Value::String(k.access_key)),
                    ("secret_key", Value::String(k.secret_key)),
                ])
            })
            .collect();
        attrs.insert("keys".to_string(), Value::List(keys));

        let swift_keys = self
            .swift_keys
            .into_iter()
            .map(|k| {
                record([
                    ("user", Value::String(k.user)),
                    ("secret_key", Value::String(k.secret_key)),
                ])
            })
            .collect();
        attrs.insert("swift_keys".to_string(), Value::List(swift_keys));

        let caps = self
            .caps
            .into_iter()
            .map(|c| {
                record([
                    ("type", Value::String(c.cap_type)),
                    ("perm", Value::String(c.perm)),
                ])
            })
            .collect();
        attrs.insert("caps".to_string(), Value::List(caps));

        attrs.insert("op_mask".to_string(), Value::String(self.op_mask));
        attrs.insert(
            "default_placement".to_string(),
            Value::String(self.default_placement),
        );
        attrs.insert(
            "default_storage_class".to_string(),
            Value::String(self.default_storage_class),
        );
        attrs.insert(
            "placement_tags".to_string(),
            Value::List(self.placement_tags.into_iter().map(Value::String).collect()),
        );
        attrs.insert("bucket_quota".to_string(), self.bucket_quota.into_value());
        attrs.insert("user_quota".to_string(), self.user_quota.into_value());
        attrs.insert("type".to_string(), Value::String(self.user_type));
        attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rgw_admin::QuotaSpec;

    fn alice() -> User {
        User {
            id: "alice".to_string(),
            display_name: "Alice".to_string(),
            max_buckets: Some(1000),
            keys: vec![UserKeySpec {
                user: "alice".to_string(),
                access_key: "AK".to_string(),
                secret_key: "SK".to_string(),
            }],
            user_quota: QuotaSpec {
                enabled: Some(true),
                max_size: Some(500),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn attrs(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn expand_create_carries_directives() {
        let spec = UserSpec::from_attributes(&attrs(&[
            ("user_id", Value::from("alice")),
            ("tenant", Value::from("t1")),
            ("display_name", Value::from("Alice")),
            ("generate_key", Value::Bool(true)),
            ("key_type", Value::from("s3")),
            ("user_caps", Value::from("users=read")),
        ]))
        .unwrap();

        let request = spec.expand_create();
        assert_eq!(request.uid, "t1$alice");
        assert_eq!(request.display_name.as_deref(), Some("Alice"));
        assert_eq!(request.generate_key, Some(true));
        assert_eq!(request.key_type.as_deref(), Some("s3"));
        assert_eq!(request.user_caps.as_deref(), Some("users=read"));
        assert_eq!(request.email, None);
    }

    #[test]
    fn expand_modify_uses_tracked_identity() {
        let spec = UserSpec::from_attributes(&attrs(&[
            ("user_id", Value::from("alice")),
            ("email", Value::from("a@example.com")),
        ]))
        .unwrap();
        let request = spec.expand_modify("t1$alice", &HashMap::new());
        assert_eq!(request.uid, "t1$alice");
        assert_eq!(request.email.as_deref(), Some("a@example.com"));
    }

    #[test]
    fn expand_modify_sends_directives_only_on_change() {
        let previous = attrs(&[
            ("user_id", Value::from("alice")),
            ("generate_key", Value::Bool(true)),
            ("key_type", Value::from("s3")),
            ("user_caps", Value::from("users=read")),
        ]);
        let unchanged = UserSpec::from_attributes(&previous)
            .unwrap()
            .expand_modify("alice", &previous);
        assert_eq!(unchanged.generate_key, None);
        assert_eq!(unchanged.key_type, None);
        assert_eq!(unchanged.user_caps, None);

        let mut desired = previous.clone();
        desired.insert("user_caps".to_string(), Value::from("users=read, write"));
        let changed = UserSpec::from_attributes(&desired)
            .unwrap()
            .expand_modify("alice", &previous);
        assert_eq!(changed.user_caps.as_deref(), Some("users=read, write"));
        assert_eq!(changed.generate_key, None);
    }

    #[test]
    fn unset_max_buckets_differs_from_zero() {
        let unset = UserSpec::from_attributes(&attrs(&[("user_id", Value::from("alice"))]))
            .unwrap()
            .expand_create();
        assert_eq!(unset.max_buckets, None);
        assert!(!unset.query_pairs().iter().any(|(k, _)| *k == "max-buckets"));

        let zero = UserSpec::from_attributes(&attrs(&[
            ("user_id", Value::from("alice")),
            ("max_buckets", Value::Int(0)),
        ]))
        .unwrap()
        .expand_create();
        assert_eq!(zero.max_buckets, Some(0));
    }

    #[test]
    fn missing_user_id_is_rejected() {
        assert!(matches!(
            UserSpec::from_attributes(&HashMap::new()),
            Err(TypeError::MissingRequired { .. })
        ));
    }

    #[test]
    fn flatten_scenario_alice() {
        let flattened = flatten_user(&alice());
        assert_eq!(flattened.user_id, "alice");

        let attrs = flattened.into_attributes();
        assert_eq!(attrs.get("display_name"), Some(&Value::from("Alice")));
        assert_eq!(attrs.get("max_buckets"), Some(&Value::Int(1000)));
        assert!(!attrs.contains_key("tenant"));
        assert!(!attrs.contains_key("suspended"));

        let Some(Value::List(keys)) = attrs.get("keys") else {
            panic!("expected key list");
        };
        assert_eq!(keys.len(), 1);
        let Value::Map(key) = &keys[0] else {
            panic!("expected key record");
        };
        assert_eq!(key.get("access_key"), Some(&Value::from("AK")));
        assert_eq!(key.get("secret_key"), Some(&Value::from("SK")));
    }

    #[test]
    fn flatten_preserves_key_order() {
        let mut user = alice();
        user.keys = ["k1", "k2", "k3"]
            .iter()
            .map(|k| UserKeySpec {
                user: "alice".to_string(),
                access_key: k.to_string(),
                secret_key: String::new(),
            })
            .collect();

        let flattened = flatten_user(&user);
        let order: Vec<_> = flattened.keys.iter().map(|k| k.access_key.as_str()).collect();
        assert_eq!(order, vec!["k1", "k2", "k3"]);
    }

    #[test]
    fn flatten_preserves_nested_list_order() {
        let mut user = alice();
        user.subusers = ["alice:a", "alice:b", "alice:c"]
            .iter()
            .map(|id| SubuserSpec {
                id: id.to_string(),
                permissions: "read".to_string(),
            })
            .collect();
        user.swift_keys = ["alice:c", "alice:a"]
            .iter()
            .map(|u| SwiftKeySpec {
                user: u.to_string(),
                secret_key: String::new(),
            })
            .collect();
        user.caps = ["users", "buckets", "metadata"]
            .iter()
            .map(|t| UserCapSpec {
                cap_type: t.to_string(),
                perm: "*".to_string(),
            })
            .collect();
        user.placement_tags = vec!["ssd".to_string(), "archive".to_string()];

        let attrs = flatten_user(&user).into_attributes();
        let field = |list: &str, key: &str| -> Vec<String> {
            let Some(Value::List(items)) = attrs.get(list) else {
                panic!("expected list {}", list);
            };
            items
                .iter()
                .map(|item| match item {
                    Value::Map(map) => map.get_string(key).unwrap_or_default().to_string(),
                    Value::String(s) => s.clone(),
                    other => panic!("unexpected element {:?}", other),
                })
                .collect()
        };
        assert_eq!(field("subusers", "id"), vec!["alice:a", "alice:b", "alice:c"]);
        assert_eq!(field("swift_keys", "user"), vec!["alice:c", "alice:a"]);
        assert_eq!(field("caps", "type"), vec!["users", "buckets", "metadata"]);
        assert_eq!(field("placement_tags", ""), vec!["ssd", "archive"]);
    }

    #[test]
    fn flatten_tenanted_user() {
        let user = User {
            id: "t1$alice".to_string(),
            tenant: "t1".to_string(),
            ..Default::default()
        };
        let flattened = flatten_user(&user);
        assert_eq!(flattened.user_id, "alice");
        assert_eq!(flattened.tenant, "t1");
        assert_eq!(flattened.user_quota.user_id.as_deref(), Some("t1$alice"));
        assert_eq!(flattened.bucket_quota.quota_type, QuotaType::Bucket);
    }

    #[test]
    fn echo_round_trip_keeps_caller_fields_without_directives() {
        let declared = attrs(&[
            ("user_id", Value::from("alice")),
            ("display_name", Value::from("Alice")),
            ("email", Value::from("alice@example.com")),
            ("suspended", Value::Int(0)),
            ("max_buckets", Value::Int(0)),
            ("generate_key", Value::Bool(true)),
            ("purge_data", Value::Int(1)),
        ]);
        let request = UserSpec::from_attributes(&declared)
            .unwrap()
            .expand_create();

        // A gateway that echoes the request back
        let echoed = User {
            id: request.uid.clone(),
            display_name: request.display_name.clone().unwrap_or_default(),
            email: request.email.clone().unwrap_or_default(),
            suspended: request.suspended,
            max_buckets: request.max_buckets,
            ..Default::default()
        };
        let flattened = flatten_user(&echoed).into_attributes();

        for key in ["user_id", "display_name", "email", "suspended", "max_buckets"] {
            assert_eq!(flattened.get(key), declared.get(key), "{}", key);
        }
        for key in ["generate_key", "key_type", "user_caps", "purge_data"] {
            assert!(!flattened.contains_key(key), "{}", key);
        }
    }
}
