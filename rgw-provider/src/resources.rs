//! Resource type definitions and schemas
//!
//! This module defines:
//! - Resource and data source types (implementing the ResourceType trait)
//! - Attribute schemas for `user`, `quota` and the `user` data source

use rgw_core::provider::ResourceType;
use rgw_core::resource::Value;
use rgw_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use crate::identity::QuotaType;

pub const USER: &str = "user";
pub const QUOTA: &str = "quota";

// =============================================================================
// Resource Type Definitions
// =============================================================================

macro_rules! define_resource_type {
    ($name:ident, $type_name:expr, $schema:expr) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $type_name
            }
            fn schema(&self) -> ResourceSchema {
                $schema
            }
        }
    };
}

define_resource_type!(UserType, USER, user_schema());
define_resource_type!(QuotaResourceType, QUOTA, quota_schema());
define_resource_type!(UserDataSourceType, USER, user_data_source_schema());

/// Returns all resource types supported by this provider
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    vec![Box::new(UserType), Box::new(QuotaResourceType)]
}

/// Returns all data sources supported by this provider
pub fn data_source_types() -> Vec<Box<dyn ResourceType>> {
    vec![Box::new(UserDataSourceType)]
}

/// Schema of a managed resource type
pub fn schema_for(resource_type: &str) -> Option<ResourceSchema> {
    match resource_type {
        USER => Some(user_schema()),
        QUOTA => Some(quota_schema()),
        _ => None,
    }
}

// =============================================================================
// Schemas
// =============================================================================

fn computed(name: &str, attr_type: AttributeType) -> AttributeSchema {
    AttributeSchema::new(name, attr_type).computed()
}

fn record(fields: Vec<AttributeSchema>) -> AttributeType {
    AttributeType::Object(fields)
}

fn list_of(fields: Vec<AttributeSchema>) -> AttributeType {
    AttributeType::List(Box::new(record(fields)))
}

fn quota_type_enum() -> AttributeType {
    AttributeType::Enum(
        QuotaType::ALL
            .iter()
            .map(|t| t.as_str().to_string())
            .collect(),
    )
}

/// Quota sub-record nested in a user
fn quota_block() -> AttributeType {
    record(vec![
        computed("user_id", AttributeType::String),
        computed("type", quota_type_enum()),
        computed("enabled", AttributeType::Bool),
        computed("check_on_raw", AttributeType::Bool),
        computed("max_size", AttributeType::Int),
        computed("max_size_kb", AttributeType::Int),
        computed("max_objects", AttributeType::Int),
    ])
}

/// Attributes read back from the gateway for every user
fn computed_user_attributes(schema: ResourceSchema) -> ResourceSchema {
    schema
        .attribute(computed(
            "subusers",
            list_of(vec![
                computed("id", AttributeType::String),
                computed("permissions", AttributeType::String),
            ]),
        ))
        .attribute(computed(
            "keys",
            list_of(vec![
                computed("user", AttributeType::String),
                computed("access_key", AttributeType::String).sensitive(),
                computed("secret_key", AttributeType::String).sensitive(),
            ]),
        ))
        .attribute(computed(
            "swift_keys",
            list_of(vec![
                computed("user", AttributeType::String),
                computed("secret_key", AttributeType::String).sensitive(),
            ]),
        ))
        .attribute(computed(
            "caps",
            list_of(vec![
                computed("type", AttributeType::String),
                computed("perm", AttributeType::String),
            ]),
        ))
        .attribute(computed("op_mask", AttributeType::String))
        .attribute(computed("default_placement", AttributeType::String))
        .attribute(computed("default_storage_class", AttributeType::String))
        .attribute(computed(
            "placement_tags",
            AttributeType::List(Box::new(AttributeType::String)),
        ))
        .attribute(computed("bucket_quota", quota_block()))
        .attribute(computed("user_quota", quota_block()))
        .attribute(computed("type", AttributeType::String))
}

/// Schema of the `user` resource
pub fn user_schema() -> ResourceSchema {
    let schema = ResourceSchema::new(USER)
        .with_description("A Ceph Object Gateway user")
        .attribute(
            AttributeSchema::new("user_id", AttributeType::String)
                .required()
                .force_new()
                .with_description("User id, without the tenant"),
        )
        .attribute(
            AttributeSchema::new("tenant", AttributeType::String)
                .optional()
                .force_new()
                .with_description("Tenant owning the user"),
        )
        .attribute(
            AttributeSchema::new("display_name", AttributeType::String)
                .optional()
                .computed(),
        )
        .attribute(
            AttributeSchema::new("email", AttributeType::String)
                .optional()
                .computed(),
        )
        .attribute(
            AttributeSchema::new("suspended", AttributeType::Int)
                .optional()
                .computed(),
        )
        .attribute(
            AttributeSchema::new("max_buckets", AttributeType::Int)
                .optional()
                .computed(),
        )
        .attribute(
            AttributeSchema::new("generate_key", AttributeType::Bool)
                .write_only()
                .with_description("Generate a key pair on create or update"),
        )
        .attribute(
            AttributeSchema::new(
                "key_type",
                AttributeType::Enum(vec!["s3".to_string(), "swift".to_string()]),
            )
            .write_only(),
        )
        .attribute(
            AttributeSchema::new("user_caps", AttributeType::String)
                .write_only()
                .with_description("Capabilities to grant, e.g. \"usage=read, write; users=read\""),
        )
        .attribute(
            AttributeSchema::new("purge_data", AttributeType::Int)
                .write_only()
                .with_description("Purge the user's data on deletion"),
        );
    computed_user_attributes(schema)
}

/// Schema of the `user` data source
pub fn user_data_source_schema() -> ResourceSchema {
    let schema = ResourceSchema::new(USER)
        .with_description("Look up an existing Ceph Object Gateway user")
        .attribute(AttributeSchema::new("user_id", AttributeType::String).required())
        .attribute(AttributeSchema::new("tenant", AttributeType::String).optional())
        .attribute(computed("display_name", AttributeType::String))
        .attribute(computed("email", AttributeType::String))
        .attribute(computed("suspended", AttributeType::Int))
        .attribute(computed("max_buckets", AttributeType::Int));
    computed_user_attributes(schema)
}

/// Schema of the `quota` resource
pub fn quota_schema() -> ResourceSchema {
    ResourceSchema::new(QUOTA)
        .with_description(
            "User or bucket quota of a gateway user. Upon deletion, the quota is disabled.",
        )
        .attribute(
            AttributeSchema::new("user_id", AttributeType::String)
                .required()
                .force_new()
                .with_description("The ID of the user to set the quota for"),
        )
        .attribute(
            AttributeSchema::new("type", quota_type_enum())
                .required()
                .force_new()
                .with_description("`user` or `bucket`"),
        )
        .attribute(
            AttributeSchema::new("enabled", AttributeType::Bool)
                .optional()
                .with_default(Value::Bool(true)),
        )
        .attribute(
            AttributeSchema::new("check_on_raw", AttributeType::Bool)
                .optional()
                .with_default(Value::Bool(false)),
        )
        .attribute(
            AttributeSchema::new("max_size", AttributeType::Int)
                .optional()
                .computed(),
        )
        .attribute(
            AttributeSchema::new("max_size_kb", AttributeType::Int)
                .optional()
                .computed(),
        )
        .attribute(
            AttributeSchema::new("max_objects", AttributeType::Int)
                .optional()
                .computed(),
        )
}
