//! Schema - Define type schemas for resources
//!
//! Providers define schemas for each resource type, enabling validation of
//! caller-supplied configuration and of the state flattened back from the
//! remote system.

use std::collections::HashMap;
use std::fmt;

use crate::resource::Value;

/// Placeholder rendered in place of sensitive values
pub const SENSITIVE_PLACEHOLDER: &str = "(sensitive)";

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Boolean
    Bool,
    /// Enum (list of allowed values)
    Enum(Vec<String>),
    /// List
    List(Box<AttributeType>),
    /// Map
    Map(Box<AttributeType>),
    /// Nested record with its own attribute schemas
    Object(Vec<AttributeSchema>),
}

impl AttributeType {
    /// Check if a value conforms to this type
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match (self, value) {
            (AttributeType::String, Value::String(_)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Enum(variants), Value::String(s)) => {
                if variants.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(TypeError::InvalidEnumVariant {
                        value: s.clone(),
                        expected: variants.clone(),
                    })
                }
            }

            (AttributeType::List(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.validate(item).map_err(|e| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Map(inner), Value::Map(map)) => {
                for (k, v) in map {
                    inner.validate(v).map_err(|e| TypeError::MapValueError {
                        key: k.clone(),
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Object(fields), Value::Map(map)) => {
                for (k, v) in map {
                    let field = fields
                        .iter()
                        .find(|f| &f.name == k)
                        .ok_or_else(|| TypeError::UnknownAttribute { name: k.clone() })?;
                    field
                        .attr_type
                        .validate(v)
                        .map_err(|e| TypeError::MapValueError {
                            key: k.clone(),
                            inner: Box::new(e),
                        })?;
                }
                Ok(())
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name(),
            }),
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Enum(variants) => format!("Enum({})", variants.join(" | ")),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Map(inner) => format!("Map<{}>", inner.type_name()),
            AttributeType::Object(_) => "Object".to_string(),
        }
    }

    /// Replace sensitive leaves inside nested values
    fn redact(&self, value: &Value) -> Value {
        match (self, value) {
            (AttributeType::List(inner), Value::List(items)) => {
                Value::List(items.iter().map(|item| inner.redact(item)).collect())
            }
            (AttributeType::Map(inner), Value::Map(map)) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), inner.redact(v)))
                    .collect(),
            ),
            (AttributeType::Object(fields), Value::Map(map)) => Value::Map(
                map.iter()
                    .map(|(k, v)| {
                        let redacted = match fields.iter().find(|f| &f.name == k) {
                            Some(field) => field.redact(v),
                            None => v.clone(),
                        };
                        (k.clone(), redacted)
                    })
                    .collect(),
            ),
            _ => value.clone(),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Type error
#[derive(Debug, Clone, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Invalid enum variant '{value}', expected one of: {}", expected.join(", "))]
    InvalidEnumVariant {
        value: String,
        expected: Vec<String>,
    },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Unknown attribute '{name}'")]
    UnknownAttribute { name: String },

    #[error("Attribute '{name}' is computed and cannot be set")]
    ComputedOnly { name: String },

    #[error("Attribute '{name}': {inner}")]
    AttributeError { name: String, inner: Box<TypeError> },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },

    #[error("Map value for key '{key}': {inner}")]
    MapValueError { key: String, inner: Box<TypeError> },
}

impl Value {
    fn type_name(&self) -> String {
        match self {
            Value::String(_) => "String".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::List(_) => "List".to_string(),
            Value::Map(_) => "Map".to_string(),
        }
    }
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    /// Must be supplied by the caller
    pub required: bool,
    /// May be supplied by the caller
    pub optional: bool,
    /// Populated from the remote system
    pub computed: bool,
    /// Changing the value forces replacement instead of an in-place update
    pub force_new: bool,
    /// Value must not be shown in plain output
    pub sensitive: bool,
    /// Directive consumed by a lifecycle call, never read back
    pub write_only: bool,
    pub default: Option<Value>,
    pub description: Option<String>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            optional: false,
            computed: false,
            force_new: false,
            sensitive: false,
            write_only: false,
            default: None,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn write_only(mut self) -> Self {
        self.optional = true;
        self.write_only = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Whether the caller may supply this attribute
    pub fn is_configurable(&self) -> bool {
        self.required || self.optional
    }

    fn redact(&self, value: &Value) -> Value {
        if self.sensitive {
            Value::String(SENSITIVE_PLACEHOLDER.to_string())
        } else {
            self.attr_type.redact(value)
        }
    }
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: HashMap<String, AttributeSchema>,
    pub description: Option<String>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
            description: None,
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Validate caller-supplied configuration
    ///
    /// Checks required attributes, rejects computed-only and unknown
    /// attributes, and type checks everything else.
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        let mut errors = Vec::new();

        for (name, schema) in &self.attributes {
            if schema.required && !attributes.contains_key(name) && schema.default.is_none() {
                errors.push(TypeError::MissingRequired { name: name.clone() });
            }
        }

        for (name, value) in attributes {
            match self.attributes.get(name) {
                Some(schema) if !schema.is_configurable() => {
                    errors.push(TypeError::ComputedOnly { name: name.clone() });
                }
                Some(schema) => {
                    if let Err(e) = schema.attr_type.validate(value) {
                        errors.push(TypeError::AttributeError {
                            name: name.clone(),
                            inner: Box::new(e),
                        });
                    }
                }
                None => errors.push(TypeError::UnknownAttribute { name: name.clone() }),
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Type check attributes about to be stored as state
    ///
    /// Unlike [`ResourceSchema::validate`], computed attributes are expected
    /// here and nothing is required.
    pub fn check_state(&self, attributes: &HashMap<String, Value>) -> Result<(), TypeError> {
        for (name, value) in attributes {
            let schema = self
                .attributes
                .get(name)
                .ok_or_else(|| TypeError::UnknownAttribute { name: name.clone() })?;
            schema
                .attr_type
                .validate(value)
                .map_err(|e| TypeError::AttributeError {
                    name: name.clone(),
                    inner: Box::new(e),
                })?;
        }
        Ok(())
    }

    /// Fill in schema defaults for attributes the caller left unset
    pub fn apply_defaults(&self, attributes: &mut HashMap<String, Value>) {
        for (name, schema) in &self.attributes {
            if let Some(default) = &schema.default
                && !attributes.contains_key(name)
            {
                attributes.insert(name.clone(), default.clone());
            }
        }
    }

    /// Attributes the caller configured that must be carried into state
    ///
    /// Anything computed is dropped, including optional+computed values; those
    /// always come from the remote system on the next read.
    pub fn configured(&self, attributes: &HashMap<String, Value>) -> HashMap<String, Value> {
        attributes
            .iter()
            .filter(|(name, _)| {
                self.attributes
                    .get(name.as_str())
                    .is_some_and(|s| s.is_configurable() && !s.computed)
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Names of force-new attributes whose value differs between two maps
    ///
    /// A missing attribute and an empty string are treated as the same value.
    pub fn replacement_attributes(
        &self,
        from: &HashMap<String, Value>,
        to: &HashMap<String, Value>,
    ) -> Vec<String> {
        let mut changed: Vec<String> = self
            .attributes
            .values()
            .filter(|s| s.force_new)
            .filter(|s| normalized(from.get(&s.name)) != normalized(to.get(&s.name)))
            .map(|s| s.name.clone())
            .collect();
        changed.sort();
        changed
    }

    /// Copy of the attributes with sensitive values masked
    pub fn redacted(&self, attributes: &HashMap<String, Value>) -> HashMap<String, Value> {
        attributes
            .iter()
            .map(|(name, value)| {
                let redacted = match self.attributes.get(name) {
                    Some(schema) => schema.redact(value),
                    None => value.clone(),
                };
                (name.clone(), redacted)
            })
            .collect()
    }
}

fn normalized(value: Option<&Value>) -> Option<&Value> {
    match value {
        Some(Value::String(s)) if s.is_empty() => None,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket_schema() -> ResourceSchema {
        ResourceSchema::new("bucket")
            .attribute(
                AttributeSchema::new("name", AttributeType::String)
                    .required()
                    .force_new(),
            )
            .attribute(AttributeSchema::new("count", AttributeType::Int).optional())
            .attribute(
                AttributeSchema::new("enabled", AttributeType::Bool)
                    .optional()
                    .with_default(Value::Bool(true)),
            )
            .attribute(AttributeSchema::new("owner", AttributeType::String).computed())
            .attribute(
                AttributeSchema::new(
                    "keys",
                    AttributeType::List(Box::new(AttributeType::Object(vec![
                        AttributeSchema::new("access_key", AttributeType::String).computed(),
                        AttributeSchema::new("secret_key", AttributeType::String)
                            .computed()
                            .sensitive(),
                    ]))),
                )
                .computed(),
            )
    }

    #[test]
    fn validate_string_type() {
        let t = AttributeType::String;
        assert!(t.validate(&Value::String("hello".to_string())).is_ok());
        assert!(t.validate(&Value::Int(42)).is_err());
    }

    #[test]
    fn validate_enum_type() {
        let t = AttributeType::Enum(vec!["user".to_string(), "bucket".to_string()]);
        assert!(t.validate(&Value::String("user".to_string())).is_ok());
        assert!(t.validate(&Value::String("object".to_string())).is_err());
    }

    #[test]
    fn validate_object_type_rejects_unknown_field() {
        let t = AttributeType::Object(vec![AttributeSchema::new(
            "enabled",
            AttributeType::Bool,
        )]);
        let mut map = HashMap::new();
        map.insert("enabled".to_string(), Value::Bool(true));
        assert!(t.validate(&Value::Map(map.clone())).is_ok());

        map.insert("bogus".to_string(), Value::Int(1));
        assert!(matches!(
            t.validate(&Value::Map(map)),
            Err(TypeError::UnknownAttribute { .. })
        ));
    }

    #[test]
    fn missing_required_attribute() {
        let schema = bucket_schema();
        let result = schema.validate(&HashMap::new());
        let errors = result.unwrap_err();
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, TypeError::MissingRequired { name } if name == "name"))
        );
    }

    #[test]
    fn computed_attribute_cannot_be_configured() {
        let schema = bucket_schema();
        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::String("b".to_string()));
        attrs.insert("owner".to_string(), Value::String("me".to_string()));
        let errors = schema.validate(&attrs).unwrap_err();
        assert!(matches!(&errors[0], TypeError::ComputedOnly { name } if name == "owner"));
    }

    #[test]
    fn check_state_accepts_computed_and_rejects_mismatch() {
        let schema = bucket_schema();
        let mut attrs = HashMap::new();
        attrs.insert("owner".to_string(), Value::String("me".to_string()));
        assert!(schema.check_state(&attrs).is_ok());

        attrs.insert("count".to_string(), Value::String("five".to_string()));
        let err = schema.check_state(&attrs).unwrap_err();
        assert!(err.to_string().contains("count"));
    }

    #[test]
    fn apply_defaults_only_fills_unset() {
        let schema = bucket_schema();
        let mut attrs = HashMap::new();
        schema.apply_defaults(&mut attrs);
        assert_eq!(attrs.get("enabled"), Some(&Value::Bool(true)));

        let mut attrs = HashMap::new();
        attrs.insert("enabled".to_string(), Value::Bool(false));
        schema.apply_defaults(&mut attrs);
        assert_eq!(attrs.get("enabled"), Some(&Value::Bool(false)));
    }

    #[test]
    fn configured_drops_every_computed_value() {
        let schema = bucket_schema().attribute(
            AttributeSchema::new("size", AttributeType::Int)
                .optional()
                .computed(),
        );
        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::String("b".to_string()));
        attrs.insert("count".to_string(), Value::Int(3));
        attrs.insert("size".to_string(), Value::Int(5));
        attrs.insert("owner".to_string(), Value::String("me".to_string()));

        let configured = schema.configured(&attrs);
        assert_eq!(configured.len(), 2);
        assert_eq!(configured.get("count"), Some(&Value::Int(3)));
        assert!(!configured.contains_key("size"));
        assert!(!configured.contains_key("owner"));
    }

    #[test]
    fn replacement_attributes_ignore_empty_strings() {
        let schema = bucket_schema();
        let mut from = HashMap::new();
        from.insert("name".to_string(), Value::String("a".to_string()));
        from.insert("count".to_string(), Value::Int(1));

        let mut to = from.clone();
        to.insert("count".to_string(), Value::Int(2));
        assert!(schema.replacement_attributes(&from, &to).is_empty());

        to.insert("name".to_string(), Value::String("b".to_string()));
        assert_eq!(schema.replacement_attributes(&from, &to), vec!["name"]);

        let empty = HashMap::new();
        let mut blank = HashMap::new();
        blank.insert("name".to_string(), Value::String(String::new()));
        assert!(schema.replacement_attributes(&empty, &blank).is_empty());
    }

    #[test]
    fn redacted_masks_nested_sensitive_fields() {
        let schema = bucket_schema();
        let mut key = HashMap::new();
        key.insert("access_key".to_string(), Value::String("AK".to_string()));
        key.insert("secret_key".to_string(), Value::String("SK".to_string()));
        let mut attrs = HashMap::new();
        attrs.insert("keys".to_string(), Value::List(vec![Value::Map(key)]));

        let redacted = schema.redacted(&attrs);
        let Some(Value::List(keys)) = redacted.get("keys") else {
            panic!("expected keys list");
        };
        let Value::Map(first) = &keys[0] else {
            panic!("expected key record");
        };
        assert_eq!(first.get("access_key"), Some(&Value::String("AK".to_string())));
        assert_eq!(
            first.get("secret_key"),
            Some(&Value::String(SENSITIVE_PLACEHOLDER.to_string()))
        );
    }
}
