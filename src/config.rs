//! Mapping configuration
//!
//! A [`MappingConfig`] is supplied once, when a serializer is built, and is
//! consulted on every class resolution. It can be assembled in code or read
//! from a JSON document using the external key names:
//!
//! ```json
//! {
//!   "extractClassFrom": "typeAttribute",
//!   "classesNamespace": "app::",
//!   "skipUnknownObjects": false,
//!   "mapperClasses": { "person": "app::Human" }
//! }
//! ```

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Where the identity key of an element is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClassIdentitySource {
    /// The element's own (local) tag name
    #[default]
    TagName,
    /// The `xsi:type` attribute
    TypeAttribute,
}

/// One step of class identity resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdentityRule {
    /// Identity key looked up in the explicit class overrides
    OverrideMap,
    /// Class declared by the parent property's setter
    Hint,
    /// Configured namespace prefix + identity key
    Namespaced,
}

/// Ordered identity rules; the first rule producing a class name wins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityPolicy {
    rules: Vec<IdentityRule>,
}

impl Default for IdentityPolicy {
    fn default() -> Self {
        Self {
            rules: vec![
                IdentityRule::OverrideMap,
                IdentityRule::Hint,
                IdentityRule::Namespaced,
            ],
        }
    }
}

impl IdentityPolicy {
    /// Policy with the given rule order
    pub fn new(rules: Vec<IdentityRule>) -> Self {
        Self { rules }
    }

    /// Rules in evaluation order
    pub fn rules(&self) -> &[IdentityRule] {
        &self.rules
    }
}

/// Configuration for the mapper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MappingConfig {
    /// Source of the identity key
    extract_class_from: ClassIdentitySource,
    /// Prefix turning an identity key into a class name
    classes_namespace: String,
    /// Whether nodes matching no property are ignored (lenient) or rejected
    skip_unknown_objects: bool,
    /// Identity key -> class name overrides
    mapper_classes: IndexMap<String, String>,
    /// Session-wide null policy: omit nulls (`true`) or nil-mark them
    skip_when_empty: bool,
    /// Order of identity rules
    identity_rules: IdentityPolicy,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            extract_class_from: ClassIdentitySource::default(),
            classes_namespace: String::new(),
            skip_unknown_objects: true,
            mapper_classes: IndexMap::new(),
            skip_when_empty: true,
            identity_rules: IdentityPolicy::default(),
        }
    }
}

impl MappingConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a configuration from a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Invalid mapping configuration: {}", e)))
    }

    /// Get the identity key source
    pub fn extract_class_from(&self) -> ClassIdentitySource {
        self.extract_class_from
    }

    /// Get the class namespace prefix
    pub fn classes_namespace(&self) -> &str {
        &self.classes_namespace
    }

    /// Check if unknown nodes are skipped
    pub fn skip_unknown_objects(&self) -> bool {
        self.skip_unknown_objects
    }

    /// Get the class overrides
    pub fn mapper_classes(&self) -> &IndexMap<String, String> {
        &self.mapper_classes
    }

    /// Check if nulls are omitted by default
    pub fn skip_when_empty(&self) -> bool {
        self.skip_when_empty
    }

    /// Get the identity rule order
    pub fn identity_rules(&self) -> &IdentityPolicy {
        &self.identity_rules
    }

    /// Set the identity key source
    pub fn with_extract_class_from(mut self, source: ClassIdentitySource) -> Self {
        self.extract_class_from = source;
        self
    }

    /// Set the class namespace prefix
    pub fn with_classes_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.classes_namespace = namespace.into();
        self
    }

    /// Set whether unknown nodes are skipped
    pub fn with_skip_unknown_objects(mut self, skip: bool) -> Self {
        self.skip_unknown_objects = skip;
        self
    }

    /// Add a class override for an identity key
    pub fn with_mapper_class(mut self, key: impl Into<String>, class: impl Into<String>) -> Self {
        self.mapper_classes.insert(key.into(), class.into());
        self
    }

    /// Set the session-wide null policy
    pub fn with_skip_when_empty(mut self, skip: bool) -> Self {
        self.skip_when_empty = skip;
        self
    }

    /// Set the identity rule order
    pub fn with_identity_rules(mut self, policy: IdentityPolicy) -> Self {
        self.identity_rules = policy;
        self
    }
}
