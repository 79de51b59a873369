//! XML namespace handling
//!
//! The mapper is namespace-agnostic except for the XML Schema instance
//! namespace, whose `type` and `nil` attributes carry class identity and
//! explicit nulls. This module tracks prefix bindings while a document is
//! read so those attributes can be recognized under any prefix.

use std::collections::HashMap;

/// XML Schema instance namespace
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Canonical prefix for the schema instance namespace
pub const XSI_PREFIX: &str = "xsi";

/// Canonical name of the type attribute
pub const XSI_TYPE: &str = "xsi:type";

/// Canonical name of the nil marker attribute
pub const XSI_NIL: &str = "xsi:nil";

/// Namespace context for resolving prefixes
#[derive(Debug, Clone, Default)]
pub struct NamespaceContext {
    /// Mapping from prefix to namespace URI
    prefixes: HashMap<String, String>,
    /// Default namespace (no prefix)
    default_namespace: Option<String>,
}

impl NamespaceContext {
    /// Create a new empty namespace context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a namespace prefix mapping
    pub fn add_prefix(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.prefixes.insert(prefix.into(), namespace.into());
    }

    /// Set the default namespace
    pub fn set_default_namespace(&mut self, namespace: impl Into<String>) {
        self.default_namespace = Some(namespace.into());
    }

    /// Get the namespace for a prefix
    pub fn get_namespace(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(|s| s.as_str())
    }

    /// Get the default namespace
    pub fn get_default_namespace(&self) -> Option<&str> {
        self.default_namespace.as_deref()
    }

    /// Canonical form of a prefixed attribute name.
    ///
    /// Names whose prefix is bound to the schema instance namespace come back
    /// as `xsi:<local>`, whatever prefix the document used. Everything else,
    /// unbound prefixes included, is returned unchanged.
    pub fn canonical_attribute(&self, name: &str) -> String {
        match name.split_once(':') {
            Some((prefix, local)) if self.get_namespace(prefix) == Some(XSI_NAMESPACE) => {
                format!("{}:{}", XSI_PREFIX, local)
            }
            _ => name.to_string(),
        }
    }
}

/// Whether a canonical attribute name belongs to the schema instance namespace
pub fn is_xsi_attribute(name: &str) -> bool {
    name.strip_prefix(XSI_PREFIX)
        .map(|rest| rest.starts_with(':'))
        .unwrap_or(false)
}
