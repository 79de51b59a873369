//! Mapping engine
//!
//! [`XmlSerializer`] ties the pieces together: class identity resolution,
//! the per-instance metadata cache, the decoder and the encoder.
//!
//! ```rust
//! use xmlmapper::prelude::*;
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Person {
//!     id: String,
//!     name: String,
//! }
//!
//! let registry = ClassRegistry::new()
//!     .with(
//!         ClassDef::<Person>::new("app::Person")
//!             .property("id", r#"@xml({"as": "attr"})"#)
//!             .property("name", "@xml")
//!             .getter("getId", |p| ValueRef::from(&p.id))
//!             .getter("getName", |p| ValueRef::from(&p.name))
//!             .setter("setId", Param::Text, |p, v| {
//!                 p.id = v.into_text()?.unwrap_or_default();
//!                 Ok(())
//!             })
//!             .setter("setName", Param::Text, |p, v| {
//!                 p.name = v.into_text()?.unwrap_or_default();
//!                 Ok(())
//!             }),
//!     )
//!     .unwrap();
//!
//! let serializer = XmlSerializer::new(registry, MappingConfig::new().with_classes_namespace("app::"));
//!
//! let ann = Person { id: "7".into(), name: "Ann".into() };
//! let xml = serializer.serialize(&ann).unwrap();
//! assert_eq!(
//!     xml,
//!     r#"<?xml version="1.0" encoding="UTF-8"?><Person id="7"><name>Ann</name></Person>"#
//! );
//!
//! let back: Person = serializer.unserialize_as(&xml).unwrap();
//! assert_eq!(back, ann);
//! ```

mod decoder;
mod encoder;
pub mod identity;
pub mod sanitizer;

use crate::config::MappingConfig;
use crate::documents::Element;
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::metadata::{ClassMetadata, MetadataCache};
use crate::registry::ClassRegistry;
use crate::value::XmlObject;
use decoder::Decoder;
use encoder::Encoder;
use std::sync::Arc;

/// Bidirectional object/XML mapper.
///
/// Configuration is fixed at construction. Class metadata is resolved on
/// first use and cached for the lifetime of the serializer; a serializer can
/// be shared between threads once built.
#[derive(Debug)]
pub struct XmlSerializer {
    config: MappingConfig,
    limits: Limits,
    cache: MetadataCache,
}

impl XmlSerializer {
    /// Create a serializer over a set of registered classes
    pub fn new(registry: ClassRegistry, config: MappingConfig) -> Self {
        Self {
            config,
            limits: Limits::default(),
            cache: MetadataCache::new(Arc::new(registry)),
        }
    }

    /// Replace the resource limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    /// Get the resource limits
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Get the class registry
    pub fn registry(&self) -> &ClassRegistry {
        self.cache.registry()
    }

    /// Resolved metadata of a class
    pub fn summary(&self, class_name: &str) -> Result<Arc<ClassMetadata>> {
        self.cache.summary(class_name)
    }

    /// Class an element deserializes into
    pub fn resolve_class(&self, element: &Element, hint: Option<&str>) -> Result<String> {
        identity::resolve_class(element, hint, &self.config, self.registry())
    }

    /// Serialize an object into an XML document
    pub fn serialize(&self, object: &dyn XmlObject) -> Result<String> {
        self.to_element(object, None)?.to_xml_string()
    }

    /// Serialize an object into an element tree.
    ///
    /// `name` overrides the tag of the returned element.
    pub fn to_element(&self, object: &dyn XmlObject, name: Option<&str>) -> Result<Element> {
        Encoder::new(&self.cache, &self.config, &self.limits).encode(object, name)
    }

    /// Deserialize an XML document
    pub fn unserialize(&self, xml: &str) -> Result<Box<dyn XmlObject>> {
        self.unserialize_with_hint(xml, None)
    }

    /// Deserialize an XML document into a `T`.
    ///
    /// The class registered for `T` is the identity hint for the root.
    pub fn unserialize_as<T: XmlObject>(&self, xml: &str) -> Result<T> {
        let hint = self.registry().class_name_for::<T>().map(str::to_string);
        let object = self.unserialize_with_hint(xml, hint.as_deref())?;
        let type_name = (*object).type_name();
        object
            .into_any()
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| {
                Error::Type(format!(
                    "document holds {}, not {}",
                    type_name,
                    std::any::type_name::<T>()
                ))
            })
    }

    fn unserialize_with_hint(&self, xml: &str, hint: Option<&str>) -> Result<Box<dyn XmlObject>> {
        self.limits.check_input_size(xml.len())?;
        let root = Element::parse_with_limits(xml, &self.limits)?;
        self.from_element(&root, hint)
    }

    /// Deserialize an element tree
    pub fn from_element(&self, element: &Element, hint: Option<&str>) -> Result<Box<dyn XmlObject>> {
        Decoder::new(&self.cache, &self.config, &self.limits).decode(element, hint, 0)
    }

    /// Deserialize from an element of an already parsed `roxmltree` document
    pub fn from_node(
        &self,
        node: roxmltree::Node<'_, '_>,
        hint: Option<&str>,
    ) -> Result<Box<dyn XmlObject>> {
        self.from_element(&Element::from_node_with_limits(node, &self.limits)?, hint)
    }
}
