//! Element tree to object graph

use super::identity;
use crate::config::MappingConfig;
use crate::documents::Element;
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::metadata::{ClassMetadata, MetadataCache};
use crate::namespaces::is_xsi_attribute;
use crate::registry::{Param, Setter};
use crate::value::{Value, XmlObject};

/// Builds objects from elements.
///
/// Attributes are applied before child elements, each in document order.
/// The instance is only handed out once every node has been applied.
pub(crate) struct Decoder<'a> {
    cache: &'a MetadataCache,
    config: &'a MappingConfig,
    limits: &'a Limits,
}

impl<'a> Decoder<'a> {
    pub(crate) fn new(cache: &'a MetadataCache, config: &'a MappingConfig, limits: &'a Limits) -> Self {
        Self {
            cache,
            config,
            limits,
        }
    }

    /// Deserialize `element` into a new instance of its resolved class
    pub(crate) fn decode(
        &self,
        element: &Element,
        hint: Option<&str>,
        depth: usize,
    ) -> Result<Box<dyn XmlObject>> {
        self.limits.check_depth(depth)?;

        let class_name = identity::resolve_class(element, hint, self.config, self.cache.registry())?;
        let metadata = self.cache.summary(&class_name)?;
        let mut object = metadata.descriptor().construct();

        for (name, value) in &element.attributes {
            if is_xsi_attribute(name) || is_namespace_declaration(name) {
                continue;
            }
            self.apply_attribute(&metadata, object.as_mut(), name, value)?;
        }
        for child in &element.children {
            self.apply_element(&metadata, object.as_mut(), child, depth)?;
        }

        Ok(object)
    }

    fn apply_attribute(
        &self,
        metadata: &ClassMetadata,
        object: &mut dyn XmlObject,
        name: &str,
        text: &str,
    ) -> Result<()> {
        let setter = metadata
            .attribute(name)
            .and_then(|property| property.setter())
            .or_else(|| metadata.default_setter());

        match setter {
            Some(setter) => {
                let value = self.attribute_value(metadata, setter, name, text)?;
                setter.set(object, value)
            }
            None if self.config.skip_unknown_objects() => {
                log::debug!("skipping unknown attribute '{}' on {}", name, metadata.name());
                Ok(())
            }
            None => Err(Error::UnknownAttribute {
                class: metadata.name().to_string(),
                name: name.to_string(),
            }),
        }
    }

    fn apply_element(
        &self,
        metadata: &ClassMetadata,
        object: &mut dyn XmlObject,
        child: &Element,
        depth: usize,
    ) -> Result<()> {
        if let Some(setter) = metadata
            .element(child.local_name())
            .and_then(|property| property.setter())
        {
            let value = self.element_value(setter, child, depth)?;
            return setter.set(object, value);
        }

        match metadata.default_setter() {
            Some(setter) => {
                let value = if child.is_nil() {
                    Value::Null
                } else {
                    Value::Object(self.decode(child, setter.param().hint(), depth + 1)?)
                };
                setter.set(object, value)
            }
            None if self.config.skip_unknown_objects() => {
                log::debug!("skipping unknown element <{}> in {}", child.name, metadata.name());
                Ok(())
            }
            None => Err(Error::UnknownElement {
                class: metadata.name().to_string(),
                name: child.name.clone(),
            }),
        }
    }

    fn element_value(&self, setter: &Setter, child: &Element, depth: usize) -> Result<Value> {
        if child.is_nil() {
            return Ok(Value::Null);
        }
        match setter.param() {
            Param::Text => Ok(Value::Text(child.text().unwrap_or_default().to_string())),
            Param::Object(hint) => Ok(Value::Object(self.decode(
                child,
                hint.as_deref(),
                depth + 1,
            )?)),
        }
    }

    // Attributes carry no structure; object setters need a class that
    // can be built from text.
    fn attribute_value(
        &self,
        metadata: &ClassMetadata,
        setter: &Setter,
        name: &str,
        text: &str,
    ) -> Result<Value> {
        let hint = match setter.param() {
            Param::Text => return Ok(Value::Text(text.to_string())),
            Param::Object(hint) => hint.as_deref(),
        };
        let non_scalar = || Error::NonScalarAttribute {
            class: metadata.name().to_string(),
            property: name.to_string(),
        };

        let class_name = hint.ok_or_else(non_scalar)?;
        let class = self
            .cache
            .registry()
            .get(class_name)
            .ok_or_else(|| Error::ClassNotFound(class_name.to_string()))?;
        match class.from_text(text) {
            Some(object) => Ok(Value::Object(object?)),
            None => Err(non_scalar()),
        }
    }
}

fn is_namespace_declaration(name: &str) -> bool {
    name == "xmlns" || name.starts_with("xmlns:")
}
