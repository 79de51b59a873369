//! Object graph to element tree

use super::identity;
use super::sanitizer::sanitize;
use crate::config::{ClassIdentitySource, MappingConfig};
use crate::documents::Element;
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::metadata::{ClassMetadata, MetadataCache, PropertyMetadata};
use crate::names::unqualified;
use crate::namespaces::{XSI_NIL, XSI_TYPE};
use crate::value::{object_type_id, unwrap_boxed, ValueRef, XmlObject};
use std::any::TypeId;
use std::borrow::Cow;

/// Builds element trees from objects.
///
/// Keeps the chain of objects currently being written so that an object
/// reachable from itself is reported instead of recursing forever.
pub(crate) struct Encoder<'a> {
    cache: &'a MetadataCache,
    config: &'a MappingConfig,
    limits: &'a Limits,
    path: Vec<(usize, TypeId)>,
}

impl<'a> Encoder<'a> {
    pub(crate) fn new(cache: &'a MetadataCache, config: &'a MappingConfig, limits: &'a Limits) -> Self {
        Self {
            cache,
            config,
            limits,
            path: Vec::new(),
        }
    }

    /// Serialize `object` into a new element
    pub(crate) fn encode(&mut self, object: &dyn XmlObject, name: Option<&str>) -> Result<Element> {
        let object = unwrap_boxed(object);
        let class_name = self
            .cache
            .registry()
            .class_name_of(object)
            .ok_or_else(|| Error::ClassNotFound(object.type_name().to_string()))?
            .to_string();

        let key = (
            object as *const dyn XmlObject as *const () as usize,
            object_type_id(object),
        );
        if self.path.contains(&key) {
            return Err(Error::CycleDetected(class_name));
        }
        self.limits.check_depth(self.path.len())?;

        self.path.push(key);
        let result = self.encode_object(object, &class_name, name);
        self.path.pop();
        result
    }

    fn encode_object(
        &mut self,
        object: &dyn XmlObject,
        class_name: &str,
        name: Option<&str>,
    ) -> Result<Element> {
        let metadata = self.cache.summary(class_name)?;
        let tag = name
            .or_else(|| metadata.element_name())
            .unwrap_or_else(|| unqualified(class_name));

        let mut element = Element::new(tag);
        if self.config.extract_class_from() == ClassIdentitySource::TypeAttribute {
            element.set_attribute(XSI_TYPE, identity::type_key(class_name, self.config));
        }

        for property in metadata.properties() {
            let getter = match property.getter() {
                Some(getter) => getter,
                None => {
                    log::trace!("{}.{} has no getter", class_name, property.field_name());
                    continue;
                }
            };
            let value = getter.get(object)?;

            if property.is_attribute() {
                if let Some(text) = self.attribute_text(&metadata, property, value)? {
                    let text = sanitize(text, property)?;
                    element.set_attribute(property.xml_name(), text.into_owned());
                }
            } else {
                self.write_elements(&metadata, property, value, &mut element)?;
            }
        }

        Ok(element)
    }

    // None means the attribute is left out.
    fn attribute_text<'v>(
        &self,
        metadata: &ClassMetadata,
        property: &PropertyMetadata,
        value: ValueRef<'v>,
    ) -> Result<Option<Cow<'v, str>>> {
        match value {
            ValueRef::Null => Ok(None),
            ValueRef::Text(text) => Ok(Some(text)),
            ValueRef::Object(object) => {
                let text = self
                    .cache
                    .registry()
                    .class_name_of(object)
                    .and_then(|class| self.cache.registry().get(class))
                    .and_then(|class| class.to_text(object));
                match text {
                    Some(text) => Ok(Some(Cow::Owned(text))),
                    None => Err(Error::NonScalarAttribute {
                        class: metadata.name().to_string(),
                        property: property.field_name().to_string(),
                    }),
                }
            }
            ValueRef::List(items) => {
                let mut parts = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(text) = self.attribute_text(metadata, property, item)? {
                        parts.push(text);
                    }
                }
                if parts.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(Cow::Owned(parts.join(" "))))
                }
            }
        }
    }

    fn write_elements(
        &mut self,
        metadata: &ClassMetadata,
        property: &PropertyMetadata,
        value: ValueRef<'_>,
        parent: &mut Element,
    ) -> Result<()> {
        match value {
            ValueRef::List(items) => {
                for item in items {
                    self.write_elements(metadata, property, item, parent)?;
                }
            }
            ValueRef::Null => {
                if metadata.omits_null(property, self.config.skip_when_empty()) {
                    log::trace!("omitting null {}", property.field_name());
                } else {
                    parent.add_child(Element::new(property.xml_name()).with_attribute(XSI_NIL, "true"));
                }
            }
            ValueRef::Text(text) => {
                let text = sanitize(text, property)?;
                parent.add_child(Element::new(property.xml_name()).with_text(text.into_owned()));
            }
            ValueRef::Object(object) => {
                let name = if property.name_from_child() {
                    None
                } else {
                    Some(property.xml_name())
                };
                let child = self.encode(object, name)?;
                parent.add_child(child);
            }
        }
        Ok(())
    }
}
