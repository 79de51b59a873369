//! Class and property metadata
//!
//! [`resolve_class`] turns a registered [`ClassDescriptor`] into the
//! [`ClassMetadata`] the mapper works from: effective XML names and
//! placements, bound accessors, and lookup indices for attributes and child
//! elements. [`MetadataCache`] memoizes that work per class name.

use crate::annotations::Placement;
use crate::error::{Error, ParseError, Result};
use crate::names::{getter_name, is_valid_ncname, normalize, setter_name};
use crate::registry::{ClassDescriptor, ClassRegistry, Getter, Setter};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;

/// Resolved mapping of a single property
#[derive(Debug, Clone)]
pub struct PropertyMetadata {
    field_name: String,
    xml_name: String,
    placement: Placement,
    nil: Option<bool>,
    max_length: Option<i64>,
    name_from_child: bool,
    getter: Option<Getter>,
    setter: Option<Setter>,
}

impl PropertyMetadata {
    /// Field name as declared
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Attribute or element name (the field name unless overridden)
    pub fn xml_name(&self) -> &str {
        &self.xml_name
    }

    /// Attribute or element placement
    pub fn placement(&self) -> Placement {
        self.placement
    }

    /// Whether this is an attribute-placed property
    pub fn is_attribute(&self) -> bool {
        self.placement == Placement::Attribute
    }

    /// Explicit nil policy (`true`: nil-mark nulls, `false`: omit them)
    pub fn nil(&self) -> Option<bool> {
        self.nil
    }

    /// Maximum output length in characters
    pub fn max_length(&self) -> Option<i64> {
        self.max_length
    }

    /// Whether nested values supply their own tag
    pub fn name_from_child(&self) -> bool {
        self.name_from_child
    }

    /// Bound getter, if the class registered one
    pub fn getter(&self) -> Option<&Getter> {
        self.getter.as_ref()
    }

    /// Bound setter, if the class registered one
    pub fn setter(&self) -> Option<&Setter> {
        self.setter.as_ref()
    }
}

/// Resolved mapping of a class
#[derive(Debug)]
pub struct ClassMetadata {
    descriptor: Arc<ClassDescriptor>,
    element_name: Option<String>,
    default_setter: Option<Setter>,
    skip_when_empty: Option<bool>,
    properties: Vec<PropertyMetadata>,
    attribute_index: HashMap<String, usize>,
    element_index: HashMap<String, usize>,
}

impl ClassMetadata {
    /// Fully qualified class name
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Registered class behind this metadata
    pub fn descriptor(&self) -> &ClassDescriptor {
        &self.descriptor
    }

    /// Class-level element name option
    pub fn element_name(&self) -> Option<&str> {
        self.element_name.as_deref()
    }

    /// Catch-all setter for unmatched nodes
    pub fn default_setter(&self) -> Option<&Setter> {
        self.default_setter.as_ref()
    }

    /// Class-level null policy
    pub fn skip_when_empty(&self) -> Option<bool> {
        self.skip_when_empty
    }

    /// Mapped properties in declaration order
    pub fn properties(&self) -> &[PropertyMetadata] {
        &self.properties
    }

    /// Attribute-placed property matching a node name
    pub fn attribute(&self, name: &str) -> Option<&PropertyMetadata> {
        self.attribute_index
            .get(&normalize(name))
            .map(|&i| &self.properties[i])
    }

    /// Element-placed property matching a node name
    pub fn element(&self, name: &str) -> Option<&PropertyMetadata> {
        self.element_index
            .get(&normalize(name))
            .map(|&i| &self.properties[i])
    }

    /// Effective null policy of a property: property, then class, then session
    pub fn omits_null(&self, property: &PropertyMetadata, session_default: bool) -> bool {
        match property.nil {
            Some(nil) => !nil,
            None => self.skip_when_empty.unwrap_or(session_default),
        }
    }
}

/// Resolve the metadata of a registered class
pub fn resolve_class(descriptor: Arc<ClassDescriptor>) -> Result<ClassMetadata> {
    let class = descriptor.name().to_string();
    let options = descriptor.annotation().cloned().unwrap_or_default();

    if let Some(ref name) = options.name {
        check_xml_name(name, &class)?;
    }
    let default_setter = options
        .default_setter
        .as_deref()
        .and_then(|name| descriptor.setter(name))
        .cloned();

    let mut properties = Vec::new();
    let mut attribute_index = HashMap::new();
    let mut element_index = HashMap::new();

    for decl in descriptor.properties() {
        let annotation = match decl.annotation {
            Some(ref annotation) => annotation,
            None => continue,
        };
        let location = format!("{}.{}", class, decl.field);

        let xml_name = annotation.name.clone().unwrap_or_else(|| decl.field.clone());
        check_xml_name(&xml_name, &location)?;

        if let Some(max_length) = annotation.max_length {
            if max_length <= 0 {
                return Err(Error::InvalidSanitizerConfig {
                    property: location,
                    max_length,
                });
            }
        }

        let getter = match annotation.getter {
            Some(ref name) => descriptor.getter(name),
            None => descriptor.getter(&getter_name(&decl.field)),
        };
        let setter = match annotation.setter {
            Some(ref name) => descriptor.setter(name),
            None => descriptor.setter(&setter_name(&decl.field)),
        };

        let placement = annotation.placement();
        let index = match placement {
            Placement::Attribute => &mut attribute_index,
            Placement::Element => &mut element_index,
        };
        // First declaration wins on a name collision
        index.entry(normalize(&xml_name)).or_insert(properties.len());

        properties.push(PropertyMetadata {
            field_name: decl.field.clone(),
            xml_name,
            placement,
            nil: annotation.nil,
            max_length: annotation.max_length,
            name_from_child: annotation.name_from.is_some(),
            getter: getter.cloned(),
            setter: setter.cloned(),
        });
    }

    Ok(ClassMetadata {
        descriptor,
        element_name: options.name,
        default_setter,
        skip_when_empty: options.skip_when_empty,
        properties,
        attribute_index,
        element_index,
    })
}

fn check_xml_name(name: &str, location: &str) -> Result<()> {
    if is_valid_ncname(name) {
        Ok(())
    } else {
        Err(ParseError::new(format!("'{}' is not a valid XML name", name))
            .with_location(location)
            .into())
    }
}

/// Per-serializer memo of resolved class metadata.
///
/// One slot exists for every registered class; each slot is filled at most
/// once, on first use, and read without locking afterwards.
#[derive(Debug)]
pub struct MetadataCache {
    registry: Arc<ClassRegistry>,
    slots: HashMap<String, OnceCell<Arc<ClassMetadata>>>,
}

impl MetadataCache {
    /// Create an empty cache over a registry
    pub fn new(registry: Arc<ClassRegistry>) -> Self {
        let slots = registry
            .names()
            .map(|name| (name.to_string(), OnceCell::new()))
            .collect();
        Self { registry, slots }
    }

    /// Metadata of a class, resolving it on first request
    pub fn summary(&self, class_name: &str) -> Result<Arc<ClassMetadata>> {
        let slot = self
            .slots
            .get(class_name)
            .ok_or_else(|| Error::ClassNotFound(class_name.to_string()))?;

        slot.get_or_try_init(|| {
            let descriptor = self
                .registry
                .get(class_name)
                .cloned()
                .ok_or_else(|| Error::ClassNotFound(class_name.to_string()))?;
            let metadata = resolve_class(descriptor)?;
            log::debug!(
                "cached metadata for {} ({} mapped properties)",
                class_name,
                metadata.properties.len()
            );
            Ok(Arc::new(metadata))
        })
        .cloned()
    }

    /// Whether the metadata of a class has been resolved
    pub fn is_cached(&self, class_name: &str) -> bool {
        self.slots
            .get(class_name)
            .map_or(false, |slot| slot.get().is_some())
    }

    /// The registry this cache resolves against
    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }
}
