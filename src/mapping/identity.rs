//! Class identity resolution
//!
//! Decides which registered class an element is deserialized into. An
//! identity key is read from the element (its tag name or its `xsi:type`),
//! then the configured [`IdentityPolicy`](crate::config::IdentityPolicy) rules
//! are tried in order and the first one producing a class name wins.

use crate::config::{ClassIdentitySource, IdentityRule, MappingConfig};
use crate::documents::Element;
use crate::error::{Error, Result};
use crate::namespaces::XSI_TYPE;
use crate::registry::ClassRegistry;

/// Identity key of an element under the given source
pub fn identity_key(element: &Element, source: ClassIdentitySource) -> Result<&str> {
    match source {
        ClassIdentitySource::TagName => Ok(element.local_name()),
        ClassIdentitySource::TypeAttribute => element
            .attribute(XSI_TYPE)
            .map(str::trim)
            .ok_or_else(|| Error::MissingTypeAttribute {
                element: element.name.clone(),
            }),
    }
}

/// Resolve the class an element maps to.
///
/// `hint` is the class declared by the parent property's setter, if any.
pub fn resolve_class(
    element: &Element,
    hint: Option<&str>,
    config: &MappingConfig,
    registry: &ClassRegistry,
) -> Result<String> {
    let key = identity_key(element, config.extract_class_from())?;

    let resolved = config
        .identity_rules()
        .rules()
        .iter()
        .find_map(|rule| {
            let name = match rule {
                IdentityRule::OverrideMap => config.mapper_classes().get(key).cloned(),
                IdentityRule::Hint => hint.map(str::to_string),
                IdentityRule::Namespaced => {
                    Some(format!("{}{}", config.classes_namespace(), key))
                }
            };
            name.map(|name| (*rule, name))
        });

    let (rule, class_name) = resolved.ok_or_else(|| Error::ClassNotFound(key.to_string()))?;
    log::trace!(
        "<{}> identity key '{}' resolved to {} by {:?}",
        element.name,
        key,
        class_name,
        rule
    );

    if registry.contains(&class_name) {
        Ok(class_name)
    } else {
        Err(Error::ClassNotFound(class_name))
    }
}

/// Key written to `xsi:type` for a class, such that [`resolve_class`] maps it
/// back to the same class
pub fn type_key(class_name: &str, config: &MappingConfig) -> String {
    if let Some((key, _)) = config
        .mapper_classes()
        .iter()
        .find(|(_, class)| class.as_str() == class_name)
    {
        return key.clone();
    }
    class_name
        .strip_prefix(config.classes_namespace())
        .unwrap_or(class_name)
        .to_string()
}
