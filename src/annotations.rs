//! Mapping annotations
//!
//! A class or property opts into XML mapping with an annotation. Annotations
//! are either built in code ([`PropertyAnnotation::attribute`], ...) or read
//! from documentation text carrying the `@xml` marker:
//!
//! ```text
//! The person's display name.
//! @xml({"as": "attr", "name": "display-name", "maxLength": 40})
//! ```
//!
//! A bare `@xml` (or `@xml()`) opts in with all defaults. Text without the
//! marker opts out. Anything else after the marker that starts with `(` must be
//! a complete, valid JSON object using only the recognized keys.

use crate::error::ParseError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Marker token recognized in documentation text
pub const MARKER: &str = "@xml";

// The marker ends at an opening parenthesis, whitespace or the end of the line
static MARKER_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)@xml([ \t\r(][^\n]*)?$").unwrap());

/// Where a property lands in the XML
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum Placement {
    /// Child element
    #[default]
    #[serde(rename = "element")]
    Element,
    /// Attribute of the owning element
    #[serde(rename = "attr")]
    Attribute,
}

/// Where the tag of a nested value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameSource {
    /// The nested value names itself (class `name` option or class name)
    Child,
}

/// Property-level annotation
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PropertyAnnotation {
    /// `as`: attribute or element placement
    #[serde(rename = "as")]
    pub placement: Option<Placement>,
    /// `name`: XML name override
    pub name: Option<String>,
    /// `nameFrom`: let nested values supply their own tag
    pub name_from: Option<NameSource>,
    /// `nil`: emit nulls as nil-marked elements (`true`) or omit them (`false`)
    pub nil: Option<bool>,
    /// `maxLength`: truncate scalar output to this many characters
    pub max_length: Option<i64>,
    /// `getter`: accessor name override
    pub getter: Option<String>,
    /// `setter`: mutator name override
    pub setter: Option<String>,
}

impl PropertyAnnotation {
    /// Element-placed property with defaults
    pub fn element() -> Self {
        Self::default()
    }

    /// Attribute-placed property with defaults
    pub fn attribute() -> Self {
        Self {
            placement: Some(Placement::Attribute),
            ..Default::default()
        }
    }

    /// Override the XML name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Let nested values supply their own tag
    pub fn name_from_child(mut self) -> Self {
        self.name_from = Some(NameSource::Child);
        self
    }

    /// Set the nil policy for null values
    pub fn nil(mut self, nil: bool) -> Self {
        self.nil = Some(nil);
        self
    }

    /// Truncate output to `max` characters
    pub fn max_length(mut self, max: i64) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Override the getter name
    pub fn getter(mut self, name: impl Into<String>) -> Self {
        self.getter = Some(name.into());
        self
    }

    /// Override the setter name
    pub fn setter(mut self, name: impl Into<String>) -> Self {
        self.setter = Some(name.into());
        self
    }

    /// Effective placement
    pub fn placement(&self) -> Placement {
        self.placement.unwrap_or_default()
    }
}

/// Class-level annotation
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClassAnnotation {
    /// `name`: element name used when serializing the class
    pub name: Option<String>,
    /// `defaultSetter`: mutator receiving nodes no property matches
    pub default_setter: Option<String>,
    /// `skipWhenEmpty`: class-wide null policy
    pub skip_when_empty: Option<bool>,
}

impl ClassAnnotation {
    /// Annotation with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the element name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the default setter
    pub fn default_setter(mut self, name: impl Into<String>) -> Self {
        self.default_setter = Some(name.into());
        self
    }

    /// Set the class-wide null policy
    pub fn skip_when_empty(mut self, skip: bool) -> Self {
        self.skip_when_empty = Some(skip);
        self
    }
}

/// Read an annotation from documentation text.
///
/// Returns `Ok(None)` when the marker is absent.
pub fn parse_annotation<T>(doc: &str) -> Result<Option<T>, ParseError>
where
    T: DeserializeOwned + Default,
{
    let captures = match MARKER_LINE.captures(doc) {
        Some(captures) => captures,
        None => return Ok(None),
    };
    let line = captures.get(0).map_or("", |m| m.as_str()).trim_end();
    let rest = captures.get(1).map_or("", |m| m.as_str()).trim();

    if !rest.starts_with('(') {
        return Ok(Some(T::default()));
    }

    let payload = rest
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .ok_or_else(|| {
            ParseError::new(format!("unterminated {} options", MARKER)).with_source(line)
        })?
        .trim();

    if payload.is_empty() {
        return Ok(Some(T::default()));
    }

    serde_json::from_str(payload)
        .map(Some)
        .map_err(|e| ParseError::new(e.to_string()).with_source(line))
}
