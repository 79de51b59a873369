//! XML name validation and naming conventions
//!
//! This module validates XML names declared in annotations and implements the
//! fixed conventions the mapper uses to pair names with each other:
//! lookup-key normalization, accessor name derivation and class name splitting.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

// Simplified NCName pattern (BMP letters, digits, '-', '.', '_')
static NCNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z_a-z\u{C0}-\u{D6}\u{D8}-\u{F6}\u{F8}-\u{2FF}\u{370}-\u{37D}][A-Z_a-z\u{C0}-\u{D6}\u{D8}-\u{F6}\u{F8}-\u{2FF}\u{370}-\u{37D}\-\.0-9\u{B7}]*$")
        .unwrap()
});

/// Check if a string is a valid NCName (non-colonized name)
pub fn is_valid_ncname(name: &str) -> bool {
    NCNAME.is_match(name)
}

/// Check if a string is a valid QName (qualified name)
pub fn is_valid_qname(name: &str) -> bool {
    match name.split_once(':') {
        Some((prefix, local)) => is_valid_ncname(prefix) && is_valid_ncname(local),
        None => is_valid_ncname(name),
    }
}

/// Validate a QName and return an error if invalid
pub fn validate_qname(name: &str) -> Result<()> {
    if is_valid_qname(name) {
        Ok(())
    } else {
        Err(Error::MalformedXml(format!("Invalid QName: '{}'", name)))
    }
}

/// Split a QName into prefix and local name
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    if let Some((prefix, local)) = qname.split_once(':') {
        (Some(prefix), local)
    } else {
        (None, qname)
    }
}

/// Normalize a node or property name into a lookup key.
///
/// Every `-`-separated segment gets its first letter upper-cased and the
/// hyphens are dropped, so `first-name`, `firstName` and `FirstName` all
/// normalize to `FirstName`.
///
/// This is the capitalize-and-strip-hyphens convention applied per segment
/// rather than to the first letter only. Declared names and node names go
/// through the same function, so a `first-name` node still finds a
/// `firstName` property and conventional accessor names stay camel-cased.
pub fn normalize(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    for segment in name.split('-') {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            key.extend(first.to_uppercase());
            key.push_str(chars.as_str());
        }
    }
    key
}

/// Conventional getter name for a field (`name` -> `getName`)
pub fn getter_name(field: &str) -> String {
    format!("get{}", normalize(field))
}

/// Conventional setter name for a field (`name` -> `setName`)
pub fn setter_name(field: &str) -> String {
    format!("set{}", normalize(field))
}

/// The last path segment of a class name.
///
/// Both `::` and `\` are accepted as separators: `app::model::Person` and
/// `App\Model\Person` both yield `Person`.
pub fn unqualified(class_name: &str) -> &str {
    class_name
        .rsplit(|c: char| c == ':' || c == '\\')
        .next()
        .unwrap_or(class_name)
}
