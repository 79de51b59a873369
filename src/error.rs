//! Error types for xmlmapper
//!
//! This module defines all error types used throughout the library.
//! Every error aborts the serialize/deserialize call in progress; nothing is
//! retried internally and no partially built instance is handed back.

use std::fmt;
use thiserror::Error;

/// Result type alias using xmlmapper Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for mapping operations
#[derive(Error, Debug)]
pub enum Error {
    /// The resolved class name does not name a registered class
    #[error("class not found: {0}")]
    ClassNotFound(String),

    /// Type-attribute identity mode, but the element carries no `xsi:type`
    #[error("element <{element}> has no xsi:type attribute")]
    MissingTypeAttribute {
        /// Tag name of the offending element
        element: String,
    },

    /// Strict mode: an attribute matched no property and no default setter
    #[error("unknown attribute '{name}' for class {class}")]
    UnknownAttribute {
        /// Class being populated
        class: String,
        /// Attribute name as found in the document
        name: String,
    },

    /// Strict mode: a child element matched no property and no default setter
    #[error("unknown element <{name}> for class {class}")]
    UnknownElement {
        /// Class being populated
        class: String,
        /// Child tag name as found in the document
        name: String,
    },

    /// An object without a string form was targeted at an attribute
    #[error("property '{property}' of {class} holds an object without a text form and cannot be an attribute")]
    NonScalarAttribute {
        /// Owning class
        class: String,
        /// Property field name
        property: String,
    },

    /// A non-positive `maxLength`
    #[error("invalid maxLength {max_length} on property '{property}'")]
    InvalidSanitizerConfig {
        /// Property field name
        property: String,
        /// The declared value
        max_length: i64,
    },

    /// Annotation payload could not be parsed
    #[error("malformed annotation: {0}")]
    MalformedAnnotation(#[from] ParseError),

    /// The object graph refers back to one of its own ancestors
    #[error("cycle detected while serializing {0}")]
    CycleDetected(String),

    /// Input cannot be parsed into an element tree
    #[error("malformed XML: {0}")]
    MalformedXml(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// A class name or Rust type was registered twice
    #[error("duplicate class registration: {0}")]
    DuplicateClass(String),

    /// An explicit accessor override names no registered accessor
    #[error("class {class} has no accessor named '{accessor}'")]
    UnknownAccessor {
        /// Owning class
        class: String,
        /// Accessor name that failed to resolve
        accessor: String,
    },

    /// Value does not have the shape an accessor expects
    #[error("type error: {0}")]
    Type(String),

    /// Configuration document could not be read
    #[error("config error: {0}")]
    Config(String),
}

/// Annotation parsing error
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Class or property the annotation is attached to
    pub location: Option<String>,
    /// Annotation source that caused the error
    pub source: Option<String>,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            source: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref loc) = self.location {
            write!(f, "\n\nLocation: {}", loc)?;
        }

        if let Some(ref src) = self.source {
            write!(f, "\n\nSource:\n{}", src)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}
