//! # xmlmapper
//!
//! Annotation-driven, bidirectional mapping between Rust objects and XML.
//!
//! Classes are registered once with their mapping annotations and accessors;
//! a [`XmlSerializer`] then turns instances into XML documents and documents
//! back into instances.
//!
//! ## Features
//!
//! - Attribute or child element placement per property
//! - XML name overrides and self-named nested values
//! - Nil markers (`xsi:nil`) or omission for null values
//! - Output truncation (`maxLength`)
//! - Class identity from the tag name or `xsi:type`, with explicit overrides
//! - Catch-all default setters for unmatched nodes
//! - Strict or lenient handling of unknown nodes
//! - Cycle and depth guards
//!
//! ## Example
//!
//! ```rust
//! use xmlmapper::prelude::*;
//!
//! #[derive(Default)]
//! struct Note {
//!     body: String,
//! }
//!
//! let registry = ClassRegistry::new()
//!     .with(
//!         ClassDef::<Note>::new("app::Note")
//!             .doc(r#"@xml({"name": "note"})"#)
//!             .property("body", r#"@xml({"maxLength": 5})"#)
//!             .getter("getBody", |n| ValueRef::from(&n.body)),
//!     )
//!     .unwrap();
//!
//! let serializer = XmlSerializer::new(registry, MappingConfig::default());
//! let xml = serializer.serialize(&Note { body: "HelloWorld".into() }).unwrap();
//! assert!(xml.ends_with("<note><body>Hello</body></note>"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules - Foundation
pub mod error;
pub mod limits;

// Core modules - Utilities
pub mod namespaces;
pub mod names;
pub mod documents;

// Class model
pub mod annotations;
pub mod value;
pub mod registry;
pub mod metadata;

// Mapping
pub mod config;
pub mod mapping;

// Re-exports for convenience
pub use config::{ClassIdentitySource, IdentityPolicy, IdentityRule, MappingConfig};
pub use documents::Element;
pub use error::{Error, Result};
pub use mapping::XmlSerializer;

/// Commonly used types
pub mod prelude {
    pub use crate::annotations::{ClassAnnotation, PropertyAnnotation};
    pub use crate::config::{ClassIdentitySource, IdentityPolicy, IdentityRule, MappingConfig};
    pub use crate::documents::Element;
    pub use crate::error::{Error, Result};
    pub use crate::limits::Limits;
    pub use crate::mapping::XmlSerializer;
    pub use crate::registry::{ClassDef, ClassRegistry, Param};
    pub use crate::value::{Value, ValueRef, XmlObject};
}

/// Version of the xmlmapper library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
