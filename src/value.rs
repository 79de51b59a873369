//! Values exchanged with mapped objects
//!
//! Accessors never touch fields directly through the engine. Getters hand out
//! a borrowed [`ValueRef`] and setters receive an owned [`Value`]; nested
//! objects travel as `dyn XmlObject` and are downcast back to their concrete
//! type by the accessor that owns them.

use crate::error::{Error, Result};
use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Object capability required from every mapped type.
///
/// Implemented for every `'static` type; mapping information lives in the
/// class registry, not on the type.
pub trait XmlObject: Any {
    /// Borrow as `Any` for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Mutably borrow as `Any` for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Convert a boxed object into a boxed `Any`
    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Rust type name, for diagnostics
    fn type_name(&self) -> &'static str;
}

impl<T: Any> XmlObject for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

impl fmt::Debug for dyn XmlObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "XmlObject({})", self.type_name())
    }
}

/// Look through `Box<dyn XmlObject>` wrappers that were themselves coerced
/// into trait objects, so lookups see the concrete type.
pub(crate) fn unwrap_boxed(object: &dyn XmlObject) -> &dyn XmlObject {
    match object.as_any().downcast_ref::<Box<dyn XmlObject>>() {
        Some(inner) => unwrap_boxed(&**inner),
        None => object,
    }
}

/// Concrete `TypeId` of an object, looking through boxes
pub(crate) fn object_type_id(object: &dyn XmlObject) -> TypeId {
    unwrap_boxed(object).as_any().type_id()
}

/// Value read from an object through a getter
#[derive(Debug)]
pub enum ValueRef<'a> {
    /// No value
    Null,
    /// Scalar text
    Text(Cow<'a, str>),
    /// Sequence of values
    List(Vec<ValueRef<'a>>),
    /// Nested object
    Object(&'a dyn XmlObject),
}

impl<'a> ValueRef<'a> {
    /// Text from anything displayable (numbers, booleans, ...)
    pub fn display(value: &impl fmt::Display) -> Self {
        ValueRef::Text(Cow::Owned(value.to_string()))
    }

    /// Nested object
    pub fn object(value: &'a dyn XmlObject) -> Self {
        ValueRef::Object(value)
    }

    /// Optional nested object
    pub fn optional<T: XmlObject>(value: Option<&'a T>) -> Self {
        match value {
            Some(v) => ValueRef::Object(v),
            None => ValueRef::Null,
        }
    }

    /// Sequence of values
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ValueRef<'a>>,
    {
        ValueRef::List(items.into_iter().map(Into::into).collect())
    }

    /// Sequence of nested objects
    pub fn objects<T: XmlObject>(items: impl IntoIterator<Item = &'a T>) -> Self {
        ValueRef::List(items.into_iter().map(|v| ValueRef::Object(v)).collect())
    }

    /// Whether this is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, ValueRef::Null)
    }
}

impl<'a> From<&'a str> for ValueRef<'a> {
    fn from(value: &'a str) -> Self {
        ValueRef::Text(Cow::Borrowed(value))
    }
}

impl<'a> From<&'a String> for ValueRef<'a> {
    fn from(value: &'a String) -> Self {
        ValueRef::Text(Cow::Borrowed(value.as_str()))
    }
}

impl From<String> for ValueRef<'_> {
    fn from(value: String) -> Self {
        ValueRef::Text(Cow::Owned(value))
    }
}

impl<'a, T: Into<ValueRef<'a>>> From<Option<T>> for ValueRef<'a> {
    fn from(value: Option<T>) -> Self {
        value.map_or(ValueRef::Null, Into::into)
    }
}

/// Value handed to a setter
#[derive(Debug)]
pub enum Value {
    /// Explicit null (a nil-marked element)
    Null,
    /// Raw text of an attribute or element
    Text(String),
    /// Deserialized nested object
    Object(Box<dyn XmlObject>),
}

impl Value {
    /// Whether this is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Text content; `None` for null
    pub fn into_text(self) -> Result<Option<String>> {
        match self {
            Value::Null => Ok(None),
            Value::Text(text) => Ok(Some(text)),
            Value::Object(object) => Err(Error::Type(format!(
                "expected text, found object of type {}",
                (*object).type_name()
            ))),
        }
    }

    /// Parse the text content; `None` for null
    pub fn parse<T>(self) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.into_text()? {
            None => Ok(None),
            Some(text) => text.trim().parse().map(Some).map_err(|e| {
                Error::Type(format!(
                    "cannot parse '{}' as {}: {}",
                    text,
                    std::any::type_name::<T>(),
                    e
                ))
            }),
        }
    }

    /// Downcast a nested object; `None` for null
    pub fn into_object<T: XmlObject>(self) -> Result<Option<T>> {
        match self {
            Value::Null => Ok(None),
            Value::Object(object) => {
                let type_name = (*object).type_name();
                object
                    .into_any()
                    .downcast::<T>()
                    .map(|boxed| Some(*boxed))
                    .map_err(|_| {
                        Error::Type(format!(
                            "expected {}, found {}",
                            std::any::type_name::<T>(),
                            type_name
                        ))
                    })
            }
            Value::Text(text) => Err(Error::Type(format!(
                "expected {}, found text '{}'",
                std::any::type_name::<T>(),
                text
            ))),
        }
    }
}
