//! Class registration
//!
//! Rust has no runtime introspection, so every mapped type is described once,
//! up front, with a [`ClassDef`]: its class name, its annotated properties in
//! declaration order and a table of named accessors. Registering the
//! definition parses its annotations and checks every explicitly named
//! accessor, so a bad definition fails at registration rather than on the
//! first document that happens to exercise it.
//!
//! ```rust
//! use xmlmapper::registry::{ClassDef, ClassRegistry, Param};
//! use xmlmapper::value::ValueRef;
//!
//! #[derive(Default)]
//! struct Person {
//!     name: String,
//! }
//!
//! let mut registry = ClassRegistry::new();
//! registry
//!     .register(
//!         ClassDef::<Person>::new("app::Person")
//!             .property("name", r#"@xml({"as": "attr"})"#)
//!             .getter("getName", |p| ValueRef::from(&p.name))
//!             .setter("setName", Param::Text, |p, v| {
//!                 p.name = v.into_text()?.unwrap_or_default();
//!                 Ok(())
//!             }),
//!     )
//!     .unwrap();
//! assert!(registry.contains("app::Person"));
//! ```

use crate::annotations::{parse_annotation, ClassAnnotation, PropertyAnnotation};
use crate::error::{Error, ParseError, Result};
use crate::value::{object_type_id, unwrap_boxed, Value, ValueRef, XmlObject};
use indexmap::IndexMap;
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

type GetFn = dyn for<'a> Fn(&'a dyn XmlObject) -> Option<ValueRef<'a>> + Send + Sync;
type SetFn = dyn Fn(&mut dyn XmlObject, Value) -> Result<()> + Send + Sync;
type ToTextFn = dyn Fn(&dyn XmlObject) -> Option<String> + Send + Sync;
type FromTextFn = dyn Fn(&str) -> Result<Box<dyn XmlObject>> + Send + Sync;

fn erase_getter<F>(f: F) -> Arc<GetFn>
where
    F: for<'a> Fn(&'a dyn XmlObject) -> Option<ValueRef<'a>> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn erase_setter<F>(f: F) -> Arc<SetFn>
where
    F: Fn(&mut dyn XmlObject, Value) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn construct<T: XmlObject + Default>() -> Box<dyn XmlObject> {
    Box::new(T::default())
}

/// What a setter expects to receive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    /// Raw text of the attribute or element
    Text,
    /// A nested object, deserialized with the given class as identity hint
    Object(Option<String>),
}

impl Param {
    /// Nested object of the given class
    pub fn object(class: impl Into<String>) -> Self {
        Param::Object(Some(class.into()))
    }

    /// Nested object whose class comes from the element alone
    pub fn any_object() -> Self {
        Param::Object(None)
    }

    /// Class hint for nested values
    pub fn hint(&self) -> Option<&str> {
        match self {
            Param::Text => None,
            Param::Object(hint) => hint.as_deref(),
        }
    }
}

/// Named, type-erased getter
#[derive(Clone)]
pub struct Getter {
    name: String,
    func: Arc<GetFn>,
}

impl Getter {
    /// Accessor name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read the value from an object
    pub fn get<'a>(&self, object: &'a dyn XmlObject) -> Result<ValueRef<'a>> {
        let object = unwrap_boxed(object);
        (self.func)(object).ok_or_else(|| {
            Error::Type(format!(
                "getter {} called on {}",
                self.name,
                object.type_name()
            ))
        })
    }
}

impl fmt::Debug for Getter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Getter").field("name", &self.name).finish()
    }
}

/// Named, type-erased setter
#[derive(Clone)]
pub struct Setter {
    name: String,
    param: Param,
    func: Arc<SetFn>,
}

impl Setter {
    /// Accessor name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter kind
    pub fn param(&self) -> &Param {
        &self.param
    }

    /// Apply a value to an object
    pub fn set(&self, object: &mut dyn XmlObject, value: Value) -> Result<()> {
        (self.func)(object, value)
    }
}

impl fmt::Debug for Setter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setter")
            .field("name", &self.name)
            .field("param", &self.param)
            .finish()
    }
}

enum Source<A> {
    Doc(String),
    Typed(A),
}

impl<A> Source<A>
where
    A: serde::de::DeserializeOwned + Default,
{
    fn resolve(self, location: &str) -> Result<Option<A>> {
        match self {
            Source::Typed(annotation) => Ok(Some(annotation)),
            Source::Doc(doc) => {
                parse_annotation(&doc).map_err(|e| Error::from(e.with_location(location)))
            }
        }
    }
}

/// Definition of a mapped class, consumed by [`ClassRegistry::register`]
pub struct ClassDef<T> {
    name: String,
    annotation: Option<Source<ClassAnnotation>>,
    properties: Vec<(String, Source<PropertyAnnotation>)>,
    getters: IndexMap<String, Getter>,
    setters: IndexMap<String, Setter>,
    to_text: Option<Arc<ToTextFn>>,
    from_text: Option<Arc<FromTextFn>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: XmlObject + Default> ClassDef<T> {
    /// Start a definition for class `name` backed by `T`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: None,
            properties: Vec::new(),
            getters: IndexMap::new(),
            setters: IndexMap::new(),
            to_text: None,
            from_text: None,
            _marker: PhantomData,
        }
    }

    /// Class documentation; an `@xml` marker in it carries the class options
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.annotation = Some(Source::Doc(doc.into()));
        self
    }

    /// Class options given directly
    pub fn annotate(mut self, annotation: ClassAnnotation) -> Self {
        self.annotation = Some(Source::Typed(annotation));
        self
    }

    /// Declare a property with its documentation.
    ///
    /// Properties whose documentation has no `@xml` marker are not mapped.
    pub fn property(mut self, field: impl Into<String>, doc: impl Into<String>) -> Self {
        self.properties.push((field.into(), Source::Doc(doc.into())));
        self
    }

    /// Declare a mapped property with its annotation given directly
    pub fn property_with(mut self, field: impl Into<String>, annotation: PropertyAnnotation) -> Self {
        self.properties.push((field.into(), Source::Typed(annotation)));
        self
    }

    /// Register a getter under `name`
    pub fn getter<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: for<'a> Fn(&'a T) -> ValueRef<'a> + Send + Sync + 'static,
    {
        let name = name.into();
        let func = erase_getter(move |object| object.as_any().downcast_ref::<T>().map(|t| f(t)));
        self.getters.insert(name.clone(), Getter { name, func });
        self
    }

    /// Register a setter under `name`, expecting `param`
    pub fn setter<F>(mut self, name: impl Into<String>, param: Param, f: F) -> Self
    where
        F: Fn(&mut T, Value) -> Result<()> + Send + Sync + 'static,
    {
        let name = name.into();
        let accessor = name.clone();
        let func = erase_setter(move |object, value| {
            let type_name = (*object).type_name();
            match object.as_any_mut().downcast_mut::<T>() {
                Some(target) => f(target, value),
                None => Err(Error::Type(format!(
                    "setter {} called on {}",
                    accessor, type_name
                ))),
            }
        });
        self.setters.insert(name.clone(), Setter { name, param, func });
        self
    }

    /// String conversion used when an instance is placed in an attribute
    pub fn to_text<F>(mut self, f: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        self.to_text = Some(Arc::new(move |object: &dyn XmlObject| {
            object.as_any().downcast_ref::<T>().map(|t| f(t))
        }));
        self
    }

    /// Construction from attribute text, for setters taking this class
    pub fn from_text<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Result<T> + Send + Sync + 'static,
    {
        self.from_text = Some(Arc::new(move |text: &str| {
            f(text).map(|t| Box::new(t) as Box<dyn XmlObject>)
        }));
        self
    }

    fn into_descriptor(self) -> Result<ClassDescriptor> {
        let class = self.name;

        let annotation = match self.annotation {
            Some(source) => source.resolve(&class)?,
            None => None,
        };

        let mut properties = Vec::with_capacity(self.properties.len());
        for (field, source) in self.properties {
            let annotation = source.resolve(&format!("{}.{}", class, field))?;
            properties.push(PropertyDecl { field, annotation });
        }

        let check = |accessor: &Option<String>, known: bool| -> Result<()> {
            match accessor {
                Some(accessor) if !known => Err(Error::UnknownAccessor {
                    class: class.clone(),
                    accessor: accessor.clone(),
                }),
                _ => Ok(()),
            }
        };

        for decl in &properties {
            if let Some(ref annotation) = decl.annotation {
                let getter = &annotation.getter;
                check(getter, getter.as_ref().map_or(true, |g| self.getters.contains_key(g)))?;
                let setter = &annotation.setter;
                check(setter, setter.as_ref().map_or(true, |s| self.setters.contains_key(s)))?;
            }
        }
        if let Some(ref annotation) = annotation {
            let default_setter = &annotation.default_setter;
            check(
                default_setter,
                default_setter.as_ref().map_or(true, |s| self.setters.contains_key(s)),
            )?;
            // Unmatched nodes reach the default setter as objects only
            if let Some(setter) = default_setter.as_ref().and_then(|s| self.setters.get(s)) {
                if matches!(setter.param, Param::Text) {
                    return Err(ParseError::new(format!(
                        "default setter '{}' must take an object",
                        setter.name
                    ))
                    .with_location(class.clone())
                    .into());
                }
            }
        }

        Ok(ClassDescriptor {
            name: class,
            type_id: TypeId::of::<T>(),
            annotation,
            properties,
            getters: self.getters,
            setters: self.setters,
            construct: construct::<T>,
            to_text: self.to_text,
            from_text: self.from_text,
        })
    }
}

/// A declared property and its annotation (`None` when not mapped)
#[derive(Debug, Clone)]
pub struct PropertyDecl {
    /// Field name
    pub field: String,
    /// Parsed annotation
    pub annotation: Option<PropertyAnnotation>,
}

/// A registered class
pub struct ClassDescriptor {
    name: String,
    type_id: TypeId,
    annotation: Option<ClassAnnotation>,
    properties: Vec<PropertyDecl>,
    getters: IndexMap<String, Getter>,
    setters: IndexMap<String, Setter>,
    construct: fn() -> Box<dyn XmlObject>,
    to_text: Option<Arc<ToTextFn>>,
    from_text: Option<Arc<FromTextFn>>,
}

impl ClassDescriptor {
    /// Fully qualified class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Backing Rust type
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Class annotation, if the class carries one
    pub fn annotation(&self) -> Option<&ClassAnnotation> {
        self.annotation.as_ref()
    }

    /// Declared properties in order
    pub fn properties(&self) -> &[PropertyDecl] {
        &self.properties
    }

    /// Getter by name
    pub fn getter(&self, name: &str) -> Option<&Getter> {
        self.getters.get(name)
    }

    /// Setter by name
    pub fn setter(&self, name: &str) -> Option<&Setter> {
        self.setters.get(name)
    }

    /// Fresh instance with default field values
    pub fn construct(&self) -> Box<dyn XmlObject> {
        (self.construct)()
    }

    /// String form of an instance, if the class has one
    pub fn to_text(&self, object: &dyn XmlObject) -> Option<String> {
        self.to_text
            .as_ref()
            .and_then(|f| f(unwrap_boxed(object)))
    }

    /// Instance built from text, if the class supports it
    pub fn from_text(&self, text: &str) -> Option<Result<Box<dyn XmlObject>>> {
        self.from_text.as_ref().map(|f| f(text))
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("annotation", &self.annotation)
            .field("properties", &self.properties)
            .field("getters", &self.getters.keys().collect::<Vec<_>>())
            .field("setters", &self.setters.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// The set of classes a serializer can map
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: IndexMap<String, Arc<ClassDescriptor>>,
    by_type: HashMap<TypeId, String>,
}

impl ClassRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class definition
    pub fn register<T: XmlObject + Default>(&mut self, def: ClassDef<T>) -> Result<&mut Self> {
        if self.classes.contains_key(&def.name) {
            return Err(Error::DuplicateClass(def.name));
        }
        if let Some(existing) = self.by_type.get(&TypeId::of::<T>()) {
            return Err(Error::DuplicateClass(format!(
                "{} is already registered as {}",
                std::any::type_name::<T>(),
                existing
            )));
        }

        let descriptor = def.into_descriptor()?;
        log::debug!(
            "registered class {} ({} declared properties)",
            descriptor.name,
            descriptor.properties.len()
        );

        self.by_type
            .insert(descriptor.type_id, descriptor.name.clone());
        self.classes
            .insert(descriptor.name.clone(), Arc::new(descriptor));
        Ok(self)
    }

    /// Builder form of [`ClassRegistry::register`]
    pub fn with<T: XmlObject + Default>(mut self, def: ClassDef<T>) -> Result<Self> {
        self.register(def)?;
        Ok(self)
    }

    /// Class by name
    pub fn get(&self, name: &str) -> Option<&Arc<ClassDescriptor>> {
        self.classes.get(name)
    }

    /// Whether `name` names a registered class
    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Class name registered for the concrete type of `object`
    pub fn class_name_of(&self, object: &dyn XmlObject) -> Option<&str> {
        self.by_type
            .get(&object_type_id(object))
            .map(|s| s.as_str())
    }

    /// Class name registered for the Rust type `T`
    pub fn class_name_for<T: XmlObject>(&self) -> Option<&str> {
        self.by_type.get(&TypeId::of::<T>()).map(|s| s.as_str())
    }

    /// Registered class names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(|s| s.as_str())
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether no class is registered
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
