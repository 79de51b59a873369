//! Mapped classes shared by the integration tests.
//!
//! Every class lives under the `app::` namespace except `App\Human`, which is
//! only reachable through a class override.

#![allow(dead_code)]

use std::cell::OnceCell;
use std::rc::Rc;
use xmlmapper::prelude::*;

/// Install a test logger once per test binary
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Configuration resolving tag names inside `app::`
pub fn config() -> MappingConfig {
    MappingConfig::new().with_classes_namespace("app::")
}

/// Registry holding every fixture class
pub fn registry() -> ClassRegistry {
    let mut registry = ClassRegistry::new();
    registry
        .register(address_def())
        .and_then(|r| r.register(person_def()))
        .and_then(|r| r.register(human_def()))
        .and_then(|r| r.register(basket_def()))
        .and_then(|r| r.register(extra_def()))
        .and_then(|r| r.register(color_def()))
        .and_then(|r| r.register(shape_def()))
        .and_then(|r| r.register(catalog_def()))
        .and_then(|r| r.register(node_def()))
        .expect("fixture classes register");
    registry
}

/// Serializer over all fixture classes
pub fn serializer(config: MappingConfig) -> XmlSerializer {
    XmlSerializer::new(registry(), config)
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub zip: Option<String>,
}

pub fn address_def() -> ClassDef<Address> {
    ClassDef::<Address>::new("app::Address")
        .property("zip", r#"@xml({"as": "attr"})"#)
        .property("street", "@xml")
        .property("city", "@xml")
        .getter("getZip", |a| ValueRef::from(a.zip.as_ref()))
        .getter("getStreet", |a| ValueRef::from(&a.street))
        .getter("getCity", |a| ValueRef::from(&a.city))
        .setter("setZip", Param::Text, |a, v| {
            a.zip = v.into_text()?;
            Ok(())
        })
        .setter("setStreet", Param::Text, |a, v| {
            a.street = v.into_text()?.unwrap_or_default();
            Ok(())
        })
        .setter("setCity", Param::Text, |a, v| {
            a.city = v.into_text()?.unwrap_or_default();
            Ok(())
        })
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Person {
    pub id: u32,
    pub name: String,
    pub nickname: Option<String>,
    pub bio: String,
    pub address: Option<Address>,
    pub tags: Vec<String>,
}

pub fn person_def() -> ClassDef<Person> {
    ClassDef::<Person>::new("app::Person")
        .doc("A registered person.\n@xml")
        .property("id", r#"@xml({"as": "attr"})"#)
        .property("name", "@xml")
        .property("nickname", r#"@xml({"nil": true})"#)
        .property("bio", r#"@xml({"maxLength": 5})"#)
        .property("address", "@xml")
        .property("tags", r#"@xml({"name": "tag"})"#)
        .property("age", "Derived from the birth date, never mapped.")
        .getter("getId", |p| ValueRef::display(&p.id))
        .getter("getName", |p| ValueRef::from(&p.name))
        .getter("getNickname", |p| ValueRef::from(p.nickname.as_ref()))
        .getter("getBio", |p| ValueRef::from(&p.bio))
        .getter("getAddress", |p| ValueRef::optional(p.address.as_ref()))
        .getter("getTags", |p| ValueRef::list(&p.tags))
        .setter("setId", Param::Text, |p, v| {
            p.id = v.parse::<u32>()?.unwrap_or_default();
            Ok(())
        })
        .setter("setName", Param::Text, |p, v| {
            p.name = v.into_text()?.unwrap_or_default();
            Ok(())
        })
        .setter("setNickname", Param::Text, |p, v| {
            p.nickname = v.into_text()?;
            Ok(())
        })
        .setter("setBio", Param::Text, |p, v| {
            p.bio = v.into_text()?.unwrap_or_default();
            Ok(())
        })
        .setter("setAddress", Param::object("app::Address"), |p, v| {
            p.address = v.into_object::<Address>()?;
            Ok(())
        })
        .setter("setTags", Param::Text, |p, v| {
            p.tags.extend(v.into_text()?);
            Ok(())
        })
}

#[derive(Debug, Default, PartialEq)]
pub struct Human {
    pub name: String,
}

pub fn human_def() -> ClassDef<Human> {
    ClassDef::<Human>::new("App\\Human")
        .property("name", "@xml")
        .getter("getName", |h| ValueRef::from(&h.name))
        .setter("setName", Param::Text, |h, v| {
            h.name = v.into_text()?.unwrap_or_default();
            Ok(())
        })
}

/// Collects every node it has no property for through `addItem`
#[derive(Debug, Default, PartialEq)]
pub struct Basket {
    pub label: String,
    pub items: Vec<Extra>,
}

pub fn basket_def() -> ClassDef<Basket> {
    ClassDef::<Basket>::new("app::Basket")
        .doc(r#"@xml({"name": "root", "defaultSetter": "addItem"})"#)
        .property("label", "@xml")
        .getter("getLabel", |b| ValueRef::from(&b.label))
        .setter("setLabel", Param::Text, |b, v| {
            b.label = v.into_text()?.unwrap_or_default();
            Ok(())
        })
        .setter("addItem", Param::object("app::Extra"), |b, v| {
            b.items.extend(v.into_object::<Extra>()?);
            Ok(())
        })
}

#[derive(Debug, Default, PartialEq)]
pub struct Extra {
    pub code: String,
}

pub fn extra_def() -> ClassDef<Extra> {
    ClassDef::<Extra>::new("app::Extra")
        .property("code", "@xml")
        .getter("getCode", |e| ValueRef::from(&e.code))
        .setter("setCode", Param::Text, |e, v| {
            e.code = v.into_text()?.unwrap_or_default();
            Ok(())
        })
        .from_text(|text| {
            Ok(Extra {
                code: text.to_string(),
            })
        })
}

/// Has a text form, so it can sit in an attribute
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

fn parse_color(text: &str) -> Result<Color> {
    let hex = text
        .trim()
        .strip_prefix('#')
        .filter(|hex| hex.len() == 6 && hex.is_ascii())
        .ok_or_else(|| Error::Type(format!("not a color: {}", text)))?;
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| Error::Type(e.to_string()))
    };
    Ok(Color {
        r: channel(0)?,
        g: channel(2)?,
        b: channel(4)?,
    })
}

pub fn color_def() -> ClassDef<Color> {
    ClassDef::<Color>::new("app::Color")
        .to_text(|c| format!("#{:02x}{:02x}{:02x}", c.r, c.g, c.b))
        .from_text(parse_color)
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Shape {
    pub kind: String,
    pub fill: Option<Color>,
    pub labels: Vec<String>,
}

pub fn shape_def() -> ClassDef<Shape> {
    ClassDef::<Shape>::new("app::Shape")
        .doc(r#"@xml({"name": "shape"})"#)
        .property("kind", r#"@xml({"as": "attr"})"#)
        .property("fill", r#"@xml({"as": "attr"})"#)
        .property("labels", r#"@xml({"as": "attr"})"#)
        .getter("getKind", |s| ValueRef::from(&s.kind))
        .getter("getFill", |s| ValueRef::optional(s.fill.as_ref()))
        .getter("getLabels", |s| ValueRef::list(&s.labels))
        .setter("setKind", Param::Text, |s, v| {
            s.kind = v.into_text()?.unwrap_or_default();
            Ok(())
        })
        .setter("setFill", Param::object("app::Color"), |s, v| {
            s.fill = v.into_object::<Color>()?;
            Ok(())
        })
        .setter("setLabels", Param::Text, |s, v| {
            s.labels = v
                .into_text()?
                .unwrap_or_default()
                .split_whitespace()
                .map(str::to_string)
                .collect();
            Ok(())
        })
}

/// Entries name themselves and come back through the default setter
#[derive(Debug, Default, PartialEq)]
pub struct Catalog {
    pub entries: Vec<Address>,
}

pub fn catalog_def() -> ClassDef<Catalog> {
    ClassDef::<Catalog>::new("app::Catalog")
        .doc(r#"@xml({"name": "catalog", "defaultSetter": "addEntry"})"#)
        .property("entries", r#"@xml({"nameFrom": "child"})"#)
        .getter("getEntries", |c| ValueRef::objects(&c.entries))
        .setter("addEntry", Param::any_object(), |c, v| {
            c.entries.extend(v.into_object::<Address>()?);
            Ok(())
        })
}

/// Linked node; `next` may point back at an ancestor
#[derive(Debug, Default)]
pub struct Node {
    pub name: String,
    pub next: OnceCell<Rc<Node>>,
}

pub fn node_def() -> ClassDef<Node> {
    ClassDef::<Node>::new("app::Node")
        .property("name", r#"@xml({"as": "attr"})"#)
        .property("next", "@xml")
        .getter("getName", |n| ValueRef::from(&n.name))
        .getter("getNext", |n| ValueRef::optional(n.next.get().map(|next| &**next)))
}

/// Node named `name` with no successor
pub fn node(name: &str) -> Rc<Node> {
    Rc::new(Node {
        name: name.to_string(),
        next: OnceCell::new(),
    })
}
