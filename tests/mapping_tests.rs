//! Integration tests for serializing and deserializing mapped classes

mod fixtures;

use fixtures::*;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use xmlmapper::prelude::*;

fn ann() -> Person {
    Person {
        id: 7,
        name: "Ann".into(),
        nickname: None,
        bio: "Hi".into(),
        address: Some(Address {
            street: "Main St".into(),
            city: "Oslo".into(),
            zip: Some("0150".into()),
        }),
        tags: vec!["a".into(), "b".into()],
    }
}

const ANN_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8"?>"#,
    r#"<Person xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" id="7">"#,
    r#"<name>Ann</name>"#,
    r#"<nickname xsi:nil="true"/>"#,
    r#"<bio>Hi</bio>"#,
    r#"<address zip="0150"><street>Main St</street><city>Oslo</city></address>"#,
    r#"<tag>a</tag><tag>b</tag>"#,
    r#"</Person>"#
);

#[test]
fn test_serialize_person() {
    init_logging();
    let serializer = serializer(config());
    assert_eq!(serializer.serialize(&ann()).unwrap(), ANN_XML);
}

#[test]
fn test_round_trip_person() {
    init_logging();
    let serializer = serializer(config());

    let xml = serializer.serialize(&ann()).unwrap();
    let back = serializer.unserialize(&xml).unwrap();
    let back = back.into_any().downcast::<Person>().unwrap();
    assert_eq!(*back, ann());

    let typed: Person = serializer.unserialize_as(&xml).unwrap();
    assert_eq!(typed, ann());
}

#[test]
fn test_serialize_is_idempotent() {
    let serializer = serializer(config());
    let person = ann();
    let first = serializer.serialize(&person).unwrap();
    let second = serializer.serialize(&person).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_attribute_and_element_placement() {
    let serializer = serializer(config());
    let root = serializer.to_element(&ann(), None).unwrap();

    assert_eq!(root.attribute("id"), Some("7"));
    assert!(root.find_children("id").is_empty());
    assert!(root.attribute("name").is_none());
    assert_eq!(root.find_children("name").len(), 1);

    let address = root.find_children("address")[0];
    assert_eq!(address.attribute("zip"), Some("0150"));
    assert!(address.find_children("zip").is_empty());
}

#[test]
fn test_element_name_override() {
    let serializer = serializer(config());
    let root = serializer.to_element(&ann(), Some("member")).unwrap();
    assert_eq!(root.name, "member");
}

#[test]
fn test_null_policy() {
    let person = Person {
        id: 1,
        ..Default::default()
    };

    // Session default omits nulls; the nickname property asks for a nil marker
    let root = serializer(config()).to_element(&person, None).unwrap();
    assert!(root.find_children("address").is_empty());
    let nickname = root.find_children("nickname")[0];
    assert!(nickname.is_nil());
    assert_eq!(nickname.text(), None);

    let root = serializer(config().with_skip_when_empty(false))
        .to_element(&person, None)
        .unwrap();
    let address = root.find_children("address")[0];
    assert!(address.is_nil());
    assert!(address.children.is_empty());
}

#[test]
fn test_nil_elements_deserialize_to_none() {
    let serializer = serializer(config());
    let xml = r#"<Person xmlns:i="http://www.w3.org/2001/XMLSchema-instance">
        <nickname i:nil="true"/>
        <address i:nil="true"/>
    </Person>"#;

    let person: Person = serializer.unserialize_as(xml).unwrap();
    assert_eq!(person.nickname, None);
    assert_eq!(person.address, None);
}

#[test]
fn test_truncation() {
    let serializer = serializer(config());
    let person = Person {
        bio: "HelloWorld".into(),
        ..Default::default()
    };
    let root = serializer.to_element(&person, None).unwrap();
    assert_eq!(root.find_children("bio")[0].text(), Some("Hello"));
}

#[test]
fn test_class_identity_override() {
    init_logging();
    let config = MappingConfig::from_json(r#"{"mapperClasses": {"person": "App\\Human"}}"#).unwrap();
    let serializer = serializer(config.with_classes_namespace("app::"));

    let xml = "<person><name>Ann</name></person>";
    assert_eq!(
        serializer.resolve_class(&Element::parse(xml).unwrap(), None).unwrap(),
        "App\\Human"
    );

    let object = serializer.unserialize(xml).unwrap();
    let human = object.into_any().downcast::<Human>().unwrap();
    assert_eq!(human.name, "Ann");
}

#[test]
fn test_default_setter_fallback() {
    let serializer = serializer(config());

    let basket: Basket = serializer
        .unserialize_as("<root><extra>1</extra></root>")
        .unwrap();
    assert_eq!(basket.items, vec![Extra::default()]);

    // Attributes are applied before children, both in document order
    let basket: Basket = serializer
        .unserialize_as(r#"<root code="9"><extra><code>7</code></extra><label>L</label></root>"#)
        .unwrap();
    assert_eq!(basket.label, "L");
    assert_eq!(
        basket.items,
        vec![Extra { code: "9".into() }, Extra { code: "7".into() }]
    );
}

#[test]
fn test_lenient_mode_skips_unknown_nodes() {
    let serializer = serializer(config());
    let person: Person = serializer
        .unserialize_as(r#"<Person id="3" mood="happy"><hobby>chess</hobby><name>Bo</name></Person>"#)
        .unwrap();
    assert_eq!(person.id, 3);
    assert_eq!(person.name, "Bo");
}

#[test]
fn test_strict_mode_rejects_unknown_nodes() {
    let serializer = serializer(config().with_skip_unknown_objects(false));

    match serializer.unserialize(r#"<Person id="3" mood="happy"/>"#) {
        Err(Error::UnknownAttribute { class, name }) => {
            assert_eq!(class, "app::Person");
            assert_eq!(name, "mood");
        }
        other => panic!("expected UnknownAttribute, got {:?}", other),
    }

    match serializer.unserialize("<Person><hobby>chess</hobby></Person>") {
        Err(Error::UnknownElement { class, name }) => {
            assert_eq!(class, "app::Person");
            assert_eq!(name, "hobby");
        }
        other => panic!("expected UnknownElement, got {:?}", other),
    }

    // Reserved attributes are not unknown
    let xml = r#"<Person xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:type="Person"/>"#;
    assert!(serializer.unserialize(xml).is_ok());
}

#[test]
fn test_unknown_class() {
    let serializer = serializer(config());
    assert!(matches!(
        serializer.unserialize("<Robot><name>R2</name></Robot>"),
        Err(Error::ClassNotFound(ref name)) if name == "app::Robot"
    ));

    // A failing nested class aborts the whole call
    let config = config().with_mapper_class("address", "app::Nowhere");
    assert!(matches!(
        serializer_with(config).unserialize("<Person><address/></Person>"),
        Err(Error::ClassNotFound(ref name)) if name == "app::Nowhere"
    ));
}

fn serializer_with(config: MappingConfig) -> XmlSerializer {
    fixtures::serializer(config)
}

#[test]
fn test_type_attribute_identity() {
    let config = config().with_extract_class_from(ClassIdentitySource::TypeAttribute);
    let serializer = serializer(config);

    let root = serializer.to_element(&ann(), None).unwrap();
    assert_eq!(root.attribute("xsi:type"), Some("Person"));
    assert_eq!(
        root.find_children("address")[0].attribute("xsi:type"),
        Some("Address")
    );

    let xml = serializer.serialize(&ann()).unwrap();
    let back: Person = serializer.unserialize_as(&xml).unwrap();
    assert_eq!(back, ann());

    assert!(matches!(
        serializer.unserialize("<Person/>"),
        Err(Error::MissingTypeAttribute { ref element }) if element == "Person"
    ));
}

#[test]
fn test_attribute_text_conversions() {
    let serializer = serializer(config());
    let shape = Shape {
        kind: "circle".into(),
        fill: Some(Color { r: 255, g: 128, b: 0 }),
        labels: vec!["big".into(), "round".into()],
    };

    let xml = serializer.serialize(&shape).unwrap();
    assert_eq!(
        xml,
        r##"<?xml version="1.0" encoding="UTF-8"?><shape kind="circle" fill="#ff8000" labels="big round"/>"##
    );

    let back: Shape = serializer.unserialize_as(&xml).unwrap();
    assert_eq!(back, shape);
}

#[derive(Debug, Default)]
struct Badge {
    owner: Address,
}

fn badge_serializer() -> XmlSerializer {
    let mut registry = registry();
    registry
        .register(
            ClassDef::<Badge>::new("app::Badge")
                .property("owner", r#"@xml({"as": "attr"})"#)
                .getter("getOwner", |b| ValueRef::object(&b.owner))
                .setter("setOwner", Param::object("app::Address"), |b, v| {
                    b.owner = v.into_object::<Address>()?.unwrap_or_default();
                    Ok(())
                }),
        )
        .unwrap();
    XmlSerializer::new(registry, config())
}

#[test]
fn test_non_scalar_attribute() {
    let serializer = badge_serializer();

    match serializer.serialize(&Badge::default()) {
        Err(Error::NonScalarAttribute { class, property }) => {
            assert_eq!(class, "app::Badge");
            assert_eq!(property, "owner");
        }
        other => panic!("expected NonScalarAttribute, got {:?}", other),
    }

    assert!(matches!(
        serializer.unserialize(r#"<Badge owner="Ann"/>"#),
        Err(Error::NonScalarAttribute { .. })
    ));
}

#[test]
fn test_children_named_by_their_class() {
    let serializer = serializer(config());
    let catalog = Catalog {
        entries: vec![
            Address {
                street: "A".into(),
                city: "X".into(),
                zip: None,
            },
            Address {
                street: "B".into(),
                city: "Y".into(),
                zip: Some("1".into()),
            },
        ],
    };

    let xml = serializer.serialize(&catalog).unwrap();
    assert_eq!(
        xml,
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?><catalog>"#,
            r#"<Address><street>A</street><city>X</city></Address>"#,
            r#"<Address zip="1"><street>B</street><city>Y</city></Address>"#,
            r#"</catalog>"#
        )
    );

    let back: Catalog = serializer.unserialize_as(&xml).unwrap();
    assert_eq!(back, catalog);
}

#[test]
fn test_cycle_detected() {
    let serializer = serializer(config());

    let a = node("a");
    let b = node("b");
    b.next.set(a.clone()).unwrap();
    a.next.set(b.clone()).unwrap();

    assert!(matches!(
        serializer.serialize(&*a),
        Err(Error::CycleDetected(ref class)) if class == "app::Node"
    ));

    let selfish = node("self");
    selfish.next.set(selfish.clone()).unwrap();
    assert!(matches!(
        serializer.serialize(&*selfish),
        Err(Error::CycleDetected(_))
    ));
}

#[test]
fn test_acyclic_chain_serializes() {
    let serializer = serializer(config());
    let a = node("a");
    a.next.set(node("b")).unwrap();

    let xml = serializer.serialize(&*a).unwrap();
    assert_eq!(
        xml,
        r#"<?xml version="1.0" encoding="UTF-8"?><Node name="a"><next name="b"/></Node>"#
    );
}

#[test]
fn test_depth_limit() {
    let serializer = serializer(config()).with_limits(Limits::default().with_max_depth(1));

    let a = node("a");
    let b = node("b");
    b.next.set(node("c")).unwrap();
    a.next.set(b).unwrap();
    assert!(matches!(
        serializer.serialize(&*a),
        Err(Error::LimitExceeded(_))
    ));

    let xml = "<Person><address><street>x</street></address></Person>";
    assert!(serializer.unserialize(xml).is_ok());
    let shallow = serializer.with_limits(Limits::default().with_max_depth(0));
    assert!(matches!(
        shallow.unserialize(xml),
        Err(Error::LimitExceeded(_))
    ));
}

#[test]
fn test_deep_unmapped_nesting_is_rejected() {
    let serializer = serializer(config()).with_limits(Limits::strict());
    let depth = 100_000;
    let xml = format!("<Person>{}{}</Person>", "<a>".repeat(depth), "</a>".repeat(depth));
    assert!(xml.len() < Limits::strict().max_input_size);

    assert!(matches!(
        serializer.unserialize(&xml),
        Err(Error::LimitExceeded(_))
    ));
}

#[test]
fn test_deep_parsed_tree_is_rejected() {
    let serializer = serializer(config()).with_limits(Limits::default().with_max_depth(2));
    let xml = "<Person><a><b><c/></b></a></Person>";
    let doc = roxmltree::Document::parse(xml).unwrap();

    assert!(matches!(
        serializer.from_node(doc.root_element(), None),
        Err(Error::LimitExceeded(_))
    ));
}

#[test]
fn test_input_size_limit() {
    let serializer = serializer(config()).with_limits(Limits::default().with_max_input_size(16));
    assert!(matches!(
        serializer.unserialize("<Person><name>Ann</name></Person>"),
        Err(Error::LimitExceeded(_))
    ));
}

#[test]
fn test_malformed_xml() {
    let serializer = serializer(config());
    for xml in ["<Person>", "", "<Person></Human>", "<a/><b/>"] {
        assert!(
            matches!(serializer.unserialize(xml), Err(Error::MalformedXml(_))),
            "accepted {:?}",
            xml
        );
    }
}

#[test]
fn test_from_parsed_tree() {
    let serializer = serializer(config());
    let xml = ANN_XML.trim_start_matches(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    let doc = roxmltree::Document::parse(xml).unwrap();

    let object = serializer.from_node(doc.root_element(), None).unwrap();
    let person = object.into_any().downcast::<Person>().unwrap();
    assert_eq!(*person, ann());

    let element = Element::parse(ANN_XML).unwrap();
    let object = serializer.from_element(&element, Some("app::Person")).unwrap();
    assert_eq!(*object.into_any().downcast::<Person>().unwrap(), ann());
}

#[test]
fn test_summary() {
    let serializer = serializer(config());

    let summary = serializer.summary("app::Person").unwrap();
    let fields: Vec<_> = summary.properties().iter().map(|p| p.field_name()).collect();
    assert_eq!(fields, vec!["id", "name", "nickname", "bio", "address", "tags"]);
    assert_eq!(summary.element("tag").unwrap().field_name(), "tags");

    assert!(matches!(
        serializer.summary("app::Nope"),
        Err(Error::ClassNotFound(_))
    ));
}

#[test]
fn test_shared_between_threads() {
    fn assert_sync<T: Send + Sync>() {}
    assert_sync::<XmlSerializer>();

    let serializer = serializer(config());
    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    let summary = serializer.summary("app::Person").unwrap();
                    let xml = serializer.serialize(&ann()).unwrap();
                    (summary, xml)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let first = serializer.summary("app::Person").unwrap();
    for (summary, xml) in &results {
        assert!(Arc::ptr_eq(&first, summary));
        assert_eq!(xml.as_str(), ANN_XML);
    }
}

#[test]
fn test_unregistered_object() {
    #[derive(Default)]
    struct Stranger;

    let serializer = serializer(config());
    assert!(matches!(
        serializer.serialize(&Stranger),
        Err(Error::ClassNotFound(_))
    ));
}

#[test]
fn test_unserialize_as_wrong_type() {
    let config = config().with_mapper_class("Person", "app::Address");
    let serializer = serializer(config);
    assert!(matches!(
        serializer.unserialize_as::<Person>("<Person/>"),
        Err(Error::Type(_))
    ));
}
