use super::Shape;
use crate::{
    error::ErrorKind,
    test_fixtures::{BadTable, Headless, Person, Pet},
    traits::Record,
    value::Value,
};

#[test]
fn full_shape_lists_every_field_but_the_id() {
    let shape = Shape::<Person>::of().unwrap();

    assert_eq!(
        shape.field_names(),
        vec![
            "name", "address", "age", "height", "rank", "active", "avatar", "joined"
        ]
    );
    assert_eq!(shape.primary().name(), "id");
    assert_eq!(shape.table(), "Person");
}

#[test]
fn non_default_shape_keeps_only_changed_fields() {
    let template = Person {
        address: "St Leonards".into(),
        age: 46,
        ..Person::default()
    };

    let partial = Shape::derive(&template, false).unwrap();
    assert_eq!(partial.field_names(), vec!["address", "age"]);

    let full = Shape::derive(&template, true).unwrap();
    assert_eq!(full.fields().len(), Person::FIELDS.len() - 1);
}

#[test]
fn all_default_template_yields_empty_shape() {
    let shape = Shape::derive(&Person::default(), false).unwrap();

    assert!(shape.is_empty());
}

#[test]
fn id_is_never_a_field_even_when_set() {
    let template = Person {
        id: "01ABC".into(),
        ..Person::default()
    };

    assert!(Shape::derive(&template, false).unwrap().is_empty());
}

#[test]
fn custom_id_field_is_used() {
    let shape = Shape::<Pet>::of().unwrap();

    assert_eq!(shape.primary().name(), "tag");
    assert_eq!(shape.field_names(), vec!["owner", "species"]);
}

#[test]
fn missing_primary_id_is_rejected() {
    let err = Shape::<Headless>::of().unwrap_err();

    assert_eq!(err.kind, ErrorKind::NoPrimaryId);
}

#[test]
fn table_name_with_separator_is_rejected() {
    let err = Shape::<BadTable>::of().unwrap_err();

    assert_eq!(err.kind, ErrorKind::MalformedKey);
}

#[test]
fn restrict_keeps_known_allowlisted_fields() {
    let shape = Shape::<Person>::of().unwrap().restrict(&["age", "name", "nope"]);

    // declaration order, not allowlist order
    assert_eq!(shape.field_names(), vec!["name", "age"]);
}

#[test]
fn restrict_with_no_known_fields_keeps_everything() {
    let all = Shape::<Person>::of().unwrap().fields().len();

    let shape = Shape::<Person>::of().unwrap().restrict(&["nope"]);
    assert_eq!(shape.fields().len(), all);

    let shape = Shape::<Person>::of().unwrap().restrict(&[]);
    assert_eq!(shape.fields().len(), all);
}

#[test]
fn assign_id_and_decoded_fields() {
    let shape = Shape::<Person>::of().unwrap();
    let mut person = Person::default();

    shape.assign_id(&mut person, "01XYZ").unwrap();
    let age = Person::field("age").unwrap();
    Shape::assign(age, &mut person, &Value::Int64(46).encode().unwrap()).unwrap();

    assert_eq!(person.id, "01XYZ");
    assert_eq!(person.age, 46);
}

#[test]
fn assign_rejects_bytes_of_another_kind() {
    let mut person = Person::default();
    let age = Person::field("age").unwrap();

    let err = Shape::assign(age, &mut person, &Value::Text("46".into()).encode().unwrap())
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeConversion);
}
