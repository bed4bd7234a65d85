use bcl_dynamic::{DescriptorPool, DynMessage, FieldKind, MessageDescriptor, ScalarType};
use bcl_walker::{ArrayOfScalarField, AstValue, Container, Field, ReflectError, ScalarField};

fn pool() -> std::rc::Rc<DescriptorPool> {
    DescriptorPool::new([
        MessageDescriptor::new("test.v1.Config")
            .field("name", FieldKind::Scalar(ScalarType::String))
            .field("ports", FieldKind::Repeated(ScalarType::Int64))
            .field("enabled", FieldKind::Scalar(ScalarType::Bool))
            .field("server", FieldKind::message("test.v1.Server")),
        MessageDescriptor::new("test.v1.Server")
            .field("host", FieldKind::Scalar(ScalarType::String)),
    ])
    .unwrap()
}

#[test]
fn writes_through_container_are_visible_on_the_message() {
    bcl_testhelpers::setup();

    let config = DynMessage::new(&pool(), "test.v1.Config").unwrap();
    let container = config.container();
    assert_eq!(container.schema_name(), "test.v1.Config");
    assert_eq!(container.type_name(), "Config");

    let mut ports = container
        .property_as_field("ports")
        .unwrap()
        .as_array_of_scalar()
        .unwrap();
    assert_eq!(ports.append_ast_value(&AstValue::Integer(80)).unwrap(), 0);
    assert_eq!(ports.append_ast_value(&AstValue::Integer(443)).unwrap(), 1);

    container
        .property_as_field("enabled")
        .unwrap()
        .as_scalar()
        .unwrap()
        .set_ast_value(&AstValue::Bool(true))
        .unwrap();

    let server = container.property_as_container("server").unwrap();
    server
        .property_as_field("host")
        .unwrap()
        .as_scalar()
        .unwrap()
        .set_ast_value(&AstValue::from("localhost"))
        .unwrap();

    let ports: Vec<i64> = config
        .get_list("ports")
        .iter()
        .filter_map(|v| v.as_i64())
        .collect();
    assert_eq!(ports, vec![80, 443]);
    assert_eq!(config.get("enabled").and_then(|v| v.as_bool()), Some(true));
    assert_eq!(
        config
            .get_message("server")
            .and_then(|server| server.get_str("host"))
            .as_deref(),
        Some("localhost")
    );
}

#[test]
fn unknown_message_is_reported() {
    bcl_testhelpers::setup();

    let err = DynMessage::new(&pool(), "test.v1.Nope").unwrap_err();
    assert_eq!(err, ReflectError::UnknownSchema("test.v1.Nope".to_string()));
}

#[test]
fn field_type_names() {
    bcl_testhelpers::setup();

    let config = DynMessage::new(&pool(), "test.v1.Config").unwrap();
    let ports = config.container().property_as_field("ports").unwrap();
    assert_eq!(ports.type_name(), "repeated int64");
    assert_eq!(ports.full_type_name(), "test.v1.Config.ports (repeated int64)");
    assert!(ports.as_scalar().is_none());
}
