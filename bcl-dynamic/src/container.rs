//! [`Container`] and [`Field`] implementations over [`DynMessage`].

use std::fmt;
use std::rc::Rc;

use bcl_walker::{
    ArrayOfScalarField, AstValue, Container, Field, PropertyKind, ReflectError, ScalarField,
    TypeDescriptor,
};

use crate::{DynMessage, DynValue, FieldKind, ScalarType};

/// A message, or a map field of one, seen as a walker container.
#[derive(Clone)]
pub struct DynContainer {
    inner: Inner,
}

#[derive(Clone)]
enum Inner {
    Message {
        message: DynMessage,
        /// Set when the message is an element of a repeated field.
        index: Option<usize>,
    },
    Map {
        owner: DynMessage,
        field: String,
        kind: FieldKind,
        descriptor: Rc<TypeDescriptor>,
    },
}

impl DynContainer {
    pub(crate) fn message(message: DynMessage, index: Option<usize>) -> Self {
        DynContainer {
            inner: Inner::Message { message, index },
        }
    }

    /// The message behind this container, if it is not a map.
    pub fn as_message(&self) -> Option<&DynMessage> {
        match &self.inner {
            Inner::Message { message, .. } => Some(message),
            Inner::Map { .. } => None,
        }
    }

    fn no_such_property(&self, name: &str) -> ReflectError {
        ReflectError::NoSuchProperty {
            schema: self.schema_name().to_string(),
            property: name.to_string(),
        }
    }

    fn not_a_container(&self, name: &str, kind: PropertyKind) -> ReflectError {
        ReflectError::NotAContainer {
            schema: self.schema_name().to_string(),
            property: name.to_string(),
            kind,
        }
    }
}

fn message_field(message: &DynMessage, name: &str) -> Option<FieldKind> {
    message.descriptor().get_field(name).map(|f| f.kind.clone())
}

impl Container for DynContainer {
    type Field = DynField;

    fn descriptor(&self) -> &TypeDescriptor {
        match &self.inner {
            Inner::Message { message, .. } => &message.entry.type_descriptor,
            Inner::Map { descriptor, .. } => descriptor,
        }
    }

    fn property_as_container(&self, name: &str) -> Result<Self, ReflectError> {
        match &self.inner {
            Inner::Message { message, .. } => {
                let kind = message_field(message, name).ok_or_else(|| self.no_such_property(name))?;
                match &kind {
                    FieldKind::Message(target) => {
                        if let Some(existing) = message.get_message(name) {
                            return Ok(DynContainer::message(existing, None));
                        }
                        let child = message.new_child(target)?;
                        message.set(name, DynValue::Message(child.clone()));
                        Ok(DynContainer::message(child, None))
                    }
                    FieldKind::RepeatedMessage(target) => {
                        let child = message.new_child(target)?;
                        let index = message.push(name, DynValue::Message(child.clone()))?;
                        Ok(DynContainer::message(child, Some(index)))
                    }
                    FieldKind::Map(_) | FieldKind::MapOfMessage(_) => {
                        let descriptor = message
                            .entry
                            .map_types
                            .get(name)
                            .cloned()
                            .ok_or_else(|| self.no_such_property(name))?;
                        Ok(DynContainer {
                            inner: Inner::Map {
                                owner: message.clone(),
                                field: name.to_string(),
                                kind: kind.clone(),
                                descriptor,
                            },
                        })
                    }
                    FieldKind::Scalar(_) | FieldKind::Repeated(_) => {
                        Err(self.not_a_container(name, kind.property_kind()))
                    }
                }
            }
            Inner::Map {
                owner, field, kind, ..
            } => {
                let FieldKind::MapOfMessage(target) = kind else {
                    return Err(self.not_a_container(name, PropertyKind::Scalar));
                };
                let fresh = owner.new_child(target)?;
                let entry = owner.message_entry(field, name, fresh)?;
                Ok(DynContainer::message(entry, None))
            }
        }
    }

    fn property_as_field(&self, name: &str) -> Result<DynField, ReflectError> {
        match &self.inner {
            Inner::Message { message, .. } => {
                let kind = message_field(message, name).ok_or_else(|| self.no_such_property(name))?;
                Ok(DynField {
                    owner: message.clone(),
                    field: name.to_string(),
                    key: None,
                    kind,
                })
            }
            Inner::Map {
                owner, field, kind, ..
            } => Ok(DynField {
                owner: owner.clone(),
                field: field.clone(),
                key: Some(name.to_string()),
                kind: kind.clone(),
            }),
        }
    }

    fn element_index(&self) -> Option<usize> {
        match &self.inner {
            Inner::Message { index, .. } => *index,
            Inner::Map { .. } => None,
        }
    }
}

impl fmt::Debug for DynContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Inner::Message { message, index } => f
                .debug_struct("DynContainer")
                .field("message", &message.full_name())
                .field("index", index)
                .finish(),
            Inner::Map { owner, field, .. } => f
                .debug_struct("DynContainer")
                .field("map", &format!("{}.{field}", owner.full_name()))
                .finish(),
        }
    }
}

/// A field of a message, or one entry of a map field.
#[derive(Clone)]
pub struct DynField {
    owner: DynMessage,
    field: String,
    /// Set for map entries.
    key: Option<String>,
    kind: FieldKind,
}

impl DynField {
    fn full_name(&self) -> String {
        match &self.key {
            Some(key) => format!("{}.{}[{key:?}]", self.owner.full_name(), self.field),
            None => format!("{}.{}", self.owner.full_name(), self.field),
        }
    }

    fn value_kind(&self) -> String {
        match (&self.key, &self.kind) {
            (Some(_), FieldKind::Map(ty)) => ty.to_string(),
            (Some(_), FieldKind::MapOfMessage(name)) => name.clone(),
            (_, kind) => kind.to_string(),
        }
    }
}

impl Field for DynField {
    type Scalar = DynScalar;
    type Array = DynArray;

    fn type_name(&self) -> String {
        self.value_kind()
    }

    fn full_type_name(&self) -> String {
        format!("{} ({})", self.full_name(), self.value_kind())
    }

    fn as_scalar(&self) -> Option<DynScalar> {
        let ty = match (&self.key, &self.kind) {
            (None, FieldKind::Scalar(ty)) | (Some(_), FieldKind::Map(ty)) => *ty,
            _ => return None,
        };
        Some(DynScalar {
            field: self.clone(),
            ty,
        })
    }

    fn as_array_of_scalar(&self) -> Option<DynArray> {
        match (&self.key, &self.kind) {
            (None, FieldKind::Repeated(ty)) => Some(DynArray {
                field: self.clone(),
                ty: *ty,
            }),
            _ => None,
        }
    }
}

impl fmt::Debug for DynField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_type_name())
    }
}

/// A settable scalar field or map entry.
#[derive(Debug, Clone)]
pub struct DynScalar {
    field: DynField,
    ty: ScalarType,
}

impl ScalarField for DynScalar {
    fn set_ast_value(&mut self, value: &AstValue) -> Result<(), ReflectError> {
        let value = DynValue::from_ast(self.ty, value)?;
        let DynField {
            owner, field, key, ..
        } = &self.field;
        match key {
            None => {
                owner.set(field, value);
                Ok(())
            }
            Some(key) => owner.insert_entry(field, key, value),
        }
    }

    fn full_type_name(&self) -> String {
        self.field.full_type_name()
    }
}

/// An appendable repeated scalar field.
#[derive(Debug, Clone)]
pub struct DynArray {
    field: DynField,
    ty: ScalarType,
}

impl ArrayOfScalarField for DynArray {
    fn append_ast_value(&mut self, value: &AstValue) -> Result<usize, ReflectError> {
        let value = DynValue::from_ast(self.ty, value)?;
        self.field.owner.push(&self.field.field, value)
    }

    fn full_type_name(&self) -> String {
        self.field.full_type_name()
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::{DescriptorPool, MessageDescriptor};

    fn pool() -> Rc<DescriptorPool> {
        DescriptorPool::new([
            MessageDescriptor::new("test.v1.Element")
                .field("id", FieldKind::Scalar(ScalarType::Int64))
                .oneof(
                    "type",
                    [
                        ("foo", FieldKind::message("test.v1.Leaf")),
                        ("bar", FieldKind::message("test.v1.Leaf")),
                    ],
                ),
            MessageDescriptor::new("test.v1.Leaf")
                .field("ratio", FieldKind::Scalar(ScalarType::Double))
                .field("labels", FieldKind::Map(ScalarType::String))
                .field("children", FieldKind::repeated_message("test.v1.Leaf"))
                .field("named", FieldKind::map_of_message("test.v1.Leaf")),
        ])
        .unwrap()
    }

    #[test]
    fn selecting_a_oneof_member_clears_the_other() {
        let element = DynMessage::new(&pool(), "test.v1.Element").unwrap();
        let container = element.container();
        container.property_as_container("foo").unwrap();
        assert_eq!(element.which_oneof("type").as_deref(), Some("foo"));
        container.property_as_container("bar").unwrap();
        assert_eq!(element.which_oneof("type").as_deref(), Some("bar"));
        assert!(!element.has("foo"));
    }

    #[test]
    fn nested_message_is_reused() {
        let element = DynMessage::new(&pool(), "test.v1.Element").unwrap();
        let container = element.container();
        let first = container.property_as_container("foo").unwrap();
        first
            .property_as_field("ratio")
            .unwrap()
            .as_scalar()
            .unwrap()
            .set_ast_value(&AstValue::Float(0.5))
            .unwrap();
        let second = container.property_as_container("foo").unwrap();
        let leaf = second.as_message().unwrap();
        assert_eq!(leaf.get("ratio").and_then(|v| v.as_f64()), Some(0.5));
    }

    #[test]
    fn repeated_message_appends_and_reports_index() {
        let leaf = DynMessage::new(&pool(), "test.v1.Leaf").unwrap();
        let container = leaf.container();
        let first = container.property_as_container("children").unwrap();
        let second = container.property_as_container("children").unwrap();
        assert_eq!(first.element_index(), Some(0));
        assert_eq!(second.element_index(), Some(1));
        assert_eq!(leaf.get_list("children").len(), 2);
    }

    #[test]
    fn map_entries_are_set_through_the_map_container() {
        let leaf = DynMessage::new(&pool(), "test.v1.Leaf").unwrap();
        let labels = leaf.container().property_as_container("labels").unwrap();
        assert_eq!(labels.schema_name(), "map<string, string>");
        assert!(labels.has_property("anything"));

        let field = labels.property_as_field("team").unwrap();
        assert_eq!(
            field.full_type_name(),
            "test.v1.Leaf.labels[\"team\"] (string)"
        );
        field
            .as_scalar()
            .unwrap()
            .set_ast_value(&AstValue::from("core"))
            .unwrap();

        let entries = leaf.get_map("labels");
        assert_eq!(entries.get("team").and_then(|v| v.as_str()), Some("core"));

        let err = labels.property_as_container("team").unwrap_err();
        assert!(matches!(err, ReflectError::NotAContainer { .. }));
    }

    #[test]
    fn map_of_message_entries_are_get_or_create() {
        let leaf = DynMessage::new(&pool(), "test.v1.Leaf").unwrap();
        let named = leaf.container().property_as_container("named").unwrap();
        let a = named.property_as_container("a").unwrap();
        let again = named.property_as_container("a").unwrap();
        a.property_as_field("ratio")
            .unwrap()
            .as_scalar()
            .unwrap()
            .set_ast_value(&AstValue::Integer(2))
            .unwrap();
        let again = again.as_message().unwrap();
        assert_eq!(again.get("ratio").and_then(|v| v.as_f64()), Some(2.0));
        assert_eq!(leaf.get_map("named").len(), 1);
    }

    #[test]
    fn scalar_conversion_rejects_mismatched_literals() {
        let element = DynMessage::new(&pool(), "test.v1.Element").unwrap();
        let err = element
            .container()
            .property_as_field("id")
            .unwrap()
            .as_scalar()
            .unwrap()
            .set_ast_value(&AstValue::from("seven"))
            .unwrap_err();
        assert_eq!(
            err,
            ReflectError::TypeMismatch {
                expected: "int64".to_string(),
                found: "string",
            }
        );
    }

    #[test]
    fn scalars_are_not_containers_or_arrays() {
        let element = DynMessage::new(&pool(), "test.v1.Element").unwrap();
        let container = element.container();
        let err = container.property_as_container("id").unwrap_err();
        assert!(matches!(
            err,
            ReflectError::NotAContainer {
                kind: PropertyKind::Scalar,
                ..
            }
        ));
        let field = container.property_as_field("id").unwrap();
        assert!(field.as_array_of_scalar().is_none());
        assert!(container.property_as_field("missing").is_err());
    }

    #[test]
    fn misshapen_stored_values_are_reported() {
        let leaf = DynMessage::new(&pool(), "test.v1.Leaf").unwrap();
        {
            let mut data = leaf.data.borrow_mut();
            data.insert("children".to_string(), DynValue::Int64(1));
            data.insert("labels".to_string(), DynValue::List(Vec::new()));
            let mut named = IndexMap::new();
            named.insert("a".to_string(), DynValue::Bool(true));
            data.insert("named".to_string(), DynValue::Map(named));
        }
        let container = leaf.container();

        let err = container.property_as_container("children").unwrap_err();
        assert_eq!(
            err,
            ReflectError::ShapeMismatch {
                schema: "test.v1.Leaf".to_string(),
                property: "children".to_string(),
                expected: "list",
            }
        );
        assert_eq!(
            err.to_string(),
            "property 'children' of test.v1.Leaf does not hold a list"
        );

        let labels = container.property_as_container("labels").unwrap();
        let err = labels
            .property_as_field("team")
            .unwrap()
            .as_scalar()
            .unwrap()
            .set_ast_value(&AstValue::from("core"))
            .unwrap_err();
        assert!(matches!(err, ReflectError::ShapeMismatch { expected: "map", .. }));

        let named = container.property_as_container("named").unwrap();
        let err = named.property_as_container("a").unwrap_err();
        assert!(matches!(
            err,
            ReflectError::ShapeMismatch {
                expected: "map of messages",
                ..
            }
        ));
    }
}
