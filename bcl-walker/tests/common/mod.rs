#![allow(dead_code)]

use std::rc::Rc;

use bcl_dynamic::{DescriptorPool, DynMessage, FieldKind, MessageDescriptor, ScalarType};
use bcl_walker::{BlockSpec, ChildSpec, SchemaSet, SchemaWalker, SourceMap, Span, Tag};

pub fn pool() -> Rc<DescriptorPool> {
    DescriptorPool::new([
        MessageDescriptor::new("test.v1.File")
            .field("topLevelSingle", FieldKind::Scalar(ScalarType::String))
            .field("topLevelRepeated", FieldKind::Repeated(ScalarType::String))
            .field("elements", FieldKind::repeated_message("test.v1.Element"))
            .field("sections", FieldKind::map_of_message("test.v1.Bar")),
        MessageDescriptor::new("test.v1.Element").oneof(
            "type",
            [
                ("foo", FieldKind::message("test.v1.Foo")),
                ("bar", FieldKind::message("test.v1.Bar")),
            ],
        ),
        MessageDescriptor::new("test.v1.Foo")
            .field("name", FieldKind::Scalar(ScalarType::String))
            .field("description", FieldKind::Scalar(ScalarType::String))
            .field("tags", FieldKind::Map(ScalarType::String)),
        MessageDescriptor::new("test.v1.Bar")
            .field("size", FieldKind::Scalar(ScalarType::Int64))
            .field("aliases", FieldKind::Repeated(ScalarType::String)),
    ])
    .unwrap()
}

pub fn file_spec() -> BlockSpec {
    BlockSpec::new("test.v1.File")
        .with_debug_name("file")
        .with_child("foo", ChildSpec::block(["elements", "foo"]))
        .with_child("bar", ChildSpec::block(["elements", "bar"]))
}

pub fn foo_spec() -> BlockSpec {
    BlockSpec::new("test.v1.Foo")
        .with_child("tag", ChildSpec::block(["tags"]))
        .with_name(Tag::new(["name"]))
        .with_description(Tag::new(["description"]))
}

pub fn schemas() -> SchemaSet {
    SchemaSet::with_given([file_spec(), foo_spec()])
}

/// A fresh file message with a root scope over it.
pub struct Fixture {
    pub file: DynMessage,
    pub schemas: SchemaSet,
    pub source_map: SourceMap,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_schemas(schemas())
    }

    pub fn with_schemas(schemas: SchemaSet) -> Self {
        Fixture {
            file: DynMessage::new(&pool(), "test.v1.File").unwrap(),
            schemas,
            source_map: SourceMap::new(),
        }
    }

    pub fn root(&self) -> SchemaWalker<'_, bcl_dynamic::DynContainer> {
        SchemaWalker::new_root(&self.schemas, self.file.container(), Some(&self.source_map))
            .unwrap()
    }
}

pub fn line(n: u32) -> Span {
    Span::on_line(n, 0, 1)
}
