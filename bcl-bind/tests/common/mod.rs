#![allow(dead_code)]

use std::rc::Rc;

use bcl_bind::{AttributeValue, Event, Ident};
use bcl_dynamic::{DescriptorPool, FieldKind, MessageDescriptor, ScalarType};
use bcl_walker::{AstValue, BlockSpec, ChildSpec, SchemaSet, Span, Tag};

/// A file of elements, each holding either a `Foo` or a `Bar`.
pub fn pool() -> Rc<DescriptorPool> {
    DescriptorPool::new([
        MessageDescriptor::new("test.v1.File")
            .field("topLevelSingle", FieldKind::Scalar(ScalarType::String))
            .field("topLevelRepeated", FieldKind::Repeated(ScalarType::String))
            .field("elements", FieldKind::repeated_message("test.v1.Element")),
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
            .field("ratio", FieldKind::Scalar(ScalarType::Double))
            .field("aliases", FieldKind::Repeated(ScalarType::String)),
    ])
    .unwrap()
}

pub fn schemas() -> SchemaSet {
    SchemaSet::with_given([
        BlockSpec::new("test.v1.File")
            .with_child("foo", ChildSpec::block(["elements", "foo"]))
            .with_child("bar", ChildSpec::block(["elements", "bar"]))
            .with_child("element", ChildSpec::block(["elements"])),
        BlockSpec::new("test.v1.Element").with_type_select(Tag::new(Vec::<String>::new())),
        BlockSpec::new("test.v1.Foo")
            .with_child("tag", ChildSpec::block(["tags"]))
            .with_name(Tag::new(["name"]))
            .with_description(Tag::new(["description"])),
    ])
}

/// Turn a one-statement-per-line document into events.
///
/// Understands `name label... {`, `}`, `# description` and
/// `dotted.key = value`, where a value is a quoted string, a number, a bool
/// or a bracketed list of those.
pub fn events(source: &str) -> Vec<Event> {
    let mut events = Vec::new();
    for (line_no, line) in source.lines().enumerate() {
        let line_no = line_no as u32;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        let indent = (line.len() - line.trim_start().len()) as u32;
        let span = Span::on_line(line_no, indent, indent + text.len() as u32);

        if text == "}" {
            events.push(Event::BlockClose { span });
        } else if let Some(description) = text.strip_prefix('#') {
            events.push(Event::Description {
                text: description.trim().to_string(),
                span,
            });
        } else if let Some(header) = text.strip_suffix('{') {
            let mut idents = words(header, line_no, indent);
            let name = idents.remove(0);
            events.push(Event::BlockOpen {
                name,
                labels: idents,
                span,
            });
        } else {
            let (key, value) = text.split_once('=').expect("attribute");
            let mut column = indent;
            let key = key
                .trim_end()
                .split('.')
                .map(|segment| {
                    let end = column + segment.len() as u32;
                    let ident = Ident::new(segment, Span::on_line(line_no, column, end));
                    column = end + 1;
                    ident
                })
                .collect();
            events.push(Event::Attribute {
                key,
                value: parse_value(value.trim()),
                span,
            });
        }
    }
    events
}

fn words(header: &str, line: u32, start: u32) -> Vec<Ident> {
    let mut idents = Vec::new();
    let mut offset = 0;
    for word in header.split_whitespace() {
        let pos = offset + header[offset..].find(word).expect("word");
        idents.push(Ident::new(
            word,
            Span::on_line(line, start + pos as u32, start + (pos + word.len()) as u32),
        ));
        offset = pos + word.len();
    }
    idents
}

fn parse_value(text: &str) -> AttributeValue {
    match text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        Some(items) => AttributeValue::Array(
            items
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(parse_scalar)
                .collect(),
        ),
        None => AttributeValue::Scalar(parse_scalar(text)),
    }
}

fn parse_scalar(text: &str) -> AstValue {
    if let Some(s) = text.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
        return AstValue::from(s);
    }
    match text {
        "true" => AstValue::Bool(true),
        "false" => AstValue::Bool(false),
        _ => text
            .parse::<i64>()
            .map(AstValue::Integer)
            .or_else(|_| text.parse::<f64>().map(AstValue::Float))
            .expect("literal"),
    }
}
