//! Runtime message descriptors.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use bcl_walker::{PropertyDescriptor, PropertyKind, ReflectError, TypeDescriptor};
use indexmap::IndexMap;

/// Type of a scalar value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// UTF-8 text.
    String,
    /// `true` or `false`.
    Bool,
    /// Signed 64-bit integer.
    Int64,
    /// 64-bit float.
    Double,
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScalarType::String => "string",
            ScalarType::Bool => "bool",
            ScalarType::Int64 => "int64",
            ScalarType::Double => "double",
        })
    }
}

/// What a message field holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// A single scalar.
    Scalar(ScalarType),
    /// A list of scalars.
    Repeated(ScalarType),
    /// A nested message, by full name.
    Message(String),
    /// A list of messages, by full name.
    RepeatedMessage(String),
    /// A string-keyed map of scalars.
    Map(ScalarType),
    /// A string-keyed map of messages, by full name.
    MapOfMessage(String),
}

impl FieldKind {
    /// A nested message field.
    pub fn message(full_name: impl Into<String>) -> Self {
        FieldKind::Message(full_name.into())
    }

    /// A repeated message field.
    pub fn repeated_message(full_name: impl Into<String>) -> Self {
        FieldKind::RepeatedMessage(full_name.into())
    }

    /// A map-of-messages field.
    pub fn map_of_message(full_name: impl Into<String>) -> Self {
        FieldKind::MapOfMessage(full_name.into())
    }

    /// How the walker sees this field.
    pub const fn property_kind(&self) -> PropertyKind {
        match self {
            FieldKind::Scalar(_) => PropertyKind::Scalar,
            FieldKind::Repeated(_) => PropertyKind::ArrayOfScalar,
            FieldKind::Message(_) => PropertyKind::Object,
            FieldKind::RepeatedMessage(_) => PropertyKind::ArrayOfObject,
            FieldKind::Map(_) => PropertyKind::MapOfScalar,
            FieldKind::MapOfMessage(_) => PropertyKind::MapOfObject,
        }
    }

    /// The message this field refers to, if any.
    pub fn message_name(&self) -> Option<&str> {
        match self {
            FieldKind::Message(name)
            | FieldKind::RepeatedMessage(name)
            | FieldKind::MapOfMessage(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Scalar(ty) => write!(f, "{ty}"),
            FieldKind::Repeated(ty) => write!(f, "repeated {ty}"),
            FieldKind::Message(name) => write!(f, "{name}"),
            FieldKind::RepeatedMessage(name) => write!(f, "repeated {name}"),
            FieldKind::Map(ty) => write!(f, "map<string, {ty}>"),
            FieldKind::MapOfMessage(name) => write!(f, "map<string, {name}>"),
        }
    }
}

/// One field of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,
    /// What the field holds.
    pub kind: FieldKind,
    /// The oneof group this field belongs to.
    pub oneof: Option<String>,
}

/// The shape of one message type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDescriptor {
    full_name: String,
    fields: IndexMap<String, FieldDescriptor>,
}

impl MessageDescriptor {
    /// A message with no fields.
    pub fn new(full_name: impl Into<String>) -> Self {
        MessageDescriptor {
            full_name: full_name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Add a plain field.
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        self.fields.insert(
            name.clone(),
            FieldDescriptor {
                name,
                kind,
                oneof: None,
            },
        );
        self
    }

    /// Add a oneof group; at most one of its members is set at a time.
    pub fn oneof<N: Into<String>>(
        mut self,
        group: impl Into<String>,
        members: impl IntoIterator<Item = (N, FieldKind)>,
    ) -> Self {
        let group = group.into();
        for (name, kind) in members {
            let name = name.into();
            self.fields.insert(
                name.clone(),
                FieldDescriptor {
                    name,
                    kind,
                    oneof: Some(group.clone()),
                },
            );
        }
        self
    }

    /// Fully-qualified name.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Short name: the last dotted component.
    pub fn short_name(&self) -> &str {
        self.full_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.full_name)
    }

    /// Look up a field.
    pub fn get_field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    /// Every field, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values()
    }

    /// The other members of `field`'s oneof group.
    pub(crate) fn oneof_siblings<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> {
        let group = self.fields.get(field).and_then(|f| f.oneof.as_deref());
        self.fields
            .values()
            .filter(move |f| group.is_some() && f.oneof.as_deref() == group && f.name != field)
            .map(|f| f.name.as_str())
    }
}

/// A message descriptor with its precomputed reflective descriptions.
#[derive(Debug)]
pub(crate) struct MessageEntry {
    pub(crate) descriptor: MessageDescriptor,
    pub(crate) type_descriptor: TypeDescriptor,
    /// Descriptions of the containers exposed by map fields, by field name.
    pub(crate) map_types: HashMap<String, Rc<TypeDescriptor>>,
}

/// A closed set of message descriptors that may refer to each other.
#[derive(Debug)]
pub struct DescriptorPool {
    messages: HashMap<String, Rc<MessageEntry>>,
}

impl DescriptorPool {
    /// Build a pool, checking that every message reference resolves.
    pub fn new(
        messages: impl IntoIterator<Item = MessageDescriptor>,
    ) -> Result<Rc<Self>, ReflectError> {
        let messages: Vec<MessageDescriptor> = messages.into_iter().collect();

        for message in &messages {
            for field in message.fields() {
                if let Some(target) = field.kind.message_name()
                    && !messages.iter().any(|m| m.full_name == target)
                {
                    return Err(ReflectError::UnknownSchema(target.to_string()));
                }
            }
        }

        let messages = messages
            .into_iter()
            .map(|descriptor| {
                let entry = MessageEntry::new(descriptor);
                (entry.descriptor.full_name.clone(), Rc::new(entry))
            })
            .collect();

        Ok(Rc::new(DescriptorPool { messages }))
    }

    /// Look up a message descriptor.
    pub fn message(&self, full_name: &str) -> Option<&MessageDescriptor> {
        self.messages.get(full_name).map(|entry| &entry.descriptor)
    }

    pub(crate) fn entry(&self, full_name: &str) -> Result<Rc<MessageEntry>, ReflectError> {
        self.messages
            .get(full_name)
            .cloned()
            .ok_or_else(|| ReflectError::UnknownSchema(full_name.to_string()))
    }
}

impl MessageEntry {
    fn new(descriptor: MessageDescriptor) -> Self {
        let type_descriptor = TypeDescriptor {
            schema_name: descriptor.full_name.clone(),
            type_name: descriptor.short_name().to_string(),
            properties: descriptor
                .fields()
                .map(|field| PropertyDescriptor {
                    name: field.name.clone(),
                    kind: field.kind.property_kind(),
                })
                .collect(),
            open_keys: None,
        };

        let map_types = descriptor
            .fields()
            .filter_map(|field| {
                let value_kind = match &field.kind {
                    FieldKind::Map(_) => PropertyKind::Scalar,
                    FieldKind::MapOfMessage(_) => PropertyKind::Object,
                    _ => return None,
                };
                let name = field.kind.to_string();
                Some((
                    field.name.clone(),
                    Rc::new(TypeDescriptor {
                        schema_name: name.clone(),
                        type_name: name,
                        properties: Vec::new(),
                        open_keys: Some(value_kind),
                    }),
                ))
            })
            .collect();

        MessageEntry {
            descriptor,
            type_descriptor,
            map_types,
        }
    }
}
