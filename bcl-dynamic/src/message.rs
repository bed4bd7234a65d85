//! Message data and the values it holds.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use bcl_walker::{AstValue, ReflectError};
use indexmap::IndexMap;

use crate::descriptor::{DescriptorPool, MessageEntry};
use crate::{DynContainer, MessageDescriptor, ScalarType};

/// A value stored in a message field.
#[derive(Clone)]
pub enum DynValue {
    /// A string.
    String(String),
    /// A bool.
    Bool(bool),
    /// A 64-bit integer.
    Int64(i64),
    /// A 64-bit float.
    Double(f64),
    /// A repeated field.
    List(Vec<DynValue>),
    /// A map field.
    Map(IndexMap<String, DynValue>),
    /// A nested message (a shared handle).
    Message(DynMessage),
}

impl DynValue {
    /// The string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DynValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// The bool, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DynValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer, if this is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DynValue::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// The float, if this is one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DynValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// The elements, if this is a list.
    pub fn as_list(&self) -> Option<&[DynValue]> {
        match self {
            DynValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// The entries, if this is a map.
    pub fn as_map(&self) -> Option<&IndexMap<String, DynValue>> {
        match self {
            DynValue::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// The message handle, if this is one.
    pub fn as_message(&self) -> Option<&DynMessage> {
        match self {
            DynValue::Message(message) => Some(message),
            _ => None,
        }
    }

    pub(crate) fn from_ast(ty: ScalarType, value: &AstValue) -> Result<Self, ReflectError> {
        match (ty, value) {
            (ScalarType::String, AstValue::String(s)) => Ok(DynValue::String(s.clone())),
            (ScalarType::Bool, AstValue::Bool(b)) => Ok(DynValue::Bool(*b)),
            (ScalarType::Int64, AstValue::Integer(i)) => Ok(DynValue::Int64(*i)),
            (ScalarType::Double, AstValue::Float(v)) => Ok(DynValue::Double(*v)),
            (ScalarType::Double, AstValue::Integer(i)) => Ok(DynValue::Double(*i as f64)),
            (ty, value) => Err(ReflectError::TypeMismatch {
                expected: ty.to_string(),
                found: value.kind_name(),
            }),
        }
    }
}

impl fmt::Debug for DynValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynValue::String(s) => write!(f, "{s:?}"),
            DynValue::Bool(b) => write!(f, "{b}"),
            DynValue::Int64(i) => write!(f, "{i}"),
            DynValue::Double(v) => write!(f, "{v}"),
            DynValue::List(items) => f.debug_list().entries(items).finish(),
            DynValue::Map(entries) => f.debug_map().entries(entries).finish(),
            DynValue::Message(message) => message.fmt(f),
        }
    }
}

/// A shared handle to one message's data.
///
/// Clones share the same data.
#[derive(Clone)]
pub struct DynMessage {
    pub(crate) pool: Rc<DescriptorPool>,
    pub(crate) entry: Rc<MessageEntry>,
    pub(crate) data: Rc<RefCell<IndexMap<String, DynValue>>>,
}

impl DynMessage {
    /// An empty message of type `full_name`.
    pub fn new(pool: &Rc<DescriptorPool>, full_name: &str) -> Result<Self, ReflectError> {
        Ok(DynMessage {
            pool: Rc::clone(pool),
            entry: pool.entry(full_name)?,
            data: Rc::new(RefCell::new(IndexMap::new())),
        })
    }

    /// This message's descriptor.
    pub fn descriptor(&self) -> &MessageDescriptor {
        &self.entry.descriptor
    }

    /// Fully-qualified type name.
    pub fn full_name(&self) -> &str {
        self.entry.descriptor.full_name()
    }

    /// Expose this message to the walker.
    pub fn container(&self) -> DynContainer {
        DynContainer::message(self.clone(), None)
    }

    /// The value of a set field.
    pub fn get(&self, name: &str) -> Option<DynValue> {
        self.data.borrow().get(name).cloned()
    }

    /// Whether a field has been set.
    pub fn has(&self, name: &str) -> bool {
        self.data.borrow().contains_key(name)
    }

    /// A string field's value.
    pub fn get_str(&self, name: &str) -> Option<String> {
        self.get(name)
            .and_then(|value| value.as_str().map(str::to_string))
    }

    /// A repeated string field's values; empty if unset.
    pub fn get_strings(&self, name: &str) -> Vec<String> {
        self.get_list(name)
            .iter()
            .filter_map(|value| value.as_str().map(str::to_string))
            .collect()
    }

    /// A repeated field's values; empty if unset.
    pub fn get_list(&self, name: &str) -> Vec<DynValue> {
        match self.get(name) {
            Some(DynValue::List(items)) => items,
            _ => Vec::new(),
        }
    }

    /// A map field's entries; empty if unset.
    pub fn get_map(&self, name: &str) -> IndexMap<String, DynValue> {
        match self.get(name) {
            Some(DynValue::Map(entries)) => entries,
            _ => IndexMap::new(),
        }
    }

    /// A nested message field.
    pub fn get_message(&self, name: &str) -> Option<DynMessage> {
        match self.get(name) {
            Some(DynValue::Message(message)) => Some(message),
            _ => None,
        }
    }

    /// The set member of a oneof group.
    pub fn which_oneof(&self, group: &str) -> Option<String> {
        let data = self.data.borrow();
        self.descriptor()
            .fields()
            .find(|f| f.oneof.as_deref() == Some(group) && data.contains_key(&f.name))
            .map(|f| f.name.clone())
    }

    /// Store `value` in `field`, clearing the other members of its oneof.
    pub(crate) fn set(&self, field: &str, value: DynValue) {
        let mut data = self.data.borrow_mut();
        for sibling in self.entry.descriptor.oneof_siblings(field) {
            data.shift_remove(sibling);
        }
        data.insert(field.to_string(), value);
    }

    /// Edit `field` in place, starting from `empty` when it is unset.
    /// Setting a field clears the other members of its oneof.
    pub(crate) fn update<R>(
        &self,
        field: &str,
        empty: impl FnOnce() -> DynValue,
        edit: impl FnOnce(&mut DynValue) -> R,
    ) -> R {
        let mut data = self.data.borrow_mut();
        for sibling in self.entry.descriptor.oneof_siblings(field) {
            data.shift_remove(sibling);
        }
        edit(data.entry(field.to_string()).or_insert_with(empty))
    }

    /// Append `value` to the list in `field`, returning its index.
    pub(crate) fn push(&self, field: &str, value: DynValue) -> Result<usize, ReflectError> {
        self.update(
            field,
            || DynValue::List(Vec::new()),
            |current| match current {
                DynValue::List(items) => {
                    items.push(value);
                    Ok(items.len() - 1)
                }
                _ => Err(self.shape_mismatch(field, "list")),
            },
        )
    }

    /// Set `key` in the map in `field`.
    pub(crate) fn insert_entry(
        &self,
        field: &str,
        key: &str,
        value: DynValue,
    ) -> Result<(), ReflectError> {
        self.update(
            field,
            || DynValue::Map(IndexMap::new()),
            |current| match current {
                DynValue::Map(entries) => {
                    entries.insert(key.to_string(), value);
                    Ok(())
                }
                _ => Err(self.shape_mismatch(field, "map")),
            },
        )
    }

    /// The message at `key` in the map in `field`, inserting `fresh` if the
    /// key is unset.
    pub(crate) fn message_entry(
        &self,
        field: &str,
        key: &str,
        fresh: DynMessage,
    ) -> Result<DynMessage, ReflectError> {
        self.update(
            field,
            || DynValue::Map(IndexMap::new()),
            |current| match current {
                DynValue::Map(entries) => entries
                    .entry(key.to_string())
                    .or_insert(DynValue::Message(fresh))
                    .as_message()
                    .cloned()
                    .ok_or_else(|| self.shape_mismatch(field, "map of messages")),
                _ => Err(self.shape_mismatch(field, "map")),
            },
        )
    }

    fn shape_mismatch(&self, field: &str, expected: &'static str) -> ReflectError {
        ReflectError::ShapeMismatch {
            schema: self.full_name().to_string(),
            property: field.to_string(),
            expected,
        }
    }

    pub(crate) fn new_child(&self, full_name: &str) -> Result<DynMessage, ReflectError> {
        DynMessage::new(&self.pool, full_name)
    }
}

impl fmt::Debug for DynMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct(self.full_name());
        for (name, value) in self.data.borrow().iter() {
            debug.field(name, value);
        }
        debug.finish()
    }
}
