//! The events a block configuration parser emits.

use bcl_walker::{AstValue, Span};

/// A name as it appears in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    /// The name.
    pub name: String,
    /// Where it was written.
    pub span: Span,
}

impl Ident {
    /// A name written at `span`.
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Ident {
            name: name.into(),
            span,
        }
    }
}

/// The right-hand side of an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// A single literal.
    Scalar(AstValue),
    /// A bracketed list of literals.
    Array(Vec<AstValue>),
}

impl From<AstValue> for AttributeValue {
    fn from(value: AstValue) -> Self {
        AttributeValue::Scalar(value)
    }
}

impl From<Vec<AstValue>> for AttributeValue {
    fn from(values: Vec<AstValue>) -> Self {
        AttributeValue::Array(values)
    }
}

/// One step of a parsed document.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// `name label... {`
    BlockOpen {
        /// The block name.
        name: Ident,
        /// Labels following the name, in order.
        labels: Vec<Ident>,
        /// The whole header.
        span: Span,
    },
    /// `key.path = value`
    Attribute {
        /// The dotted key, one ident per segment.
        key: Vec<Ident>,
        /// The value.
        value: AttributeValue,
        /// The whole attribute.
        span: Span,
    },
    /// A description line in a block body.
    Description {
        /// The text, without the comment marker.
        text: String,
        /// The whole line.
        span: Span,
    },
    /// `}`
    BlockClose {
        /// The closing brace.
        span: Span,
    },
}

impl Event {
    /// Where the event was written.
    pub fn span(&self) -> Span {
        match self {
            Event::BlockOpen { span, .. }
            | Event::Attribute { span, .. }
            | Event::Description { span, .. }
            | Event::BlockClose { span } => *span,
        }
    }
}
