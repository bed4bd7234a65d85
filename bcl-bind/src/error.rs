//! Binding errors and their diagnostics.

use std::error::Error;
use std::fmt::{self, Debug, Display};

use bcl_walker::{Position, ReflectError, Span, WalkPathError};

use crate::suggest::did_you_mean;

/// A document event that could not be bound.
#[derive(Clone)]
pub struct BindError {
    pub(crate) kind: BindErrorKind,
    pub(crate) span: Span,
    pub(crate) source_code: Option<String>,
}

impl BindError {
    pub(crate) fn new(kind: impl Into<BindErrorKind>, span: Span) -> Self {
        BindError {
            kind: kind.into(),
            span,
            source_code: None,
        }
    }

    /// Returns a reference to the error kind for detailed error inspection.
    pub fn kind(&self) -> &BindErrorKind {
        &self.kind
    }

    /// Where the offending name or value was written.
    pub fn span(&self) -> Span {
        self.span
    }

    /// Attach the document text, so diagnostics can point into it.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source_code = Some(source.into());
        self
    }
}

impl Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.span.start, self.kind)
    }
}

impl Error for BindError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            BindErrorKind::Walk(err) => Some(err),
            BindErrorKind::Reflect(err) => Some(err),
            _ => None,
        }
    }
}

impl Debug for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", miette::Report::new(self.clone()))
    }
}

/// What went wrong while binding.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum BindErrorKind {
    /// A name could not be resolved.
    Walk(WalkPathError),
    /// A value could not be stored.
    Reflect(ReflectError),
    /// The block requires a label that was not given.
    MissingLabel {
        /// The block name.
        block: String,
        /// Which label: `name` or `type`.
        tag: &'static str,
    },
    /// The block was given more labels than it takes.
    UnexpectedLabel {
        /// The block name.
        block: String,
        /// The first extra label.
        label: String,
    },
    /// A list was assigned to something that is not a list of scalars.
    NotAnArray {
        /// The dotted key.
        key: String,
        /// The target's type.
        type_name: String,
    },
    /// A description line in a block that has nowhere to put it.
    NoDescription {
        /// Schema (or debug) name of the block.
        block: String,
    },
    /// A closing brace with no open block.
    UnbalancedClose,
    /// The document ended inside a block.
    UnclosedBlock {
        /// The innermost open block.
        block: String,
    },
}

impl BindErrorKind {
    /// Returns an error code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            BindErrorKind::Walk(err) => err.code(),
            BindErrorKind::Reflect(_) => "bcl::reflect",
            BindErrorKind::MissingLabel { .. } => "bcl::missing_label",
            BindErrorKind::UnexpectedLabel { .. } => "bcl::unexpected_label",
            BindErrorKind::NotAnArray { .. } => "bcl::not_an_array",
            BindErrorKind::NoDescription { .. } => "bcl::no_description",
            BindErrorKind::UnbalancedClose => "bcl::unbalanced_close",
            BindErrorKind::UnclosedBlock { .. } => "bcl::unclosed_block",
        }
    }
}

impl Display for BindErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindErrorKind::Walk(err) => write!(f, "{err}"),
            BindErrorKind::Reflect(err) => write!(f, "{err}"),
            BindErrorKind::MissingLabel { block, tag } => {
                write!(f, "block '{block}' requires a {tag} label")
            }
            BindErrorKind::UnexpectedLabel { block, label } => {
                write!(f, "unexpected label '{label}' on block '{block}'")
            }
            BindErrorKind::NotAnArray { key, type_name } => {
                write!(f, "cannot assign a list to '{key}' ({type_name})")
            }
            BindErrorKind::NoDescription { block } => {
                write!(f, "{block} does not take a description")
            }
            BindErrorKind::UnbalancedClose => write!(f, "closing brace without an open block"),
            BindErrorKind::UnclosedBlock { block } => {
                write!(f, "block '{block}' is never closed")
            }
        }
    }
}

impl From<WalkPathError> for BindErrorKind {
    fn from(value: WalkPathError) -> Self {
        Self::Walk(value)
    }
}

impl From<ReflectError> for BindErrorKind {
    fn from(value: ReflectError) -> Self {
        Self::Reflect(value)
    }
}

// ============================================================================
// Diagnostic Implementation
// ============================================================================

impl miette::Diagnostic for BindError {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        Some(Box::new(self.kind.code()))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.source_code
            .as_ref()
            .map(|s| s as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        let source = self.source_code.as_deref()?;
        let start = byte_offset(source, self.span.start)?;
        let end = byte_offset(source, self.span.end).unwrap_or(start);
        let label = match &self.kind {
            BindErrorKind::Walk(WalkPathError::RootNotFound { name, .. }) => {
                format!("unknown name `{name}`")
            }
            BindErrorKind::Walk(WalkPathError::NodeNotScalar { type_name, .. }) => {
                format!("this is {type_name}")
            }
            BindErrorKind::UnexpectedLabel { .. } => "extra label".to_string(),
            _ => "error occurred here".to_string(),
        };
        Some(Box::new(std::iter::once(miette::LabeledSpan::at(
            (start, end.saturating_sub(start).max(1)),
            label,
        ))))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        let BindErrorKind::Walk(err) = &self.kind else {
            return None;
        };
        let available = err.available();
        if available.is_empty() {
            return None;
        }

        let mut help = format!("available names: {}", available.join(", "));
        let requested = err.path().last().copied().unwrap_or_default();
        if let Some(suggestion) = did_you_mean(requested, available.iter().map(String::as_str)) {
            help.push_str(&format!("\ndid you mean `{suggestion}`?"));
        }
        Some(Box::new(help))
    }
}

/// Byte offset of a line/column position in `source`. Columns count bytes.
fn byte_offset(source: &str, position: Position) -> Option<usize> {
    let mut line_start = 0;
    for (line_no, line) in source.split_inclusive('\n').enumerate() {
        if line_no == position.line as usize {
            return Some(line_start + (position.column as usize).min(line.len()));
        }
        line_start += line.len();
    }
    (position.line as usize == source.lines().count()).then_some(source.len())
}
