//! Error types for spec resolution and path walking.

use std::fmt;

use crate::{ReflectError, WILDCARD};

/// A block spec that cannot be applied to its type.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SpecError {
    /// A given child's path starts with a property the type does not have.
    UnknownProperty {
        /// The schema the spec was given for.
        schema: String,
        /// The child name whose path is broken.
        child: String,
        /// The first path step, which does not exist.
        property: String,
    },
    /// A declared child was given under the wildcard name.
    DeclaredWildcard {
        /// The schema the spec was given for.
        schema: String,
    },
}

impl fmt::Display for SpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecError::UnknownProperty {
                schema,
                child,
                property,
            } => write!(
                f,
                "spec for {schema}: child '{child}' walks through '{property}', which {schema} does not have"
            ),
            SpecError::DeclaredWildcard { schema } => write!(
                f,
                "spec for {schema}: '{WILDCARD}' names the wildcard and cannot be a declared child"
            ),
        }
    }
}

impl std::error::Error for SpecError {}

/// The underlying cause of an [`WalkPathError::UnknownPathError`] or
/// [`WalkPathError::NodeNotContainer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathErrorCause {
    /// The child spec has an empty path.
    EmptyPath,
    /// The spec for an intermediate type could not be resolved.
    Spec(SpecError),
    /// The reflection substrate refused the access.
    Reflect(ReflectError),
}

impl fmt::Display for PathErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathErrorCause::EmptyPath => f.write_str("empty path, spec issue"),
            PathErrorCause::Spec(err) => write!(f, "{err}"),
            PathErrorCause::Reflect(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for PathErrorCause {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PathErrorCause::EmptyPath => None,
            PathErrorCause::Spec(err) => Some(err),
            PathErrorCause::Reflect(err) => Some(err),
        }
    }
}

impl From<SpecError> for PathErrorCause {
    fn from(value: SpecError) -> Self {
        PathErrorCause::Spec(value)
    }
}

impl From<ReflectError> for PathErrorCause {
    fn from(value: ReflectError) -> Self {
        PathErrorCause::Reflect(value)
    }
}

/// Discriminant of a [`WalkPathError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalkPathErrorKind {
    /// See [`WalkPathError::RootNotFound`].
    RootNotFound,
    /// See [`WalkPathError::NodeNotContainer`].
    NodeNotContainer,
    /// See [`WalkPathError::NodeNotFound`].
    NodeNotFound,
    /// See [`WalkPathError::NodeNotScalar`].
    NodeNotScalar,
    /// See [`WalkPathError::UnknownPathError`].
    UnknownPathError,
}

/// A name that could not be resolved in a scope.
///
/// Each variant carries what a caller needs to render a diagnostic at the
/// source position it passed in, without walking the scope again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkPathError {
    /// The name matched neither an exact nor a wildcard child anywhere in scope.
    RootNotFound {
        /// The requested name.
        name: String,
        /// Schema name of the leaf block.
        schema: String,
        /// Every name that would have resolved.
        available: Vec<String>,
    },
    /// The path led through something that cannot be opened as a block.
    NodeNotContainer {
        /// The path walked, or the requested name when reported by `child_block`.
        path: Vec<String>,
        /// Schema of the container where the walk stopped.
        schema: String,
        /// The substrate's refusal.
        cause: PathErrorCause,
    },
    /// The container has no property with the requested name.
    NodeNotFound {
        /// The path walked up to and including the missing step.
        path: Vec<String>,
        /// Schema of the container lacking the property.
        schema: String,
        /// Every name that would have resolved.
        available: Vec<String>,
    },
    /// The target exists but is not a settable scalar.
    NodeNotScalar {
        /// The requested name.
        path: Vec<String>,
        /// The target's reported type name.
        type_name: String,
    },
    /// A spec-configuration defect or an unexpected substrate failure.
    UnknownPathError {
        /// The requested name or walked path.
        path: Vec<String>,
        /// Schema of the container involved, when known.
        schema: Option<String>,
        /// The wrapped cause.
        cause: PathErrorCause,
    },
}

impl WalkPathError {
    /// The error's kind.
    pub const fn kind(&self) -> WalkPathErrorKind {
        match self {
            WalkPathError::RootNotFound { .. } => WalkPathErrorKind::RootNotFound,
            WalkPathError::NodeNotContainer { .. } => WalkPathErrorKind::NodeNotContainer,
            WalkPathError::NodeNotFound { .. } => WalkPathErrorKind::NodeNotFound,
            WalkPathError::NodeNotScalar { .. } => WalkPathErrorKind::NodeNotScalar,
            WalkPathError::UnknownPathError { .. } => WalkPathErrorKind::UnknownPathError,
        }
    }

    /// A stable error code.
    pub const fn code(&self) -> &'static str {
        match self {
            WalkPathError::RootNotFound { .. } => "bcl::root_not_found",
            WalkPathError::NodeNotContainer { .. } => "bcl::node_not_container",
            WalkPathError::NodeNotFound { .. } => "bcl::node_not_found",
            WalkPathError::NodeNotScalar { .. } => "bcl::node_not_scalar",
            WalkPathError::UnknownPathError { .. } => "bcl::unknown_path",
        }
    }

    /// Names that were resolvable where the error occurred; empty for kinds
    /// that don't carry them.
    pub fn available(&self) -> &[String] {
        match self {
            WalkPathError::RootNotFound { available, .. }
            | WalkPathError::NodeNotFound { available, .. } => available,
            _ => &[],
        }
    }

    /// The requested name or walked path.
    pub fn path(&self) -> Vec<&str> {
        match self {
            WalkPathError::RootNotFound { name, .. } => vec![name.as_str()],
            WalkPathError::NodeNotContainer { path, .. }
            | WalkPathError::NodeNotFound { path, .. }
            | WalkPathError::NodeNotScalar { path, .. }
            | WalkPathError::UnknownPathError { path, .. } => {
                path.iter().map(String::as_str).collect()
            }
        }
    }

    pub(crate) fn unexpected(
        path: Vec<String>,
        schema: Option<String>,
        cause: impl Into<PathErrorCause>,
    ) -> Self {
        WalkPathError::UnknownPathError {
            path,
            schema,
            cause: cause.into(),
        }
    }
}

impl fmt::Display for WalkPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalkPathError::RootNotFound { name, schema, .. } => {
                write!(f, "unknown name '{name}' in {schema}")
            }
            WalkPathError::NodeNotContainer { path, schema, .. } => {
                write!(
                    f,
                    "'{}' in {schema} is not a block",
                    path.join(".")
                )
            }
            WalkPathError::NodeNotFound { path, schema, .. } => {
                write!(f, "{schema} has no field '{}'", path.join("."))
            }
            WalkPathError::NodeNotScalar { path, type_name } => {
                write!(
                    f,
                    "'{}' is {type_name}, not a scalar",
                    path.join(".")
                )
            }
            WalkPathError::UnknownPathError {
                path,
                schema,
                cause,
            } => {
                write!(f, "cannot walk '{}'", path.join("."))?;
                if let Some(schema) = schema {
                    write!(f, " in {schema}")?;
                }
                write!(f, ": {cause}")
            }
        }
    }
}

impl std::error::Error for WalkPathError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WalkPathError::NodeNotContainer { cause, .. }
            | WalkPathError::UnknownPathError { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

/// Failure to create the root scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootError {
    /// No source map was supplied for the document.
    MissingSourceLocation,
    /// The root container's spec could not be resolved.
    Spec(SpecError),
}

impl fmt::Display for RootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RootError::MissingSourceLocation => f.write_str("source location required"),
            RootError::Spec(err) => write!(f, "root spec: {err}"),
        }
    }
}

impl std::error::Error for RootError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RootError::MissingSourceLocation => None,
            RootError::Spec(err) => Some(err),
        }
    }
}

impl From<SpecError> for RootError {
    fn from(value: SpecError) -> Self {
        RootError::Spec(value)
    }
}
