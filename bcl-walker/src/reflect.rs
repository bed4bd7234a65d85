//! The reflection capability the walker is generic over.
//!
//! A reflection substrate exposes schema-defined objects as [`Container`]s
//! with named properties. The walker never looks at concrete message types:
//! it asks a container for a nested container or a leaf [`Field`] by name,
//! and asks a field whether it can be set from a scalar or appended to.

use std::fmt;

/// A scalar literal as parsed from the configuration text.
#[derive(Debug, Clone, PartialEq)]
pub enum AstValue {
    /// A quoted string.
    String(String),
    /// An integer literal.
    Integer(i64),
    /// A floating-point literal.
    Float(f64),
    /// `true` or `false`.
    Bool(bool),
}

impl AstValue {
    /// Short name of the literal kind, for error messages.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            AstValue::String(_) => "string",
            AstValue::Integer(_) => "integer",
            AstValue::Float(_) => "float",
            AstValue::Bool(_) => "bool",
        }
    }
}

impl fmt::Display for AstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstValue::String(s) => write!(f, "{s:?}"),
            AstValue::Integer(i) => write!(f, "{i}"),
            AstValue::Float(v) => write!(f, "{v}"),
            AstValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for AstValue {
    fn from(value: &str) -> Self {
        AstValue::String(value.to_string())
    }
}

impl From<String> for AstValue {
    fn from(value: String) -> Self {
        AstValue::String(value)
    }
}

impl From<i64> for AstValue {
    fn from(value: i64) -> Self {
        AstValue::Integer(value)
    }
}

impl From<f64> for AstValue {
    fn from(value: f64) -> Self {
        AstValue::Float(value)
    }
}

impl From<bool> for AstValue {
    fn from(value: bool) -> Self {
        AstValue::Bool(value)
    }
}

/// Structural classification of a property, as reported by the substrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    /// A single settable scalar.
    Scalar,
    /// A nested object.
    Object,
    /// An array of scalars, appended to one value at a time.
    ArrayOfScalar,
    /// An array of objects; opening it as a container appends an element.
    ArrayOfObject,
    /// A string-keyed map of scalars.
    MapOfScalar,
    /// A string-keyed map of objects.
    MapOfObject,
}

impl PropertyKind {
    /// Whether the property can be opened as a nested block.
    pub const fn is_container(self) -> bool {
        matches!(
            self,
            PropertyKind::Object
                | PropertyKind::ArrayOfObject
                | PropertyKind::MapOfScalar
                | PropertyKind::MapOfObject
        )
    }

    /// Whether the property can be assigned a single scalar.
    pub const fn is_scalar(self) -> bool {
        matches!(self, PropertyKind::Scalar)
    }

    /// Whether the property is an array.
    pub const fn is_collection(self) -> bool {
        matches!(self, PropertyKind::ArrayOfScalar | PropertyKind::ArrayOfObject)
    }
}

/// One named property of a reflected type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    /// Property name as addressed in paths.
    pub name: String,
    /// What the property holds.
    pub kind: PropertyKind,
}

/// The reflective description of a container type.
///
/// The walker derives default block specs from this and uses
/// `schema_name` as the registry cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// Fully-qualified schema name, unique per type.
    pub schema_name: String,
    /// Short human-readable name.
    pub type_name: String,
    /// Named properties, in declaration order.
    pub properties: Vec<PropertyDescriptor>,
    /// Set for map-like containers that accept any key, with the value kind.
    pub open_keys: Option<PropertyKind>,
}

impl TypeDescriptor {
    /// Look up a named property.
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// A reflected structural value exposing named properties.
///
/// Implementations are cheap handles: cloning one yields another handle to
/// the same underlying data, and writes through any handle are visible
/// through all of them.
pub trait Container: Clone {
    /// Leaf handle produced by [`Container::property_as_field`].
    type Field: Field;

    /// The reflective description of this container's type.
    fn descriptor(&self) -> &TypeDescriptor;

    /// Fully-qualified schema name.
    fn schema_name(&self) -> &str {
        &self.descriptor().schema_name
    }

    /// Short human-readable type name.
    fn type_name(&self) -> &str {
        &self.descriptor().type_name
    }

    /// Whether `name` addresses a property of this container.
    fn has_property(&self, name: &str) -> bool {
        let descriptor = self.descriptor();
        descriptor.open_keys.is_some() || descriptor.property(name).is_some()
    }

    /// Get or create the nested container at `name`.
    ///
    /// For arrays of objects this appends a new element; for members of a
    /// tagged union this selects the member.
    fn property_as_container(&self, name: &str) -> Result<Self, ReflectError>;

    /// Obtain the leaf field handle at `name`, in the context of this container.
    fn property_as_field(&self, name: &str) -> Result<Self::Field, ReflectError>;

    /// Position of this container within its parent array, if it is an element.
    fn element_index(&self) -> Option<usize> {
        None
    }
}

/// A leaf value reached through its parent container.
pub trait Field {
    /// Handle type for the scalar-settable capability.
    type Scalar: ScalarField;
    /// Handle type for the array-append capability.
    type Array: ArrayOfScalarField;

    /// Short type name, e.g. `string`.
    fn type_name(&self) -> String;

    /// Fully-qualified type name, used in diagnostics.
    fn full_type_name(&self) -> String;

    /// The scalar-settable capability, if this field offers it.
    fn as_scalar(&self) -> Option<Self::Scalar>;

    /// The array-append capability, if this field offers it.
    fn as_array_of_scalar(&self) -> Option<Self::Array>;
}

/// A field that can be set from a parsed scalar.
pub trait ScalarField {
    /// Set the value, converting from the literal as the substrate allows.
    fn set_ast_value(&mut self, value: &AstValue) -> Result<(), ReflectError>;

    /// Fully-qualified type name, used in diagnostics.
    fn full_type_name(&self) -> String;
}

/// An array of scalars that can be appended to.
pub trait ArrayOfScalarField {
    /// Append a value, returning its index.
    fn append_ast_value(&mut self, value: &AstValue) -> Result<usize, ReflectError>;

    /// Fully-qualified type name, used in diagnostics.
    fn full_type_name(&self) -> String;
}

/// Failure reported by a reflection substrate.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReflectError {
    /// The container has no property with this name.
    NoSuchProperty {
        /// Schema of the container.
        schema: String,
        /// The requested property.
        property: String,
    },
    /// The property exists but cannot be opened as a container.
    NotAContainer {
        /// Schema of the container.
        schema: String,
        /// The requested property.
        property: String,
        /// The property's kind.
        kind: PropertyKind,
    },
    /// A literal could not be converted to the field's type.
    TypeMismatch {
        /// The field's type.
        expected: String,
        /// The literal kind given.
        found: &'static str,
    },
    /// A property's stored value does not have the shape its kind requires.
    ShapeMismatch {
        /// Schema of the container.
        schema: String,
        /// The property holding the value.
        property: String,
        /// The shape the property's kind requires.
        expected: &'static str,
    },
    /// A schema name could not be resolved by the substrate.
    UnknownSchema(String),
}

impl fmt::Display for ReflectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReflectError::NoSuchProperty { schema, property } => {
                write!(f, "{schema} has no property '{property}'")
            }
            ReflectError::NotAContainer {
                schema,
                property,
                kind,
            } => {
                write!(
                    f,
                    "property '{property}' of {schema} is {kind:?}, not a container"
                )
            }
            ReflectError::TypeMismatch { expected, found } => {
                write!(f, "cannot set {expected} from a {found} literal")
            }
            ReflectError::ShapeMismatch {
                schema,
                property,
                expected,
            } => write!(f, "property '{property}' of {schema} does not hold a {expected}"),
            ReflectError::UnknownSchema(name) => write!(f, "unknown schema '{name}'"),
        }
    }
}

impl std::error::Error for ReflectError {}
