//! Declarative path specs: which child names a block accepts and where they go.

use std::borrow::Cow;
use std::fmt;

use indexmap::IndexMap;

/// Key under which a wildcard child spec is registered.
pub const WILDCARD: &str = "*";

/// Classification flags carried by a child spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ChildFlags {
    /// The child can be opened as a nested block.
    pub is_container: bool,
    /// The child can be assigned a single scalar.
    pub is_scalar: bool,
    /// The child addresses an array.
    pub is_collection: bool,
}

impl ChildFlags {
    /// Flags for a nested block.
    pub const CONTAINER: ChildFlags = ChildFlags {
        is_container: true,
        is_scalar: false,
        is_collection: false,
    };

    /// Flags for a scalar attribute.
    pub const SCALAR: ChildFlags = ChildFlags {
        is_container: false,
        is_scalar: true,
        is_collection: false,
    };

    /// Flags for an array field, neither a block nor a scalar.
    pub const COLLECTION: ChildFlags = ChildFlags {
        is_container: false,
        is_scalar: false,
        is_collection: true,
    };

    /// Short tag used in scope dumps.
    pub const fn tag_string(self) -> &'static str {
        match (self.is_container, self.is_scalar, self.is_collection) {
            (true, _, _) => "block",
            (false, true, _) => "attr",
            (false, false, true) => "list",
            (false, false, false) => "field",
        }
    }
}

/// A child name mapped to an explicit property path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredChild {
    /// Property-access steps from the owning container to the target.
    pub path: Vec<String>,
    /// What the target is.
    pub flags: ChildFlags,
}

/// The rule for one child name within one schema type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildSpec {
    /// An exact name with its path.
    Declared(DeclaredChild),
    /// The `*` fallback: any unmatched name is a one-step access named after itself.
    Wildcard(ChildFlags),
}

impl ChildSpec {
    /// A nested block reached through `path`.
    pub fn block<S: Into<String>>(path: impl IntoIterator<Item = S>) -> Self {
        Self::declared(path, ChildFlags::CONTAINER)
    }

    /// A scalar attribute reached through `path`.
    pub fn attribute<S: Into<String>>(path: impl IntoIterator<Item = S>) -> Self {
        Self::declared(path, ChildFlags::SCALAR)
    }

    /// An array field reached through `path`.
    pub fn list<S: Into<String>>(path: impl IntoIterator<Item = S>) -> Self {
        Self::declared(path, ChildFlags::COLLECTION)
    }

    /// A declared child with explicit flags.
    pub fn declared<S: Into<String>>(path: impl IntoIterator<Item = S>, flags: ChildFlags) -> Self {
        ChildSpec::Declared(DeclaredChild {
            path: path.into_iter().map(Into::into).collect(),
            flags,
        })
    }

    /// The spec's flags.
    pub const fn flags(&self) -> ChildFlags {
        match self {
            ChildSpec::Declared(declared) => declared.flags,
            ChildSpec::Wildcard(flags) => *flags,
        }
    }

    /// Resolve this spec for a requested name.
    ///
    /// A wildcard becomes a one-step path named after the request,
    /// keeping the wildcard's container/scalar flags. It never addresses a
    /// collection.
    pub fn materialize(&self, name: &str) -> Cow<'_, DeclaredChild> {
        match self {
            ChildSpec::Declared(declared) => Cow::Borrowed(declared),
            ChildSpec::Wildcard(flags) => Cow::Owned(DeclaredChild {
                path: vec![name.to_string()],
                flags: ChildFlags {
                    is_container: flags.is_container,
                    is_scalar: flags.is_scalar,
                    is_collection: false,
                },
            }),
        }
    }
}

/// A label binding on a block, e.g. the `Name` in `foo Name { ... }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Child names, resolved in the block's own scope; the last is the target.
    pub path: Vec<String>,
    /// Whether the label may be omitted.
    pub optional: bool,
}

impl Tag {
    /// A required tag targeting `path`.
    pub fn new<S: Into<String>>(path: impl IntoIterator<Item = S>) -> Self {
        Tag {
            path: path.into_iter().map(Into::into).collect(),
            optional: false,
        }
    }

    /// Mark the tag as optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Where a block spec came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecSource {
    /// Derived from the type's reflective description only.
    Derived,
    /// A caller-given spec overlaid on the derived one.
    Given,
}

impl fmt::Display for SpecSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecSource::Derived => f.write_str("derived"),
            SpecSource::Given => f.write_str("given"),
        }
    }
}

/// All child specs and tags for one schema type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSpec {
    schema_name: String,
    children: IndexMap<String, ChildSpec>,
    /// Binds the block's label to a field.
    pub name: Option<Tag>,
    /// Selects a union member from the block's label.
    pub type_select: Option<Tag>,
    /// Receives description lines in the block body.
    pub description: Option<Tag>,
    /// Human name used in diagnostics instead of the schema name.
    pub debug_name: Option<String>,
    /// Provenance.
    pub source: SpecSource,
}

impl BlockSpec {
    /// An empty given spec for `schema_name`.
    pub fn new(schema_name: impl Into<String>) -> Self {
        BlockSpec {
            schema_name: schema_name.into(),
            children: IndexMap::new(),
            name: None,
            type_select: None,
            description: None,
            debug_name: None,
            source: SpecSource::Given,
        }
    }

    /// Add or replace a named child.
    ///
    /// A [`ChildSpec::Wildcard`] is always stored under [`WILDCARD`],
    /// whatever name is passed. A declared child named [`WILDCARD`] is kept
    /// and rejected when the spec is resolved.
    pub fn with_child(mut self, name: impl Into<String>, spec: ChildSpec) -> Self {
        self.insert_child(name.into(), spec);
        self
    }

    /// Add or replace the wildcard child.
    pub fn with_wildcard(self, flags: ChildFlags) -> Self {
        self.with_child(WILDCARD, ChildSpec::Wildcard(flags))
    }

    /// Set the name tag.
    pub fn with_name(mut self, tag: Tag) -> Self {
        self.name = Some(tag);
        self
    }

    /// Set the type-select tag.
    pub fn with_type_select(mut self, tag: Tag) -> Self {
        self.type_select = Some(tag);
        self
    }

    /// Set the description tag.
    pub fn with_description(mut self, tag: Tag) -> Self {
        self.description = Some(tag);
        self
    }

    /// Set the debug name.
    pub fn with_debug_name(mut self, name: impl Into<String>) -> Self {
        self.debug_name = Some(name.into());
        self
    }

    pub(crate) fn insert_child(&mut self, name: String, spec: ChildSpec) {
        let key = match spec {
            ChildSpec::Wildcard(_) => WILDCARD.to_string(),
            ChildSpec::Declared(_) => name,
        };
        self.children.insert(key, spec);
    }

    /// The schema this spec applies to.
    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    /// All children, including the wildcard, in declaration order.
    pub fn children(&self) -> impl Iterator<Item = (&str, &ChildSpec)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Exact-name lookup; never matches the wildcard.
    pub fn child(&self, name: &str) -> Option<&ChildSpec> {
        if name == WILDCARD {
            return None;
        }
        self.children.get(name)
    }

    /// The wildcard spec, if registered.
    pub fn wildcard(&self) -> Option<&ChildSpec> {
        self.children.get(WILDCARD)
    }

    /// Names of the exact (non-wildcard) children.
    pub fn exact_names(&self) -> impl Iterator<Item = &str> {
        self.children
            .keys()
            .map(String::as_str)
            .filter(|name| *name != WILDCARD)
    }

    /// Debug name if set, otherwise the schema name.
    pub fn err_name(&self) -> &str {
        self.debug_name.as_deref().unwrap_or(&self.schema_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_materializes_single_step_path() {
        let spec = ChildSpec::Wildcard(ChildFlags {
            is_container: false,
            is_scalar: true,
            is_collection: true,
        });
        let resolved = spec.materialize("colour");
        assert_eq!(resolved.path, vec!["colour".to_string()]);
        assert!(resolved.flags.is_scalar);
        assert!(!resolved.flags.is_container);
        assert!(!resolved.flags.is_collection);
    }

    #[test]
    fn declared_materializes_borrowed() {
        let spec = ChildSpec::block(["elements", "foo"]);
        let resolved = spec.materialize("ignored");
        assert!(matches!(resolved, Cow::Borrowed(_)));
        assert_eq!(resolved.path, vec!["elements", "foo"]);
    }

    #[test]
    fn wildcard_is_stored_under_star_only() {
        let spec = BlockSpec::new("test.v1.Map")
            .with_child("anything", ChildSpec::Wildcard(ChildFlags::SCALAR));
        assert!(spec.child("anything").is_none());
        assert!(spec.child(WILDCARD).is_none());
        assert_eq!(spec.wildcard(), Some(&ChildSpec::Wildcard(ChildFlags::SCALAR)));
        assert_eq!(spec.exact_names().count(), 0);
    }

    #[test]
    fn tag_strings() {
        assert_eq!(ChildFlags::CONTAINER.tag_string(), "block");
        assert_eq!(ChildFlags::SCALAR.tag_string(), "attr");
        assert_eq!(ChildFlags::COLLECTION.tag_string(), "list");
        assert_eq!(ChildFlags::default().tag_string(), "field");
    }
}
