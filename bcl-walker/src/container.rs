//! Bound container nodes and the ordered set a scope resolves names against.

use std::borrow::Cow;
use std::rc::Rc;

use indexmap::IndexSet;

use crate::location::LocationCursor;
use crate::{
    BlockSpec, ChildSpec, Container, DeclaredChild, ReflectError, SchemaSet, Span, WalkPathError,
};

/// A live container paired with its resolved spec.
#[derive(Debug, Clone)]
pub(crate) struct ContainerField<C> {
    pub(crate) container: C,
    pub(crate) spec: Rc<BlockSpec>,
    /// The property step that reached this container; empty for the root.
    pub(crate) name: String,
    /// Containers crossed on the way here, nearest first. They are not
    /// addressable by name but their specs still answer lookups.
    pub(crate) transparent_path: Vec<ContainerField<C>>,
    pub(crate) location: LocationCursor,
    pub(crate) is_root: bool,
}

/// A child resolved against one container: where to walk from, and the path.
pub(crate) struct FoundChild<'a, C> {
    pub(crate) owner: &'a ContainerField<C>,
    pub(crate) spec: Cow<'a, DeclaredChild>,
}

impl<C: Container> ContainerField<C> {
    pub(crate) fn new(
        container: C,
        spec: Rc<BlockSpec>,
        name: String,
        location: LocationCursor,
    ) -> Self {
        ContainerField {
            container,
            spec,
            name,
            transparent_path: Vec::new(),
            location,
            is_root: false,
        }
    }

    pub(crate) fn schema_name(&self) -> &str {
        self.container.schema_name()
    }

    /// This node followed by its transparent ancestry.
    fn lookup_chain(&self) -> impl Iterator<Item = &ContainerField<C>> {
        std::iter::once(self).chain(self.transparent_path.iter())
    }

    fn find_exact(&self, name: &str) -> Option<FoundChild<'_, C>> {
        self.lookup_chain().find_map(|node| match node.spec.child(name) {
            Some(ChildSpec::Declared(declared)) => Some(FoundChild {
                owner: node,
                spec: Cow::Borrowed(declared),
            }),
            _ => None,
        })
    }

    fn find_wildcard(&self, name: &str) -> Option<FoundChild<'_, C>> {
        self.lookup_chain().find_map(|node| {
            node.spec.wildcard().map(|wildcard| FoundChild {
                owner: node,
                spec: wildcard.materialize(name),
            })
        })
    }

    fn children(&self) -> impl Iterator<Item = (&str, &ChildSpec)> {
        self.lookup_chain().flat_map(|node| node.spec.children())
    }

    /// Walk `path` one property at a time, resolving the spec of every
    /// container reached. Returns the visited nodes, the final target first
    /// and then the crossed intermediates, nearest first.
    pub(crate) fn walk_path(
        &self,
        schema_set: &SchemaSet,
        path: &[String],
        span: Span,
    ) -> Result<Vec<ContainerField<C>>, WalkPathError> {
        let mut visited: Vec<ContainerField<C>> = Vec::with_capacity(path.len());

        for (idx, step) in path.iter().enumerate() {
            let current = visited.last().unwrap_or(self);
            let walked = || path[..=idx].to_vec();

            if !current.container.has_property(step) {
                return Err(WalkPathError::NodeNotFound {
                    path: walked(),
                    schema: current.schema_name().to_string(),
                    available: Vec::new(),
                });
            }

            let next = match current.container.property_as_container(step) {
                Ok(next) => next,
                Err(err @ ReflectError::NotAContainer { .. }) => {
                    return Err(WalkPathError::NodeNotContainer {
                        path: walked(),
                        schema: current.schema_name().to_string(),
                        cause: err.into(),
                    });
                }
                Err(err) => {
                    return Err(WalkPathError::unexpected(
                        walked(),
                        Some(current.schema_name().to_string()),
                        err,
                    ));
                }
            };

            let mut location = current.location.child(step, span);
            if let Some(index) = next.element_index() {
                location = location.child(&index.to_string(), span);
            }

            let spec = schema_set.block_spec(&next).map_err(|err| {
                WalkPathError::unexpected(walked(), Some(next.schema_name().to_string()), err)
            })?;

            visited.push(ContainerField::new(next, spec, step.clone(), location));
        }

        visited.reverse();
        Ok(visited)
    }

    /// Obtain the leaf `name` in the context of this container, recording
    /// where it was written.
    pub(crate) fn new_value(&self, name: &str, span: Span) -> Result<C::Field, ReflectError> {
        let field = self.container.property_as_field(name)?;
        self.location.record(name, span);
        Ok(field)
    }
}

/// The containers visible to a scope, in resolution precedence order.
#[derive(Debug)]
pub(crate) struct ContainerSet<C>(Vec<Rc<ContainerField<C>>>);

impl<C> Clone for ContainerSet<C> {
    fn clone(&self) -> Self {
        ContainerSet(self.0.clone())
    }
}

impl<C: Container> ContainerSet<C> {
    pub(crate) fn single(entry: Rc<ContainerField<C>>) -> Self {
        ContainerSet(vec![entry])
    }

    /// Entries of `self` followed by entries of `other`, sharing references.
    pub(crate) fn concat(&self, other: &ContainerSet<C>) -> Self {
        let mut entries = self.0.clone();
        entries.extend(other.0.iter().cloned());
        ContainerSet(entries)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Rc<ContainerField<C>>> {
        self.0.iter()
    }

    /// Exact names across every entry first; only then the first wildcard.
    pub(crate) fn find_block(&self, name: &str) -> Option<FoundChild<'_, C>> {
        self.0
            .iter()
            .find_map(|entry| entry.find_exact(name))
            .or_else(|| self.0.iter().find_map(|entry| entry.find_wildcard(name)))
    }

    /// Every exact child name, in precedence order, without duplicates.
    pub(crate) fn list_children(&self) -> Vec<String> {
        self.names_where(|_| true)
    }

    pub(crate) fn list_attributes(&self) -> Vec<String> {
        self.names_where(|spec| spec.flags().is_scalar)
    }

    pub(crate) fn list_blocks(&self) -> Vec<String> {
        self.names_where(|spec| spec.flags().is_container)
    }

    pub(crate) fn schema_names(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|entry| entry.schema_name().to_string())
            .collect()
    }

    fn names_where(&self, keep: impl Fn(&ChildSpec) -> bool) -> Vec<String> {
        let mut names = IndexSet::new();
        for entry in &self.0 {
            for (name, spec) in entry.children() {
                if matches!(spec, ChildSpec::Declared(_)) && keep(spec) {
                    names.insert(name.to_string());
                }
            }
        }
        names.into_iter().collect()
    }
}
