//! The schema walker: resolves typed names against a stack of bound containers.

use std::fmt;
use std::rc::Rc;

use crate::container::{ContainerField, ContainerSet, FoundChild};
use crate::tracing_macros::trace;
use crate::{
    BlockSpec, ChildSpec, Container, Field, PathErrorCause, RootError, SchemaSet, SourceMap, Span,
    WalkPathError,
};

/// A view of the names a block body can use.
///
/// This is the seam between an event-driven parser and the walker: the
/// parser calls [`Scope::child_block`] when a block opens and uses the
/// returned scope for the body, and calls [`Scope::scalar_field`] or
/// [`Scope::field`] for attributes. Scopes are values; every operation
/// returns a new one and leaves the receiver untouched.
pub trait Scope: Sized {
    /// Leaf handle returned by [`Scope::field`].
    type Field: Field;

    /// Resolve `name` to a nested block and return a fresh scope for its body.
    fn child_block(&self, name: &str, span: Span) -> Result<Self, WalkPathError>;

    /// Resolve `name` to a scalar-settable field.
    fn scalar_field(
        &self,
        name: &str,
        span: Span,
    ) -> Result<<Self::Field as Field>::Scalar, WalkPathError>;

    /// Resolve `name` to a field, whatever its capabilities.
    fn field(&self, name: &str, span: Span) -> Result<Self::Field, WalkPathError>;

    /// Let `other`'s blocks answer lookups after this scope's own, with
    /// `other`'s leaf as the current block.
    fn merge_scope(&self, other: &Self) -> Self;

    /// A scope that sees only the current block.
    fn tail_scope(&self) -> Self;

    /// The spec of the block whose body is being populated.
    fn leaf_spec(&self) -> &BlockSpec;

    /// Scalar attribute names available in this scope.
    fn list_attributes(&self) -> Vec<String>;

    /// Block names available in this scope.
    fn list_blocks(&self) -> Vec<String>;

    /// Every exact child name available in this scope.
    fn list_children(&self) -> Vec<String>;

    /// Schema names of every visible block, in precedence order.
    fn schema_names(&self) -> Vec<String>;

    /// Write a human-readable dump of the scope.
    fn print_scope(&self, out: &mut dyn fmt::Write) -> fmt::Result;
}

/// The [`Scope`] implementation over any [`Container`].
pub struct SchemaWalker<'s, C> {
    schema_set: &'s SchemaSet,
    block_set: ContainerSet<C>,
    leaf_block: Rc<ContainerField<C>>,
    root_block: Option<Rc<ContainerField<C>>>,
}

impl<C> Clone for SchemaWalker<'_, C> {
    fn clone(&self) -> Self {
        SchemaWalker {
            schema_set: self.schema_set,
            block_set: self.block_set.clone(),
            leaf_block: Rc::clone(&self.leaf_block),
            root_block: self.root_block.clone(),
        }
    }
}

impl<'s, C: Container> SchemaWalker<'s, C> {
    /// A scope over the document root.
    ///
    /// Every location resolved through this scope and the scopes derived
    /// from it is recorded in `source_map`, which is required.
    pub fn new_root(
        schema_set: &'s SchemaSet,
        root: C,
        source_map: Option<&SourceMap>,
    ) -> Result<Self, RootError> {
        let source_map = source_map.ok_or(RootError::MissingSourceLocation)?;
        let spec = schema_set.block_spec(&root)?;

        let mut root = ContainerField::new(root, spec, String::new(), source_map.cursor());
        root.is_root = true;
        let root = Rc::new(root);

        Ok(SchemaWalker {
            schema_set,
            block_set: ContainerSet::single(Rc::clone(&root)),
            leaf_block: Rc::clone(&root),
            root_block: Some(root),
        })
    }

    fn new_child(&self, container: ContainerField<C>, new_scope: bool) -> Self {
        let container = Rc::new(container);
        let block_set = if new_scope {
            ContainerSet::single(Rc::clone(&container))
        } else {
            self.block_set
                .concat(&ContainerSet::single(Rc::clone(&container)))
        };
        SchemaWalker {
            schema_set: self.schema_set,
            block_set,
            leaf_block: Rc::clone(&container),
            root_block: Some(container),
        }
    }

    /// The container whose body is being populated.
    pub fn current_block(&self) -> &C {
        &self.leaf_block.container
    }

    /// The container this walker was rooted at, unset for tail scopes.
    pub fn root_block(&self) -> Option<&C> {
        self.root_block.as_ref().map(|root| &root.container)
    }

    fn find_block(&self, name: &str) -> Result<FoundChild<'_, C>, WalkPathError> {
        self.block_set
            .find_block(name)
            .ok_or_else(|| WalkPathError::RootNotFound {
                name: name.to_string(),
                schema: self.leaf_block.schema_name().to_string(),
                available: self.block_set.list_children(),
            })
    }

    /// Walk a path found for `name`, reporting a non-container step under
    /// the requested name rather than the internal step.
    fn walk_for(
        &self,
        name: &str,
        root: &ContainerField<C>,
        path: &[String],
        span: Span,
    ) -> Result<ContainerField<C>, WalkPathError> {
        self.walk_to_child(root, path, span).map_err(|err| match err {
            WalkPathError::NodeNotContainer { schema, cause, .. } => {
                WalkPathError::NodeNotContainer {
                    path: vec![name.to_string()],
                    schema,
                    cause,
                }
            }
            other => other,
        })
    }

    fn walk_to_child(
        &self,
        root: &ContainerField<C>,
        path: &[String],
        span: Span,
    ) -> Result<ContainerField<C>, WalkPathError> {
        if path.is_empty() {
            return Ok(root.clone());
        }

        let mut visited = root
            .walk_path(self.schema_set, path, span)
            .map_err(|err| match err {
                WalkPathError::NodeNotFound { path, schema, .. } => WalkPathError::NodeNotFound {
                    path,
                    schema,
                    available: self.block_set.list_children(),
                },
                other => other,
            })?
            .into_iter();

        // walk_path returns at least one node for a non-empty path
        let Some(mut main) = visited.next() else {
            return Ok(root.clone());
        };
        main.transparent_path = visited.collect();
        Ok(main)
    }

    /// Like [`Scope::child_block`], but the returned scope keeps every block
    /// visible here, with the new block appended last.
    pub fn nested_block(&self, name: &str, span: Span) -> Result<Self, WalkPathError> {
        self.open_block(name, span, false)
    }

    fn open_block(&self, name: &str, span: Span, new_scope: bool) -> Result<Self, WalkPathError> {
        let found = self.find_block(name)?;
        if found.spec.path.is_empty() {
            return Err(WalkPathError::unexpected(
                vec![name.to_string()],
                Some(found.owner.schema_name().to_string()),
                PathErrorCause::EmptyPath,
            ));
        }

        let container = self.walk_for(name, found.owner, &found.spec.path, span)?;

        trace!(
            name,
            schema = container.schema_name(),
            transparent = container.transparent_path.len(),
            "entered block"
        );
        Ok(self.new_child(container, new_scope))
    }

    fn resolve_field(&self, name: &str, span: Span) -> Result<(C::Field, bool), WalkPathError> {
        // The root is the entry in scope that owns `name`; the parent is
        // the container holding the leaf, one step short of the end of the
        // path. Leaves are only reachable in their parent's context.
        let found = self.find_block(name)?;
        let Some((last, path_to_parent)) = found.spec.path.split_last() else {
            return Err(WalkPathError::unexpected(
                vec![name.to_string()],
                Some(found.owner.schema_name().to_string()),
                PathErrorCause::EmptyPath,
            ));
        };

        let parent = self.walk_for(name, found.owner, path_to_parent, span)?;
        if !parent.container.has_property(last) {
            return Err(WalkPathError::NodeNotFound {
                path: vec![name.to_string()],
                schema: parent.schema_name().to_string(),
                available: self.block_set.list_children(),
            });
        }

        let field = parent.new_value(last, span).map_err(|err| {
            WalkPathError::unexpected(
                vec![name.to_string()],
                Some(parent.schema_name().to_string()),
                err,
            )
        })?;

        trace!(name, path = ?found.spec.path, "resolved field");
        Ok((field, found.spec.flags.is_scalar))
    }
}

impl<C: Container> Scope for SchemaWalker<'_, C> {
    type Field = C::Field;

    fn child_block(&self, name: &str, span: Span) -> Result<Self, WalkPathError> {
        self.open_block(name, span, true)
    }

    fn scalar_field(
        &self,
        name: &str,
        span: Span,
    ) -> Result<<Self::Field as Field>::Scalar, WalkPathError> {
        let (field, is_scalar) = self.resolve_field(name, span)?;
        if !is_scalar {
            return Err(WalkPathError::NodeNotScalar {
                path: vec![name.to_string()],
                type_name: field.type_name(),
            });
        }

        field.as_scalar().ok_or_else(|| WalkPathError::NodeNotScalar {
            path: vec![name.to_string()],
            type_name: field.full_type_name(),
        })
    }

    fn field(&self, name: &str, span: Span) -> Result<Self::Field, WalkPathError> {
        let (field, _) = self.resolve_field(name, span)?;
        Ok(field)
    }

    fn merge_scope(&self, other: &Self) -> Self {
        assert!(
            std::ptr::eq(self.schema_set, other.schema_set),
            "invalid merge: scopes were built from different schema sets"
        );
        SchemaWalker {
            schema_set: self.schema_set,
            block_set: self.block_set.concat(&other.block_set),
            leaf_block: Rc::clone(&other.leaf_block),
            root_block: self.root_block.clone(),
        }
    }

    fn tail_scope(&self) -> Self {
        SchemaWalker {
            schema_set: self.schema_set,
            block_set: ContainerSet::single(Rc::clone(&self.leaf_block)),
            leaf_block: Rc::clone(&self.leaf_block),
            root_block: None,
        }
    }

    fn leaf_spec(&self) -> &BlockSpec {
        &self.leaf_block.spec
    }

    fn list_attributes(&self) -> Vec<String> {
        self.block_set.list_attributes()
    }

    fn list_blocks(&self) -> Vec<String> {
        self.block_set.list_blocks()
    }

    fn list_children(&self) -> Vec<String> {
        self.block_set.list_children()
    }

    fn schema_names(&self) -> Vec<String> {
        self.block_set.schema_names()
    }

    fn print_scope(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        writeln!(out, "available blocks:")?;
        for block in self.block_set.iter() {
            let nodes = std::iter::once(&**block).chain(block.transparent_path.iter());
            for node in nodes {
                write!(out, "from {} : {}", node.schema_name(), node.spec.source)?;
                if let Some(debug_name) = &node.spec.debug_name {
                    write!(out, " {debug_name:?}")?;
                }
                if node.is_root {
                    write!(out, " (root)")?;
                } else if !node.name.is_empty() {
                    write!(out, " via {:?}", node.name)?;
                }
                writeln!(out)?;
                for (name, child) in node.spec.children() {
                    let flags = child.flags();
                    match child {
                        ChildSpec::Declared(declared) => {
                            writeln!(out, " - [{}] {name:?} {:?}", flags.tag_string(), declared.path)?
                        }
                        ChildSpec::Wildcard(_) => {
                            writeln!(out, " - [{}] {name:?} <any>", flags.tag_string())?
                        }
                    }
                }
            }
        }

        let spec = &self.leaf_block.spec;
        writeln!(out, "leaf spec: {}", spec.err_name())?;
        if let Some(tag) = &spec.name {
            writeln!(out, " - tag[name]: {:?}", tag.path)?;
        }
        if let Some(tag) = &spec.type_select {
            writeln!(out, " - tag[type]: {:?}", tag.path)?;
        }
        if let Some(tag) = &spec.description {
            writeln!(out, " - tag[description]: {:?}", tag.path)?;
        }
        writeln!(out, "-------")
    }
}

impl<C: Container> fmt::Debug for SchemaWalker<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaWalker")
            .field("schemas", &self.block_set.schema_names())
            .field("leaf", &self.leaf_block.schema_name())
            .field("root", &self.root_block.as_ref().map(|r| r.schema_name()))
            .finish()
    }
}
