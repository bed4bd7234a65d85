//! Drives a [`Scope`] from a stream of document events.

use bcl_walker::{
    ArrayOfScalarField, AstValue, Field, PathErrorCause, ScalarField, Scope, SourceLocation,
    SourceMap, Span, Tag, WalkPathError,
};

use crate::{AttributeValue, BindError, BindErrorKind, Event, Ident};

/// Options for a [`Binder`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BinderOptions {
    /// Log a dump of the scope at `debug` level whenever a name fails to
    /// resolve.
    pub verbose: bool,
}

impl BinderOptions {
    /// Enable scope dumps on failure.
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }
}

struct OpenBlock<S> {
    scope: S,
    name: String,
    span: Span,
}

/// Consumes document events and writes the values they carry through a scope.
///
/// The binder keeps one scope per open block. Values land in the containers
/// the root scope was built over; source positions land in that scope's
/// source map.
pub struct Binder<S> {
    root: S,
    open: Vec<OpenBlock<S>>,
    options: BinderOptions,
}

impl<S: Scope> Binder<S> {
    /// A binder writing through `root`.
    pub fn new(root: S, options: BinderOptions) -> Self {
        Binder {
            root,
            open: Vec::new(),
            options,
        }
    }

    /// The scope of the innermost open block.
    pub fn current(&self) -> &S {
        self.open
            .last()
            .map(|block| &block.scope)
            .unwrap_or(&self.root)
    }

    /// Number of blocks currently open.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Apply one event.
    pub fn feed(&mut self, event: Event) -> Result<(), BindError> {
        match event {
            Event::BlockOpen { name, labels, span } => self.open_block(name, labels, span),
            Event::Attribute { key, value, span } => self.attribute(&key, &value, span),
            Event::Description { text, span } => self.description(&text, span),
            Event::BlockClose { span } => self.close_block(span),
        }
    }

    /// Check that every block was closed and hand back the root scope.
    pub fn finish(self) -> Result<S, BindError> {
        if let Some(block) = self.open.last() {
            return Err(BindError::new(
                BindErrorKind::UnclosedBlock {
                    block: block.name.clone(),
                },
                block.span,
            ));
        }
        Ok(self.root)
    }

    fn open_block(&mut self, name: Ident, labels: Vec<Ident>, span: Span) -> Result<(), BindError> {
        let parent = self.current();
        let scope = self.walk(parent, name.span, |scope| scope.child_block(&name.name, span))?;
        let scope = self.apply_labels(scope, &name, labels)?;

        tracing::trace!(
            block = %name.name,
            depth = self.open.len() + 1,
            schemas = ?scope.schema_names(),
            "opened block"
        );
        self.open.push(OpenBlock {
            scope,
            name: name.name,
            span,
        });
        Ok(())
    }

    fn close_block(&mut self, span: Span) -> Result<(), BindError> {
        let Some(block) = self.open.pop() else {
            return Err(BindError::new(BindErrorKind::UnbalancedClose, span));
        };
        tracing::trace!(block = %block.name, depth = self.open.len(), "closed block");
        Ok(())
    }

    /// Labels are consumed in order: first the variant selector, then the
    /// name, each only if the block's spec declares the tag.
    fn apply_labels(&self, scope: S, name: &Ident, labels: Vec<Ident>) -> Result<S, BindError> {
        let mut labels = labels.into_iter();
        let mut scope = scope;

        if let Some(tag) = scope.leaf_spec().type_select.clone() {
            match labels.next() {
                Some(label) => scope = self.select_type(scope, &tag, &label)?,
                None if tag.optional => {}
                None => return Err(missing_label(name, "type")),
            }
        }

        if let Some(tag) = scope.leaf_spec().name.clone() {
            match labels.next() {
                Some(label) => {
                    self.set_tag(&scope, &tag, label.span, AstValue::String(label.name))?
                }
                None if tag.optional => {}
                None => return Err(missing_label(name, "name")),
            }
        }

        if let Some(extra) = labels.next() {
            return Err(BindError::new(
                BindErrorKind::UnexpectedLabel {
                    block: name.name.clone(),
                    label: extra.name,
                },
                extra.span,
            ));
        }

        Ok(scope)
    }

    /// Open the variant named by `label` under the tag's path and let the
    /// block body see it alongside the block itself.
    fn select_type(&self, scope: S, tag: &Tag, label: &Ident) -> Result<S, BindError> {
        let mut target = scope.tail_scope();
        for step in &tag.path {
            target = self.walk(&target, label.span, |s| s.child_block(step, label.span))?;
        }
        let selected = self.walk(&target, label.span, |s| {
            s.child_block(&label.name, label.span)
        })?;
        Ok(scope.merge_scope(&selected))
    }

    /// Write `value` to the scalar a tag points at, relative to the block.
    fn set_tag(&self, scope: &S, tag: &Tag, span: Span, value: AstValue) -> Result<(), BindError> {
        let Some((last, path_to_parent)) = tag.path.split_last() else {
            return Err(BindError::new(
                WalkPathError::UnknownPathError {
                    path: Vec::new(),
                    schema: Some(scope.leaf_spec().err_name().to_string()),
                    cause: PathErrorCause::EmptyPath,
                },
                span,
            ));
        };

        let mut target = scope.tail_scope();
        for step in path_to_parent {
            target = self.walk(&target, span, |s| s.child_block(step, span))?;
        }
        let mut field = self.walk(&target, span, |s| s.scalar_field(last, span))?;
        field
            .set_ast_value(&value)
            .map_err(|err| BindError::new(err, span))
    }

    fn attribute(&self, key: &[Ident], value: &AttributeValue, span: Span) -> Result<(), BindError> {
        let Some((last, path_to_parent)) = key.split_last() else {
            return Err(BindError::new(
                WalkPathError::UnknownPathError {
                    path: Vec::new(),
                    schema: Some(self.current().leaf_spec().err_name().to_string()),
                    cause: PathErrorCause::EmptyPath,
                },
                span,
            ));
        };

        let mut nested: Option<S> = None;
        for ident in path_to_parent {
            let from = nested.as_ref().unwrap_or(self.current());
            nested = Some(self.walk(from, ident.span, |s| s.child_block(&ident.name, span))?);
        }
        let target = nested.as_ref().unwrap_or(self.current());

        match value {
            AttributeValue::Scalar(value) => {
                let mut field = self.walk(target, last.span, |s| s.scalar_field(&last.name, span))?;
                field
                    .set_ast_value(value)
                    .map_err(|err| BindError::new(err, span))
            }
            AttributeValue::Array(values) => {
                let field = self.walk(target, last.span, |s| s.field(&last.name, span))?;
                let Some(mut array) = field.as_array_of_scalar() else {
                    return Err(BindError::new(
                        BindErrorKind::NotAnArray {
                            key: dotted(key),
                            type_name: field.full_type_name(),
                        },
                        last.span,
                    ));
                };
                for value in values {
                    array
                        .append_ast_value(value)
                        .map_err(|err| BindError::new(err, span))?;
                }
                Ok(())
            }
        }
    }

    fn description(&self, text: &str, span: Span) -> Result<(), BindError> {
        let scope = self.current();
        let Some(tag) = scope.leaf_spec().description.clone() else {
            return Err(BindError::new(
                BindErrorKind::NoDescription {
                    block: scope.leaf_spec().err_name().to_string(),
                },
                span,
            ));
        };
        self.set_tag(scope, &tag, span, AstValue::String(text.to_string()))
    }

    /// Run one resolution, attaching `span` to a failure.
    fn walk<T>(
        &self,
        scope: &S,
        span: Span,
        resolve: impl FnOnce(&S) -> Result<T, WalkPathError>,
    ) -> Result<T, BindError> {
        resolve(scope).map_err(|err| {
            if self.options.verbose {
                let mut dump = String::new();
                if scope.print_scope(&mut dump).is_ok() {
                    tracing::debug!(error = %err, "failed to resolve in scope:\n{dump}");
                }
            }
            BindError::new(err, span)
        })
    }
}

fn missing_label(name: &Ident, tag: &'static str) -> BindError {
    BindError::new(
        BindErrorKind::MissingLabel {
            block: name.name.clone(),
            tag,
        },
        name.span,
    )
}

fn dotted(key: &[Ident]) -> String {
    key.iter()
        .map(|ident| ident.name.as_str())
        .collect::<Vec<_>>()
        .join(".")
}

/// Bind a whole document and return the source locations it produced.
///
/// `source_map` must be the map `scope` was rooted with.
pub fn bind_events<S: Scope>(
    scope: S,
    source_map: &SourceMap,
    events: impl IntoIterator<Item = Event>,
    options: BinderOptions,
) -> Result<SourceLocation, BindError> {
    let mut binder = Binder::new(scope, options);
    for event in events {
        binder.feed(event)?;
    }
    binder.finish()?;
    Ok(source_map.snapshot())
}
