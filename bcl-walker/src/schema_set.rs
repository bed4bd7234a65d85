//! The path spec registry.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::tracing_macros::{debug, trace};
use crate::{
    BlockSpec, ChildFlags, ChildSpec, Container, SpecError, SpecSource, TypeDescriptor, WILDCARD,
};

/// Per-schema block specs for one parse.
///
/// Specs are derived from a container's [`TypeDescriptor`] the first time
/// its schema is seen, overlaid with any spec given for that schema name,
/// and cached. One registry serves one document parse at a time.
#[derive(Debug, Default)]
pub struct SchemaSet {
    given: HashMap<String, BlockSpec>,
    cache: RefCell<HashMap<String, Rc<BlockSpec>>>,
}

impl SchemaSet {
    /// An empty registry: every spec is derived.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry seeded with given specs.
    pub fn with_given(specs: impl IntoIterator<Item = BlockSpec>) -> Self {
        let mut set = Self::new();
        for spec in specs {
            set.give(spec);
        }
        set
    }

    /// Register a given spec. A later registration for the same schema
    /// replaces the earlier one and invalidates its cached derivation.
    pub fn give(&mut self, spec: BlockSpec) {
        let schema_name = spec.schema_name().to_string();
        self.cache.get_mut().remove(&schema_name);
        self.given.insert(schema_name, spec);
    }

    /// Whether a spec for `schema_name` has been resolved and cached.
    pub fn is_cached(&self, schema_name: &str) -> bool {
        self.cache.borrow().contains_key(schema_name)
    }

    /// The spec for `container`'s schema, derived and cached on first use.
    pub fn block_spec<C: Container>(&self, container: &C) -> Result<Rc<BlockSpec>, SpecError> {
        let schema_name = container.schema_name();
        if let Some(spec) = self.cache.borrow().get(schema_name) {
            trace!(schema = schema_name, "block spec cache hit");
            return Ok(Rc::clone(spec));
        }

        let spec = Rc::new(self.derive(container.descriptor())?);
        debug!(
            schema = schema_name,
            source = %spec.source,
            children = spec.exact_names().count(),
            wildcard = spec.wildcard().is_some(),
            "resolved block spec"
        );
        self.cache
            .borrow_mut()
            .insert(schema_name.to_string(), Rc::clone(&spec));
        Ok(spec)
    }

    fn derive(&self, descriptor: &TypeDescriptor) -> Result<BlockSpec, SpecError> {
        let mut spec = BlockSpec::new(descriptor.schema_name.clone());
        spec.source = SpecSource::Derived;

        for property in &descriptor.properties {
            let flags = ChildFlags {
                is_container: property.kind.is_container(),
                is_scalar: property.kind.is_scalar(),
                is_collection: property.kind.is_collection(),
            };
            spec.insert_child(
                property.name.clone(),
                ChildSpec::declared([property.name.as_str()], flags),
            );
        }

        if let Some(kind) = descriptor.open_keys {
            spec.insert_child(
                String::new(),
                ChildSpec::Wildcard(ChildFlags {
                    is_container: kind.is_container(),
                    is_scalar: kind.is_scalar(),
                    is_collection: kind.is_collection(),
                }),
            );
        }

        let Some(given) = self.given.get(&descriptor.schema_name) else {
            return Ok(spec);
        };

        for (name, child) in given.children() {
            if name == WILDCARD && matches!(child, ChildSpec::Declared(_)) {
                return Err(SpecError::DeclaredWildcard {
                    schema: descriptor.schema_name.clone(),
                });
            }
            if let ChildSpec::Declared(declared) = child
                && let Some(first) = declared.path.first()
                && descriptor.open_keys.is_none()
                && descriptor.property(first).is_none()
            {
                return Err(SpecError::UnknownProperty {
                    schema: descriptor.schema_name.clone(),
                    child: name.to_string(),
                    property: first.clone(),
                });
            }
            spec.insert_child(name.to_string(), child.clone());
        }

        if given.name.is_some() {
            spec.name = given.name.clone();
        }
        if given.type_select.is_some() {
            spec.type_select = given.type_select.clone();
        }
        if given.description.is_some() {
            spec.description = given.description.clone();
        }
        if given.debug_name.is_some() {
            spec.debug_name = given.debug_name.clone();
        }
        spec.source = SpecSource::Given;

        Ok(spec)
    }
}
