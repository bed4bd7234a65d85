mod common;

use std::rc::Rc;

use bcl_dynamic::DynMessage;
use bcl_walker::{
    BlockSpec, ChildFlags, ChildSpec, RootError, SchemaSet, SchemaWalker, SourceMap, SpecError,
    SpecSource, Tag,
};
use common::{file_spec, pool, schemas};

#[test]
fn repeated_lookups_return_the_same_spec() {
    bcl_testhelpers::setup();

    let set = schemas();
    let file = DynMessage::new(&pool(), "test.v1.File").unwrap().container();
    assert!(!set.is_cached("test.v1.File"));

    let first = set.block_spec(&file).unwrap();
    let second = set.block_spec(&file).unwrap();
    assert!(Rc::ptr_eq(&first, &second));
    assert!(set.is_cached("test.v1.File"));
}

#[test]
fn derived_spec_has_one_child_per_property() {
    bcl_testhelpers::setup();

    let set = SchemaSet::new();
    let bar = DynMessage::new(&pool(), "test.v1.Bar").unwrap().container();
    let spec = set.block_spec(&bar).unwrap();

    assert_eq!(spec.source, SpecSource::Derived);
    assert_eq!(spec.exact_names().collect::<Vec<_>>(), ["size", "aliases"]);
    assert_eq!(spec.child("size"), Some(&ChildSpec::attribute(["size"])));
    assert_eq!(spec.child("aliases"), Some(&ChildSpec::list(["aliases"])));
    assert!(spec.wildcard().is_none());
    assert!(spec.name.is_none());
}

#[test]
fn given_spec_overlays_the_derived_one() {
    bcl_testhelpers::setup();

    let set = schemas();
    let file = DynMessage::new(&pool(), "test.v1.File").unwrap().container();
    let spec = set.block_spec(&file).unwrap();

    assert_eq!(spec.source, SpecSource::Given);
    assert_eq!(spec.err_name(), "file");
    assert_eq!(
        spec.exact_names().collect::<Vec<_>>(),
        [
            "topLevelSingle",
            "topLevelRepeated",
            "elements",
            "sections",
            "foo",
            "bar"
        ]
    );
    assert_eq!(spec.child("elements").map(ChildSpec::flags).map(|f| f.is_collection), Some(true));
}

#[test]
fn map_containers_get_a_wildcard() {
    bcl_testhelpers::setup();

    let set = SchemaSet::new();
    let file = DynMessage::new(&pool(), "test.v1.File").unwrap().container();
    let sections = bcl_walker::Container::property_as_container(&file, "sections").unwrap();
    let spec = set.block_spec(&sections).unwrap();

    assert_eq!(spec.wildcard(), Some(&ChildSpec::Wildcard(ChildFlags::CONTAINER)));
    assert_eq!(spec.exact_names().count(), 0);
}

#[test]
fn later_registration_wins() {
    bcl_testhelpers::setup();

    let mut set = schemas();
    let file = DynMessage::new(&pool(), "test.v1.File").unwrap().container();
    assert_eq!(set.block_spec(&file).unwrap().err_name(), "file");

    set.give(file_spec().with_debug_name("document"));
    assert!(!set.is_cached("test.v1.File"));
    assert_eq!(set.block_spec(&file).unwrap().err_name(), "document");
}

#[test]
fn given_child_through_unknown_property_is_rejected() {
    bcl_testhelpers::setup();

    let set = SchemaSet::with_given([
        BlockSpec::new("test.v1.File").with_child("oops", ChildSpec::block(["nothing", "here"]))
    ]);
    let file = DynMessage::new(&pool(), "test.v1.File").unwrap();
    let source_map = SourceMap::new();

    let err = SchemaWalker::new_root(&set, file.container(), Some(&source_map)).unwrap_err();
    assert_eq!(
        err,
        RootError::Spec(SpecError::UnknownProperty {
            schema: "test.v1.File".to_string(),
            child: "oops".to_string(),
            property: "nothing".to_string(),
        })
    );
}

#[test]
fn declared_child_under_the_wildcard_name_is_rejected() {
    bcl_testhelpers::setup();

    let set = SchemaSet::with_given([
        BlockSpec::new("test.v1.File").with_child("*", ChildSpec::attribute(["topLevelSingle"]))
    ]);
    let file = DynMessage::new(&pool(), "test.v1.File").unwrap().container();

    let err = set.block_spec(&file).unwrap_err();
    assert_eq!(
        err,
        SpecError::DeclaredWildcard {
            schema: "test.v1.File".to_string(),
        }
    );
    assert_eq!(
        err.to_string(),
        "spec for test.v1.File: '*' names the wildcard and cannot be a declared child"
    );
    assert!(!set.is_cached("test.v1.File"));
}

#[test]
fn root_requires_a_source_map() {
    bcl_testhelpers::setup();

    let set = schemas();
    let file = DynMessage::new(&pool(), "test.v1.File").unwrap();
    let err = SchemaWalker::new_root(&set, file.container(), None).unwrap_err();
    assert_eq!(err, RootError::MissingSourceLocation);
    assert_eq!(err.to_string(), "source location required");
}

#[test]
fn given_tags_are_kept() {
    bcl_testhelpers::setup();

    let set = schemas();
    let file = DynMessage::new(&pool(), "test.v1.File").unwrap().container();
    let element = bcl_walker::Container::property_as_container(&file, "elements").unwrap();
    let foo = bcl_walker::Container::property_as_container(&element, "foo").unwrap();
    let spec = set.block_spec(&foo).unwrap();

    assert_eq!(spec.name, Some(Tag::new(["name"])));
    assert_eq!(spec.description, Some(Tag::new(["description"])));
    assert!(spec.type_select.is_none());
}
