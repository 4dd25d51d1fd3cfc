//! Integration tests for dotted path navigation
//!
//! Covers:
//! - get/set over parsed JSON and XML documents
//! - set followed by get returns the stored subtree
//! - Typed getters for configuration-style documents
//! - Error kinds and arena accounting for replaced subtrees

mod common;

use common::{assert_conserved, free_counts, test_arena};
use slabtree::{
    Arena, ArenaConfig, Error, Node, ParseLimits, PathErrorKind, PathSegment, TreePath, json,
    path, xml,
};

#[test]
fn test_set_then_get_returns_value() {
    let arena = test_arena();
    let mut root = Node::object(&arena).unwrap();

    let value = json::parse(&arena, r#"{"k": [1, 2]}"#).unwrap();
    let expected = value.try_clone().unwrap();
    root.set("a.b", value).unwrap();

    assert_eq!(root.get("a.b").unwrap(), &expected);
    assert_eq!(root.to_json().unwrap(), r#"{"a":{"b":{"k":[1,2]}}}"#);
}

#[test]
fn test_free_functions_match_methods() {
    let arena = test_arena();
    let mut root = json::parse(&arena, r#"{"list": [{"id": "x"}, {"id": "y"}]}"#).unwrap();

    assert_eq!(path::get(&root, "list[1].id").unwrap().text().unwrap(), "y");
    path::set(&mut root, "list[0].id", Node::leaf(&arena, "z").unwrap()).unwrap();
    assert_eq!(root.get_text("list[0].id").unwrap(), "z");

    let node = path::get_mut(&mut root, "list[1]").unwrap();
    node.insert("extra", Node::null(&arena).unwrap()).unwrap();
    assert_eq!(
        root.to_json().unwrap(),
        r#"{"list":[{"id":"z"},{"id":"y","extra":null}]}"#
    );
}

#[test]
fn test_paths_over_xml_documents() {
    let arena = test_arena();
    let root = xml::parse(
        &arena,
        "<memory><facts><fact>sky is blue</fact><fact>water is wet</fact></facts></memory>",
    )
    .unwrap();
    assert_eq!(root.get_text("memory.facts.fact").unwrap(), "sky is blue");
    assert_eq!(root.get_text("memory.facts[1]").unwrap(), "water is wet");
}

#[test]
fn test_reusable_parsed_path() {
    let arena = test_arena();
    let path: TreePath = "agent.tools[0]".parse().unwrap();
    assert_eq!(path.segments()[2], PathSegment::Index(0));
    assert_eq!(path.as_str(), "agent.tools[0]");

    let mut root = json::parse(&arena, r#"{"agent": {"tools": ["search"]}}"#).unwrap();
    assert_eq!(path.resolve(&root).unwrap().text().unwrap(), "search");

    path.assign(&mut root, Node::leaf(&arena, "browse").unwrap())
        .unwrap();
    assert_eq!(path.resolve(&root).unwrap().text().unwrap(), "browse");

    *path.resolve_mut(&mut root).unwrap() = Node::leaf(&arena, "shell").unwrap();
    assert_eq!(root.get_text("agent.tools[0]").unwrap(), "shell");
}

#[test]
fn test_replacing_subtree_releases_slots() {
    let arena = test_arena();
    let mut root = json::parse(&arena, r#"{"a": 1}"#).unwrap();
    let before = free_counts(&arena);

    let big = json::parse(&arena, r#"{"x": [1, 2, 3, {"y": "long text value here"}]}"#).unwrap();
    root.set("a", big).unwrap();
    root.set_text("a", "1").unwrap();

    assert_conserved(&arena, &before);
}

#[test]
fn test_config_style_typed_reads() {
    let arena = test_arena();
    let root = json::parse(
        &arena,
        r#"{"llm": {"endpoint": "http://localhost:1234", "temperature": 0.7, "max_tokens": 4096, "stream": false}}"#,
    )
    .unwrap();
    assert_eq!(root.get_text("llm.endpoint").unwrap(), "http://localhost:1234");
    assert_eq!(root.get_f64("llm.temperature").unwrap(), 0.7);
    assert_eq!(root.get_i64("llm.max_tokens").unwrap(), 4096);
    assert!(!root.get_bool("llm.stream").unwrap());
    assert!(matches!(
        root.get_i64("llm.temperature"),
        Err(Error::Path {
            kind: PathErrorKind::TypeMismatch("integer"),
            ..
        })
    ));
    assert!(matches!(
        root.get_i64("llm.missing"),
        Err(Error::Path {
            kind: PathErrorKind::KeyNotFound(_),
            ..
        })
    ));
}

#[test]
fn test_error_messages_name_the_path() {
    let arena = test_arena();
    let root = json::parse(&arena, r#"{"a": [1]}"#).unwrap();

    let err = root.get("a[4]").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Path error at 'a[4]': index 4 out of range (length 1)"
    );

    let err = root.get("a..b").unwrap_err();
    assert!(err.to_string().starts_with("Path error at 'a..b': malformed path"));
}

#[test]
fn test_set_through_leaf_fails_without_changes() {
    let arena = test_arena();
    let mut root = json::parse(&arena, r#"{"a": "text"}"#).unwrap();
    let before = free_counts(&arena);

    let err = root.set_text("a.b", "x").unwrap_err();
    assert_eq!(
        err,
        Error::path("a.b", PathErrorKind::NotAContainer("leaf"))
    );
    assert_eq!(root.to_json().unwrap(), r#"{"a":"text"}"#);
    assert_conserved(&arena, &before);
}

#[test]
fn test_deep_set_fails_closed() {
    let arena = Arena::new(ArenaConfig::default()).unwrap();
    let mut root = Node::object(&arena).unwrap();
    let before = free_counts(&arena);

    let path = vec!["a"; 4_000].join(".");
    assert_eq!(
        root.set_text(&path, "x").unwrap_err(),
        Error::TooDeep {
            depth: 4_000,
            max: 64
        }
    );
    assert_conserved(&arena, &before);
    assert_eq!(root.to_json().unwrap(), "{}");

    // Trusted callers can opt into deeper trees and matching writers
    let limits = ParseLimits::permissive();
    let path: TreePath = vec!["a"; 300].join(".").parse().unwrap();
    let leaf = Node::leaf(&arena, "x").unwrap();
    path.assign_with_limits(&mut root, leaf, &limits).unwrap();
    assert!(matches!(root.to_json(), Err(Error::TooDeep { max: 64, .. })));
    let out = json::JsonWriter::new(&arena)
        .with_limits(limits)
        .write(&root)
        .unwrap();
    assert!(out.as_str().unwrap().starts_with("{\"a\":{\"a\":"));
}
