//! Path query execution against real documents.

mod common;

use common::{doc, serialize};
use jex_core::{Query, Step};
use pretty_assertions::assert_eq;

fn numbers(d: &jex_core::Document, path: &str) -> Vec<f64> {
    let mut out = Vec::new();
    Query::parse(path).unwrap().retrieve(d, |r| {
        if let Some(v) = r.as_number() {
            out.push(v);
        }
    });
    out
}

#[test]
fn exact_paths() {
    let d = doc(r#"{"a":{"b":[10,20,30]},"c":5}"#);
    assert_eq!(numbers(&d, "c"), vec![5.0]);
    assert_eq!(numbers(&d, "a.b[0]"), vec![10.0]);
    assert_eq!(numbers(&d, "a.b[2]"), vec![30.0]);
    assert_eq!(numbers(&d, "a.b[3]"), Vec::<f64>::new());
    assert_eq!(numbers(&d, "a.z"), Vec::<f64>::new());
}

#[test]
fn index_wildcard_selects_all_elements() {
    let d = doc(r#"{"a":1,"b":[2,3]}"#);
    assert_eq!(numbers(&d, "b[*]"), vec![2.0, 3.0]);
}

#[test]
fn label_wildcard_selects_every_member() {
    let d = doc(r#"{"x":{"a":5},"y":{"a":6},"z":[7]}"#);
    assert_eq!(numbers(&d, "*.a"), vec![5.0, 6.0]);
}

#[test]
fn duplicate_labels_all_match() {
    let d = doc(r#"{"a":1,"a":2}"#);
    assert_eq!(numbers(&d, "a"), vec![1.0, 2.0]);
}

#[test]
fn append_after_an_array_element() {
    let mut d = doc(r#"{"a":[1,3]}"#);
    let tpl = d.graft(b"2").unwrap();
    Query::parse("a[0]").unwrap().append(&mut d, tpl);
    d.flush_subtree(tpl);
    assert_eq!(serialize(&d), r#"{"a":[1,2,3]}"#);
}

#[test]
fn append_a_member_into_an_object() {
    let mut d = doc(r#"{"a":1}"#);
    let tpl = d.graft_member("b", b"[2]").unwrap();
    Query::parse("a").unwrap().append(&mut d, tpl);
    d.flush_subtree(tpl);
    assert_eq!(serialize(&d), r#"{"a":1,"b":[2]}"#);
}

#[test]
fn append_into_an_empty_container() {
    let mut d = doc(r#"{"a":[]}"#);
    let tpl = d.graft(b"1").unwrap();
    Query::parse("a[0]").unwrap().append(&mut d, tpl);
    d.flush_subtree(tpl);
    assert_eq!(serialize(&d), r#"{"a":[1]}"#);

    let mut d = doc(r#"{"o":{}}"#);
    let tpl = d.graft_member("k", b"true").unwrap();
    Query::parse("o.k").unwrap().append(&mut d, tpl);
    d.flush_subtree(tpl);
    assert_eq!(serialize(&d), r#"{"o":{"k":true}}"#);
}

#[test]
fn insert_goes_before_the_match() {
    let mut d = doc(r#"[2,3]"#);
    let tpl = d.graft(b"1").unwrap();
    Query::parse("[0]").unwrap().insert(&mut d, tpl);
    d.flush_subtree(tpl);
    assert_eq!(serialize(&d), r#"[1,2,3]"#);
}

#[test]
fn insert_with_wildcard_hits_every_match() {
    let mut d = doc(r#"[1,2]"#);
    let tpl = d.graft(b"0").unwrap();
    Query::parse("[*]").unwrap().insert(&mut d, tpl);
    d.flush_subtree(tpl);
    assert_eq!(serialize(&d), r#"[0,1,0,2]"#);
}

#[test]
fn update_replaces_and_keeps_the_label() {
    let mut d = doc(r#"{"a":1,"b":2}"#);
    let tpl = d.graft(br#"[9]"#).unwrap();
    Query::parse("b").unwrap().update(&mut d, tpl);
    d.flush_subtree(tpl);
    assert_eq!(serialize(&d), r#"{"a":1,"b":[9]}"#);
}

#[test]
fn delete_an_element_and_a_member() {
    let mut d = doc(r#"{"a":[1,2,3],"b":4}"#);
    Query::parse("a[1]").unwrap().delete(&mut d);
    assert_eq!(serialize(&d), r#"{"a":[1,3],"b":4}"#);

    Query::parse("b").unwrap().delete(&mut d);
    assert_eq!(serialize(&d), r#"{"a":[1,3]}"#);
}

#[test]
fn delete_with_wildcard_empties_the_array() {
    let mut d = doc(r#"{"a":[1,2,3]}"#);
    let live = d.live_nodes();
    Query::parse("a[*]").unwrap().delete(&mut d);
    assert_eq!(serialize(&d), r#"{"a":[]}"#);
    assert_eq!(d.live_nodes(), live - 3);
}

#[test]
fn delete_the_first_member() {
    let mut d = doc(r#"{"a":1,"b":2}"#);
    Query::parse("a").unwrap().delete(&mut d);
    assert_eq!(serialize(&d), r#"{"b":2}"#);
}

#[test]
fn labeled_template_outside_an_object_is_a_no_op() {
    let mut d = doc(r#"[1,2]"#);
    let tpl = d.graft_member("x", b"9").unwrap();
    Query::parse("[0]").unwrap().append(&mut d, tpl);
    d.flush_subtree(tpl);
    assert_eq!(serialize(&d), r#"[1,2]"#);
}

#[test]
fn unlabeled_template_into_an_object_is_a_no_op() {
    let mut d = doc(r#"{"a":1}"#);
    let tpl = d.graft(b"9").unwrap();
    Query::parse("a").unwrap().append(&mut d, tpl);
    d.flush_subtree(tpl);
    assert_eq!(serialize(&d), r#"{"a":1}"#);
}

#[test]
fn unlabeled_update_inside_an_object_is_allowed() {
    let mut d = doc(r#"{"a":1}"#);
    let tpl = d.graft(b"9").unwrap();
    Query::parse("a").unwrap().update(&mut d, tpl);
    d.flush_subtree(tpl);
    assert_eq!(serialize(&d), r#"{"a":9}"#);
}

#[test]
fn kind_mismatch_mutations_do_nothing() {
    let mut d = doc(r#"{"a":[1]}"#);
    // Index step against the object root.
    Query::parse("[0]").unwrap().delete(&mut d);
    // Label step against the array.
    Query::parse("a.b").unwrap().delete(&mut d);
    assert_eq!(serialize(&d), r#"{"a":[1]}"#);
}

#[test]
fn from_steps_round_trips() {
    let q = Query::parse("a[2].*").unwrap();
    let rebuilt = Query::from_steps(q.steps().to_vec());
    assert_eq!(q, rebuilt);
    assert!(rebuilt.has_wildcard());
    assert_eq!(
        rebuilt.steps(),
        &[Step::Label("a".into()), Step::Index(2), Step::AnyLabel]
    );
}

#[test]
fn deep_edit_through_two_wildcards() {
    let mut d = doc(r#"{"u":{"n":[1]},"v":{"n":[2]}}"#);
    let tpl = d.graft(b"0").unwrap();
    Query::parse("*.n[0]").unwrap().append(&mut d, tpl);
    d.flush_subtree(tpl);
    assert_eq!(serialize(&d), r#"{"u":{"n":[1,0]},"v":{"n":[2,0]}}"#);
}
