//! Randomized properties over parsing, documents, and queries.

mod common;

use common::{doc, serialize};
use jex_core::{Document, Event, EventKind, Parser, Query};
use proptest::prelude::*;

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 100,
        ..Default::default()
    }
}

/// Compact JSON text in exactly the form the walk serializer emits, so
/// round trips can compare strings directly.
fn canonical_json() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        Just("true".to_string()),
        Just("false".to_string()),
        Just("null".to_string()),
        (-1000i64..1000).prop_map(|n| n.to_string()),
        "[a-z]{0,8}".prop_map(|s| format!("\"{}\"", s)),
    ];
    leaf.prop_recursive(4, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6)
                .prop_map(|vals| format!("[{}]", vals.join(","))),
            prop::collection::vec(("[a-z]{1,6}", inner), 0..6).prop_map(|members| {
                let parts: Vec<String> = members
                    .into_iter()
                    .map(|(k, v)| format!("\"{}\":{}", k, v))
                    .collect();
                format!("{{{}}}", parts.join(","))
            }),
        ]
    })
}

proptest! {
    #![proptest_config(config())]

    #[test]
    fn parse_serialize_round_trip(text in canonical_json()) {
        let d = doc(&text);
        prop_assert_eq!(serialize(&d), text);
    }

    #[test]
    fn parser_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let mut p = Parser::new(&bytes);
        let _ = p.parse(&mut |_ev: Event<'_>| Ok(()));
    }

    #[test]
    fn open_close_events_balance(text in canonical_json()) {
        let mut depth = 0i64;
        let mut p = Parser::new(text.as_bytes());
        p.parse(&mut |ev: Event<'_>| {
            if ev.is_open() {
                depth += 1;
            } else if ev.is_close() {
                depth -= 1;
            }
            assert!(depth >= 0);
            Ok(())
        })
        .unwrap();
        prop_assert_eq!(depth, 0);
    }

    #[test]
    fn walk_matches_the_parser_stream(text in canonical_json()) {
        fn flat(ev: Event<'_>) -> (String, u32, u32) {
            let tok = match ev.kind {
                EventKind::NewArray => "[".to_string(),
                EventKind::EndArray => "]".to_string(),
                EventKind::NewObject => "{".to_string(),
                EventKind::EndObject => "}".to_string(),
                EventKind::Label(l) => format!("@{}", String::from_utf8_lossy(l)),
                EventKind::Number(v) => format!("#{}", v),
                EventKind::Str(s) => format!("${}", String::from_utf8_lossy(s)),
                EventKind::Sym(s) => s.token().to_string(),
            };
            (tok, ev.rank, ev.depth)
        }

        let mut parsed = Vec::new();
        Parser::new(text.as_bytes())
            .parse(&mut |ev: Event<'_>| {
                parsed.push(flat(ev));
                Ok(())
            })
            .unwrap();

        let d = doc(&text);
        let mut walked = Vec::new();
        d.walk(d.root().unwrap().id(), &mut |ev: Event<'_>| {
            walked.push(flat(ev));
            Ok(())
        })
        .unwrap();

        prop_assert_eq!(walked, parsed);
    }

    #[test]
    fn compact_is_lossless(text in canonical_json()) {
        let d = doc(&text);
        let k = d.compact().unwrap();
        prop_assert_eq!(serialize(&k), serialize(&d));
    }

    #[test]
    fn clear_frees_every_node(text in canonical_json()) {
        let mut d = doc(&text);
        prop_assert!(d.live_nodes() > 0);
        d.clear();
        prop_assert_eq!(d.live_nodes(), 0);
    }

    #[test]
    fn same_arena_clone_doubles_the_nodes(text in canonical_json()) {
        let mut d = doc(&text);
        let live = d.live_nodes();
        let root = d.root().unwrap().id();
        let copy = d.clone_subtree(root, None).unwrap();
        prop_assert_eq!(d.live_nodes(), live * 2);
        prop_assert_eq!(d.subtree_size(copy), live);
    }

    #[test]
    fn query_compile_never_panics(path in "\\PC{0,64}") {
        let _ = Query::parse(&path);
    }

    #[test]
    fn set_then_get_returns_the_literal(
        segments in prop::collection::vec("[a-z]{1,5}", 1..4),
        literal in "[a-z ]{1,8}".prop_filter("stays a string", |s| {
            s.parse::<f64>().is_err()
        }),
    ) {
        let mut d = Document::new();
        let path = segments.join(".");
        d.set_value(&path, &literal).unwrap();
        let got = d.get_value(&path).unwrap();
        prop_assert_eq!(got.text, literal);
    }

    #[test]
    fn set_then_clear_leaves_an_empty_root(
        segments in prop::collection::vec("[a-z]{1,5}", 1..4),
    ) {
        let mut d = Document::new();
        let path = segments.join(".");
        d.set_value(&path, "v").unwrap();
        d.clear_value(&path).unwrap();
        prop_assert_eq!(serialize(&d), "{}");
        prop_assert!(d.get_value(&path).is_err());
    }
}
