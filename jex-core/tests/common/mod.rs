//! Shared helpers for the integration tests.

use jex_core::{Document, Event, EventKind};

/// Render a document back to compact JSON text by replaying its walk.
pub fn serialize(doc: &Document) -> String {
    let root = match doc.root() {
        Some(r) => r,
        None => return String::new(),
    };
    let mut out = String::new();
    doc.walk(root.id(), &mut |ev: Event<'_>| {
        if ev.rank > 0 && !ev.is_close() {
            out.push(',');
        }
        match ev.kind {
            EventKind::NewArray => out.push('['),
            EventKind::EndArray => out.push(']'),
            EventKind::NewObject => out.push('{'),
            EventKind::EndObject => out.push('}'),
            EventKind::Label(l) => {
                out.push('"');
                out.push_str(&String::from_utf8_lossy(l));
                out.push_str("\":");
            }
            EventKind::Str(s) => {
                out.push('"');
                out.push_str(&String::from_utf8_lossy(s));
                out.push('"');
            }
            EventKind::Number(v) => {
                if v == (v as i64) as f64 {
                    out.push_str(&format!("{}", v as i64));
                } else {
                    out.push_str(&format!("{}", v));
                }
            }
            EventKind::Sym(s) => out.push_str(s.token()),
        }
        Ok(())
    })
    .unwrap();
    out
}

/// Parse or panic, for tests that assume valid input.
pub fn doc(text: &str) -> Document {
    Document::parse(text.as_bytes()).unwrap()
}
