//! End-to-end checks of the event stream contract.

use jex_core::{Event, EventKind, ParseError, Parser, Symbol};
use pretty_assertions::assert_eq;

fn collect(text: &str) -> Result<Vec<(String, u32, u32)>, ParseError> {
    let mut out = Vec::new();
    let mut p = Parser::new(text.as_bytes());
    p.parse(&mut |ev: Event<'_>| {
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
        out.push((tok, ev.rank, ev.depth));
        Ok(())
    })?;
    Ok(out)
}

#[test]
fn nested_document_stream() {
    let got = collect(r#"{"a": 1, "b": [true, {"c": "x"}], "d": null}"#).unwrap();
    let want: Vec<(String, u32, u32)> = vec![
        ("{".into(), 0, 0),
        ("@a".into(), 0, 1),
        ("#1".into(), 0, 1),
        ("@b".into(), 1, 1),
        ("[".into(), 0, 1),
        ("true".into(), 0, 2),
        ("{".into(), 1, 2),
        ("@c".into(), 0, 3),
        ("$x".into(), 0, 3),
        ("}".into(), 1, 2),
        ("@d".into(), 2, 1),
        ("null".into(), 0, 1),
        ("}".into(), 0, 0),
    ];
    assert_eq!(got, want);
}

#[test]
fn whitespace_is_space_tab_cr_lf() {
    let got = collect("\t\r\n [ 1 ,\n2 ] ").unwrap();
    assert_eq!(got.len(), 4);
    assert_eq!(got[1].0, "#1");
    assert_eq!(got[2].0, "#2");
}

#[test]
fn empty_containers_nested() {
    let got = collect(r#"{"a":[],"b":{}}"#).unwrap();
    let want: Vec<(String, u32, u32)> = vec![
        ("{".into(), 0, 0),
        ("@a".into(), 0, 1),
        ("[".into(), 0, 1),
        ("]".into(), 0, 1),
        ("@b".into(), 1, 1),
        ("{".into(), 0, 1),
        ("}".into(), 0, 1),
        ("}".into(), 0, 0),
    ];
    assert_eq!(got, want);
}

#[test]
fn symbols_any_case() {
    assert_eq!(collect("TRUE").unwrap()[0].0, "true");
    assert_eq!(collect("nULL").unwrap()[0].0, "null");
    assert_eq!(collect("False").unwrap()[0].0, "false");
}

#[test]
fn strings_stay_escaped() {
    let got = collect(r#""say \"hi\" \\ there""#).unwrap();
    assert_eq!(got[0].0, r#"$say \"hi\" \\ there"#);
}

#[test]
fn error_catalogue() {
    let cases: Vec<(&str, ParseError)> = vec![
        ("", ParseError::ExpectedValue),
        ("   ", ParseError::ExpectedValue),
        (":", ParseError::ExpectedValue),
        ("\"open", ParseError::UnterminatedString),
        ("[1,2", ParseError::UnterminatedArray),
        ("[1 2]", ParseError::ExpectedArrayComma),
        (r#"{"a":1"#, ParseError::UnterminatedObject),
        (r#"{"a":1 "b":2}"#, ParseError::ExpectedObjectComma),
        (r#"{"a" 1}"#, ParseError::ExpectedColon),
        (r#"{true:1}"#, ParseError::ExpectedValue),
        ("frue", ParseError::BadSymbol),
        ("nuke", ParseError::BadSymbol),
    ];
    for (text, want) in cases {
        assert_eq!(collect(text), Err(want), "input: {:?}", text);
    }
}

#[test]
fn bad_symbol_error_message() {
    assert_eq!(ParseError::BadSymbol.message(), "unknown symbol");
    assert_eq!(format!("{}", ParseError::ExpectedColon), "expected ':'");
}

#[test]
fn one_value_per_call() {
    let mut p = Parser::new(br#" {"a":1} [2] "#);
    let opens = std::cell::Cell::new(0);
    let mut sink = |ev: Event<'_>| {
        if ev.is_open() {
            opens.set(opens.get() + 1);
        }
        Ok(())
    };
    p.parse(&mut sink).unwrap();
    assert_eq!(opens.get(), 1);
    p.parse(&mut sink).unwrap();
    assert_eq!(opens.get(), 2);
    // Nothing left but whitespace.
    assert_eq!(p.parse(&mut sink), Err(ParseError::ExpectedValue));
}

#[test]
fn numbers_with_exponents_and_signs() {
    let texts = [
        ("0", 0.0),
        ("-7", -7.0),
        ("3.25", 3.25),
        ("1e2", 100.0),
        ("1E+2", 100.0),
        ("25e-2", 0.25),
    ];
    for (text, want) in texts {
        let mut got = None;
        Parser::new(text.as_bytes())
            .parse(&mut |ev: Event<'_>| {
                if let EventKind::Number(v) = ev.kind {
                    got = Some(v);
                }
                Ok(())
            })
            .unwrap();
        assert_eq!(got, Some(want), "input: {}", text);
    }
}

#[test]
fn symbol_payloads() {
    let mut syms = Vec::new();
    Parser::new(b"[true,false,null]")
        .parse(&mut |ev: Event<'_>| {
            if let EventKind::Sym(s) = ev.kind {
                syms.push(s);
            }
            Ok(())
        })
        .unwrap();
    assert_eq!(syms, vec![Symbol::True, Symbol::False, Symbol::Null]);
}
