//! Streaming JSON parser.
//!
//! Recursive descent over a borrowed byte buffer, emitting [`Event`]s into a
//! caller-supplied sink. Nothing is buffered: string and label payloads are
//! slices of the input, escapes left undecoded. One call to [`Parser::parse`]
//! consumes exactly one top-level value; call it again to read the next value
//! from the same buffer.

use crate::event::{Event, EventKind, Symbol};
use crate::MAX_LEN;

use memchr::memchr2;
use phf::phf_map;

// ============================================================================
// Errors
// ============================================================================

/// Everything that can go wrong while parsing or building a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// A string, label, or number longer than the engine accepts.
    TooLong,
    UnterminatedString,
    UnterminatedArray,
    UnterminatedObject,
    /// A keyword that is not `true`, `false`, or `null`.
    BadSymbol,
    /// A value was required and something else was found.
    ExpectedValue,
    ExpectedArrayComma,
    ExpectedObjectComma,
    ExpectedColon,
    /// Nesting beyond the resident tree's fixed depth.
    DepthExceeded,
    /// String pool storage refused an allocation.
    OutOfSpace,
}

impl ParseError {
    pub fn message(&self) -> &'static str {
        match self {
            ParseError::TooLong => "token too long",
            ParseError::UnterminatedString => "unterminated string",
            ParseError::UnterminatedArray => "unterminated array",
            ParseError::UnterminatedObject => "unterminated object",
            ParseError::BadSymbol => "unknown symbol",
            ParseError::ExpectedValue => "expected a value",
            ParseError::ExpectedArrayComma => "expected ',' or ']'",
            ParseError::ExpectedObjectComma => "expected ',' or '}'",
            ParseError::ExpectedColon => "expected ':'",
            ParseError::DepthExceeded => "nesting too deep",
            ParseError::OutOfSpace => "out of string space",
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ParseError {}

// ============================================================================
// Keywords
// ============================================================================

static KEYWORDS: phf::Map<&'static str, Symbol> = phf_map! {
    "true" => Symbol::True,
    "false" => Symbol::False,
    "null" => Symbol::Null,
};

// ============================================================================
// Parser
// ============================================================================

/// Streaming parser over a borrowed buffer.
///
/// ```
/// use jex_core::{Event, EventKind, Parser};
///
/// let mut p = Parser::new(b"[1, 2]");
/// let mut ranks = Vec::new();
/// p.parse(&mut |ev: Event<'_>| {
///     if let EventKind::Number(_) = ev.kind {
///         ranks.push(ev.rank);
///     }
///     Ok(())
/// })
/// .unwrap();
/// assert_eq!(ranks, vec![0, 1]);
/// ```
pub struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Parser { input, pos: 0 }
    }

    /// Current offset into the buffer.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Parse one top-level value, feeding events to `sink`.
    ///
    /// Returns the number of bytes consumed so far. A sink error aborts the
    /// parse and is returned unchanged.
    pub fn parse<F>(&mut self, sink: &mut F) -> Result<usize, ParseError>
    where
        F: FnMut(Event<'a>) -> Result<(), ParseError>,
    {
        self.skip_ws();
        self.value(sink, 0, 0)?;
        self.skip_ws();
        Ok(self.pos)
    }

    fn skip_ws(&mut self) {
        while let Some(&c) = self.input.get(self.pos) {
            match c {
                b' ' | b'\t' | b'\r' | b'\n' => self.pos += 1,
                _ => break,
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Dispatch on the first byte of a value.
    fn value<F>(&mut self, sink: &mut F, rank: u32, depth: u32) -> Result<(), ParseError>
    where
        F: FnMut(Event<'a>) -> Result<(), ParseError>,
    {
        self.skip_ws();
        match self.peek() {
            Some(b'"') => {
                let s = self.string()?;
                sink(Event::new(EventKind::Str(s), rank, depth))
            }
            Some(b'-') => {
                let v = self.number()?;
                sink(Event::new(EventKind::Number(v), rank, depth))
            }
            Some(c) if c.is_ascii_digit() => {
                let v = self.number()?;
                sink(Event::new(EventKind::Number(v), rank, depth))
            }
            Some(b'[') => self.array(sink, rank, depth),
            Some(b'{') => self.object(sink, rank, depth),
            Some(c) if c.is_ascii_alphabetic() => {
                let s = self.symbol()?;
                sink(Event::new(EventKind::Sym(s), rank, depth))
            }
            _ => Err(ParseError::ExpectedValue),
        }
    }

    /// Scan a quoted string, returning its contents verbatim.
    ///
    /// An escaped pair never terminates the scan, so `\"` stays inside the
    /// string; no unescaping happens here.
    fn string(&mut self) -> Result<&'a [u8], ParseError> {
        debug_assert_eq!(self.peek(), Some(b'"'));
        let start = self.pos + 1;
        let mut i = start;
        loop {
            if i > self.input.len() {
                return Err(ParseError::UnterminatedString);
            }
            match memchr2(b'"', b'\\', &self.input[i..]) {
                Some(off) => {
                    let at = i + off;
                    if self.input[at] == b'"' {
                        if at - start >= MAX_LEN {
                            return Err(ParseError::TooLong);
                        }
                        self.pos = at + 1;
                        return Ok(&self.input[start..at]);
                    }
                    // Backslash: skip it and the byte it escapes.
                    i = at + 2;
                }
                None => return Err(ParseError::UnterminatedString),
            }
        }
    }

    fn number(&mut self) -> Result<f64, ParseError> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.peek() == Some(b'.') {
            self.pos += 1;
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        // An exponent marker only counts when digits follow it.
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            let mark = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                self.pos += 1;
            }
            if matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.pos += 1;
                }
            } else {
                self.pos = mark;
            }
        }
        let text = &self.input[start..self.pos];
        if text.len() >= MAX_LEN {
            return Err(ParseError::TooLong);
        }
        // The scan admits only [-0-9.eE+] so this is always valid UTF-8.
        let s = std::str::from_utf8(text).map_err(|_| ParseError::ExpectedValue)?;
        Ok(s.parse::<f64>().unwrap_or(0.0))
    }

    /// Read a keyword. The first letter fixes the length, the lookup is
    /// case-insensitive.
    fn symbol(&mut self) -> Result<Symbol, ParseError> {
        let len = match self.peek().map(|c| c.to_ascii_lowercase()) {
            Some(b't') | Some(b'n') => 4,
            Some(b'f') => 5,
            _ => return Err(ParseError::BadSymbol),
        };
        if self.pos + len > self.input.len() {
            return Err(ParseError::BadSymbol);
        }
        let mut buf = [0u8; 5];
        for (i, b) in self.input[self.pos..self.pos + len].iter().enumerate() {
            buf[i] = b.to_ascii_lowercase();
        }
        let word = std::str::from_utf8(&buf[..len]).map_err(|_| ParseError::BadSymbol)?;
        match KEYWORDS.get(word) {
            Some(&sym) => {
                self.pos += len;
                Ok(sym)
            }
            None => Err(ParseError::BadSymbol),
        }
    }

    fn array<F>(&mut self, sink: &mut F, rank: u32, depth: u32) -> Result<(), ParseError>
    where
        F: FnMut(Event<'a>) -> Result<(), ParseError>,
    {
        debug_assert_eq!(self.peek(), Some(b'['));
        self.pos += 1;
        self.skip_ws();
        if self.peek() == Some(b']') {
            self.pos += 1;
            sink(Event::new(EventKind::NewArray, rank, depth))?;
            return sink(Event::new(EventKind::EndArray, rank, depth));
        }
        sink(Event::new(EventKind::NewArray, rank, depth))?;
        let mut i = 0u32;
        loop {
            self.value(sink, i, depth + 1)?;
            i += 1;
            self.skip_ws();
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                }
                Some(b']') => {
                    self.pos += 1;
                    return sink(Event::new(EventKind::EndArray, rank, depth));
                }
                Some(_) => return Err(ParseError::ExpectedArrayComma),
                None => return Err(ParseError::UnterminatedArray),
            }
        }
    }

    fn object<F>(&mut self, sink: &mut F, rank: u32, depth: u32) -> Result<(), ParseError>
    where
        F: FnMut(Event<'a>) -> Result<(), ParseError>,
    {
        debug_assert_eq!(self.peek(), Some(b'{'));
        self.pos += 1;
        self.skip_ws();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            sink(Event::new(EventKind::NewObject, rank, depth))?;
            return sink(Event::new(EventKind::EndObject, rank, depth));
        }
        sink(Event::new(EventKind::NewObject, rank, depth))?;
        let mut i = 0u32;
        loop {
            self.skip_ws();
            if self.peek() != Some(b'"') {
                return Err(ParseError::ExpectedValue);
            }
            let label = self.string()?;
            self.skip_ws();
            if self.peek() != Some(b':') {
                return Err(ParseError::ExpectedColon);
            }
            self.pos += 1;
            sink(Event::new(EventKind::Label(label), i, depth + 1))?;
            self.value(sink, 0, depth + 1)?;
            i += 1;
            self.skip_ws();
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                }
                Some(b'}') => {
                    self.pos += 1;
                    return sink(Event::new(EventKind::EndObject, rank, depth));
                }
                Some(_) => return Err(ParseError::ExpectedObjectComma),
                None => return Err(ParseError::UnterminatedObject),
            }
        }
    }
}
