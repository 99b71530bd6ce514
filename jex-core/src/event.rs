//! Structural events - the shared protocol of the parser and the walker.
//!
//! This is a SAX-style model: events are emitted in document order with no
//! accumulation, and structure is represented by paired open/close events.
//!
//! ## Rank and depth
//!
//! Every event carries the 0-based position of its value among its
//! siblings (`rank`) and the nesting depth. An object member emits a
//! `Label` event carrying the member's rank, and the value event that
//! follows always reports rank 0. Array elements report their index as
//! rank. This convention lets a stateless consumer tell object members
//! from array elements without tracking containers.
//!
//! `{"a":[1,true]}` emits:
//! ```text
//! NewObject            rank 0, depth 0
//! Label("a")           rank 0, depth 1
//! NewArray             rank 0, depth 1
//! Number(1.0)          rank 0, depth 2
//! Sym(True)            rank 1, depth 2
//! EndArray             rank 0, depth 1
//! EndObject            rank 0, depth 0
//! ```

/// The three keyword values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    True,
    False,
    Null,
}

impl Symbol {
    /// The canonical lower-case token for this symbol.
    pub fn token(self) -> &'static str {
        match self {
            Symbol::True => "true",
            Symbol::False => "false",
            Symbol::Null => "null",
        }
    }
}

/// What an event reports.
///
/// The lifetime `'a` refers to the source buffer - label and string
/// payloads are zero-copy slices of the original input (or of arena
/// storage when re-emitted by the tree walker). String bytes are verbatim:
/// escape sequences are not decoded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventKind<'a> {
    NewArray,
    EndArray,
    NewObject,
    EndObject,
    /// Object member key; the member's value event follows immediately.
    Label(&'a [u8]),
    Number(f64),
    Str(&'a [u8]),
    Sym(Symbol),
}

/// One parser or walker event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event<'a> {
    pub kind: EventKind<'a>,
    /// 0-based position among siblings (0 for a value following a label).
    pub rank: u32,
    /// Nesting depth; the top-level value is depth 0.
    pub depth: u32,
}

impl<'a> Event<'a> {
    pub fn new(kind: EventKind<'a>, rank: u32, depth: u32) -> Self {
        Event { kind, rank, depth }
    }

    /// Check if this event opens a container.
    pub fn is_open(&self) -> bool {
        matches!(self.kind, EventKind::NewArray | EventKind::NewObject)
    }

    /// Check if this event closes a container.
    pub fn is_close(&self) -> bool {
        matches!(self.kind, EventKind::EndArray | EventKind::EndObject)
    }
}
