//! jex - embeddable JSON engine.
//!
//! Parses JSON into a stream of structural events, optionally assembles the
//! events into a mutable arena-backed document tree, and supports dotted
//! path queries (`a.b[2].c`, with `*` wildcards) for partial reads and
//! writes of the resident tree.
//!
//! # Architecture
//!
//! - **arena.rs** - node blocks, string pools, free-list recycling
//! - **event.rs** - structural event protocol shared by parser and walker
//! - **parser.rs** - streaming recursive-descent parser, zero-copy events
//! - **builder.rs** - event consumer that assembles the resident tree
//! - **tree.rs** - Document navigation, walk, flush, clone, compaction
//! - **query.rs** - path compiler and retrieve/append/insert/update/delete
//! - **value.rs** - single-scalar get/set/clear convenience layer

pub mod arena;
pub mod builder;
pub mod event;
pub mod parser;
pub mod query;
pub mod tree;
pub mod value;

pub use arena::{Arena, NodeId, Payload, StrRef};
pub use builder::TreeSink;
pub use event::{Event, EventKind, Symbol};
pub use parser::{ParseError, Parser};
pub use query::{Query, Step};
pub use tree::{Document, NodeRef};
pub use value::{AccessError, Fetched, ValueKind};

/// Longest accepted string, number, label, or query path, in bytes.
pub const MAX_LEN: usize = 8192;

/// Maximum nesting depth for resident trees and compiled queries.
pub const MAX_DEPTH: usize = 64;
