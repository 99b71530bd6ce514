//! Assembles parser events into a resident tree.
//!
//! [`TreeSink`] tracks an explicit container stack plus the previous event,
//! which is enough to decide for each incoming value whether it becomes the
//! first child of the container on top of the stack, fills in a node that a
//! label event already created, or chains on as the next sibling.

use crate::arena::{NodeId, Payload};
use crate::event::{Event, EventKind};
use crate::parser::ParseError;
use crate::tree::Document;
use crate::MAX_DEPTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prev {
    None,
    NewArray,
    NewObject,
    Other,
}

/// Event sink that grows a subtree inside a [`Document`]'s arena.
///
/// The built subtree is detached: [`finish`](TreeSink::finish) hands back its
/// root and the caller decides where it goes.
pub struct TreeSink<'d> {
    doc: &'d mut Document,
    stack: Vec<NodeId>,
    prev: Prev,
    root: Option<NodeId>,
}

impl<'d> TreeSink<'d> {
    pub fn new(doc: &'d mut Document) -> Self {
        TreeSink {
            doc,
            stack: Vec::new(),
            prev: Prev::None,
            root: None,
        }
    }

    /// Consume one event.
    pub fn handle(&mut self, ev: Event<'_>) -> Result<(), ParseError> {
        match ev.kind {
            EventKind::EndArray | EventKind::EndObject => {
                // An End right after the matching New closes an empty
                // container; the container itself stays on duty as the
                // attachment point, so nothing pops.
                let empty = matches!(
                    (ev.kind, self.prev),
                    (EventKind::EndArray, Prev::NewArray)
                        | (EventKind::EndObject, Prev::NewObject)
                );
                if !empty {
                    self.stack.pop();
                }
                self.prev = Prev::Other;
                return Ok(());
            }
            _ => {}
        }

        let node = match self.stack.last().copied() {
            None => {
                // First event of the stream roots the subtree.
                let n = self.doc.arena.alloc_node();
                self.root = Some(n);
                self.stack.push(n);
                n
            }
            Some(tos) => {
                let tos_node = *self.doc.arena.node(tos);
                if tos_node.payload.is_container()
                    && matches!(self.prev, Prev::NewArray | Prev::NewObject)
                {
                    // First child of a freshly opened container. The fixed
                    // walk stacks traverse at most MAX_DEPTH - 1 levels, so
                    // building stops one short of MAX_DEPTH.
                    if self.stack.len() == MAX_DEPTH - 1 {
                        return Err(ParseError::DepthExceeded);
                    }
                    let n = self.doc.arena.alloc_node();
                    self.doc.arena.node_mut(tos).payload.set_child(Some(n));
                    self.stack.push(n);
                    n
                } else if tos_node.label.is_some()
                    && matches!(tos_node.payload, Payload::Empty)
                {
                    // Value for the member the label event created.
                    tos
                } else {
                    // Next sibling; it replaces its predecessor on the stack.
                    let n = self.doc.arena.alloc_node();
                    self.doc.arena.node_mut(tos).next = Some(n);
                    let top = self.stack.len() - 1;
                    self.stack[top] = n;
                    n
                }
            }
        };

        self.fill(node, ev)?;
        self.prev = Self::prev_of(ev.kind);
        Ok(())
    }

    fn fill(&mut self, node: NodeId, ev: Event<'_>) -> Result<(), ParseError> {
        match ev.kind {
            EventKind::Label(l) => {
                let r = self.doc.arena.alloc_str(l).ok_or(ParseError::OutOfSpace)?;
                self.doc.arena.node_mut(node).label = Some(r);
            }
            EventKind::Str(s) => {
                let r = self.doc.arena.alloc_str(s).ok_or(ParseError::OutOfSpace)?;
                self.doc.arena.node_mut(node).payload = Payload::Str(r);
            }
            EventKind::Number(v) => {
                self.doc.arena.node_mut(node).payload = Payload::Number(v);
            }
            EventKind::Sym(s) => {
                self.doc.arena.node_mut(node).payload = Payload::Sym(s);
            }
            EventKind::NewArray => {
                self.doc.arena.node_mut(node).payload = Payload::Array(None);
            }
            EventKind::NewObject => {
                self.doc.arena.node_mut(node).payload = Payload::Object(None);
            }
            EventKind::EndArray | EventKind::EndObject => {}
        }
        Ok(())
    }

    fn prev_of(kind: EventKind<'_>) -> Prev {
        match kind {
            EventKind::NewArray => Prev::NewArray,
            EventKind::NewObject => Prev::NewObject,
            _ => Prev::Other,
        }
    }

    /// Root of the built subtree, if any events arrived.
    pub fn finish(self) -> Option<NodeId> {
        self.root
    }
}
