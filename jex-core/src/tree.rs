//! The resident document tree.
//!
//! A [`Document`] owns an [`Arena`] and the root of the tree built inside
//! it. Traversal (walk, flush, clone) uses explicit fixed-size work stacks
//! rather than recursion, so tree depth can never overflow the call stack.
//!
//! [`NodeRef`] is a cheap borrowing handle for reading and navigating
//! without touching raw node ids.

use crate::arena::{Arena, Node, NodeId, Payload};
use crate::builder::TreeSink;
use crate::event::{Event, EventKind, Symbol};
use crate::parser::{ParseError, Parser};
use crate::MAX_DEPTH;

/// A parsed JSON document: arena storage plus the tree root.
///
/// An empty document (no root) is valid; flushing the root returns the
/// document to that state.
#[derive(Debug)]
pub struct Document {
    pub(crate) arena: Arena,
    pub(crate) root: Option<NodeId>,
}

impl Document {
    pub fn new() -> Self {
        Document {
            arena: Arena::new(),
            root: None,
        }
    }

    /// Parse one JSON value into a fresh document.
    pub fn parse(text: &[u8]) -> Result<Document, ParseError> {
        let mut doc = Document::new();
        let n = doc.graft(text)?;
        doc.root = Some(n);
        Ok(doc)
    }

    /// Parse one JSON value into this document's arena as a detached
    /// subtree, returning its root. The document root is not changed.
    ///
    /// A parse error flushes whatever was built before returning it.
    pub fn graft(&mut self, text: &[u8]) -> Result<NodeId, ParseError> {
        let mut parser = Parser::new(text);
        let mut sink = TreeSink::new(self);
        let outcome = parser.parse(&mut |ev| sink.handle(ev));
        let built = sink.finish();
        if let Err(e) = outcome {
            if let Some(n) = built {
                self.flush_subtree(n);
            }
            return Err(e);
        }
        built.ok_or(ParseError::ExpectedValue)
    }

    /// [`graft`](Document::graft), then attach `label` to the subtree root
    /// so it can serve as an object member.
    pub fn graft_member(&mut self, label: &str, text: &[u8]) -> Result<NodeId, ParseError> {
        let n = self.graft(text)?;
        match self.arena.alloc_str(label.as_bytes()) {
            Some(r) => {
                self.arena.node_mut(n).label = Some(r);
                Ok(n)
            }
            None => {
                self.flush_subtree(n);
                Err(ParseError::OutOfSpace)
            }
        }
    }

    /// Handle to the document root.
    pub fn root(&self) -> Option<NodeRef<'_>> {
        self.root.map(|id| self.node_ref(id))
    }

    pub fn node_ref(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { doc: self, id }
    }

    /// Nodes currently allocated across the whole document.
    pub fn live_nodes(&self) -> usize {
        self.arena.live_nodes()
    }

    /// String-pool bytes currently spoken for, retired pools included.
    pub fn pool_bytes_used(&self) -> usize {
        self.arena.active_pool_used().iter().sum::<usize>()
            + self.arena.retired_pool_used().iter().sum::<usize>()
    }

    /// Count the nodes of the subtree rooted at `n` (`n` itself included,
    /// its siblings excluded).
    pub fn subtree_size(&self, n: NodeId) -> usize {
        let mut count = 1usize;
        let mut stack = Vec::new();
        if let Some(c) = self.arena.node(n).payload.child() {
            stack.push(c);
        }
        while let Some(id) = stack.pop() {
            count += 1;
            let node = self.arena.node(id);
            if let Some(nx) = node.next {
                stack.push(nx);
            }
            if let Some(c) = node.payload.child() {
                stack.push(c);
            }
        }
        count
    }

    /// Re-emit the subtree rooted at `n` as the event stream that would
    /// have built it. Sibling links of `n` itself are not followed.
    ///
    /// The rank/depth convention matches the parser: labels carry the
    /// member's rank and the value after a label reports rank 0.
    pub fn walk<F>(&self, n: NodeId, sink: &mut F) -> Result<(), ParseError>
    where
        F: FnMut(Event<'_>) -> Result<(), ParseError>,
    {
        let mut stack = [(n, 0u32); MAX_DEPTH];
        let mut top: i32 = 0;
        let mut state = 0u8;
        let mut cur = n;

        loop {
            // Visit: emit this node, then descend into a first child.
            if state == 0 {
                let node = *self.arena.node(cur);
                let depth = top as u32;
                let mut r = stack[top as usize].1;
                if let Some(l) = node.label {
                    sink(Event::new(
                        EventKind::Label(self.arena.str_bytes(l)),
                        r,
                        depth,
                    ))?;
                    r = 0;
                }
                match node.payload {
                    Payload::Number(v) => {
                        sink(Event::new(EventKind::Number(v), r, depth))?;
                        state = 1;
                    }
                    Payload::Str(sr) => {
                        sink(Event::new(
                            EventKind::Str(self.arena.str_bytes(sr)),
                            r,
                            depth,
                        ))?;
                        state = 1;
                    }
                    Payload::Sym(sym) => {
                        sink(Event::new(EventKind::Sym(sym), r, depth))?;
                        state = 1;
                    }
                    Payload::Array(child) | Payload::Object(child) => {
                        let kind = if matches!(node.payload, Payload::Array(_)) {
                            EventKind::NewArray
                        } else {
                            EventKind::NewObject
                        };
                        sink(Event::new(kind, r, depth))?;
                        match child {
                            Some(c) => {
                                cur = c;
                                top += 1;
                                stack[top as usize] = (c, 0);
                            }
                            None => state = 2,
                        }
                    }
                    Payload::Empty => state = 1,
                }
            }

            // Advance: move to the next sibling, or pop toward the root.
            if state == 1 {
                let next = self.arena.node(cur).next;
                match next {
                    Some(nx) if top > 0 => {
                        cur = nx;
                        stack[top as usize].0 = nx;
                        stack[top as usize].1 += 1;
                        state = 0;
                    }
                    _ => {
                        top -= 1;
                        if top < 0 {
                            break;
                        }
                        cur = stack[top as usize].0;
                        state = 2;
                    }
                }
            }

            // Ascend: close the container just popped back to.
            if state == 2 {
                let kind = match self.arena.node(cur).payload {
                    Payload::Object(_) => EventKind::EndObject,
                    _ => EventKind::EndArray,
                };
                sink(Event::new(kind, stack[top as usize].1, top as u32))?;
                state = 1;
            }

            if !(top > 0 && (top as usize) < MAX_DEPTH - 1) {
                break;
            }
        }
        Ok(())
    }

    /// Free every node of the subtree rooted at `n`, returning the sibling
    /// `n` was linked to. String bytes stay allocated in their pools.
    pub fn flush_subtree(&mut self, n: NodeId) -> Option<NodeId> {
        let result = self.arena.node(n).next;
        let mut stack = [n; MAX_DEPTH];
        let mut top: i32 = 0;
        let mut state = 0u8;
        let mut cur = n;

        loop {
            if state == 0 {
                state = 1;
                if let Some(c) = self.arena.node(cur).payload.child() {
                    cur = c;
                    top += 1;
                    stack[top as usize] = c;
                    state = 0;
                }
            }
            if state == 1 {
                let next = self.arena.node(cur).next;
                match next {
                    Some(nx) if top > 0 => {
                        let f = cur;
                        cur = nx;
                        stack[top as usize] = nx;
                        self.arena.free_node(f);
                        state = 0;
                    }
                    _ => {
                        top -= 1;
                        if top >= 0 {
                            let f = cur;
                            cur = stack[top as usize];
                            self.arena.free_node(f);
                        }
                    }
                }
            }
            if !(top > 0 && (top as usize) < MAX_DEPTH - 1) {
                break;
            }
        }

        // The subtree root itself goes last.
        self.arena.free_node(stack[0]);
        result
    }

    /// Drop the whole tree and reset string storage.
    pub fn clear(&mut self) {
        if let Some(r) = self.root.take() {
            self.flush_subtree(r);
        }
        self.arena.reset_strings();
    }

    fn source_node(&self, src: Option<&Document>, id: NodeId) -> Node {
        *src.unwrap_or(self).arena.node(id)
    }

    /// Clone one node into this arena. Strings are copied when the node
    /// comes from a foreign document, shared when it is already ours.
    fn clone_node(&mut self, n: Node, src: Option<&Document>) -> Option<NodeId> {
        let m = self.arena.alloc_node();
        if let Some(l) = n.label {
            let r = match src {
                Some(other) => match self.arena.alloc_str(other.arena.str_bytes(l)) {
                    Some(r) => r,
                    None => {
                        self.arena.free_node(m);
                        return None;
                    }
                },
                None => l,
            };
            self.arena.node_mut(m).label = Some(r);
        }
        let payload = match n.payload {
            Payload::Str(sr) => match src {
                Some(other) => match self.arena.alloc_str(other.arena.str_bytes(sr)) {
                    Some(r) => Payload::Str(r),
                    None => {
                        self.arena.free_node(m);
                        return None;
                    }
                },
                None => Payload::Str(sr),
            },
            // Containers start empty; the subtree clone wires children up.
            Payload::Array(_) => Payload::Array(None),
            Payload::Object(_) => Payload::Object(None),
            p => p,
        };
        self.arena.node_mut(m).payload = payload;
        Some(m)
    }

    /// Clone the subtree rooted at `n` into this arena, returning the
    /// clone's root. `n`'s sibling link is not cloned.
    ///
    /// `src` names the document that owns `n`; `None` means `n` lives in
    /// this document, in which case label and string bytes are shared
    /// rather than copied. Returns `None` if string storage runs out,
    /// after flushing the partial clone.
    pub fn clone_subtree(&mut self, n: NodeId, src: Option<&Document>) -> Option<NodeId> {
        let first = self.source_node(src, n);
        let m = self.clone_node(first, src)?;

        let mut n_stack = [n; MAX_DEPTH];
        let mut m_stack = [m; MAX_DEPTH];
        let mut top: i32 = 0;
        let mut state = 0u8;
        let mut nc = n;
        let mut mc = m;

        loop {
            if state == 0 {
                state = 1;
                if let Some(c) = self.source_node(src, nc).payload.child() {
                    nc = c;
                    top += 1;
                    n_stack[top as usize] = c;
                    state = 0;
                    let child = self.source_node(src, c);
                    match self.clone_node(child, src) {
                        Some(cm) => {
                            self.arena.node_mut(mc).payload.set_child(Some(cm));
                            mc = cm;
                            m_stack[top as usize] = cm;
                        }
                        None => {
                            self.flush_subtree(m);
                            return None;
                        }
                    }
                }
            }
            if state == 1 {
                let next = self.source_node(src, nc).next;
                match next {
                    Some(nx) if top > 0 => {
                        nc = nx;
                        n_stack[top as usize] = nx;
                        let sib = self.source_node(src, nx);
                        match self.clone_node(sib, src) {
                            Some(nm) => {
                                self.arena.node_mut(mc).next = Some(nm);
                                mc = nm;
                                m_stack[top as usize] = nm;
                                state = 0;
                            }
                            None => {
                                self.flush_subtree(m);
                                return None;
                            }
                        }
                    }
                    _ => {
                        top -= 1;
                        if top >= 0 {
                            nc = n_stack[top as usize];
                            mc = m_stack[top as usize];
                        }
                    }
                }
            }
            if !(top > 0 && (top as usize) < MAX_DEPTH - 1) {
                break;
            }
        }
        Some(m)
    }

    /// Copy the whole document into a fresh one, dropping the string-pool
    /// garbage accumulated by edits. `None` if the copy ran out of space.
    pub fn compact(&self) -> Option<Document> {
        let mut k = Document::new();
        if let Some(r) = self.root {
            k.root = k.clone_subtree(r, Some(self));
            if k.root.is_none() {
                return None;
            }
        }
        Some(k)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Navigation handle
// ============================================================================

/// Borrowing read handle to one node of a document.
#[derive(Clone, Copy)]
pub struct NodeRef<'d> {
    doc: &'d Document,
    id: NodeId,
}

impl<'d> NodeRef<'d> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn payload(&self) -> Payload {
        self.doc.arena.node(self.id).payload
    }

    /// Member label bytes, if this node sits inside an object.
    pub fn label(&self) -> Option<&'d [u8]> {
        self.doc
            .arena
            .node(self.id)
            .label
            .map(|l| self.doc.arena.str_bytes(l))
    }

    pub fn as_str(&self) -> Option<&'d [u8]> {
        match self.doc.arena.node(self.id).payload {
            Payload::Str(r) => Some(self.doc.arena.str_bytes(r)),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self.payload() {
            Payload::Number(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<Symbol> {
        match self.payload() {
            Payload::Sym(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_container(&self) -> bool {
        self.payload().is_container()
    }

    pub fn first_child(&self) -> Option<NodeRef<'d>> {
        self.payload().child().map(|id| self.doc.node_ref(id))
    }

    pub fn next_sibling(&self) -> Option<NodeRef<'d>> {
        self.doc
            .arena
            .node(self.id)
            .next
            .map(|id| self.doc.node_ref(id))
    }

    /// Iterate this container's children in order.
    pub fn children(&self) -> Children<'d> {
        Children {
            next: self.first_child(),
        }
    }

    pub fn subtree_size(&self) -> usize {
        self.doc.subtree_size(self.id)
    }
}

pub struct Children<'d> {
    next: Option<NodeRef<'d>>,
}

impl<'d> Iterator for Children<'d> {
    type Item = NodeRef<'d>;

    fn next(&mut self) -> Option<NodeRef<'d>> {
        let cur = self.next?;
        self.next = cur.next_sibling();
        Some(cur)
    }
}
