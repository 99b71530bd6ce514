//! Path queries over the resident tree.
//!
//! A path like `a.b[2].c` compiles into a list of [`Step`]s. Label steps
//! match object members, index steps match array elements, and `*` (or an
//! empty/non-numeric bracket) matches every child at that level. Execution
//! visits every node the path selects; the mutating forms splice a clone of
//! a caller-built template into each selected position.
//!
//! The compiler recovers from sloppy input instead of rejecting it:
//! `a..b` reads as `a.b`, `a[12` as `a[12]`, `[12]a` as `[12].a`, and a
//! dangling `[` as a wildcard index.

use crate::arena::{NodeId, Payload};
use crate::parser::ParseError;
use crate::tree::{Document, NodeRef};
use crate::{MAX_DEPTH, MAX_LEN};

/// One level of a compiled path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Match the object member with this exact label.
    Label(String),
    /// Match every member of an object.
    AnyLabel,
    /// Match the array element at this position.
    Index(u32),
    /// Match every element of an array.
    AnyIndex,
}

impl Step {
    fn is_label(&self) -> bool {
        matches!(self, Step::Label(_) | Step::AnyLabel)
    }
}

/// A compiled path query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    steps: Vec<Step>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Init,
    Label,
    Index,
}

impl Query {
    /// Compile a dotted path.
    pub fn parse(path: &str) -> Result<Query, ParseError> {
        let bytes = path.as_bytes();
        if bytes.len() > MAX_LEN {
            return Err(ParseError::TooLong);
        }
        let len = bytes.len();
        let mut steps = Vec::new();
        let mut mode = Mode::Init;
        let mut start = 0usize;
        let mut pos = 0usize;

        // One pass with a zero sentinel past the end, so every step is
        // terminated the same way.
        while pos <= len {
            let c = if pos < len { bytes[pos] } else { 0 };
            let old = mode;
            match mode {
                Mode::Init => match c {
                    b'[' => {
                        mode = Mode::Index;
                        start = pos + 1;
                    }
                    b'.' | 0 | b']' => {}
                    _ => {
                        mode = Mode::Label;
                        start = pos;
                    }
                },
                Mode::Label => match c {
                    b'.' | 0 => {
                        push_label(&mut steps, &bytes[start..pos])?;
                        mode = Mode::Init;
                    }
                    b'[' => {
                        push_label(&mut steps, &bytes[start..pos])?;
                        mode = Mode::Index;
                        start = pos + 1;
                    }
                    _ => {}
                },
                Mode::Index => match c {
                    b']' | 0 => {
                        push_index(&mut steps, &bytes[start..pos])?;
                        mode = Mode::Init;
                    }
                    _ => {}
                },
            }
            // A label's first character is already under the cursor when
            // we switch out of init mode; do not step over it.
            if !(mode == Mode::Label && old == Mode::Init) {
                pos += 1;
            }
        }

        Ok(Query { steps })
    }

    pub fn from_steps(steps: Vec<Step>) -> Query {
        Query { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn has_wildcard(&self) -> bool {
        self.steps
            .iter()
            .any(|s| matches!(s, Step::AnyLabel | Step::AnyIndex))
    }

    /// Visit every node the path selects, in document order.
    pub fn retrieve<'d, F>(&self, doc: &'d Document, mut f: F)
    where
        F: FnMut(NodeRef<'d>),
    {
        if let Some(root) = doc.root {
            retrieve_rec(doc, &self.steps, root, &mut f);
        }
    }

    /// Splice a clone of `template` after each selected node.
    ///
    /// The template lives in `doc`'s own arena (see
    /// [`Document::graft`](crate::Document::graft)); the caller keeps
    /// ownership and flushes it when done. Selections whose container kind
    /// does not suit the template (a labeled template outside an object,
    /// an unlabeled one outside an array) are skipped silently.
    pub fn append(&self, doc: &mut Document, template: NodeId) {
        self.run(doc, Action::Append, Some(template));
    }

    /// Splice a clone of `template` before each selected node.
    pub fn insert(&self, doc: &mut Document, template: NodeId) {
        self.run(doc, Action::Insert, Some(template));
    }

    /// Replace each selected node with a clone of `template`. An unlabeled
    /// template replacing an object member inherits the member's label.
    pub fn update(&self, doc: &mut Document, template: NodeId) {
        self.run(doc, Action::Update, Some(template));
    }

    /// Flush each selected subtree out of the tree.
    pub fn delete(&self, doc: &mut Document) {
        self.run(doc, Action::Delete, None);
    }

    fn run(&self, doc: &mut Document, action: Action, template: Option<NodeId>) {
        if let Some(root) = doc.root {
            exec(
                doc, &self.steps, root, Slot::Root, Ctx::None, action, template,
            );
        }
    }

    /// Count the children the final path level selects when widened to a
    /// wildcard, and report the last one. Supports sizing a container
    /// before positional edits.
    pub fn child_probe(&self, doc: &Document) -> (usize, Option<NodeId>) {
        let mut probe = self.clone();
        if let Some(last) = probe.steps.last_mut() {
            *last = if last.is_label() {
                Step::AnyLabel
            } else {
                Step::AnyIndex
            };
        }
        let mut count = 0usize;
        let mut last = None;
        probe.retrieve(doc, |r| {
            count += 1;
            last = Some(r.id());
        });
        (count, last)
    }
}

fn push_label(steps: &mut Vec<Step>, content: &[u8]) -> Result<(), ParseError> {
    if steps.len() == MAX_DEPTH {
        return Err(ParseError::DepthExceeded);
    }
    let step = if content == b"*" {
        Step::AnyLabel
    } else {
        Step::Label(String::from_utf8_lossy(content).into_owned())
    };
    steps.push(step);
    Ok(())
}

fn push_index(steps: &mut Vec<Step>, content: &[u8]) -> Result<(), ParseError> {
    if steps.len() == MAX_DEPTH {
        return Err(ParseError::DepthExceeded);
    }
    // Leading digits decide the index; anything without them (including
    // `*` and an empty bracket) is a wildcard.
    let mut value = 0u32;
    let mut digits = false;
    for &b in content {
        if b.is_ascii_digit() {
            digits = true;
            value = value.wrapping_mul(10).wrapping_add((b - b'0') as u32);
        } else {
            break;
        }
    }
    steps.push(if digits { Step::Index(value) } else { Step::AnyIndex });
    Ok(())
}

fn label_matches(doc: &Document, n: NodeId, wanted: &str) -> bool {
    doc.arena
        .node(n)
        .label
        .map(|l| doc.arena.str_bytes(l) == wanted.as_bytes())
        .unwrap_or(false)
}

fn retrieve_rec<'d, F>(doc: &'d Document, steps: &[Step], n: NodeId, f: &mut F)
where
    F: FnMut(NodeRef<'d>),
{
    let (step, rest) = match steps.split_first() {
        None => {
            f(doc.node_ref(n));
            return;
        }
        Some(pair) => pair,
    };
    match doc.arena.node(n).payload {
        Payload::Object(child) if step.is_label() => {
            let mut cur = child;
            while let Some(c) = cur {
                let hit = match step {
                    Step::AnyLabel => true,
                    Step::Label(w) => label_matches(doc, c, w),
                    _ => false,
                };
                if hit {
                    retrieve_rec(doc, rest, c, f);
                }
                cur = doc.arena.node(c).next;
            }
        }
        Payload::Array(child) if !step.is_label() => {
            let mut cur = child;
            let mut i = 0u32;
            while let Some(c) = cur {
                let hit = match step {
                    Step::AnyIndex => true,
                    Step::Index(k) => i == *k,
                    _ => false,
                };
                if hit {
                    retrieve_rec(doc, rest, c, f);
                }
                cur = doc.arena.node(c).next;
                i += 1;
            }
        }
        // Step kind and node kind disagree: nothing selected down here.
        _ => {}
    }
}

// ============================================================================
// Mutating executor
// ============================================================================

/// The link that points at the node under consideration. Rewriting it is
/// how deletes and inserts splice the tree without parent pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Root,
    Child(NodeId),
    Next(NodeId),
}

fn read_slot(doc: &Document, s: Slot) -> Option<NodeId> {
    match s {
        Slot::Root => doc.root,
        Slot::Child(p) => doc.arena.node(p).payload.child(),
        Slot::Next(p) => doc.arena.node(p).next,
    }
}

fn write_slot(doc: &mut Document, s: Slot, v: Option<NodeId>) {
    match s {
        Slot::Root => doc.root = v,
        Slot::Child(p) => doc.arena.node_mut(p).payload.set_child(v),
        Slot::Next(p) => doc.arena.node_mut(p).next = v,
    }
}

/// The container kind we stepped through to reach the current node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ctx {
    None,
    Object,
    Array,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Append,
    Insert,
    Delete,
    Update,
}

/// Descend the remaining steps from `n`, applying `action` at each full
/// match. Returns the node that now occupies `n`'s position, or `None`
/// after a delete removed the last sibling.
fn exec(
    doc: &mut Document,
    steps: &[Step],
    n: NodeId,
    slot: Slot,
    ctx: Ctx,
    action: Action,
    template: Option<NodeId>,
) -> Option<NodeId> {
    let (step, rest) = match steps.split_first() {
        Some(pair) => pair,
        None => return apply(doc, n, slot, ctx, action, template),
    };

    let payload = doc.arena.node(n).payload;
    match payload {
        Payload::Object(child) if step.is_label() => {
            let mut slot = Slot::Child(n);
            let mut cur = child;

            // Placing into an empty object: the template's own label names
            // the member, so the last step has nothing to match against.
            if cur.is_none()
                && matches!(action, Action::Append | Action::Insert)
                && rest.is_empty()
            {
                if let Some(t) = template {
                    if doc.arena.node(t).label.is_some() {
                        let m = doc.clone_subtree(t, None);
                        write_slot(doc, slot, m);
                    }
                }
            }

            while let Some(c) = cur {
                let hit = match step {
                    Step::AnyLabel => true,
                    Step::Label(w) => label_matches(doc, c, w),
                    _ => false,
                };
                let rc = if hit {
                    exec(doc, rest, c, slot, Ctx::Object, action, template)
                } else {
                    Some(c)
                };
                advance(doc, &mut slot, &mut cur, c, rc, action);
            }
            Some(n)
        }
        Payload::Array(child) if !step.is_label() => {
            let mut slot = Slot::Child(n);
            let mut cur = child;

            if cur.is_none()
                && matches!(action, Action::Append | Action::Insert)
                && rest.is_empty()
            {
                if let Some(t) = template {
                    if doc.arena.node(t).label.is_none() {
                        let m = doc.clone_subtree(t, None);
                        write_slot(doc, slot, m);
                    }
                }
            }

            let mut i = 0u32;
            while let Some(c) = cur {
                let hit = match step {
                    Step::AnyIndex => true,
                    Step::Index(k) => i == *k,
                    _ => false,
                };
                let rc = if hit {
                    exec(doc, rest, c, slot, Ctx::Array, action, template)
                } else {
                    Some(c)
                };
                advance(doc, &mut slot, &mut cur, c, rc, action);
                i += 1;
            }
            Some(n)
        }
        // Step kind and node kind disagree: silently select nothing.
        _ => Some(n),
    }
}

/// Move the child loop forward after one recursion, accounting for edits
/// that rewrote the current link.
fn advance(
    doc: &Document,
    slot: &mut Slot,
    cur: &mut Option<NodeId>,
    c: NodeId,
    rc: Option<NodeId>,
    action: Action,
) {
    if read_slot(doc, *slot) != Some(c) && action == Action::Delete {
        // The recursion deleted `c`; the link now names its successor.
        *cur = read_slot(doc, *slot);
    } else {
        *cur = rc;
        if let Some(r) = rc {
            *slot = Slot::Next(r);
            *cur = doc.arena.node(r).next;
        }
    }
}

/// Perform `action` on a fully matched node.
fn apply(
    doc: &mut Document,
    n: NodeId,
    slot: Slot,
    ctx: Ctx,
    action: Action,
    template: Option<NodeId>,
) -> Option<NodeId> {
    // A labeled template only makes sense inside an object; appending or
    // inserting an unlabeled one only inside an array.
    if let Some(t) = template {
        let labeled = doc.arena.node(t).label.is_some();
        if labeled && ctx != Ctx::Object {
            return Some(n);
        }
        if matches!(action, Action::Append | Action::Insert) && !labeled && ctx != Ctx::Array {
            return Some(n);
        }
    }

    match action {
        Action::Append => {
            if let Some(t) = template {
                if let Some(m) = doc.clone_subtree(t, None) {
                    let after = doc.arena.node(n).next;
                    doc.arena.node_mut(m).next = after;
                    doc.arena.node_mut(n).next = Some(m);
                    return Some(m);
                }
            }
            Some(n)
        }
        Action::Insert => {
            if let Some(t) = template {
                if let Some(m) = doc.clone_subtree(t, None) {
                    doc.arena.node_mut(m).next = Some(n);
                    write_slot(doc, slot, Some(m));
                }
            }
            Some(n)
        }
        Action::Delete => {
            let next = doc.flush_subtree(n);
            write_slot(doc, slot, next);
            next
        }
        Action::Update => {
            if let Some(t) = template {
                if let Some(m) = doc.clone_subtree(t, None) {
                    // A bare value replacing an object member keeps the
                    // member's name.
                    let label = doc.arena.node(n).label;
                    if label.is_some() && doc.arena.node(m).label.is_none() {
                        doc.arena.node_mut(m).label = label;
                    }
                    let next = doc.flush_subtree(n);
                    doc.arena.node_mut(m).next = next;
                    write_slot(doc, slot, Some(m));
                    return Some(m);
                }
            }
            Some(n)
        }
    }
}
