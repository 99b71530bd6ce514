//! Single-value convenience layer on top of path queries.
//!
//! [`Document::get_value`], [`Document::set_value`], and
//! [`Document::clear_value`] move one scalar at a time as text, creating
//! missing path levels on write and pruning emptied containers on clear.
//! Wildcards are allowed when reading, rejected when writing.

use crate::arena::{NodeId, Payload};
use crate::event::Symbol;
use crate::parser::ParseError;
use crate::query::{Query, Step};
use crate::tree::{Document, NodeRef};

/// How a fetched value was stored in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Str,
    Number,
    Symbol,
}

/// A scalar read out of the tree, rendered as text.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    pub text: String,
    pub kind: ValueKind,
    /// More than one node matched the path; `text` holds the first scalar.
    pub ambiguous: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
    /// The path did not compile.
    BadPath(ParseError),
    /// The operation does not accept wildcard paths.
    Wildcard,
    NotFound,
    /// The path names an array or object where a scalar is required.
    Compound,
    /// String pool storage refused an allocation.
    OutOfSpace,
}

impl AccessError {
    pub fn message(&self) -> &'static str {
        match self {
            AccessError::BadPath(_) => "bad path",
            AccessError::Wildcard => "wildcards not allowed here",
            AccessError::NotFound => "no value at path",
            AccessError::Compound => "value at path is compound",
            AccessError::OutOfSpace => "out of string space",
        }
    }
}

impl std::fmt::Display for AccessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessError::BadPath(e) => write!(f, "bad path: {}", e),
            other => f.write_str(other.message()),
        }
    }
}

impl std::error::Error for AccessError {}

/// Numbers that hold an integral value print without a fraction.
fn format_number(v: f64) -> String {
    if v == (v as i64) as f64 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

fn render_scalar(r: NodeRef<'_>) -> Option<Fetched> {
    match r.payload() {
        Payload::Number(v) => Some(Fetched {
            text: format_number(v),
            kind: ValueKind::Number,
            ambiguous: false,
        }),
        Payload::Str(_) => r.as_str().map(|b| Fetched {
            text: String::from_utf8_lossy(b).into_owned(),
            kind: ValueKind::Str,
            ambiguous: false,
        }),
        Payload::Sym(s) => Some(Fetched {
            text: s.token().to_string(),
            kind: ValueKind::Symbol,
            ambiguous: false,
        }),
        _ => None,
    }
}

impl Document {
    /// Read the scalar at `path` as text.
    ///
    /// Unlike [`set_value`](Document::set_value) and
    /// [`clear_value`](Document::clear_value), wildcard steps are accepted
    /// here: the first scalar match wins and any further match marks the
    /// result ambiguous. Matches that are containers never produce text, so
    /// a path that only reaches containers reports
    /// [`AccessError::NotFound`].
    pub fn get_value(&self, path: &str) -> Result<Fetched, AccessError> {
        let q = Query::parse(path).map_err(AccessError::BadPath)?;
        let mut found: Option<Fetched> = None;
        q.retrieve(self, |r| match &mut found {
            None => found = render_scalar(r),
            Some(f) => f.ambiguous = true,
        });
        found.ok_or(AccessError::NotFound)
    }

    /// Write `literal` at `path`, creating missing levels along the way.
    ///
    /// The literal is typed the way JSON source would be: `true`/`false`
    /// become symbols, numeric text a number, anything else a string. An
    /// existing scalar at the path is replaced in place (keeping its
    /// label); an existing container is an error. On an empty document the
    /// first step decides the root container's kind.
    pub fn set_value(&mut self, path: &str, literal: &str) -> Result<(), AccessError> {
        let q = Query::parse(path).map_err(AccessError::BadPath)?;
        if q.has_wildcard() {
            return Err(AccessError::Wildcard);
        }
        let steps = q.steps().to_vec();
        if steps.is_empty() {
            return Err(AccessError::NotFound);
        }

        for i in 0..steps.len() {
            if i == 0 && self.root.is_none() {
                let n = self.arena.alloc_node();
                self.arena.node_mut(n).payload = match &steps[0] {
                    Step::Label(_) | Step::AnyLabel => Payload::Object(None),
                    _ => Payload::Array(None),
                };
                self.root = Some(n);
            }

            // Deepest existing node along the prefix, if any.
            let prefix = Query::from_steps(steps[..=i].to_vec());
            let mut found = None;
            prefix.retrieve(self, |r| found = Some(r.id()));

            match found {
                None => {
                    // Build the missing suffix as a chain of containers
                    // ending in the scalar, then splice it in at level i.
                    let chain = self.build_chain(&steps[i..], literal)?;
                    let (_, last) = prefix.child_probe(self);
                    match last {
                        Some(last) => {
                            // The parent has children; the chain follows
                            // the final one.
                            self.arena.node_mut(last).next = Some(chain);
                        }
                        None => {
                            if !self.adopt_chain(&steps[..i], chain) {
                                self.flush_subtree(chain);
                                return Err(AccessError::NotFound);
                            }
                        }
                    }
                    return Ok(());
                }
                Some(n) => {
                    if i + 1 == steps.len() {
                        if self.arena.node(n).payload.is_container() {
                            return Err(AccessError::Compound);
                        }
                        let tpl = self.make_scalar(literal)?;
                        q.update(self, tpl);
                        self.flush_subtree(tpl);
                        return Ok(());
                    }
                }
            }
        }
        Ok(())
    }

    /// Delete the scalar at `path`, then prune containers the deletion
    /// left empty, stopping at (and never deleting) the document root.
    pub fn clear_value(&mut self, path: &str) -> Result<(), AccessError> {
        let q = Query::parse(path).map_err(AccessError::BadPath)?;
        if q.has_wildcard() {
            return Err(AccessError::Wildcard);
        }
        let mut found = None;
        q.retrieve(self, |r| found = Some(r.id()));
        let n = found.ok_or(AccessError::NotFound)?;
        if self.arena.node(n).payload.is_container() {
            return Err(AccessError::Compound);
        }
        q.delete(self);

        // Cascade: each emptied container goes too, root excepted.
        let mut steps = q.steps().to_vec();
        while !steps.is_empty() {
            let (count, _) = Query::from_steps(steps.clone()).child_probe(self);
            if count != 0 {
                break;
            }
            steps.pop();
            if steps.is_empty() {
                break;
            }
            Query::from_steps(steps.clone()).delete(self);
        }
        Ok(())
    }

    /// Hang `chain` as the first child of the node the path prefix names.
    /// Refuses when the parent is missing, not an empty container, or the
    /// wrong kind for the chain's head.
    fn adopt_chain(&mut self, prefix: &[Step], chain: NodeId) -> bool {
        let q = Query::from_steps(prefix.to_vec());
        let mut parent = None;
        q.retrieve(self, |r| parent = Some(r.id()));
        let parent = match parent {
            Some(p) => p,
            None => return false,
        };
        let labeled = self.arena.node(chain).label.is_some();
        let fits = match self.arena.node(parent).payload {
            Payload::Object(None) => labeled,
            Payload::Array(None) => !labeled,
            _ => false,
        };
        if fits {
            self.arena.node_mut(parent).payload.set_child(Some(chain));
        }
        fits
    }

    /// One chain link per remaining step: containers typed by the step
    /// that follows them, the scalar value at the end.
    fn build_chain(&mut self, steps: &[Step], literal: &str) -> Result<NodeId, AccessError> {
        let mut head: Option<NodeId> = None;
        let mut prev: Option<NodeId> = None;
        for (k, step) in steps.iter().enumerate() {
            match self.chain_link(steps.get(k + 1), step, literal) {
                Ok(n) => {
                    match prev {
                        Some(p) => self.arena.node_mut(p).payload.set_child(Some(n)),
                        None => head = Some(n),
                    }
                    prev = Some(n);
                }
                Err(e) => {
                    if let Some(h) = head {
                        self.flush_subtree(h);
                    }
                    return Err(e);
                }
            }
        }
        head.ok_or(AccessError::NotFound)
    }

    fn chain_link(
        &mut self,
        next: Option<&Step>,
        step: &Step,
        literal: &str,
    ) -> Result<NodeId, AccessError> {
        let payload = match next {
            Some(Step::Label(_)) | Some(Step::AnyLabel) => Payload::Object(None),
            Some(_) => Payload::Array(None),
            None => self.scalar_payload(literal)?,
        };
        let n = self.arena.alloc_node();
        self.arena.node_mut(n).payload = payload;
        if let Step::Label(l) = step {
            match self.arena.alloc_str(l.as_bytes()) {
                Some(r) => self.arena.node_mut(n).label = Some(r),
                None => {
                    self.arena.free_node(n);
                    return Err(AccessError::OutOfSpace);
                }
            }
        }
        Ok(n)
    }

    fn scalar_payload(&mut self, literal: &str) -> Result<Payload, AccessError> {
        if literal == "true" {
            return Ok(Payload::Sym(Symbol::True));
        }
        if literal == "false" {
            return Ok(Payload::Sym(Symbol::False));
        }
        if let Ok(v) = literal.parse::<f64>() {
            return Ok(Payload::Number(v));
        }
        let r = self
            .arena
            .alloc_str(literal.as_bytes())
            .ok_or(AccessError::OutOfSpace)?;
        Ok(Payload::Str(r))
    }

    /// A detached, unlabeled scalar to serve as an update template.
    fn make_scalar(&mut self, literal: &str) -> Result<NodeId, AccessError> {
        let payload = self.scalar_payload(literal)?;
        let n = self.arena.alloc_node();
        self.arena.node_mut(n).payload = payload;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_numbers_print_without_fraction() {
        assert_eq!(format_number(7.0), "7");
        assert_eq!(format_number(-2.0), "-2");
        assert_eq!(format_number(0.25), "0.25");
    }

    #[test]
    fn literals_are_typed_like_source() {
        let mut d = Document::new();
        d.set_value("a", "true").unwrap();
        d.set_value("b", "2.5").unwrap();
        d.set_value("c", "hello").unwrap();
        assert_eq!(d.get_value("a").unwrap().kind, ValueKind::Symbol);
        assert_eq!(d.get_value("b").unwrap().kind, ValueKind::Number);
        assert_eq!(d.get_value("c").unwrap().kind, ValueKind::Str);
        // "null" has no literal form here; it stays a string.
        d.set_value("d", "null").unwrap();
        assert_eq!(d.get_value("d").unwrap().kind, ValueKind::Str);
    }
}
