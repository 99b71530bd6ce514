//! Per-document storage for tree nodes and string bytes.
//!
//! Nodes are allocated in fixed-size blocks and recycled through a free
//! list threaded through the nodes' own `next` links. Nothing is returned
//! to the system allocator before the arena itself is dropped.
//!
//! Strings live in fixed-capacity pools. The active pool list is kept
//! sorted by decreasing utilization so that new strings pack into the
//! fullest pool that still fits them, preserving emptier pools for larger
//! strings. A pool whose free space drops below [`RETIREMENT`] is moved to
//! a retired list and excluded from further allocation.

use crate::event::Symbol;
use crate::MAX_LEN;

/// Nodes per allocation block.
pub const NODE_BLOCK: usize = 128;

/// Byte capacity of one string pool.
pub const POOL_CAP: usize = 2 * MAX_LEN - 16;

/// A pool with less free space than this is retired from allocation.
pub const RETIREMENT: usize = 24;

/// Index of a node in the arena's block table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        NodeId(index as u32)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to a byte range inside one of the arena's string pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrRef {
    pool: u32,
    start: u32,
    len: u32,
}

impl StrRef {
    /// Length of the referenced bytes (excluding the trailing zero byte).
    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// The value carried by a node, exactly one kind at a time.
///
/// `Empty` marks a node whose value has not been assigned yet: a labeled
/// object member between its label event and its value event, or a node
/// sitting on the free list.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Payload {
    #[default]
    Empty,
    Number(f64),
    Str(StrRef),
    Sym(Symbol),
    Array(Option<NodeId>),
    Object(Option<NodeId>),
}

impl Payload {
    pub fn is_container(&self) -> bool {
        matches!(self, Payload::Array(_) | Payload::Object(_))
    }

    /// First child of a container, `None` for empty containers and scalars.
    pub fn child(&self) -> Option<NodeId> {
        match self {
            Payload::Array(c) | Payload::Object(c) => *c,
            _ => None,
        }
    }

    pub(crate) fn set_child(&mut self, v: Option<NodeId>) {
        if let Payload::Array(c) | Payload::Object(c) = self {
            *c = v;
        }
    }
}

/// One JSON value in the resident tree.
///
/// The label is present iff the node is a member of an object. The `next`
/// link chains siblings inside an array or object; for a free node it
/// threads the arena's free list instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct Node {
    pub(crate) next: Option<NodeId>,
    pub(crate) label: Option<StrRef>,
    pub(crate) payload: Payload,
}

#[derive(Debug)]
struct Pool {
    buf: Box<[u8]>,
    used: usize,
}

impl Pool {
    fn new() -> Self {
        Pool {
            buf: vec![0u8; POOL_CAP].into_boxed_slice(),
            used: 0,
        }
    }
}

/// Owner of all node and string storage for one document.
#[derive(Debug)]
pub struct Arena {
    blocks: Vec<Box<[Node]>>,
    free_head: Option<NodeId>,
    free_len: usize,
    pools: Vec<Pool>,
    /// Pool indices still accepting strings, sorted by decreasing `used`.
    active: Vec<u32>,
    /// Pools with less than `RETIREMENT` bytes left.
    retired: Vec<u32>,
}

impl Arena {
    pub fn new() -> Self {
        Arena {
            blocks: Vec::new(),
            free_head: None,
            free_len: 0,
            pools: Vec::new(),
            active: Vec::new(),
            retired: Vec::new(),
        }
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.blocks[id.index() / NODE_BLOCK][id.index() % NODE_BLOCK]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.blocks[id.index() / NODE_BLOCK][id.index() % NODE_BLOCK]
    }

    /// Pop a zeroed node off the free list, growing by one block if needed.
    pub(crate) fn alloc_node(&mut self) -> NodeId {
        let id = match self.free_head {
            Some(id) => id,
            None => self.grow(),
        };
        self.free_head = self.node(id).next;
        self.free_len -= 1;
        let n = self.node_mut(id);
        n.next = None;
        n.label = None;
        n.payload = Payload::Empty;
        id
    }

    /// Return a node to the free list. Strings it referenced stay allocated.
    pub(crate) fn free_node(&mut self, id: NodeId) {
        let head = self.free_head;
        let n = self.node_mut(id);
        n.label = None;
        n.payload = Payload::Empty;
        n.next = head;
        self.free_head = Some(id);
        self.free_len += 1;
    }

    fn grow(&mut self) -> NodeId {
        let base = self.blocks.len() * NODE_BLOCK;
        let block: Box<[Node]> = (0..NODE_BLOCK).map(|_| Node::default()).collect();
        self.blocks.push(block);
        for i in 0..NODE_BLOCK {
            let next = if i + 1 < NODE_BLOCK {
                Some(NodeId::new(base + i + 1))
            } else {
                None
            };
            self.node_mut(NodeId::new(base + i)).next = next;
        }
        self.free_head = Some(NodeId::new(base));
        self.free_len += NODE_BLOCK;
        NodeId::new(base)
    }

    /// Nodes currently in use (allocated and not yet freed).
    pub fn live_nodes(&self) -> usize {
        self.blocks.len() * NODE_BLOCK - self.free_len
    }

    /// Copy `bytes` into pool storage, reserving one extra zero byte.
    ///
    /// Returns `None` when the string can never fit in a pool. The first
    /// active pool with room wins; afterwards the pool is retired if its
    /// free space dropped below [`RETIREMENT`], or re-sorted into place if
    /// its new utilization now exceeds its predecessor's.
    pub(crate) fn alloc_str(&mut self, bytes: &[u8]) -> Option<StrRef> {
        let need = bytes.len() + 1;
        if need > POOL_CAP {
            return None;
        }

        // First fit over the active list (fullest pools first).
        let mut at = None;
        for (i, &pi) in self.active.iter().enumerate() {
            if self.pools[pi as usize].used + need <= POOL_CAP {
                at = Some(i);
                break;
            }
        }
        let at = match at {
            Some(i) => i,
            None => {
                self.pools.push(Pool::new());
                self.active.push(self.pools.len() as u32 - 1);
                self.active.len() - 1
            }
        };
        let pi = self.active[at] as usize;

        let start = self.pools[pi].used;
        self.pools[pi].buf[start..start + bytes.len()].copy_from_slice(bytes);
        self.pools[pi].buf[start + bytes.len()] = 0;
        self.pools[pi].used += need;
        let r = StrRef {
            pool: pi as u32,
            start: start as u32,
            len: bytes.len() as u32,
        };

        // Re-home the pool: retire, or restore the sort order.
        let used = self.pools[pi].used;
        if used + RETIREMENT > POOL_CAP {
            self.active.remove(at);
            self.retired.push(pi as u32);
        } else if at > 0 && self.pools[self.active[at - 1] as usize].used < used {
            self.active.remove(at);
            let pos = self
                .active
                .iter()
                .position(|&q| self.pools[q as usize].used < used)
                .unwrap_or(self.active.len());
            self.active.insert(pos, pi as u32);
        }

        Some(r)
    }

    /// The bytes behind a string handle.
    pub fn str_bytes(&self, r: StrRef) -> &[u8] {
        let p = &self.pools[r.pool as usize];
        &p.buf[r.start as usize..(r.start + r.len) as usize]
    }

    /// Reset every pool to empty and un-retire them all. Node storage is
    /// untouched; callers flush the tree separately.
    pub(crate) fn reset_strings(&mut self) {
        for p in &mut self.pools {
            p.used = 0;
        }
        self.retired.clear();
        self.active = (0..self.pools.len() as u32).collect();
    }

    /// Utilization of each active pool, in list order.
    pub fn active_pool_used(&self) -> Vec<usize> {
        self.active
            .iter()
            .map(|&pi| self.pools[pi as usize].used)
            .collect()
    }

    /// Utilization of each retired pool.
    pub fn retired_pool_used(&self) -> Vec<usize> {
        self.retired
            .iter()
            .map(|&pi| self.pools[pi as usize].used)
            .collect()
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}
