//! C1: the node arena.
//!
//! A growable buffer of region descriptors, addressed by stable `usize`
//! indices rather than references or raw pointers. Growth never relocates a
//! *live* descriptor's meaning: `Vec::resize` may move the backing
//! allocation, but every consumer holds an index, not a pointer, into it, so
//! nothing is invalidated the way the source's pointer-based scheme was.

use crate::config::PoolOptions;
use crate::error::{Error, Result};

/// Stable identity of a region descriptor within one pool's arena.
pub type NodeId = usize;

/// One region descriptor: a contiguous sub-range of a pool.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Node {
    /// Byte offset of this region within the pool's backing buffer.
    pub offset: u64,
    /// Size in bytes of this region.
    pub size: u64,
    /// `true` if this region is reserved (allocated to a client); `false` if free.
    pub reserved: bool,
    /// `true` if this slot holds a live descriptor; `false` if vacant and reusable.
    pub live: bool,
    pub prev: Option<NodeId>,
    pub next: Option<NodeId>,
}

impl Node {
    const fn vacant() -> Self {
        Node {
            offset: 0,
            size: 0,
            reserved: false,
            live: false,
            prev: None,
            next: None,
        }
    }
}

/// Growable, index-addressed storage for region descriptors.
///
/// Vacant slots (from [`Arena::release`]) are tracked on a stack and reused
/// by the next [`Arena::reserve`], so the arena does not grow without bound
/// under steady-state allocate/free traffic.
#[derive(Debug)]
pub(crate) struct Arena {
    nodes: Vec<Node>,
    vacant: Vec<NodeId>,
    live_count: usize,
    load_factor: f64,
    growth_factor: usize,
}

impl Arena {
    pub fn new(options: &PoolOptions) -> Result<Self> {
        let capacity = options.initial_arena_capacity;
        let mut nodes = Vec::new();
        nodes
            .try_reserve_exact(capacity)
            .map_err(|e| Error::Fail(format!("failed to allocate node arena: {e}")))?;
        nodes.resize(capacity, Node::vacant());
        let vacant = (0..capacity).rev().collect();
        Ok(Self {
            nodes,
            vacant,
            live_count: 0,
            load_factor: options.load_factor,
            growth_factor: options.growth_factor,
        })
    }

    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    pub fn live_count(&self) -> usize {
        self.live_count
    }

    /// Grow the arena if reserving one more descriptor would exceed the load
    /// factor. Exposed (not just used internally by `reserve`) so a caller
    /// can pre-pay for a descriptor it hasn't constructed yet, before
    /// mutating any other state, and be sure the later `reserve` call that
    /// actually consumes it cannot fail.
    pub(crate) fn grow_if_needed(&mut self) -> Result<()> {
        let capacity = self.nodes.len();
        if capacity == 0 || (self.live_count + 1) as f64 / capacity as f64 > self.load_factor {
            let new_capacity = (capacity * self.growth_factor).max(1);
            let additional = new_capacity - capacity;
            trace!(
                "Growing node arena from {} to {} slots",
                capacity,
                new_capacity
            );
            self.nodes
                .try_reserve_exact(additional)
                .map_err(|e| Error::Fail(format!("failed to grow node arena: {e}")))?;
            let before = self.nodes.len();
            self.nodes.resize(new_capacity, Node::vacant());
            self.vacant.extend((before..new_capacity).rev());
        }
        Ok(())
    }

    /// Reserve a fresh descriptor slot, growing the arena first if the load
    /// factor would be exceeded. Returns the stable [`NodeId`] of the slot.
    pub fn reserve(&mut self, node: Node) -> Result<NodeId> {
        self.grow_if_needed()?;
        let id = self
            .vacant
            .pop()
            .ok_or_else(|| Error::Fail("node arena has no vacant slot after growth".into()))?;
        self.nodes[id] = node;
        self.nodes[id].live = true;
        self.live_count += 1;
        Ok(id)
    }

    /// Mark a slot vacant, making it eligible for reuse by a future `reserve`.
    pub fn release(&mut self, id: NodeId) {
        debug_assert!(self.nodes[id].live, "releasing an already-vacant slot");
        self.nodes[id] = Node::vacant();
        self.vacant.push(id);
        self.live_count -= 1;
    }

    /// `true` if `id` is in range and currently holds a live descriptor.
    /// Safe to call with a stale or out-of-range id; never panics.
    pub fn is_live(&self, id: NodeId) -> bool {
        self.nodes.get(id).map(|n| n.live).unwrap_or(false)
    }

    pub fn get(&self, id: NodeId) -> &Node {
        debug_assert!(self.nodes[id].live);
        &self.nodes[id]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        debug_assert!(self.nodes[id].live);
        &mut self.nodes[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> PoolOptions {
        PoolOptions {
            initial_arena_capacity: 2,
            ..Default::default()
        }
    }

    #[test]
    fn reserve_and_release_reuses_slots() {
        let mut arena = Arena::new(&opts()).unwrap();
        let a = arena.reserve(Node::vacant()).unwrap();
        let b = arena.reserve(Node::vacant()).unwrap();
        assert_ne!(a, b);
        assert_eq!(arena.live_count(), 2);
        arena.release(a);
        assert_eq!(arena.live_count(), 1);
        let c = arena.reserve(Node::vacant()).unwrap();
        // the vacant slot from `a` should be reused rather than growing
        assert_eq!(c, a);
    }

    #[test]
    fn grows_past_load_factor() {
        let mut arena = Arena::new(&opts()).unwrap();
        assert_eq!(arena.capacity(), 2);
        let _a = arena.reserve(Node::vacant()).unwrap();
        // live_count=1, capacity=2 -> 2/2 = 1.0 > 0.75, should have grown on the *next* reserve
        let _b = arena.reserve(Node::vacant()).unwrap();
        assert!(arena.capacity() > 2);
    }

    #[test]
    fn live_identities_survive_growth() {
        let mut arena = Arena::new(&opts()).unwrap();
        let mut node = Node::vacant();
        node.size = 42;
        let id = arena.reserve(node).unwrap();
        for _ in 0..16 {
            let _ = arena.reserve(Node::vacant()).unwrap();
        }
        assert_eq!(arena.get(id).size, 42);
    }
}
