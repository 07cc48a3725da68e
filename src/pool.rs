//! The pool manager: ties the node arena (C1), region list (C2), and gap
//! index (C3) together, and implements the placement (C4) and coalescing
//! (C5) engines on top of them.

use crate::arena::{Arena, Node, NodeId};
use crate::config::PoolOptions;
use crate::error::{Error, Result};
use crate::gap_index::GapIndex;
use crate::list;
use crate::policy::Policy;

/// Identity of a pool within a [`Registry`](crate::registry::Registry).
///
/// Opaque outside the crate; a `PoolId` from one registry must not be used
/// against another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolId(pub(crate) usize);

/// One contiguous region of a pool, as reported by [`Pool::inspect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Size in bytes of this region.
    pub size: u64,
    /// `true` if this region is currently reserved by a client.
    pub reserved: bool,
}

/// Handle to one reserved region of a pool, returned by [`Pool::allocate`].
///
/// Opaque: accessors expose the `(offset, size)` pair the source reached by
/// reinterpreting the descriptor's layout; this crate exposes the same pair
/// through methods instead of a pointer cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pool: PoolId,
    node: NodeId,
    offset: u64,
    size: u64,
}

impl Allocation {
    /// The pool this allocation was produced by.
    pub fn pool_id(&self) -> PoolId {
        self.pool
    }

    /// Byte offset of this allocation within its pool's backing buffer.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Size in bytes of this allocation.
    pub fn size(&self) -> u64 {
        self.size
    }
}

/// A single suballocator pool: one backing buffer, bookkept by C1-C5.
#[derive(Debug)]
pub struct Pool {
    id: PoolId,
    total_size: u64,
    policy: Policy,
    num_allocs: u64,
    alloc_size: u64,
    head: Option<NodeId>,
    arena: Arena,
    gaps: GapIndex,
}

impl Pool {
    /// Create a new pool of `total_size` bytes under `policy`, using the
    /// default [`PoolOptions`]. Fails if `total_size` is zero or if the
    /// backing structures cannot be allocated.
    pub fn open(id: PoolId, total_size: u64, policy: Policy) -> Result<Self> {
        Self::open_with_options(id, total_size, policy, PoolOptions::default())
    }

    /// As [`Pool::open`], with explicit capacity overrides.
    pub fn open_with_options(
        id: PoolId,
        total_size: u64,
        policy: Policy,
        options: PoolOptions,
    ) -> Result<Self> {
        options.validate();
        if total_size == 0 {
            return Err(Error::Fail("cannot open a zero-size pool".into()));
        }
        let mut arena = Arena::new(&options)?;
        let mut gaps = GapIndex::new(&options)?;
        let root = arena.reserve(Node {
            offset: 0,
            size: total_size,
            reserved: false,
            live: true,
            prev: None,
            next: None,
        })?;
        gaps.insert(root, total_size)?;
        debug!("Opened pool {:?} with {} bytes ({:?})", id, total_size, policy);
        Ok(Self {
            id,
            total_size,
            policy,
            num_allocs: 0,
            alloc_size: 0,
            head: Some(root),
            arena,
            gaps,
        })
    }

    pub fn id(&self) -> PoolId {
        self.id
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn alloc_size(&self) -> u64 {
        self.alloc_size
    }

    pub fn num_allocs(&self) -> u64 {
        self.num_allocs
    }

    /// Number of free regions. Computed from the gap index rather than kept
    /// as a second hand-synchronized counter (see design notes on the
    /// source's redundant `num_gaps`/gap-index-length pair).
    pub fn num_gaps(&self) -> usize {
        self.gaps.len()
    }

    /// `true` if this pool has no live allocations, i.e. `close` would succeed.
    pub fn is_empty(&self) -> bool {
        self.num_allocs == 0
    }

    /// C4: allocate `size` bytes under this pool's placement policy.
    pub fn allocate(&mut self, size: u64) -> Result<Allocation> {
        if size == 0 {
            return Err(Error::Fail("cannot allocate zero bytes".into()));
        }

        let chosen = match self.policy {
            Policy::BestFit => self.gaps.best_fit(size),
            Policy::FirstFit => self.first_fit(size),
        };

        let Some(gap_id) = chosen else {
            warn!(
                "Pool {:?}: no free region >= {} bytes (no_space)",
                self.id, size
            );
            return Err(Error::NoSpace);
        };

        let gap_size = self.arena.get(gap_id).size;
        let gap_offset = self.arena.get(gap_id).offset;
        let remainder = gap_size - size;

        // Pre-pay for any growth a split could require before mutating
        // anything: once `gaps.remove` and the node flip below run, this
        // operation must not be able to fail and leave the pool half-updated.
        if remainder > 0 {
            self.arena.grow_if_needed()?;
            self.gaps.grow_if_needed()?;
        }

        self.gaps.remove(gap_id)?;

        {
            let node = self.arena.get_mut(gap_id);
            node.reserved = true;
            node.size = size;
        }

        if remainder > 0 {
            let remainder_node = Node {
                offset: gap_offset + size,
                size: remainder,
                reserved: false,
                live: true,
                prev: None,
                next: None,
            };
            let remainder_id = self.arena.reserve(remainder_node)?;
            list::insert_after(&mut self.arena, gap_id, remainder_id);
            self.gaps.insert(remainder_id, remainder)?;
        }

        self.num_allocs += 1;
        self.alloc_size += size;

        debug!(
            "Pool {:?}: allocated {} bytes at offset {} ({:?}, remainder {})",
            self.id, size, gap_offset, self.policy, remainder
        );

        Ok(Allocation {
            pool: self.id,
            node: gap_id,
            offset: gap_offset,
            size,
        })
    }

    fn first_fit(&self, size: u64) -> Option<NodeId> {
        list::iter(&self.arena, self.head)
            .find(|&id| !self.arena.get(id).reserved && self.arena.get(id).size >= size)
    }

    /// C5: release `alloc` back to this pool, coalescing with free neighbors.
    pub fn free(&mut self, alloc: Allocation) -> Result<()> {
        if alloc.pool != self.id {
            return Err(Error::Fail("allocation does not belong to this pool".into()));
        }
        if !self.arena.is_live(alloc.node) {
            return Err(Error::Fail(
                "allocation handle does not match a live reserved descriptor".into(),
            ));
        }

        let node = self.arena.get(alloc.node);
        let matches = node.reserved && node.offset == alloc.offset && node.size == alloc.size;
        if !matches {
            return Err(Error::Fail(
                "allocation handle does not match a live reserved descriptor".into(),
            ));
        }

        // Pre-pay for the gap-index insert at the end of this operation
        // before mutating anything: the merges below only ever remove
        // entries, so the only fallible growth left is this one, and it
        // must not be able to fail after state has already changed.
        self.gaps.grow_if_needed()?;

        self.num_allocs -= 1;
        self.alloc_size -= alloc.size;
        self.arena.get_mut(alloc.node).reserved = false;

        let mut result_id = alloc.node;

        // Forward merge: if `next` is free, it's absorbed into `result_id`.
        if let Some(next_id) = self.arena.get(result_id).next {
            if !self.arena.get(next_id).reserved {
                self.gaps.remove(next_id)?;
                let next_size = self.arena.get(next_id).size;
                self.arena.get_mut(result_id).size += next_size;
                self.head = list::unlink(&mut self.arena, next_id, self.head);
                self.arena.release(next_id);
            }
        }

        // Backward merge: if `prev` is free, `result_id` is absorbed into it.
        if let Some(prev_id) = self.arena.get(result_id).prev {
            if !self.arena.get(prev_id).reserved {
                self.gaps.remove(prev_id)?;
                let result_size = self.arena.get(result_id).size;
                self.arena.get_mut(prev_id).size += result_size;
                self.head = list::unlink(&mut self.arena, result_id, self.head);
                self.arena.release(result_id);
                result_id = prev_id;
            }
        }

        let final_size = self.arena.get(result_id).size;
        self.gaps.insert(result_id, final_size)?;

        debug!(
            "Pool {:?}: freed allocation at offset {} ({} bytes)",
            self.id, alloc.offset, alloc.size
        );

        Ok(())
    }

    /// Inspection contract: an ordered snapshot of every live region, in
    /// address order, as `(size, reserved)` pairs.
    pub fn inspect(&self) -> Vec<Segment> {
        list::iter(&self.arena, self.head)
            .map(|id| {
                let node = self.arena.get(id);
                Segment {
                    size: node.size,
                    reserved: node.reserved,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(size: u64, policy: Policy) -> Pool {
        Pool::open(PoolId(0), size, policy).unwrap()
    }

    #[test]
    fn zero_size_pool_fails() {
        assert!(Pool::open(PoolId(0), 0, Policy::BestFit).is_err());
    }

    #[test]
    fn zero_size_allocation_fails() {
        let mut pool = open(100, Policy::BestFit);
        assert!(pool.allocate(0).is_err());
    }

    #[test]
    fn exact_fit_consumes_entire_gap() {
        let mut pool = open(100, Policy::BestFit);
        let a = pool.allocate(100).unwrap();
        assert_eq!(a.offset(), 0);
        assert_eq!(pool.num_gaps(), 0);
        assert_eq!(pool.num_allocs(), 1);
        pool.free(a).unwrap();
        assert_eq!(pool.num_gaps(), 1);
        assert_eq!(pool.num_allocs(), 0);
    }

    #[test]
    fn over_request_is_no_space() {
        let mut pool = open(100, Policy::BestFit);
        assert_eq!(pool.allocate(200), Err(Error::NoSpace));
    }

    #[test]
    fn scenario_s1_s4_best_fit() {
        let mut pool = open(1000, Policy::BestFit);
        let a = pool.allocate(100).unwrap();
        let b = pool.allocate(200).unwrap();
        let c = pool.allocate(300).unwrap();

        assert_eq!(a.offset(), 0);
        assert_eq!(b.offset(), 100);
        assert_eq!(c.offset(), 300);
        assert_eq!(pool.num_allocs(), 3);
        assert_eq!(pool.alloc_size(), 600);
        assert_eq!(pool.num_gaps(), 1);
        assert_eq!(
            pool.inspect(),
            vec![
                Segment { size: 100, reserved: true },
                Segment { size: 200, reserved: true },
                Segment { size: 300, reserved: true },
                Segment { size: 400, reserved: false },
            ]
        );

        // S2
        pool.free(b).unwrap();
        assert_eq!(pool.num_gaps(), 2);
        assert_eq!(
            pool.inspect(),
            vec![
                Segment { size: 100, reserved: true },
                Segment { size: 200, reserved: false },
                Segment { size: 300, reserved: true },
                Segment { size: 400, reserved: false },
            ]
        );

        // S3
        pool.free(a).unwrap();
        assert_eq!(pool.num_gaps(), 2);
        assert_eq!(
            pool.inspect(),
            vec![
                Segment { size: 300, reserved: false },
                Segment { size: 300, reserved: true },
                Segment { size: 400, reserved: false },
            ]
        );

        // S4
        pool.free(c).unwrap();
        assert_eq!(pool.num_allocs(), 0);
        assert_eq!(pool.num_gaps(), 1);
        assert_eq!(
            pool.inspect(),
            vec![Segment { size: 1000, reserved: false }]
        );
    }

    #[test]
    fn scenario_s5_first_fit() {
        let mut pool = open(100, Policy::FirstFit);
        let first = pool.allocate(10).unwrap();
        let _second = pool.allocate(10).unwrap();
        pool.free(first).unwrap();
        let third = pool.allocate(5).unwrap();
        assert_eq!(third.offset(), 0);
        assert_eq!(
            pool.inspect()[0],
            Segment { size: 5, reserved: true }
        );
        assert_eq!(
            pool.inspect()[1],
            Segment { size: 5, reserved: false }
        );
    }

    #[test]
    fn free_of_foreign_allocation_fails() {
        let mut pool_a = Pool::open(PoolId(0), 100, Policy::BestFit).unwrap();
        let pool_b = Pool::open(PoolId(1), 100, Policy::BestFit).unwrap();
        let alloc_from_b = Allocation {
            pool: pool_b.id(),
            node: 0,
            offset: 0,
            size: 100,
        };
        assert!(pool_a.free(alloc_from_b).is_err());
    }

    #[test]
    fn double_free_fails() {
        let mut pool = open(100, Policy::BestFit);
        let a = pool.allocate(50).unwrap();
        pool.free(a).unwrap();
        assert!(pool.free(a).is_err());
    }

    #[test]
    fn allocate_free_identity_any_order() {
        let mut pool = open(1000, Policy::BestFit);
        let a = pool.allocate(100).unwrap();
        let b = pool.allocate(250).unwrap();
        let c = pool.allocate(50).unwrap();
        // free out of allocation order
        pool.free(b).unwrap();
        pool.free(a).unwrap();
        pool.free(c).unwrap();
        assert_eq!(pool.num_allocs(), 0);
        assert_eq!(pool.num_gaps(), 1);
        assert_eq!(pool.inspect(), vec![Segment { size: 1000, reserved: false }]);
    }
}
