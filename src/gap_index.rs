//! C3: the gap index, a size-ordered index over the free regions of one pool.
//!
//! Kept sorted by size descending, ties broken by ascending descriptor
//! identity, on every mutation. The source sorts with an (incorrect) bubble
//! sort; nothing in the contract requires that particular algorithm, so this
//! uses the standard library's stable `sort_by`.

use crate::arena::NodeId;
use crate::config::PoolOptions;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy)]
struct GapEntry {
    size: u64,
    node: NodeId,
}

#[derive(Debug)]
pub(crate) struct GapIndex {
    entries: Vec<GapEntry>,
    capacity: usize,
    load_factor: f64,
    growth_factor: usize,
}

impl GapIndex {
    pub fn new(options: &PoolOptions) -> Result<Self> {
        let capacity = options.initial_gap_capacity;
        let mut entries = Vec::new();
        entries
            .try_reserve_exact(capacity)
            .map_err(|e| Error::Fail(format!("failed to allocate gap index: {e}")))?;
        Ok(Self {
            entries,
            capacity,
            load_factor: options.load_factor,
            growth_factor: options.growth_factor,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Grow the index if inserting one more entry would exceed the load
    /// factor. Exposed so a caller can pre-pay for an insert it hasn't
    /// constructed yet, before mutating any other state.
    pub(crate) fn grow_if_needed(&mut self) -> Result<()> {
        let capacity = self.capacity.max(1);
        if (self.entries.len() + 1) as f64 / capacity as f64 > self.load_factor {
            let new_capacity = capacity * self.growth_factor;
            trace!(
                "Growing gap index from {} to {} entries",
                capacity,
                new_capacity
            );
            let additional = new_capacity.saturating_sub(self.entries.len());
            self.entries
                .try_reserve(additional)
                .map_err(|e| Error::Fail(format!("failed to grow gap index: {e}")))?;
            self.capacity = new_capacity;
        }
        Ok(())
    }

    /// Insert a free region into the index, growing first if needed, then
    /// re-sort so the index stays size-descending with the identity tie-break.
    pub fn insert(&mut self, node: NodeId, size: u64) -> Result<()> {
        self.grow_if_needed()?;
        self.entries.push(GapEntry { size, node });
        self.sort();
        Ok(())
    }

    /// Remove the entry for `node` by identity. Swaps with the last logical
    /// entry (`Vec::swap_remove` is exactly this), then re-sorts.
    pub fn remove(&mut self, node: NodeId) -> Result<()> {
        let pos = self
            .entries
            .iter()
            .position(|e| e.node == node)
            .ok_or(Error::NotFound)?;
        self.entries.swap_remove(pos);
        self.sort();
        Ok(())
    }

    fn sort(&mut self) {
        self.entries
            .sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.node.cmp(&b.node)));
    }

    /// Find the best-fit candidate: the smallest free region with
    /// `size >= request`. Because entries are sorted size-descending, this
    /// is the last entry (in iteration order) satisfying the constraint;
    /// an exact match terminates the scan early.
    pub fn best_fit(&self, request: u64) -> Option<NodeId> {
        let mut best = None;
        for entry in &self.entries {
            if entry.size >= request {
                best = Some(entry.node);
                if entry.size == request {
                    break;
                }
            } else {
                // sorted descending: nothing further can satisfy the request
                break;
            }
        }
        best
    }

    #[cfg(test)]
    pub fn is_sorted_descending_with_identity_tiebreak(&self) -> bool {
        self.entries.windows(2).all(|w| {
            w[0].size > w[1].size || (w[0].size == w[1].size && w[0].node <= w[1].node)
        })
    }
}
