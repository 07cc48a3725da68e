//! Placement policy selection for the allocator.

/// Rule used by [`Pool::allocate`](crate::pool::Pool::allocate) to pick which
/// free region satisfies a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Policy {
    /// Pick the smallest free region whose size is at least the requested
    /// size. Minimizes wasted remainder space at the cost of scanning the
    /// gap index.
    BestFit,
    /// Pick the first free region in address order whose size is at least
    /// the requested size.
    FirstFit,
}
