//! C2: the region list, a doubly-linked list of descriptors threaded
//! through the node arena, ordered by address within the pool.
//!
//! This module only ever touches `next`/`prev`/`offset`; it never allocates
//! or frees a slot itself (that's C1's job) and never decides policy (C4/C5).

use crate::arena::{Arena, NodeId};

/// Splice `new_id` into the list immediately after `after_id`.
///
/// Used by the placement engine (C4) when a split produces a remainder
/// region: `after_id` is the region that was just reserved, `new_id` is the
/// fresh remainder.
pub(crate) fn insert_after(arena: &mut Arena, after_id: NodeId, new_id: NodeId) {
    let old_next = arena.get(after_id).next;
    arena.get_mut(new_id).prev = Some(after_id);
    arena.get_mut(new_id).next = old_next;
    if let Some(next_id) = old_next {
        arena.get_mut(next_id).prev = Some(new_id);
    }
    arena.get_mut(after_id).next = Some(new_id);
}

/// Unlink `id` from the list, stitching its neighbors together directly.
///
/// Used by the coalescing engine (C5) when one free neighbor absorbs
/// another's range: the absorbed node is unlinked here, then released back
/// to the arena by the caller. If `id` was the head, the new head is
/// returned so the caller can update the pool's head pointer.
pub(crate) fn unlink(arena: &mut Arena, id: NodeId, head: Option<NodeId>) -> Option<NodeId> {
    let prev = arena.get(id).prev;
    let next = arena.get(id).next;
    if let Some(prev_id) = prev {
        arena.get_mut(prev_id).next = next;
    }
    if let Some(next_id) = next {
        arena.get_mut(next_id).prev = prev;
    }
    if head == Some(id) {
        next
    } else {
        head
    }
}

/// Iterate live descriptor ids from `head` in address order.
pub(crate) fn iter(arena: &Arena, head: Option<NodeId>) -> ListIter<'_> {
    ListIter {
        arena,
        current: head,
    }
}

pub(crate) struct ListIter<'a> {
    arena: &'a Arena,
    current: Option<NodeId>,
}

impl Iterator for ListIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.current?;
        self.current = self.arena.get(id).next;
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Node;
    use crate::config::PoolOptions;

    fn node(offset: u64, size: u64) -> Node {
        Node {
            offset,
            size,
            reserved: false,
            live: false,
            prev: None,
            next: None,
        }
    }

    #[test]
    fn insert_after_splices_correctly() {
        let mut arena = Arena::new(&PoolOptions::default()).unwrap();
        let a = arena.reserve(node(0, 100)).unwrap();
        let b = arena.reserve(node(100, 50)).unwrap();
        // list is just [a] initially, with b spliced in after a
        insert_after(&mut arena, a, b);
        assert_eq!(arena.get(a).next, Some(b));
        assert_eq!(arena.get(b).prev, Some(a));
        assert_eq!(arena.get(b).next, None);

        let ids: Vec<_> = iter(&arena, Some(a)).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn unlink_middle_node_stitches_neighbors() {
        let mut arena = Arena::new(&PoolOptions::default()).unwrap();
        let a = arena.reserve(node(0, 100)).unwrap();
        let b = arena.reserve(node(100, 50)).unwrap();
        let c = arena.reserve(node(150, 50)).unwrap();
        insert_after(&mut arena, a, b);
        insert_after(&mut arena, b, c);

        let head = unlink(&mut arena, b, Some(a));
        assert_eq!(head, Some(a));
        assert_eq!(arena.get(a).next, Some(c));
        assert_eq!(arena.get(c).prev, Some(a));
    }

    #[test]
    fn unlink_head_returns_new_head() {
        let mut arena = Arena::new(&PoolOptions::default()).unwrap();
        let a = arena.reserve(node(0, 100)).unwrap();
        let b = arena.reserve(node(100, 50)).unwrap();
        insert_after(&mut arena, a, b);

        let head = unlink(&mut arena, a, Some(a));
        assert_eq!(head, Some(b));
        assert_eq!(arena.get(b).prev, None);
    }
}
