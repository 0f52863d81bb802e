//! Intrusive doubly linked list backed by `SlotArena`, with detachable nodes.
//!
//! Nodes live in a `SlotArena` and are linked by `SlotId`. Unlike a plain
//! linked list, a node can be *detached* from the chain while staying alive
//! in the arena, then linked again later under the same handle. The resource
//! cache uses this for pinning: a pinned node leaves the recency order but
//! keeps its bookkeeping.
//!
//! ## Architecture
//!
//! ```text
//!   arena (SlotArena<Node<T>>)
//!   ┌────────┬──────────────────────────────────────────────────────────┐
//!   │ SlotId │ Node { value, prev, next, linkage }                      │
//!   ├────────┼──────────────────────────────────────────────────────────┤
//!   │ id_1   │ { A, prev: None,       next: Some(id_3), Linked }        │
//!   │ id_2   │ { B, prev: None,       next: None,       Detached }      │
//!   │ id_3   │ { C, prev: Some(id_1), next: None,       Linked }        │
//!   └────────┴──────────────────────────────────────────────────────────┘
//!
//!   head ─► [id_1] ◄──► [id_3] ◄── tail        (id_2 alive, off-list)
//! ```
//!
//! ## Operations
//! - `push_front(v)` / `push_back(v)`: allocate + link
//! - `insert_detached(v)`: allocate only
//! - `unlink(id)` / `link_front(id)` / `link_back(id)`: change membership, keep node
//! - `move_to_front(id)`: bump a linked node
//! - `remove(id)`: unlink if needed + free slot
//!
//! All of the above are O(1). `debug_validate_invariants()` is available in
//! debug/test builds.

use crate::ds::slot_arena::{SlotArena, SlotId};

/// Whether a node currently sits in the list chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    Linked,
    Detached,
}

#[derive(Debug)]
struct Node<T> {
    value: T,
    prev: Option<SlotId>,
    next: Option<SlotId>,
    linkage: Linkage,
}

/// Intrusive list whose nodes can outlive their membership in the chain.
#[derive(Debug)]
pub struct IntrusiveList<T> {
    arena: SlotArena<Node<T>>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
    linked_len: usize,
}

impl<T> IntrusiveList<T> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self {
            arena: SlotArena::new(),
            head: None,
            tail: None,
            linked_len: 0,
        }
    }

    /// Creates an empty list with reserved node capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: SlotArena::with_capacity(capacity),
            head: None,
            tail: None,
            linked_len: 0,
        }
    }

    /// Returns the number of live nodes, linked or detached.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Returns the number of nodes currently in the chain.
    pub fn linked_len(&self) -> usize {
        self.linked_len
    }

    /// Returns `true` if there are no live nodes at all.
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Returns `true` if `id` is a live node (linked or detached).
    pub fn contains(&self, id: SlotId) -> bool {
        self.arena.contains(id)
    }

    /// Returns the membership of `id`, or `None` if it is not a live node.
    pub fn linkage(&self, id: SlotId) -> Option<Linkage> {
        self.arena.get(id).map(|node| node.linkage)
    }

    /// Returns `true` if `id` is live and in the chain.
    pub fn is_linked(&self, id: SlotId) -> bool {
        self.linkage(id) == Some(Linkage::Linked)
    }

    /// Returns the value at the front (MRU) of the chain.
    pub fn front(&self) -> Option<&T> {
        self.head.and_then(|id| self.get(id))
    }

    /// Returns the SlotId at the front (MRU) of the chain.
    pub fn front_id(&self) -> Option<SlotId> {
        self.head
    }

    /// Returns the value at the back (LRU) of the chain.
    pub fn back(&self) -> Option<&T> {
        self.tail.and_then(|id| self.get(id))
    }

    /// Returns the SlotId at the back (LRU) of the chain.
    pub fn back_id(&self) -> Option<SlotId> {
        self.tail
    }

    /// Returns the neighbour of `id` towards the front.
    pub fn prev_id(&self, id: SlotId) -> Option<SlotId> {
        self.arena.get(id).and_then(|node| node.prev)
    }

    /// Returns the neighbour of `id` towards the back.
    pub fn next_id(&self, id: SlotId) -> Option<SlotId> {
        self.arena.get(id).and_then(|node| node.next)
    }

    /// Returns the value for a node id, if present.
    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.arena.get(id).map(|node| &node.value)
    }

    /// Returns a mutable reference to a node value, if present.
    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.arena.get_mut(id).map(|node| &mut node.value)
    }

    /// Inserts a new node at the front and returns its `SlotId`.
    pub fn push_front(&mut self, value: T) -> SlotId {
        let id = self.insert_detached(value);
        self.attach_front(id);
        id
    }

    /// Inserts a new node at the back and returns its `SlotId`.
    pub fn push_back(&mut self, value: T) -> SlotId {
        let id = self.insert_detached(value);
        self.attach_back(id);
        id
    }

    /// Allocates a node without linking it.
    pub fn insert_detached(&mut self, value: T) -> SlotId {
        self.arena.insert(Node {
            value,
            prev: None,
            next: None,
            linkage: Linkage::Detached,
        })
    }

    /// Links a detached node at the front; returns `false` if absent or already linked.
    pub fn link_front(&mut self, id: SlotId) -> bool {
        if self.linkage(id) != Some(Linkage::Detached) {
            return false;
        }
        self.attach_front(id);
        true
    }

    /// Links a detached node at the back; returns `false` if absent or already linked.
    pub fn link_back(&mut self, id: SlotId) -> bool {
        if self.linkage(id) != Some(Linkage::Detached) {
            return false;
        }
        self.attach_back(id);
        true
    }

    /// Takes a linked node out of the chain, keeping it alive.
    ///
    /// Returns `false` if `id` is absent or already detached.
    pub fn unlink(&mut self, id: SlotId) -> bool {
        if !self.is_linked(id) {
            return false;
        }
        self.detach(id);
        true
    }

    /// Moves a linked node to the front; returns `false` if it is not linked.
    pub fn move_to_front(&mut self, id: SlotId) -> bool {
        if !self.is_linked(id) {
            return false;
        }
        if Some(id) == self.head {
            return true;
        }
        self.detach(id);
        self.attach_front(id);
        true
    }

    /// Removes and returns the back (LRU) value of the chain.
    pub fn pop_back(&mut self) -> Option<T> {
        let id = self.tail?;
        self.remove(id)
    }

    /// Frees the node `id`, unlinking it first if needed, and returns its value.
    pub fn remove(&mut self, id: SlotId) -> Option<T> {
        if self.is_linked(id) {
            self.detach(id);
        }
        self.arena.remove(id).map(|node| node.value)
    }

    /// Returns an iterator over linked values from front to back.
    pub fn iter(&self) -> IntrusiveListIter<'_, T> {
        IntrusiveListIter {
            list: self,
            current: self.head,
        }
    }

    /// Returns an iterator of linked SlotIds from front to back.
    pub fn iter_ids(&self) -> IntrusiveListIdIter<'_, T> {
        IntrusiveListIdIter {
            list: self,
            current: self.head,
        }
    }

    /// Returns every live node, linked or not, in arena order.
    pub fn iter_all(&self) -> impl Iterator<Item = (SlotId, &T, Linkage)> {
        self.arena
            .iter()
            .map(|(id, node)| (id, &node.value, node.linkage))
    }

    fn detach(&mut self, id: SlotId) {
        let (prev, next) = match self.arena.get(id) {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        if let Some(prev_id) = prev {
            if let Some(prev_node) = self.arena.get_mut(prev_id) {
                prev_node.next = next;
            }
        } else {
            self.head = next;
        }

        if let Some(next_id) = next {
            if let Some(next_node) = self.arena.get_mut(next_id) {
                next_node.prev = prev;
            }
        } else {
            self.tail = prev;
        }

        if let Some(node) = self.arena.get_mut(id) {
            node.prev = None;
            node.next = None;
            node.linkage = Linkage::Detached;
        }
        self.linked_len -= 1;
    }

    fn attach_front(&mut self, id: SlotId) {
        let old_head = self.head;
        match self.arena.get_mut(id) {
            Some(node) => {
                node.prev = None;
                node.next = old_head;
                node.linkage = Linkage::Linked;
            },
            None => return,
        }
        if let Some(old_head) = old_head {
            if let Some(head_node) = self.arena.get_mut(old_head) {
                head_node.prev = Some(id);
            }
        } else {
            self.tail = Some(id);
        }
        self.head = Some(id);
        self.linked_len += 1;
    }

    fn attach_back(&mut self, id: SlotId) {
        let old_tail = self.tail;
        match self.arena.get_mut(id) {
            Some(node) => {
                node.next = None;
                node.prev = old_tail;
                node.linkage = Linkage::Linked;
            },
            None => return,
        }
        if let Some(old_tail) = old_tail {
            if let Some(tail_node) = self.arena.get_mut(old_tail) {
                tail_node.next = Some(id);
            }
        } else {
            self.head = Some(id);
        }
        self.tail = Some(id);
        self.linked_len += 1;
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        if self.head.is_none() || self.tail.is_none() {
            assert!(self.head.is_none());
            assert!(self.tail.is_none());
            assert_eq!(self.linked_len, 0);
        }

        let mut seen = std::collections::HashSet::new();
        let mut count = 0usize;
        let mut current = self.head;
        let mut prev = None;

        while let Some(id) = current {
            assert!(seen.insert(id));
            let node = self.arena.get(id).expect("node missing");
            assert_eq!(node.linkage, Linkage::Linked);
            assert_eq!(node.prev, prev);
            if node.next.is_none() {
                assert_eq!(self.tail, Some(id));
            }

            prev = Some(id);
            current = node.next;
            count += 1;
            assert!(count <= self.linked_len);
        }
        assert_eq!(count, self.linked_len);

        for (id, node) in self.arena.iter() {
            if node.linkage == Linkage::Detached {
                assert!(!seen.contains(&id));
                assert!(node.prev.is_none() && node.next.is_none());
            }
        }
    }
}

/// Iterator over linked values from front to back.
pub struct IntrusiveListIter<'a, T> {
    list: &'a IntrusiveList<T>,
    current: Option<SlotId>,
}

impl<'a, T> Iterator for IntrusiveListIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let node = self.list.arena.get(id)?;
        self.current = node.next;
        Some(&node.value)
    }
}

/// Iterator over linked SlotIds from front to back.
pub struct IntrusiveListIdIter<'a, T> {
    list: &'a IntrusiveList<T>,
    current: Option<SlotId>,
}

impl<'a, T> Iterator for IntrusiveListIdIter<'a, T> {
    type Item = SlotId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let node = self.list.arena.get(id)?;
        self.current = node.next;
        Some(id)
    }
}

impl<T> Default for IntrusiveList<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values<T: Copy>(list: &IntrusiveList<T>) -> Vec<T> {
        list.iter().copied().collect()
    }

    #[test]
    fn intrusive_list_basic_ops() {
        let mut list = IntrusiveList::new();
        let a = list.push_front("a");
        let b = list.push_back("b");
        let c = list.push_back("c");

        assert_eq!(list.front(), Some(&"a"));
        assert_eq!(list.back(), Some(&"c"));
        assert_eq!(list.len(), 3);
        assert_eq!(list.linked_len(), 3);

        assert!(list.move_to_front(c));
        assert_eq!(values(&list), vec!["c", "a", "b"]);

        assert_eq!(list.remove(b), Some("b"));
        assert_eq!(list.pop_back(), Some("a"));
        assert_eq!(list.pop_back(), Some("c"));
        assert!(list.is_empty());
        assert!(!list.contains(a));
        list.debug_validate_invariants();
    }

    #[test]
    fn intrusive_list_unlink_keeps_node_alive() {
        let mut list = IntrusiveList::new();
        let a = list.push_back(1);
        let b = list.push_back(2);
        let c = list.push_back(3);

        assert!(list.unlink(b));
        assert_eq!(values(&list), vec![1, 3]);
        assert_eq!(list.len(), 3);
        assert_eq!(list.linked_len(), 2);
        assert_eq!(list.linkage(b), Some(Linkage::Detached));
        assert_eq!(list.get(b), Some(&2));
        assert_eq!(list.prev_id(c), Some(a));

        assert!(!list.unlink(b));
        assert!(!list.move_to_front(b));
        list.debug_validate_invariants();
    }

    #[test]
    fn intrusive_list_relink_front_and_back() {
        let mut list = IntrusiveList::new();
        let a = list.push_back("a");
        let b = list.push_back("b");
        let c = list.push_back("c");

        list.unlink(a);
        list.unlink(c);
        assert_eq!(values(&list), vec!["b"]);

        assert!(list.link_front(c));
        assert!(list.link_back(a));
        assert_eq!(values(&list), vec!["c", "b", "a"]);
        assert!(!list.link_front(b));
        assert_eq!(list.front_id(), Some(c));
        assert_eq!(list.back_id(), Some(a));
        list.debug_validate_invariants();
    }

    #[test]
    fn intrusive_list_insert_detached_then_link() {
        let mut list = IntrusiveList::new();
        let a = list.insert_detached(7);
        assert_eq!(list.len(), 1);
        assert_eq!(list.linked_len(), 0);
        assert_eq!(list.front(), None);

        assert!(list.link_front(a));
        assert_eq!(list.front(), Some(&7));
        assert_eq!(list.back(), Some(&7));
        list.debug_validate_invariants();
    }

    #[test]
    fn intrusive_list_remove_detached_node() {
        let mut list = IntrusiveList::new();
        let a = list.push_back(1);
        let b = list.push_back(2);
        list.unlink(a);

        assert_eq!(list.remove(a), Some(1));
        assert_eq!(list.len(), 1);
        assert_eq!(values(&list), vec![2]);
        assert!(list.is_linked(b));
        list.debug_validate_invariants();
    }

    #[test]
    fn intrusive_list_neighbour_walk_from_tail() {
        let mut list = IntrusiveList::new();
        let a = list.push_back('a');
        let b = list.push_back('b');
        let c = list.push_back('c');

        let mut walked = Vec::new();
        let mut cursor = list.back_id();
        while let Some(id) = cursor {
            walked.push(id);
            cursor = list.prev_id(id);
        }
        assert_eq!(walked, vec![c, b, a]);
        assert_eq!(list.next_id(a), Some(b));
    }

    #[test]
    fn intrusive_list_iter_all_reports_linkage() {
        let mut list = IntrusiveList::new();
        let a = list.push_back(1);
        let b = list.push_back(2);
        list.unlink(b);

        let all: Vec<_> = list.iter_all().map(|(id, v, l)| (id, *v, l)).collect();
        assert_eq!(
            all,
            vec![(a, 1, Linkage::Linked), (b, 2, Linkage::Detached)]
        );
        let ids: Vec<_> = list.iter_ids().collect();
        assert_eq!(ids, vec![a]);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: arbitrary op sequences keep the chain consistent
            #[cfg_attr(miri, ignore)]
            #[test]
            fn prop_ops_preserve_invariants(ops in prop::collection::vec((0u8..6, any::<u8>()), 0..200)) {
                let mut list = IntrusiveList::new();
                let mut ids: Vec<SlotId> = Vec::new();

                for (op, arg) in ops {
                    let pick = if ids.is_empty() { None } else { Some(ids[arg as usize % ids.len()]) };
                    match op {
                        0 => ids.push(list.push_front(arg)),
                        1 => ids.push(list.push_back(arg)),
                        2 => { if let Some(id) = pick { list.unlink(id); } },
                        3 => { if let Some(id) = pick { list.link_front(id); } },
                        4 => { if let Some(id) = pick { list.move_to_front(id); } },
                        _ => {
                            if let Some(id) = pick {
                                list.remove(id);
                                ids.retain(|other| *other != id);
                            }
                        },
                    }
                    list.debug_validate_invariants();
                    prop_assert!(list.linked_len() <= list.len());
                    prop_assert_eq!(list.len(), ids.len());
                }
            }
        }
    }
}
