use super::alloc::{AllocError, Allocator};
use super::compare::{Comparator, Natural};
use super::cursor::{self, Cursor, State};
use super::node::{Link, NodeStore};
use super::tree_iter::{IntoIter, Iter, Range};
use super::{Probe, Side};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem;

/// An ordered set kept in an unbalanced binary search tree.
///
/// Elements are unique under the comparator `C`. Positions are handed out as
/// [`Cursor`]s, which stay usable across insertions and across the erasure of
/// any other element.
pub struct BsTree<T, C = Natural> {
    pub(super) store: NodeStore<T>,
    pub(super) root: Option<Link>,
    len: usize,
    /// Leftmost node, what `begin` points to
    pub(super) first: Option<Link>,
    /// Rightmost node, what `end` is one past
    pub(super) last: Option<Link>,
    compare: C,
}

impl<T, C: Default> BsTree<T, C> {
    /// Create an empty tree with a fresh unbounded allocator
    pub fn new() -> Self {
        BsTree::with_compare_and_allocator(C::default(), Allocator::new())
    }

    /// Create an empty tree drawing its nodes from `alloc`
    pub fn with_allocator(alloc: Allocator) -> Self {
        BsTree::with_compare_and_allocator(C::default(), alloc)
    }
}

impl<T, C> BsTree<T, C> {
    pub fn with_compare(compare: C) -> Self {
        BsTree::with_compare_and_allocator(compare, Allocator::new())
    }

    pub fn with_compare_and_allocator(compare: C, alloc: Allocator) -> Self {
        BsTree {
            store: NodeStore::new(alloc),
            root: None,
            len: 0,
            first: None,
            last: None,
            compare,
        }
    }

    /// Return the number of elements in the tree
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Return the largest number of elements a tree can hold
    pub fn max_size(&self) -> usize {
        NodeStore::<T>::max_nodes()
    }

    pub fn allocator(&self) -> &Allocator {
        self.store.allocator()
    }

    pub fn comparator(&self) -> &C {
        &self.compare
    }

    /// Return the number of edges plus one on the longest root-to-leaf path.
    /// Walks the whole tree without recursion
    pub fn height(&self) -> usize {
        let root = match self.root {
            Some(root) => root,
            None => return 0,
        };
        let mut height = 0;
        let mut depth = 1;
        let mut current = root;
        let mut previous: Option<Link> = None;
        loop {
            let links = *self.store.links(current);
            let next = if previous == links.parent {
                // Arrived from above
                height = height.max(depth);
                links.left.or(links.right).or(links.parent)
            } else if previous.is_some() && previous == links.left {
                links.right.or(links.parent)
            } else {
                links.parent
            };
            match next {
                None => return height,
                Some(next) => {
                    if Some(next) == links.parent {
                        depth -= 1;
                    } else {
                        depth += 1;
                    }
                    previous = Some(current);
                    current = next;
                }
            }
        }
    }

    /// Return a cursor to the smallest element, or `end()` when empty
    pub fn begin(&self) -> Cursor {
        match self.first {
            Some(first) => Cursor::valid(self.store.id(), first),
            None => self.end(),
        }
    }

    /// Return the past-the-end cursor
    pub fn end(&self) -> Cursor {
        Cursor::after_end(self.store.id(), self.last)
    }

    /// Return the element under the cursor, if it still exists
    pub fn get(&self, at: Cursor) -> Option<&T> {
        self.live_link(at).map(|link| self.store.value(link))
    }

    /// Move the cursor to the next element.
    /// Moving past the maximum gives `end()`; moving `end()` is a no-op
    pub fn next(&self, at: Cursor) -> Cursor {
        match at.state {
            State::Valid(_) => match self.live_link(at) {
                Some(link) => self.cursor_from(cursor::successor(&self.store, link)),
                None => Cursor::invalid(self.store.id()),
            },
            _ => at,
        }
    }

    /// Move the cursor to the previous element.
    /// Moving `end()` gives the maximum; moving before the minimum gives an
    /// invalid cursor
    pub fn prev(&self, at: Cursor) -> Cursor {
        match at.state {
            State::Valid(_) => match self.live_link(at) {
                Some(link) => self.cursor_from(cursor::predecessor(&self.store, link)),
                None => Cursor::invalid(self.store.id()),
            },
            State::AfterEnd(_) if at.store == self.store.id() => match self.last {
                Some(last) => Cursor::valid(self.store.id(), last),
                None => at,
            },
            _ => at,
        }
    }

    pub fn first(&self) -> Option<&T> {
        self.first.map(|link| self.store.value(link))
    }

    pub fn last(&self) -> Option<&T> {
        self.last.map(|link| self.store.value(link))
    }

    /// Return a sorted iterator over references to elements in the tree
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(&self.store, self.first, self.last, self.len)
    }

    /// Iterate over `[first, last)`.
    /// Panics if a cursor belongs to another tree
    pub fn range(&self, first: Cursor, last: Cursor) -> Range<'_, T> {
        assert!(
            first.store == self.store.id() && last.store == self.store.id(),
            "cursor from another tree"
        );
        let stop = match last.state {
            State::Valid(link) if self.store.contains(link) => Some(link),
            _ => None,
        };
        Range::new(&self.store, self.live_link(first), stop)
    }

    /// Erase the element under the cursor and return a cursor to its successor.
    /// Return `None` if the cursor is not on an element of this tree
    pub fn erase(&mut self, at: Cursor) -> Option<Cursor> {
        let link = self.live_link(at)?;
        let next = self.next(at);
        let value = self.unlink(link);
        // Relinking and bookkeeping are done: the value may now run its destructor
        drop(value);
        Some(if next.is_valid() { next } else { self.end() })
    }

    /// Erase every element in `[first, last)` and return the position after them
    pub fn erase_range(&mut self, first: Cursor, last: Cursor) -> Cursor {
        let mut current = first;
        while current != last {
            match self.erase(current) {
                Some(next) => current = next,
                None => break,
            }
        }
        current
    }

    /// Remove the element under the cursor and return it
    pub fn take(&mut self, at: Cursor) -> Option<T> {
        let link = self.live_link(at)?;
        Some(self.unlink(link))
    }

    pub fn pop_first(&mut self) -> Option<T> {
        let first = self.first?;
        Some(self.unlink(first))
    }

    pub fn pop_last(&mut self) -> Option<T> {
        let last = self.last?;
        Some(self.unlink(last))
    }

    /// Keep only the elements for which `keep` returns `true`, visiting them
    /// in ascending order
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&T) -> bool,
    {
        let mut current = self.first;
        while let Some(link) = current {
            current = match cursor::successor(&self.store, link) {
                State::Valid(next) => Some(next),
                _ => None,
            };
            if !keep(self.store.value(link)) {
                drop(self.unlink(link));
            }
        }
    }

    /// Remove every element. Runs in O(n) time and O(1) extra space
    pub fn clear(&mut self) {
        let root = self.root.take();
        self.len = 0;
        self.first = None;
        self.last = None;
        if let Some(root) = root {
            self.store.delete_subtree(root);
        }
    }

    pub(super) fn live_link(&self, at: Cursor) -> Option<Link> {
        if at.store != self.store.id() {
            return None;
        }
        at.link().filter(|&link| self.store.contains(link))
    }

    fn cursor_from(&self, state: State) -> Cursor {
        Cursor {
            store: self.store.id(),
            state,
        }
    }

    fn cursor(&self, link: Link) -> Cursor {
        Cursor::valid(self.store.id(), link)
    }

    fn attach_root(&mut self, link: Link) {
        debug_assert!(self.root.is_none());
        self.root = Some(link);
        self.first = Some(link);
        self.last = Some(link);
        self.len = 1;
    }

    /// Hang the parentless node `link` in the empty `side` slot of `parent`
    fn attach(&mut self, parent: Link, side: Side, link: Link) {
        self.store.links_mut(link).parent = Some(parent);
        let parent_links = self.store.links_mut(parent);
        match side {
            Side::Left => {
                debug_assert!(parent_links.left.is_none());
                parent_links.left = Some(link);
                if self.first == Some(parent) {
                    self.first = Some(link);
                }
            }
            Side::Right => {
                debug_assert!(parent_links.right.is_none());
                parent_links.right = Some(link);
                if self.last == Some(parent) {
                    self.last = Some(link);
                }
            }
        }
        self.len += 1;
    }

    /// Point whatever referenced `old` (its parent or the root) at `new`
    fn replace_child(&mut self, parent: Option<Link>, old: Link, new: Option<Link>) {
        match parent {
            None => self.root = new,
            Some(parent) => {
                let parent_links = self.store.links_mut(parent);
                if parent_links.left == Some(old) {
                    parent_links.left = new;
                } else {
                    debug_assert_eq!(parent_links.right, Some(old));
                    parent_links.right = new;
                }
            }
        }
    }

    /// Detach a node from the tree, fixing links, caches and `len`, then free
    /// its slot and hand back the value
    fn unlink(&mut self, link: Link) -> T {
        let links = *self.store.links(link);
        match (links.left, links.right) {
            (None, None) => {
                self.replace_child(links.parent, link, None);
                // A leaf minimum (maximum) is a left (right) child: its parent comes next
                if self.first == Some(link) {
                    self.first = links.parent;
                }
                if self.last == Some(link) {
                    self.last = links.parent;
                }
            }
            (None, Some(child)) | (Some(child), None) => {
                self.replace_child(links.parent, link, Some(child));
                self.store.links_mut(child).parent = links.parent;
                if self.first == Some(link) {
                    self.first = Some(self.store.leftmost(child));
                }
                if self.last == Some(link) {
                    self.last = Some(self.store.rightmost(child));
                }
            }
            (Some(left), Some(right)) => {
                // Alternate the promoted side so that erase/insert cycles do not
                // skew the tree in one direction
                let (promoted, grafted) = if self.len % 2 == 0 {
                    (left, right)
                } else {
                    (right, left)
                };
                if links.parent.is_none() {
                    log::trace!("erasing the root, {:?} takes over", promoted);
                }
                self.replace_child(links.parent, link, Some(promoted));
                self.store.links_mut(promoted).parent = links.parent;
                self.graft(promoted, grafted, promoted == left);
            }
        }

        self.len -= 1;
        match self.store.free(link) {
            Some(value) => value,
            None => unreachable!("unlinked a relocated node"),
        }
    }

    /// Insert the detached subtree `grafted` as a leaf below `into`.
    ///
    /// Every key of `grafted` is greater (`after` is true) or smaller than every
    /// key of `into`, so the comparator-guided descent always takes the same
    /// side: follow it down to the first free slot
    fn graft(&mut self, into: Link, grafted: Link, after: bool) {
        let (parent, side) = if after {
            (self.store.rightmost(into), Side::Right)
        } else {
            (self.store.leftmost(into), Side::Left)
        };
        log::trace!("grafting {:?} on the {:?} of {:?}", grafted, side, parent);
        let parent_links = self.store.links_mut(parent);
        match side {
            Side::Left => parent_links.left = Some(grafted),
            Side::Right => parent_links.right = Some(grafted),
        }
        self.store.links_mut(grafted).parent = Some(parent);
    }

    /// Exchange everything but the comparators
    fn swap_contents(&mut self, other: &mut Self) {
        mem::swap(&mut self.store, &mut other.store);
        mem::swap(&mut self.root, &mut other.root);
        mem::swap(&mut self.len, &mut other.len);
        mem::swap(&mut self.first, &mut other.first);
        mem::swap(&mut self.last, &mut other.last);
    }

    /// Rebuild `source` inside the empty `dest`, moving every value into a node
    /// of `dest`'s allocator. Same synchronized walk as `copy_walk`.
    /// `dest` must have reserved `source.len()` nodes; `source` is left empty
    fn move_walk(source: &mut Self, dest: &mut Self) -> Result<(), AllocError> {
        debug_assert!(dest.is_empty());
        let source_root = match source.root {
            Some(root) => root,
            None => return Ok(()),
        };
        let value = source.store.relocate(source_root);
        let root = dest.store.create(None, value)?;
        dest.attach_root(root);

        let mut from = source_root;
        let mut to = root;
        loop {
            let from_links = *source.store.links(from);
            let to_links = *dest.store.links(to);
            if let (Some(left), None) = (from_links.left, to_links.left) {
                let value = source.store.relocate(left);
                let copy = dest.store.create(Some(to), value)?;
                dest.store.links_mut(to).left = Some(copy);
                dest.len += 1;
                from = left;
                to = copy;
            } else if let (Some(right), None) = (from_links.right, to_links.right) {
                let value = source.store.relocate(right);
                let copy = dest.store.create(Some(to), value)?;
                dest.store.links_mut(to).right = Some(copy);
                dest.len += 1;
                from = right;
                to = copy;
            } else {
                match (from_links.parent, to_links.parent) {
                    (Some(from_parent), Some(to_parent)) => {
                        from = from_parent;
                        to = to_parent;
                    }
                    _ => break,
                }
            }
        }

        dest.first = Some(dest.store.leftmost(root));
        dest.last = Some(dest.store.rightmost(root));
        source.clear();
        Ok(())
    }
}

impl<T, C: Comparator<T>> BsTree<T, C> {
    /// Insert a value. Return a cursor to it and `true`, or a cursor to the
    /// equal element already present and `false` (the value is dropped)
    pub fn insert(&mut self, value: T) -> Result<(Cursor, bool), AllocError> {
        match self.probe(&value) {
            Probe::Found(existing) => Ok((self.cursor(existing), false)),
            Probe::Empty => {
                let link = self.store.create(None, value)?;
                self.attach_root(link);
                Ok((self.cursor(link), true))
            }
            Probe::Vacant { parent, side } => {
                let link = self.store.create(None, value)?;
                self.attach(parent, side, link);
                Ok((self.cursor(link), true))
            }
        }
    }

    /// Insert a value, starting the search from `hint`.
    ///
    /// From the hint, walk backward while the element is greater than
    /// `value` (or forward while it is smaller), then attach `value` right
    /// there when the needed child slot is free, or descend from there. A hint
    /// just after (or at) the final position makes this O(1).
    pub fn insert_hint(&mut self, hint: Cursor, value: T) -> Result<Cursor, AllocError> {
        let start = match self.hint_link(hint) {
            Some(start) => start,
            None => return self.insert(value).map(|(at, _)| at),
        };
        let position = self.walk_hint(start, &value);
        match self.probe_from(position, &value) {
            Probe::Found(existing) => Ok(self.cursor(existing)),
            Probe::Vacant { parent, side } => {
                let link = self.store.create(None, value)?;
                self.attach(parent, side, link);
                Ok(self.cursor(link))
            }
            Probe::Empty => unreachable!("probed from an existing node"),
        }
    }

    /// Build a value in a new node, then insert it.
    ///
    /// The node is built before its position is known. If an equal element is
    /// already present, or if the comparator panics, the new node is destroyed
    /// again
    pub fn emplace_with<F>(&mut self, make: F) -> Result<(Cursor, bool), AllocError>
    where
        F: FnOnce() -> T,
    {
        let link = self.store.create_with(None, make)?;
        let pending = Pending {
            tree: self,
            link,
            armed: true,
        };
        Ok(pending.settle(None))
    }

    /// Like `emplace_with`, starting the search from `hint` as `insert_hint` does
    pub fn emplace_hint_with<F>(&mut self, hint: Cursor, make: F) -> Result<Cursor, AllocError>
    where
        F: FnOnce() -> T,
    {
        let start = self.hint_link(hint);
        let link = self.store.create_with(None, make)?;
        let pending = Pending {
            tree: self,
            link,
            armed: true,
        };
        let position = start.map(|start| {
            let tree = &*pending.tree;
            tree.walk_hint(start, tree.store.value(link))
        });
        Ok(pending.settle(position).0)
    }

    /// Insert every value, stopping at the first allocation failure
    pub fn extend_from<I>(&mut self, values: I) -> Result<(), AllocError>
    where
        I: IntoIterator<Item = T>,
    {
        for value in values {
            self.push(value)?;
        }
        Ok(())
    }

    /// Insert a value, appending it in O(1) when it is a new maximum
    fn push(&mut self, value: T) -> Result<(), AllocError> {
        let is_max = match self.last {
            Some(last) => self.compare.compare(self.store.value(last), &value) == Ordering::Less,
            None => false,
        };
        if is_max {
            let end = self.end();
            self.insert_hint(end, value)?;
        } else {
            self.insert(value)?;
        }
        Ok(())
    }

    /// Return a cursor to the element equal to `key`, or `end()`
    pub fn find<Q: ?Sized>(&self, key: &Q) -> Cursor
    where
        C: Comparator<T, Q>,
    {
        match self.probe(key) {
            Probe::Found(link) => self.cursor(link),
            _ => self.end(),
        }
    }

    /// Return the element equal to `key`
    pub fn get_key<Q: ?Sized>(&self, key: &Q) -> Option<&T>
    where
        C: Comparator<T, Q>,
    {
        match self.probe(key) {
            Probe::Found(link) => Some(self.store.value(link)),
            _ => None,
        }
    }

    pub fn contains<Q: ?Sized>(&self, key: &Q) -> bool
    where
        C: Comparator<T, Q>,
    {
        matches!(self.probe(key), Probe::Found(_))
    }

    /// Return the number of elements equal to `key`: 0 or 1
    pub fn count<Q: ?Sized>(&self, key: &Q) -> usize
    where
        C: Comparator<T, Q>,
    {
        self.contains(key) as usize
    }

    /// Return a cursor to the first element not less than `key`, or `end()`
    pub fn lower_bound<Q: ?Sized>(&self, key: &Q) -> Cursor
    where
        C: Comparator<T, Q>,
    {
        let probe = match self.probe(key) {
            Probe::Empty => return self.end(),
            Probe::Found(link) => return self.cursor(link),
            Probe::Vacant { parent, .. } => parent,
        };
        self.walk_to_bound(probe, key, |ordering| ordering != Ordering::Less)
    }

    /// Return a cursor to the first element greater than `key`, or `end()`
    pub fn upper_bound<Q: ?Sized>(&self, key: &Q) -> Cursor
    where
        C: Comparator<T, Q>,
    {
        let probe = match self.probe(key) {
            Probe::Empty => return self.end(),
            Probe::Found(link) => return self.next(self.cursor(link)),
            Probe::Vacant { parent, .. } => parent,
        };
        self.walk_to_bound(probe, key, |ordering| ordering == Ordering::Greater)
    }

    /// Return `lower_bound(key)` and the position after it.
    /// Keys are unique, so the pair spans the element equal to `key` when
    /// there is one; otherwise it spans the first greater element
    pub fn equal_range<Q: ?Sized>(&self, key: &Q) -> (Cursor, Cursor)
    where
        C: Comparator<T, Q>,
    {
        let lower = self.lower_bound(key);
        (lower, self.next(lower))
    }

    /// Erase the element equal to `key`. Return the number erased: 0 or 1
    pub fn erase_key<Q: ?Sized>(&mut self, key: &Q) -> usize
    where
        C: Comparator<T, Q>,
    {
        match self.take_key(key) {
            Some(value) => {
                drop(value);
                1
            }
            None => 0,
        }
    }

    /// Remove the element equal to `key` and return it
    pub fn take_key<Q: ?Sized>(&mut self, key: &Q) -> Option<T>
    where
        C: Comparator<T, Q>,
    {
        match self.probe(key) {
            Probe::Found(link) => Some(self.unlink(link)),
            _ => None,
        }
    }

    /// Descend from the root
    fn probe<Q: ?Sized>(&self, key: &Q) -> Probe
    where
        C: Comparator<T, Q>,
    {
        match self.root {
            Some(root) => self.probe_from(root, key),
            None => Probe::Empty,
        }
    }

    /// Descend from `start`: smaller keys go left, greater ones go right
    fn probe_from<Q: ?Sized>(&self, start: Link, key: &Q) -> Probe
    where
        C: Comparator<T, Q>,
    {
        let mut current = start;
        loop {
            let (next, side) = match self.compare.compare(self.store.value(current), key) {
                Ordering::Greater => (self.store.left(current), Side::Left),
                Ordering::Less => (self.store.right(current), Side::Right),
                Ordering::Equal => return Probe::Found(current),
            };
            match next {
                Some(next) => current = next,
                None => {
                    return Probe::Vacant {
                        parent: current,
                        side,
                    }
                }
            }
        }
    }

    /// From `probe`, the last node of a failed descent for `key`, step to the
    /// first element for which `reached` holds
    fn walk_to_bound<Q: ?Sized, F>(&self, probe: Link, key: &Q, reached: F) -> Cursor
    where
        C: Comparator<T, Q>,
        F: Fn(Ordering) -> bool,
    {
        let reached_at = |link| reached(self.compare.compare(self.store.value(link), key));
        let mut position = probe;
        if reached_at(position) {
            // Step back while the predecessor still qualifies
            loop {
                match cursor::predecessor(&self.store, position) {
                    State::Valid(previous) if reached_at(previous) => position = previous,
                    _ => return self.cursor(position),
                }
            }
        } else {
            loop {
                match cursor::successor(&self.store, position) {
                    State::Valid(next) => {
                        position = next;
                        if reached_at(position) {
                            return self.cursor(position);
                        }
                    }
                    _ => return self.end(),
                }
            }
        }
    }

    /// Resolve a hint cursor to a starting node
    fn hint_link(&self, hint: Cursor) -> Option<Link> {
        if hint.store != self.store.id() {
            return None;
        }
        match hint.state {
            State::Valid(_) => self.live_link(hint),
            State::AfterEnd(_) => self.last,
            State::Invalid => self.first,
        }
    }

    /// Walk from `start` toward the position of `value`, stopping at the ends
    fn walk_hint(&self, start: Link, value: &T) -> Link {
        let mut position = start;
        if self.compare.compare(self.store.value(position), value) == Ordering::Greater {
            while Some(position) != self.first
                && self.compare.compare(self.store.value(position), value) == Ordering::Greater
            {
                match cursor::predecessor(&self.store, position) {
                    State::Valid(previous) => position = previous,
                    _ => break,
                }
            }
        } else {
            while Some(position) != self.last
                && self.compare.compare(self.store.value(position), value) == Ordering::Less
            {
                match cursor::successor(&self.store, position) {
                    State::Valid(next) => position = next,
                    _ => break,
                }
            }
        }
        position
    }
}

/// A node built ahead of its insertion. Dropping it while armed destroys the
/// node, so a duplicate or a panicking comparator does not leak it
struct Pending<'a, T, C> {
    tree: &'a mut BsTree<T, C>,
    link: Link,
    armed: bool,
}

impl<'a, T, C: Comparator<T>> Pending<'a, T, C> {
    /// Place the node by descending from `start` (or from the root)
    fn settle(mut self, start: Option<Link>) -> (Cursor, bool) {
        let tree = &mut *self.tree;
        let link = self.link;
        let value = tree.store.value(link);
        let probe = match start {
            Some(start) => tree.probe_from(start, value),
            None => tree.probe(value),
        };
        match probe {
            Probe::Empty => {
                self.armed = false;
                tree.attach_root(link);
                (tree.cursor(link), true)
            }
            Probe::Vacant { parent, side } => {
                self.armed = false;
                tree.attach(parent, side, link);
                (tree.cursor(link), true)
            }
            // Still armed: the speculative node goes away with `self`
            Probe::Found(existing) => (tree.cursor(existing), false),
        }
    }
}

impl<'a, T, C> Drop for Pending<'a, T, C> {
    fn drop(&mut self) {
        if self.armed {
            drop(self.tree.store.free(self.link));
        }
    }
}

impl<T: Clone, C: Clone> BsTree<T, C> {
    /// Deep-copy the tree into nodes from its own allocator
    pub fn try_clone(&self) -> Result<Self, AllocError> {
        self.try_clone_in(self.allocator().clone())
    }

    /// Deep-copy the tree into nodes from `alloc`. Nothing is left allocated
    /// on failure
    pub fn try_clone_in(&self, alloc: Allocator) -> Result<Self, AllocError> {
        let mut copy = BsTree::with_compare_and_allocator(self.compare.clone(), alloc);
        copy.store.reserve(self.len)?;
        self.copy_walk(&mut copy)?;
        copy.store.shrink_credit();
        Ok(copy)
    }

    /// Replace the contents with a copy of `other`.
    ///
    /// If this tree's allocator propagates on copy assignment, it is replaced by
    /// `other`'s; otherwise the copy is made in this tree's own allocator. On
    /// failure the tree is unchanged
    pub fn assign_from(&mut self, other: &Self) -> Result<(), AllocError> {
        let propagate = self.allocator().propagation().on_copy_assign;
        let alloc = if propagate {
            other.allocator().clone()
        } else {
            self.allocator().clone()
        };
        log::debug!(
            "copy-assigning {} element(s), propagating allocator: {}",
            other.len,
            propagate
        );
        let copy = other.try_clone_in(alloc)?;
        *self = copy;
        Ok(())
    }

}

impl<T, C: Clone> BsTree<T, C> {
    /// Move the contents of `other` here, leaving `other` empty.
    ///
    /// The nodes are taken over as they are when this tree's allocator
    /// propagates on move assignment or equals `other`'s. Otherwise every
    /// value is relocated into nodes from this tree's allocator. On failure both
    /// trees are unchanged
    pub fn move_assign(&mut self, other: &mut Self) -> Result<(), AllocError> {
        let propagate = self.allocator().propagation().on_move_assign;
        if propagate || self.allocator() == other.allocator() {
            log::debug!(
                "move-assigning {} element(s) by taking over nodes",
                other.len
            );
            let own_policy = self.allocator().propagation();
            let empty =
                BsTree::with_compare_and_allocator(other.compare.clone(), other.allocator().clone());
            let mut taken = mem::replace(other, empty);
            if !propagate {
                taken.store.set_propagation(own_policy);
            }
            *self = taken;
        } else {
            log::debug!(
                "move-assigning {} element(s) by relocation between allocators",
                other.len
            );
            let mut relocated =
                BsTree::with_compare_and_allocator(other.compare.clone(), self.allocator().clone());
            relocated.store.reserve(other.len)?;
            Self::move_walk(other, &mut relocated)?;
            relocated.store.shrink_credit();
            *self = relocated;
        }
        Ok(())
    }

    /// Build a tree using `alloc` out of the contents of `other`, which is
    /// left empty. On failure `other` is unchanged
    pub fn take_in(other: &mut Self, alloc: Allocator) -> Result<Self, AllocError> {
        if *other.allocator() == alloc {
            let empty = BsTree::with_compare_and_allocator(other.compare.clone(), alloc.clone());
            let mut taken = mem::replace(other, empty);
            taken.store.set_propagation(alloc.propagation());
            Ok(taken)
        } else {
            let mut relocated = BsTree::with_compare_and_allocator(other.compare.clone(), alloc);
            relocated.store.reserve(other.len)?;
            Self::move_walk(other, &mut relocated)?;
            relocated.store.shrink_credit();
            Ok(relocated)
        }
    }

    /// Exchange the contents of two trees.
    ///
    /// Nodes change hands when this tree's allocator propagates on swap or the
    /// allocators are equal; cursors then follow their elements into the other
    /// tree. Otherwise each tree keeps its allocator and the values are
    /// relocated, which can fail; on failure both trees are unchanged
    pub fn swap(&mut self, other: &mut Self) -> Result<(), AllocError> {
        let propagate = self.allocator().propagation().on_swap;
        if propagate || self.allocator() == other.allocator() {
            let (own_policy, other_policy) =
                (self.allocator().propagation(), other.allocator().propagation());
            mem::swap(&mut self.compare, &mut other.compare);
            self.swap_contents(other);
            if !propagate {
                self.store.set_propagation(own_policy);
                other.store.set_propagation(other_policy);
            }
            return Ok(());
        }

        log::debug!(
            "swapping {} and {} element(s) by relocation between allocators",
            self.len,
            other.len
        );
        let mut mine =
            BsTree::with_compare_and_allocator(other.compare.clone(), self.allocator().clone());
        mine.store.reserve(other.len)?;
        let mut theirs =
            BsTree::with_compare_and_allocator(self.compare.clone(), other.allocator().clone());
        theirs.store.reserve(self.len)?;
        Self::move_walk(other, &mut mine)?;
        Self::move_walk(self, &mut theirs)?;
        mine.store.shrink_credit();
        theirs.store.shrink_credit();
        *self = mine;
        *other = theirs;
        Ok(())
    }

}

impl<T: Clone, C> BsTree<T, C> {
    /// Copy this tree into the empty `dest` with an iterative pre-order walk
    /// over both trees in lockstep: copy the left child if the copy has none
    /// yet, else the right one, else climb in both
    fn copy_walk(&self, dest: &mut Self) -> Result<(), AllocError> {
        debug_assert!(dest.is_empty());
        let source_root = match self.root {
            Some(root) => root,
            None => return Ok(()),
        };
        let root = dest
            .store
            .create_with(None, || self.store.value(source_root).clone())?;
        dest.attach_root(root);

        let mut from = source_root;
        let mut to = root;
        loop {
            let from_links = *self.store.links(from);
            let to_links = *dest.store.links(to);
            if let (Some(left), None) = (from_links.left, to_links.left) {
                let copy = dest
                    .store
                    .create_with(Some(to), || self.store.value(left).clone())?;
                dest.store.links_mut(to).left = Some(copy);
                dest.len += 1;
                from = left;
                to = copy;
            } else if let (Some(right), None) = (from_links.right, to_links.right) {
                let copy = dest
                    .store
                    .create_with(Some(to), || self.store.value(right).clone())?;
                dest.store.links_mut(to).right = Some(copy);
                dest.len += 1;
                from = right;
                to = copy;
            } else {
                match (from_links.parent, to_links.parent) {
                    (Some(from_parent), Some(to_parent)) => {
                        from = from_parent;
                        to = to_parent;
                    }
                    _ => break,
                }
            }
        }

        dest.first = Some(dest.store.leftmost(root));
        dest.last = Some(dest.store.rightmost(root));
        Ok(())
    }
}

impl<T, C> Drop for BsTree<T, C> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: Clone, C: Clone> Clone for BsTree<T, C> {
    /// Panics if the allocator cannot provide the nodes
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(copy) => copy,
            Err(error) => panic!("cannot clone tree: {}", error),
        }
    }
}

impl<T, C: Default> Default for BsTree<T, C> {
    fn default() -> Self {
        BsTree::new()
    }
}

impl<T: fmt::Debug, C> fmt::Debug for BsTree<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: PartialEq, C> PartialEq for BsTree<T, C> {
    /// Same length and pairwise equal in order
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq, C> Eq for BsTree<T, C> {}

impl<T: PartialOrd, C> PartialOrd for BsTree<T, C> {
    /// Lexicographic order of the sorted sequences
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<T: Ord, C> Ord for BsTree<T, C> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<T: Hash, C> Hash for BsTree<T, C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len);
        for element in self.iter() {
            element.hash(state);
        }
    }
}

impl<T, C: Comparator<T>> Extend<T> for BsTree<T, C> {
    /// Panics if the allocator cannot provide the nodes
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        if let Err(error) = self.extend_from(iter) {
            panic!("cannot extend tree: {}", error);
        }
    }
}

impl<'a, T: Copy + 'a, C: Comparator<T>> Extend<&'a T> for BsTree<T, C> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<T, C: Comparator<T> + Default> std::iter::FromIterator<T> for BsTree<T, C> {
    /// Create a tree from an iterator. Runs of ascending values are appended
    /// in O(1) each
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tree = BsTree::new();
        tree.extend(iter);
        tree
    }
}

impl<T, C: Comparator<T> + Default, const N: usize> From<[T; N]> for BsTree<T, C> {
    fn from(values: [T; N]) -> Self {
        values.into_iter().collect()
    }
}

impl<T, C> IntoIterator for BsTree<T, C> {
    type Item = T;
    type IntoIter = IntoIter<T, C>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}

impl<'a, T, C> IntoIterator for &'a BsTree<T, C> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
