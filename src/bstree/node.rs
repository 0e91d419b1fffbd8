use super::alloc::{AllocError, Allocator, Propagation};
use slab::Slab;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of a node store, shared by every cursor handed out for it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct StoreId(u64);

impl StoreId {
    fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        StoreId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Slab key plus the stamp of the node it was created for.
/// Stamps are never reused within a store, so a link outlives its node
/// harmlessly even after the key is handed to another node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct Link {
    key: usize,
    stamp: u64,
}

/// Child links own the subtree below them, `parent` is only used to walk up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct Links {
    pub(super) left: Option<Link>,
    pub(super) right: Option<Link>,
    pub(super) parent: Option<Link>,
}

pub(super) struct Node<T> {
    pub(super) value: T,
    pub(super) links: Links,
}

enum Slot<T> {
    Occupied(Node<T>),
    /// The value was moved out but the links are still needed by a walk
    Relocated(Links),
}

struct Entry<T> {
    stamp: u64,
    slot: Slot<T>,
}

/// Slab holding every node of one tree.
///
/// Every entry (and every outstanding credit) is charged to `alloc` and
/// released when the entry is removed or the store is dropped.
pub(super) struct NodeStore<T> {
    id: StoreId,
    entries: Slab<Entry<T>>,
    next_stamp: u64,
    /// Nodes already acquired from the allocator but not created yet
    credit: usize,
    alloc: Allocator,
}

impl<T> NodeStore<T> {
    pub(super) fn new(alloc: Allocator) -> Self {
        NodeStore {
            id: StoreId::fresh(),
            entries: Slab::new(),
            next_stamp: 0,
            credit: 0,
            alloc,
        }
    }

    pub(super) fn id(&self) -> StoreId {
        self.id
    }

    pub(super) fn allocator(&self) -> &Allocator {
        &self.alloc
    }

    /// Keep the pool, change the policy
    pub(super) fn set_propagation(&mut self, propagation: Propagation) {
        self.alloc = self.alloc.clone().with_propagation(propagation);
    }

    /// Return the largest number of nodes a store can address
    pub(super) fn max_nodes() -> usize {
        isize::MAX as usize / std::mem::size_of::<Entry<T>>().max(1)
    }

    /// Acquire `additional` nodes up front, so that the next `additional`
    /// creations cannot fail for lack of storage
    pub(super) fn reserve(&mut self, additional: usize) -> Result<(), AllocError> {
        let wanted = additional.saturating_sub(self.credit);
        if wanted == 0 {
            return Ok(());
        }
        match self.entries.len().checked_add(self.credit + wanted) {
            Some(total) if total <= Self::max_nodes() => {}
            _ => return Err(AllocError::CapacityOverflow),
        }
        self.alloc.acquire(wanted)?;
        self.credit += wanted;
        self.entries.reserve(self.credit);
        Ok(())
    }

    /// Give back credit that was reserved but not used
    pub(super) fn shrink_credit(&mut self) {
        self.alloc.release(self.credit);
        self.credit = 0;
    }

    /// Allocate a node under `parent`, building its value with `make`.
    /// If `make` panics, the allocator charge is returned first
    pub(super) fn create_with<F>(&mut self, parent: Option<Link>, make: F) -> Result<Link, AllocError>
    where
        F: FnOnce() -> T,
    {
        self.charge()?;
        let charge = Charge {
            store: self,
            armed: true,
        };
        let value = make();
        Ok(charge.fill(Node {
            value,
            links: Links {
                left: None,
                right: None,
                parent,
            },
        }))
    }

    /// Allocate a node holding `value`
    pub(super) fn create(&mut self, parent: Option<Link>, value: T) -> Result<Link, AllocError> {
        self.create_with(parent, move || value)
    }

    /// Return whether `link` points to a node holding a value
    pub(super) fn contains(&self, link: Link) -> bool {
        self.try_node(link).is_some()
    }

    fn entry(&self, link: Link) -> Option<&Entry<T>> {
        self.entries
            .get(link.key)
            .filter(|entry| entry.stamp == link.stamp)
    }

    fn entry_mut(&mut self, link: Link) -> Option<&mut Entry<T>> {
        self.entries
            .get_mut(link.key)
            .filter(|entry| entry.stamp == link.stamp)
    }

    pub(super) fn try_node(&self, link: Link) -> Option<&Node<T>> {
        match self.entry(link) {
            Some(Entry {
                slot: Slot::Occupied(node),
                ..
            }) => Some(node),
            _ => None,
        }
    }

    /// Return the value at `link`.
    /// Panics if the link is dangling
    pub(super) fn value(&self, link: Link) -> &T {
        match self.try_node(link) {
            Some(node) => &node.value,
            None => panic!("{:?} does not point to a live node", link),
        }
    }

    /// Return the links of a live or relocated node.
    /// Panics if the link is dangling
    pub(super) fn links(&self, link: Link) -> &Links {
        match self.entry(link) {
            Some(Entry {
                slot: Slot::Occupied(node),
                ..
            }) => &node.links,
            Some(Entry {
                slot: Slot::Relocated(links),
                ..
            }) => links,
            None => panic!("{:?} points to a removed node", link),
        }
    }

    pub(super) fn links_mut(&mut self, link: Link) -> &mut Links {
        match self.entry_mut(link) {
            Some(Entry {
                slot: Slot::Occupied(node),
                ..
            }) => &mut node.links,
            Some(Entry {
                slot: Slot::Relocated(links),
                ..
            }) => links,
            None => panic!("{:?} points to a removed node", link),
        }
    }

    pub(super) fn left(&self, link: Link) -> Option<Link> {
        self.links(link).left
    }

    pub(super) fn right(&self, link: Link) -> Option<Link> {
        self.links(link).right
    }

    pub(super) fn parent(&self, link: Link) -> Option<Link> {
        self.links(link).parent
    }

    /// Descend to the leftmost node of the subtree at `link`
    pub(super) fn leftmost(&self, mut link: Link) -> Link {
        while let Some(left) = self.left(link) {
            link = left;
        }
        link
    }

    /// Descend to the rightmost node of the subtree at `link`
    pub(super) fn rightmost(&self, mut link: Link) -> Link {
        while let Some(right) = self.right(link) {
            link = right;
        }
        link
    }

    /// Move the value out of a node, keeping its links for an ongoing walk
    pub(super) fn relocate(&mut self, link: Link) -> T {
        let entry = match self.entry_mut(link) {
            Some(entry) => entry,
            None => panic!("{:?} points to a removed node", link),
        };
        let links = match &entry.slot {
            Slot::Occupied(node) => node.links,
            Slot::Relocated(_) => panic!("{:?} was already relocated", link),
        };
        match std::mem::replace(&mut entry.slot, Slot::Relocated(links)) {
            Slot::Occupied(node) => node.value,
            Slot::Relocated(_) => unreachable!(),
        }
    }

    /// Remove a node and return its allocator charge.
    /// The value (if it was not relocated) is handed back so that the caller
    /// decides when it gets dropped
    pub(super) fn free(&mut self, link: Link) -> Option<T> {
        if self.entry(link).is_none() {
            panic!("{:?} freed twice", link);
        }
        let entry = self.entries.remove(link.key);
        self.alloc.release(1);
        match entry.slot {
            Slot::Occupied(node) => Some(node.value),
            Slot::Relocated(_) => None,
        }
    }

    /// Free every node of the subtree rooted at `root` without recursion and
    /// return how many were freed. The subtree is detached from its parent.
    ///
    /// If dropping a value panics, the remaining nodes are still freed while
    /// unwinding
    pub(super) fn delete_subtree(&mut self, root: Link) -> usize {
        let mut guard = TeardownGuard {
            store: self,
            walk: Teardown {
                root,
                current: Some(root),
                freed: 0,
            },
        };
        while let Some(value) = guard.walk.free_next(&mut *guard.store) {
            drop(value);
        }
        guard.walk.freed
    }

    /// Take one credit, or charge one node to the allocator
    fn charge(&mut self) -> Result<(), AllocError> {
        if self.credit > 0 {
            self.credit -= 1;
            return Ok(());
        }
        if self.entries.len() >= Self::max_nodes() {
            return Err(AllocError::CapacityOverflow);
        }
        self.alloc.acquire(1)
    }
}

impl<T> Drop for NodeStore<T> {
    /// Nodes still present (only after an interrupted walk) are dropped with
    /// the slab, their charge is returned here
    fn drop(&mut self) {
        self.alloc.release(self.entries.len() + self.credit);
        self.credit = 0;
    }
}

/// A node charged to the allocator, waiting for its value
struct Charge<'a, T> {
    store: &'a mut NodeStore<T>,
    armed: bool,
}

impl<'a, T> Charge<'a, T> {
    fn fill(mut self, node: Node<T>) -> Link {
        self.armed = false;
        let stamp = self.store.next_stamp;
        self.store.next_stamp += 1;
        let key = self.store.entries.insert(Entry {
            stamp,
            slot: Slot::Occupied(node),
        });
        Link { key, stamp }
    }
}

impl<'a, T> Drop for Charge<'a, T> {
    fn drop(&mut self) {
        if self.armed {
            self.store.alloc.release(1);
        }
    }
}

/// Post-order walk freeing a subtree one leaf at a time
struct Teardown {
    root: Link,
    /// Where to resume the descent, `None` once `root` is freed
    current: Option<Link>,
    freed: usize,
}

impl Teardown {
    /// Descend while a child exists, then detach the leaf reached, free it
    /// and resume from its parent. Return the leaf's value, `None` inside if
    /// it was relocated
    fn free_next<T>(&mut self, store: &mut NodeStore<T>) -> Option<Option<T>> {
        let mut current = self.current?;
        loop {
            let links = *store.links(current);
            if let Some(left) = links.left {
                current = left;
            } else if let Some(right) = links.right {
                current = right;
            } else {
                if let Some(parent) = links.parent {
                    let parent_links = store.links_mut(parent);
                    if parent_links.left == Some(current) {
                        parent_links.left = None;
                    } else {
                        parent_links.right = None;
                    }
                }
                self.current = if current == self.root {
                    None
                } else {
                    links.parent
                };
                self.freed += 1;
                return Some(store.free(current));
            }
        }
    }
}

/// Keeps a teardown going if a value panics while being dropped
struct TeardownGuard<'a, T> {
    store: &'a mut NodeStore<T>,
    walk: Teardown,
}

impl<'a, T> Drop for TeardownGuard<'a, T> {
    fn drop(&mut self) {
        while let Some(value) = self.walk.free_next(&mut *self.store) {
            drop(value);
        }
    }
}
