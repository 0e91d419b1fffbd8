use super::node::{Link, NodeStore, StoreId};

/// A position in a tree, detached from any borrow of it.
///
/// Cursors are moved and dereferenced through the tree that produced them
/// (`BsTree::next`, `BsTree::prev`, `BsTree::get`). They survive every
/// mutation except the erasure of the element they denote; a cursor to an
/// erased element behaves as an invalid one.
#[derive(Clone, Copy, Debug)]
pub struct Cursor {
    pub(super) store: StoreId,
    pub(super) state: State,
}

#[derive(Clone, Copy, Debug)]
pub(super) enum State {
    /// On an element
    Valid(Link),
    /// One past the last element. Holds the maximum at the time the cursor
    /// was made (`None` for an empty tree)
    AfterEnd(Option<Link>),
    /// One before the first element. Never dereferenced
    Invalid,
}

impl Cursor {
    pub(super) fn valid(store: StoreId, link: Link) -> Self {
        Cursor {
            store,
            state: State::Valid(link),
        }
    }

    pub(super) fn after_end(store: StoreId, last: Option<Link>) -> Self {
        Cursor {
            store,
            state: State::AfterEnd(last),
        }
    }

    pub(super) fn invalid(store: StoreId) -> Self {
        Cursor {
            store,
            state: State::Invalid,
        }
    }

    /// Return whether the cursor was on an element when it was made.
    /// The element may have been erased since; use `BsTree::get` to check
    pub fn is_valid(&self) -> bool {
        matches!(self.state, State::Valid(_))
    }

    /// Return whether this is a past-the-end cursor
    pub fn is_after_end(&self) -> bool {
        matches!(self.state, State::AfterEnd(_))
    }

    /// Return whether the cursor fell off the front of the tree
    pub fn is_invalid(&self) -> bool {
        matches!(self.state, State::Invalid)
    }

    pub(super) fn link(&self) -> Option<Link> {
        match self.state {
            State::Valid(link) => Some(link),
            _ => None,
        }
    }
}

impl PartialEq for Cursor {
    /// Equal only when both come from the same tree, are in the same state and
    /// sit on the same node. Invalid cursors are never equal, not even to
    /// themselves: each one stands for its own "fell off the front" event
    fn eq(&self, other: &Self) -> bool {
        if self.store != other.store {
            return false;
        }
        match (self.state, other.state) {
            (State::Valid(a), State::Valid(b)) => a == b,
            (State::AfterEnd(a), State::AfterEnd(b)) => a == b,
            _ => false,
        }
    }
}

/// In-order successor of `link`
pub(super) fn successor<T>(store: &NodeStore<T>, link: Link) -> State {
    // Leftmost node of the right subtree
    if let Some(right) = store.right(link) {
        return State::Valid(store.leftmost(right));
    }

    // Climb while coming from a right child
    let mut current = link;
    loop {
        match store.parent(current) {
            // Reached the root from the right: `link` was the maximum
            None => return State::AfterEnd(Some(link)),
            Some(parent) if store.left(parent) == Some(current) => {
                return State::Valid(parent);
            }
            Some(parent) => current = parent,
        }
    }
}

/// In-order predecessor of `link`
pub(super) fn predecessor<T>(store: &NodeStore<T>, link: Link) -> State {
    // Rightmost node of the left subtree
    if let Some(left) = store.left(link) {
        return State::Valid(store.rightmost(left));
    }

    // Climb while coming from a left child
    let mut current = link;
    loop {
        match store.parent(current) {
            // Reached the root from the left: `link` was the minimum
            None => return State::Invalid,
            Some(parent) if store.right(parent) == Some(current) => {
                return State::Valid(parent);
            }
            Some(parent) => current = parent,
        }
    }
}
