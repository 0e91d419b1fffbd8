mod alloc;
mod compare;
mod cursor;
mod node;
mod tree;
mod tree_iter;

pub use alloc::{AllocError, Allocator, Bounded, NodePool, Propagation, Unbounded};
pub use compare::{ByLess, Comparator, Natural, Reversed};
pub use cursor::Cursor;
pub use tree::BsTree;
pub use tree_iter::{IntoIter, Iter, Range};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// Where a descent for a key ended
enum Probe {
    /// The tree has no root
    Empty,
    /// A node compares equal to the key
    Found(node::Link),
    /// The key belongs in the empty `side` slot of `parent`
    Vacant { parent: node::Link, side: Side },
}
