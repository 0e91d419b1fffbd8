//! An ordered set kept in an unbalanced binary search tree.
//!
//! [`BsTree`] stores unique elements under a [`Comparator`] and hands out
//! [`Cursor`]s that stay valid across insertions and across the erasure of
//! other elements. Nodes are charged to an [`Allocator`], whose
//! [`Propagation`] policy decides what copy assignment, move assignment and
//! swap do with it. Allocation failure is reported as an [`AllocError`].
//!
//! The [`sorting`] module holds three standalone in-place sorts.
//!
//! ```
//! use bstree::BsTree;
//!
//! let mut tree: BsTree<i32> = [5, 3, 8, 1, 4, 7, 9].into();
//! tree.erase_key(&5);
//! assert_eq!(tree.get(tree.lower_bound(&6)), Some(&7));
//! assert_eq!(tree.get(tree.upper_bound(&4)), Some(&7));
//! assert_eq!(tree.iter().copied().collect::<Vec<_>>(), vec![1, 3, 4, 7, 8, 9]);
//! ```

#[cfg(test)]
mod tests;

mod bstree;

pub mod sorting;

#[cfg(feature = "workload")]
pub mod workload;

pub use crate::bstree::*;
