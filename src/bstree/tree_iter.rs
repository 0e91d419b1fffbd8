use super::cursor::{self, State};
use super::node::{Link, NodeStore};
use super::BsTree;

/// Sorted iterator over references to the elements of a tree
pub struct Iter<'a, T> {
    store: &'a NodeStore<T>,
    /// Next node to return from the front and from the back
    front: Option<Link>,
    back: Option<Link>,
    /// Elements left between `front` and `back`, inclusive
    len: usize,
}

impl<'a, T> Iter<'a, T> {
    pub(super) fn new(
        store: &'a NodeStore<T>,
        front: Option<Link>,
        back: Option<Link>,
        len: usize,
    ) -> Self {
        Iter {
            store,
            front,
            back,
            len,
        }
    }
}

impl<'a, T> Clone for Iter<'a, T> {
    fn clone(&self) -> Self {
        Iter { ..*self }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        let link = self.front?;
        self.len -= 1;
        self.front = match cursor::successor(self.store, link) {
            State::Valid(next) => Some(next),
            _ => None,
        };
        Some(self.store.value(link))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        let link = self.back?;
        self.len -= 1;
        self.back = match cursor::predecessor(self.store, link) {
            State::Valid(previous) => Some(previous),
            _ => None,
        };
        Some(self.store.value(link))
    }
}

impl<'a, T> ExactSizeIterator for Iter<'a, T> {}
impl<'a, T> std::iter::FusedIterator for Iter<'a, T> {}

/// Iterator over the elements between two cursors
pub struct Range<'a, T> {
    store: &'a NodeStore<T>,
    next: Option<Link>,
    /// First node not to return, `None` to run to the end
    stop: Option<Link>,
}

impl<'a, T> Range<'a, T> {
    pub(super) fn new(store: &'a NodeStore<T>, first: Option<Link>, stop: Option<Link>) -> Self {
        Range {
            store,
            next: first,
            stop,
        }
    }
}

impl<'a, T> Iterator for Range<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let link = self.next?;
        if Some(link) == self.stop {
            self.next = None;
            return None;
        }
        self.next = match cursor::successor(self.store, link) {
            State::Valid(next) => Some(next),
            _ => None,
        };
        Some(self.store.value(link))
    }
}

impl<'a, T> std::iter::FusedIterator for Range<'a, T> {}

/// Owning iterator, in ascending order from the front
pub struct IntoIter<T, C> {
    tree: BsTree<T, C>,
}

impl<T, C> IntoIter<T, C> {
    pub(super) fn new(tree: BsTree<T, C>) -> Self {
        IntoIter { tree }
    }
}

impl<T, C> Iterator for IntoIter<T, C> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.tree.pop_first()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.tree.len(), Some(self.tree.len()))
    }
}

impl<T, C> DoubleEndedIterator for IntoIter<T, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.tree.pop_last()
    }
}

impl<T, C> ExactSizeIterator for IntoIter<T, C> {}
impl<T, C> std::iter::FusedIterator for IntoIter<T, C> {}

#[cfg(test)]
mod test {
    use super::*;

    fn helper_tree() -> BsTree<u32> {
        [50, 20, 80, 30, 25, 60, 70, 10, 90].into()
    }

    #[test]
    fn forward_and_backward() {
        let tree = helper_tree();
        let forward: Vec<_> = tree.iter().copied().collect();
        assert_eq!(forward, vec![10, 20, 25, 30, 50, 60, 70, 80, 90]);
        let backward: Vec<_> = tree.iter().rev().copied().collect();
        assert_eq!(backward, vec![90, 80, 70, 60, 50, 30, 25, 20, 10]);
    }

    #[test]
    fn meet_in_the_middle() {
        let tree = helper_tree();
        let mut iter = tree.iter();
        assert_eq!(iter.len(), 9);
        assert_eq!(iter.next(), Some(&10));
        assert_eq!(iter.next_back(), Some(&90));
        assert_eq!(iter.next_back(), Some(&80));
        assert_eq!(iter.len(), 6);
        let rest: Vec<_> = iter.by_ref().copied().collect();
        assert_eq!(rest, vec![20, 25, 30, 50, 60, 70]);
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
    }

    #[test]
    fn empty() {
        let tree: BsTree<u32> = BsTree::new();
        assert_eq!(tree.iter().next(), None);
        assert_eq!(tree.range(tree.begin(), tree.end()).next(), None);
        assert_eq!(tree.into_iter().next(), None);
    }

    #[test]
    fn range() {
        let tree = helper_tree();
        let values: Vec<_> = tree
            .range(tree.lower_bound(&25), tree.upper_bound(&60))
            .copied()
            .collect();
        assert_eq!(values, vec![25, 30, 50, 60]);

        let tail: Vec<_> = tree.range(tree.find(&70), tree.end()).copied().collect();
        assert_eq!(tail, vec![70, 80, 90]);

        let first = tree.find(&30);
        assert_eq!(tree.range(first, first).count(), 0);
    }

    #[test]
    fn into_iter() {
        let tree = helper_tree();
        let mut iter = tree.into_iter();
        assert_eq!(iter.len(), 9);
        assert_eq!(iter.next(), Some(10));
        assert_eq!(iter.next_back(), Some(90));
        let rest: Vec<_> = iter.collect();
        assert_eq!(rest, vec![20, 25, 30, 50, 60, 70, 80]);
    }

    #[test]
    fn into_iter_drops_the_rest() {
        let tree: BsTree<String> = ["b", "a", "c"].iter().map(|s| s.to_string()).collect();
        let alloc = tree.allocator().clone();
        let mut iter = tree.into_iter();
        assert_eq!(iter.next().as_deref(), Some("a"));
        assert_eq!(alloc.in_use(), 2);
        drop(iter);
        assert_eq!(alloc.in_use(), 0);
    }
}
