use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;

/// A strict weak order between stored elements `T` and probe keys `Q`.
///
/// The tree needs `Comparator<T>` to place elements. Lookups accept any `Q`
/// for which `Comparator<T, Q>` is implemented too, which is what makes a
/// comparator "transparent".
pub trait Comparator<T: ?Sized, Q: ?Sized = T> {
    /// Order `element` relative to `key`
    fn compare(&self, element: &T, key: &Q) -> Ordering;
}

/// The natural `Ord` order, transparent over every borrowed form of `T`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Natural;

impl<T, Q> Comparator<T, Q> for Natural
where
    T: Borrow<Q> + ?Sized,
    Q: Ord + ?Sized,
{
    fn compare(&self, element: &T, key: &Q) -> Ordering {
        element.borrow().cmp(key)
    }
}

/// The reverse of the natural order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reversed;

impl<T, Q> Comparator<T, Q> for Reversed
where
    T: Borrow<Q> + ?Sized,
    Q: Ord + ?Sized,
{
    fn compare(&self, element: &T, key: &Q) -> Ordering {
        key.cmp(element.borrow())
    }
}

/// Adapt a "less than" predicate.
/// Two values are equivalent when neither is less than the other
#[derive(Clone, Copy)]
pub struct ByLess<F>(pub F);

impl<T, F> Comparator<T> for ByLess<F>
where
    T: ?Sized,
    F: Fn(&T, &T) -> bool,
{
    fn compare(&self, element: &T, key: &T) -> Ordering {
        if (self.0)(element, key) {
            Ordering::Less
        } else if (self.0)(key, element) {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }
}

impl<F> fmt::Debug for ByLess<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ByLess(..)")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn natural_is_transparent() {
        let owned = String::from("pear");
        assert_eq!(Natural.compare(&owned, "apple"), Ordering::Greater);
        assert_eq!(Natural.compare(&owned, "pear"), Ordering::Equal);
        assert_eq!(Natural.compare(&owned, &String::from("plum")), Ordering::Less);
    }

    #[test]
    fn reversed() {
        assert_eq!(Reversed.compare(&1, &2), Ordering::Greater);
        assert_eq!(Reversed.compare(&2, &2), Ordering::Equal);
    }

    #[test]
    fn by_less() {
        // Case-insensitive order
        let cmp = ByLess(|a: &&str, b: &&str| a.to_lowercase() < b.to_lowercase());
        assert_eq!(cmp.compare(&"Apple", &"banana"), Ordering::Less);
        assert_eq!(cmp.compare(&"APPLE", &"apple"), Ordering::Equal);
    }
}
