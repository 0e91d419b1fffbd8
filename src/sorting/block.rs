use super::insertion::insertion_sort_by;

/// Shortest block sorted before merging starts
const BLOCK: usize = 16;

/// Sort a slice in ascending order. Stable, no allocation
pub fn block_sort<T: Ord>(v: &mut [T]) {
    block_sort_by(v, |a, b| a < b);
}

/// Sort a slice with an "is less" predicate, keeping equal elements in order.
///
/// The slice is viewed as `p` virtual slots, `p` being the largest power of
/// two not above its length. Slot `s` maps to index `s * len / p`, so that
/// runs of 16 slots cover 16 to 31 elements. Those runs are insertion-sorted,
/// then merged pairwise in rounds of doubling width. A pair is merged with a
/// single rotation when its whole right run sorts before its left run, and
/// with an in-place symmetric merge otherwise.
pub fn block_sort_by<T, F>(v: &mut [T], mut is_less: F)
where
    F: FnMut(&T, &T) -> bool,
{
    let len = v.len();
    if len < BLOCK {
        insertion_sort_by(v, is_less);
        return;
    }

    let slots = 1usize << (usize::BITS - 1 - len.leading_zeros());
    let bound = |slot: usize| (slot as u128 * len as u128 / slots as u128) as usize;

    for start in (0..slots).step_by(BLOCK) {
        insertion_sort_by(&mut v[bound(start)..bound(start + BLOCK)], &mut is_less);
    }

    let mut width = BLOCK;
    while width < slots {
        for start in (0..slots).step_by(2 * width) {
            let low = bound(start);
            let mid = bound(start + width);
            let high = bound(start + 2 * width);
            if is_less(&v[high - 1], &v[low]) {
                v[low..high].rotate_left(mid - low);
            } else if is_less(&v[mid], &v[mid - 1]) {
                sym_merge(&mut v[low..high], mid - low, &mut is_less);
            }
        }
        width *= 2;
    }
}

/// Stable in-place merge of the sorted runs `v[..mid]` and `v[mid..]`
/// (Kim & Kutzner's SymMerge). Recursion depth is logarithmic in `v.len()`
fn sym_merge<T, F>(v: &mut [T], mid: usize, is_less: &mut F)
where
    F: FnMut(&T, &T) -> bool,
{
    let len = v.len();
    if mid == 0 || mid == len {
        return;
    }

    if mid == 1 {
        // Insert v[0] after every element of the right run smaller than it
        let (mut low, mut high) = (1, len);
        while low < high {
            let probe = (low + high) / 2;
            if is_less(&v[probe], &v[0]) {
                low = probe + 1;
            } else {
                high = probe;
            }
        }
        v[..low].rotate_left(1);
        return;
    }

    if len - mid == 1 {
        // Insert v[mid] before every element of the left run greater than it
        let (mut low, mut high) = (0, mid);
        while low < high {
            let probe = (low + high) / 2;
            if !is_less(&v[mid], &v[probe]) {
                low = probe + 1;
            } else {
                high = probe;
            }
        }
        v[low..].rotate_right(1);
        return;
    }

    // Find the split around the center that makes a rotation of
    // v[start..end] leave two independent merges
    let half = len / 2;
    let n = half + mid;
    let (mut start, mut r) = if mid > half { (n - len, half) } else { (0, mid) };
    let p = n - 1;
    while start < r {
        let c = (start + r) / 2;
        if !is_less(&v[p - c], &v[c]) {
            start = c + 1;
        } else {
            r = c;
        }
    }
    let end = n - start;

    if start < mid && mid < end {
        v[start..end].rotate_left(mid - start);
    }
    if 0 < start && start < half {
        sym_merge(&mut v[..half], start, is_less);
    }
    if half < end && end < len {
        sym_merge(&mut v[half..], end - half, is_less);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sorting::test_helpers::*;

    #[test]
    fn sorts() {
        for &len in LENGTHS {
            let mut values = shuffled(len, 42 + len as u64);
            block_sort(&mut values);
            assert_eq!(values, (0..len as u32).collect::<Vec<_>>(), "length {}", len);
        }
    }

    #[test]
    fn stable() {
        for &len in LENGTHS {
            let mut values = with_duplicates(len, len as u64);
            block_sort_by(&mut values, |a, b| a.0 < b.0);
            assert_stable(&values);
        }
    }

    #[test]
    fn presorted_and_reversed() {
        for &len in LENGTHS {
            let mut ascending: Vec<usize> = (0..len).collect();
            block_sort(&mut ascending);
            assert_eq!(ascending, (0..len).collect::<Vec<_>>());

            // Every merge of a reversed input is a whole-run rotation
            let mut descending: Vec<usize> = (0..len).rev().collect();
            block_sort(&mut descending);
            assert_eq!(descending, (0..len).collect::<Vec<_>>());
        }
    }

    #[test]
    fn block_boundaries() {
        // 40 elements in 32 slots: two blocks of 20
        let len = 40;
        let slots = 32;
        let bound = |slot: usize| slot * len / slots;
        assert_eq!((bound(0), bound(16), bound(32)), (0, 20, 40));
    }

    #[test]
    fn sym_merge_runs() {
        let mut values = vec![1, 4, 6, 9, 2, 3, 5, 7, 8, 10];
        sym_merge(&mut values, 4, &mut |a: &i32, b: &i32| a < b);
        assert_eq!(values, (1..=10).collect::<Vec<_>>());

        let mut values = vec![(1, 'a'), (1, 'b'), (0, 'c'), (1, 'd')];
        sym_merge(&mut values, 2, &mut |a: &(i32, char), b: &(i32, char)| a.0 < b.0);
        assert_eq!(values, vec![(0, 'c'), (1, 'a'), (1, 'b'), (1, 'd')]);
    }
}
