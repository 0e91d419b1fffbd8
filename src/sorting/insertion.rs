/// Sort a slice in ascending order. Stable, O(n) on sorted input, O(n²)
/// otherwise
pub fn insertion_sort<T: Ord>(v: &mut [T]) {
    insertion_sort_by(v, |a, b| a < b);
}

/// Sort a slice with an "is less" predicate, keeping equal elements in order
pub fn insertion_sort_by<T, F>(v: &mut [T], mut is_less: F)
where
    F: FnMut(&T, &T) -> bool,
{
    for i in 1..v.len() {
        // Sink v[i] into the sorted prefix
        let mut j = i;
        while j > 0 && is_less(&v[j], &v[j - 1]) {
            v.swap(j, j - 1);
            j -= 1;
        }
    }
}
