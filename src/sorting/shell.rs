/// Decreasing gap sequences for `shell_sort_by`. Each ends with a gap of 1,
/// which makes the last pass a plain insertion sort
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapSequence {
    /// Ciura (2001), empirically derived
    Ciura2001,
    /// Tokuda (1992)
    Tokuda1992,
    /// Sedgewick (1986)
    Sedgewick1986,
}

impl GapSequence {
    pub fn gaps(self) -> &'static [usize] {
        match self {
            GapSequence::Ciura2001 => &[701, 301, 132, 57, 23, 10, 4, 1],
            GapSequence::Tokuda1992 => &[1182, 525, 233, 103, 46, 20, 9, 4, 1],
            GapSequence::Sedgewick1986 => &[1073, 281, 77, 23, 8, 1],
        }
    }
}

impl Default for GapSequence {
    fn default() -> Self {
        GapSequence::Ciura2001
    }
}

/// Sort a slice in ascending order with the default gap sequence. Not stable
pub fn shell_sort<T: Ord>(v: &mut [T]) {
    shell_sort_by(v, GapSequence::default(), |a, b| a < b);
}

/// Sort a slice with an "is less" predicate: an insertion sort over elements
/// `gap` apart, for each gap of the sequence in turn. Gaps not smaller than
/// the slice length are skipped
pub fn shell_sort_by<T, F>(v: &mut [T], gaps: GapSequence, mut is_less: F)
where
    F: FnMut(&T, &T) -> bool,
{
    for &gap in gaps.gaps() {
        for i in gap..v.len() {
            let mut j = i;
            while j >= gap && is_less(&v[j], &v[j - gap]) {
                v.swap(j, j - gap);
                j -= gap;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sorting::test_helpers::*;

    #[test]
    fn sorts_with_every_sequence() {
        for &gaps in &[
            GapSequence::Ciura2001,
            GapSequence::Tokuda1992,
            GapSequence::Sedgewick1986,
        ] {
            for &len in LENGTHS {
                let mut values = shuffled(len, 7 + len as u64);
                shell_sort_by(&mut values, gaps, |a, b| a < b);
                assert_eq!(values, (0..len as u32).collect::<Vec<_>>(), "{:?}", gaps);
            }
        }
    }

    #[test]
    fn sequences_end_with_one() {
        for &gaps in &[
            GapSequence::Ciura2001,
            GapSequence::Tokuda1992,
            GapSequence::Sedgewick1986,
        ] {
            assert_eq!(gaps.gaps().last(), Some(&1));
            assert!(gaps.gaps().windows(2).all(|w| w[0] > w[1]));
        }
    }

    #[test]
    fn duplicates() {
        let mut values = with_duplicates(2000, 11);
        shell_sort(&mut values);
        assert_stable(&values);

        let mut keys: Vec<u8> = with_duplicates(2000, 12).iter().map(|p| p.0).collect();
        shell_sort_by(&mut keys, GapSequence::Tokuda1992, |a, b| a < b);
        assert!(keys.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn no_clone_needed() {
        let mut values: Vec<String> = vec!["pear".into(), "fig".into(), "apple".into()];
        shell_sort(&mut values);
        assert_eq!(values, vec!["apple", "fig", "pear"]);
    }
}
