//! In-place slice sorts that do not allocate.
//!
//! Every routine takes an "is less" predicate, the same contract as the
//! comparator of a [`BsTree`](crate::BsTree) built with [`ByLess`](crate::ByLess).

mod block;
mod insertion;
mod shell;

pub use block::{block_sort, block_sort_by};
pub use insertion::{insertion_sort, insertion_sort_by};
pub use shell::{shell_sort, shell_sort_by, GapSequence};

#[cfg(test)]
mod test_helpers {
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64;

    /// Slice lengths around the interesting boundaries of the three sorts
    pub(super) const LENGTHS: &[usize] = &[
        0, 1, 2, 3, 7, 15, 16, 17, 31, 32, 33, 63, 64, 65, 100, 128, 255, 256, 257, 1000, 1024,
        3001,
    ];

    /// Return `len` values in `0..len`, shuffled deterministically
    pub(super) fn shuffled(len: usize, seed: u64) -> Vec<u32> {
        let mut values: Vec<u32> = (0..len as u32).collect();
        values.shuffle(&mut Pcg64::seed_from_u64(seed));
        values
    }

    /// Return `len` (key, position) pairs with many repeated keys
    pub(super) fn with_duplicates(len: usize, seed: u64) -> Vec<(u8, usize)> {
        let mut rng = Pcg64::seed_from_u64(seed);
        (0..len).map(|i| (rng.gen_range(0, 8), i)).collect()
    }

    /// Assert that pairs are sorted by key, and by original position among
    /// equal keys
    pub(super) fn assert_stable(values: &[(u8, usize)]) {
        for pair in values.windows(2) {
            assert!(pair[0] <= pair[1], "{:?} out of order", pair);
        }
    }
}
