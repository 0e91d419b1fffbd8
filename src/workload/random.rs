use ordered_float::OrderedFloat;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use std::iter::{ExactSizeIterator, FusedIterator};

/// An iterator over the keys `0..num`, each exactly once, in an order that
/// depends only on `seed`
pub struct RandomKeys {
    keys: std::vec::IntoIter<u64>,
}

impl RandomKeys {
    pub fn new(num: usize, seed: u64) -> RandomKeys {
        let mut keys: Vec<u64> = (0..num as u64).collect();
        keys.shuffle(&mut Pcg64::seed_from_u64(seed));
        RandomKeys {
            keys: keys.into_iter(),
        }
    }
}

impl Iterator for RandomKeys {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        self.keys.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.keys.size_hint()
    }
}

impl FusedIterator for RandomKeys {}

impl ExactSizeIterator for RandomKeys {}

/// An iterator that will generate `num` random floats in `[0, 1)`, usable as
/// keys through their total order
pub struct RandomFloats {
    remaining: usize,
    rng: Pcg64,
}

impl RandomFloats {
    pub fn new(num: usize, seed: u64) -> RandomFloats {
        RandomFloats {
            remaining: num,
            rng: Pcg64::seed_from_u64(seed),
        }
    }
}

impl Iterator for RandomFloats {
    type Item = OrderedFloat<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(OrderedFloat(self.rng.gen()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl FusedIterator for RandomFloats {}

impl ExactSizeIterator for RandomFloats {}
