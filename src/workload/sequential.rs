use std::iter::{ExactSizeIterator, FusedIterator};

/// An iterator over the keys `0..num`, each exactly once, in a fixed order
pub struct SequentialKeys {
    position: usize,
    num: usize,
    order: SequentialOrder,
}

pub enum SequentialOrder {
    Ascending,
    Descending,
    /// Alternate between the smallest and the largest key not yet produced:
    /// 0, num-1, 1, num-2, ...
    ZigZag,
}

impl SequentialKeys {
    pub fn new(num: usize, order: SequentialOrder) -> SequentialKeys {
        SequentialKeys {
            position: 0,
            num,
            order,
        }
    }
}

impl Iterator for SequentialKeys {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position == self.num {
            return None;
        }
        let i = self.position;
        self.position += 1;
        let key = match self.order {
            SequentialOrder::Ascending => i,
            SequentialOrder::Descending => self.num - 1 - i,
            SequentialOrder::ZigZag if i % 2 == 0 => i / 2,
            SequentialOrder::ZigZag => self.num - 1 - i / 2,
        };
        Some(key as u64)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let size = self.num - self.position;
        (size, Some(size))
    }
}

impl FusedIterator for SequentialKeys {}

impl ExactSizeIterator for SequentialKeys {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn orders() {
        let keys: Vec<_> = SequentialKeys::new(5, SequentialOrder::Descending).collect();
        assert_eq!(keys, vec![4, 3, 2, 1, 0]);
        let keys: Vec<_> = SequentialKeys::new(5, SequentialOrder::ZigZag).collect();
        assert_eq!(keys, vec![0, 4, 1, 3, 2]);
        let keys: Vec<_> = SequentialKeys::new(4, SequentialOrder::ZigZag).collect();
        assert_eq!(keys, vec![0, 3, 1, 2]);
    }
}
