use std::ops::Range;

use itertools::Itertools;

impl<T> Deltas for T where T: ?Sized {}

pub trait Deltas {
    /// Pair the consecutive points and return the iterator over `(Range<K>, (V, V))`,
    /// where the values are those at the range start and end.
    fn pairwise<K, V>(self) -> impl Iterator<Item = (Range<K>, (V, V))>
    where
        Self: Iterator<Item = (K, V)> + Sized,
        K: Copy,
        V: Copy,
    {
        self.tuple_windows().map(|((from_index, from_value), (to_index, to_value))| {
            (from_index..to_index, (from_value, to_value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairwise() {
        let series = vec![(2, 100), (3, 200), (5, 600)];
        let pairs: Vec<_> = series.into_iter().pairwise().collect();
        assert_eq!(pairs, vec![(2..3, (100, 200)), (3..5, (200, 600))]);
    }
}
