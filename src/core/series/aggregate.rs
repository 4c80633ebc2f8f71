use itertools::Itertools;
use ordered_float::OrderedFloat;

impl<T> Aggregate for T where T: ?Sized {}

/// Reductions over plain `f64` values.
///
/// `NaN` values are skipped by every reduction, so that an undefined ratio never poisons
/// the statistic of the well-defined ones.
pub trait Aggregate {
    #[must_use]
    fn mean(self) -> Option<f64>
    where
        Self: Sized + IntoIterator<Item = f64>,
    {
        let (sum, count) = self
            .into_iter()
            .filter(|value| !value.is_nan())
            .fold((0.0, 0_u32), |(sum, count), value| (sum + value, count + 1));
        (count != 0).then(|| sum / f64::from(count))
    }

    #[must_use]
    fn median(self) -> Option<f64>
    where
        Self: Sized + IntoIterator<Item = f64>,
    {
        let values = self
            .into_iter()
            .filter(|value| !value.is_nan())
            .map(OrderedFloat)
            .sorted_unstable()
            .collect_vec();
        if values.is_empty() {
            None
        } else {
            let index = values.len() / 2;
            let index_value = values[index].0;
            if values.len() % 2 == 1 {
                Some(index_value)
            } else {
                Some((values[index - 1].0 + index_value) / 2.0)
            }
        }
    }

    /// Quantile with linear interpolation between the closest ranks.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn quantile(self, q: f64) -> Option<f64>
    where
        Self: Sized + IntoIterator<Item = f64>,
    {
        let values = self
            .into_iter()
            .filter(|value| !value.is_nan())
            .map(OrderedFloat)
            .sorted_unstable()
            .collect_vec();
        if values.is_empty() {
            return None;
        }
        let position = q.clamp(0.0, 1.0) * (values.len() - 1) as f64;
        let lower = position.floor() as usize;
        let upper = position.ceil() as usize;
        let fraction = position - position.floor();
        Some(values[lower].0 + (values[upper].0 - values[lower].0) * fraction)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    #[expect(clippy::float_cmp)]
    fn test_median_odd() {
        let median = vec![1.0, 0.0, 2.0].median().unwrap();
        assert_eq!(median, 1.0);
    }

    #[test]
    fn test_median_even() {
        let median = vec![1.0, 0.0, 2.0, 3.0].median().unwrap();
        assert_abs_diff_eq!(median, 1.5);
    }

    #[test]
    fn test_median_skips_nan() {
        let median = vec![f64::NAN, 4.0, 2.0].median().unwrap();
        assert_abs_diff_eq!(median, 3.0);
        assert!(vec![f64::NAN].median().is_none());
    }

    #[test]
    fn test_mean() {
        assert_abs_diff_eq!(vec![1.0, 2.0, f64::NAN, 6.0].mean().unwrap(), 3.0);
        assert!(Vec::<f64>::new().mean().is_none());
    }

    #[test]
    fn test_quantile() {
        let values = vec![0.0, 10.0, 20.0, 30.0, 40.0];
        assert_abs_diff_eq!(values.clone().quantile(0.5).unwrap(), 20.0);
        assert_abs_diff_eq!(values.clone().quantile(0.99).unwrap(), 39.6, epsilon = 1e-9);
        assert_abs_diff_eq!(values.clone().quantile(0.0).unwrap(), 0.0);
        assert_abs_diff_eq!(values.quantile(1.0).unwrap(), 40.0);
    }

    #[test]
    fn test_quantile_single() {
        assert_abs_diff_eq!(vec![7.0].quantile(0.99).unwrap(), 7.0);
        assert!(Vec::<f64>::new().quantile(0.99).is_none());
    }
}
