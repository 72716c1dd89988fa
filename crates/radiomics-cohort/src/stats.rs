/// Summary of one feature's values across a set of patients.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FeatureStats {
    /// Number of values summarized.
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Upper median for even counts.
    pub median: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}

impl FeatureStats {
    /// Computes the summary of unsorted values, ignoring NaNs.
    ///
    /// Returns `None` when no value remains.
    ///
    /// # Examples
    ///
    /// ```
    /// # use radiomics_cohort::stats::FeatureStats;
    /// let stats = FeatureStats::new([4.0, 1.0, 3.0, 2.0, f64::NAN]).unwrap();
    /// assert_eq!(stats.count, 4);
    /// assert_eq!(stats.min, 1.0);
    /// assert_eq!(stats.median, 3.0);
    /// assert_eq!(stats.mean, 2.5);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut values = values
            .into_iter()
            .filter(|v| !v.is_nan())
            .collect::<Vec<_>>();
        values.sort_by(f64::total_cmp);

        let min = *values.first()?;
        let max = *values.last()?;
        let count = values.len();
        let n = count as f64;
        let mean = values.iter().sum::<f64>() / n;
        let median = values[count / 2];
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        Some(Self {
            count,
            min,
            max,
            mean,
            median,
            std_dev: variance.sqrt(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values() {
        assert!(FeatureStats::new([]).is_none());
        assert!(FeatureStats::new([f64::NAN]).is_none());
    }

    #[test]
    fn test_single_value() {
        let stats = FeatureStats::new([7.5]).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.min, 7.5);
        assert_eq!(stats.max, 7.5);
        assert_eq!(stats.median, 7.5);
        assert_eq!(stats.std_dev, 0.0);
    }

    #[test]
    fn test_spread() {
        let stats = FeatureStats::new([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(stats.mean, 5.0);
        assert!((stats.std_dev - 2.0).abs() < 1e-12);
        assert_eq!(stats.median, 5.0);
    }
}
