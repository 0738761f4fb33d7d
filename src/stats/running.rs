/// Fixed-capacity moving average and variance
///
/// Keeps the last N values in a circular buffer. Until the buffer has been
/// filled once, only the values written so far take part in the statistics.
///
/// The buffer is allocated once; `set` never allocates.
#[derive(Debug, Clone)]
pub struct RunningStatistic {
    buffer: Vec<f64>,
    head: usize,
    count: usize,
    last: f64,
}

impl RunningStatistic {
    /// Create a statistic over a window of samples
    ///
    /// # Arguments
    /// * `capacity` - Number of most recent samples kept; zero is raised to one
    ///
    /// # Returns
    /// An empty statistic whose mean and variance read 0 until the first `set`
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(1)],
            head: 0,
            count: 0,
            last: 0.0,
        }
    }

    /// Overwrite the oldest slot with `value`
    pub fn set(&mut self, value: f64) {
        self.buffer[self.head] = value;
        self.head = (self.head + 1) % self.buffer.len();
        self.count = (self.count + 1).min(self.buffer.len());
        self.last = value;
    }

    /// Arithmetic mean of the valid samples, 0 when empty
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.valid().iter().sum::<f64>() / self.count as f64
    }

    /// Population variance of the valid samples
    ///
    /// # Arguments
    /// * `mean` - Centre to measure deviations from; `None` uses [`Self::mean`]
    ///
    /// # Returns
    /// The mean squared deviation, not its square root. See [`Self::std_dev`].
    pub fn variance(&self, mean: Option<f64>) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let m = mean.unwrap_or_else(|| self.mean());
        let sum_sq: f64 = self
            .valid()
            .iter()
            .map(|v| {
                let d = m - v;
                d * d
            })
            .sum();
        sum_sq / self.count as f64
    }

    /// Standard deviation about the current mean
    pub fn std_dev(&self) -> f64 {
        self.variance(None).sqrt()
    }

    /// Most recently written value
    pub fn last(&self) -> f64 {
        self.last
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    // Slots are filled from index 0, so the first `count` are the valid ones.
    fn valid(&self) -> &[f64] {
        &self.buffer[..self.count]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_statistic() {
        let stat = RunningStatistic::new(4);
        assert_eq!(stat.mean(), 0.0);
        assert_eq!(stat.variance(None), 0.0);
        assert!(stat.is_empty());
    }

    #[test]
    fn test_partial_window() {
        let mut stat = RunningStatistic::new(5);
        stat.set(1.0);
        stat.set(3.0);
        assert_eq!(stat.len(), 2);
        assert!((stat.mean() - 2.0).abs() < 1e-12);
        assert!((stat.variance(None) - 1.0).abs() < 1e-12);
        assert!((stat.std_dev() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_window_slides() {
        let mut stat = RunningStatistic::new(3);
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stat.set(v);
        }
        // (3+4+5)/3
        assert!((stat.mean() - 4.0).abs() < 1e-12);
        assert_eq!(stat.len(), 3);
        assert_eq!(stat.last(), 5.0);
    }

    #[test]
    fn test_constant_input_has_zero_variance() {
        for capacity in [1, 2, 7, 10, 64] {
            let mut stat = RunningStatistic::new(capacity);
            for _ in 0..(capacity * 2 + 1) {
                stat.set(-2.75);
            }
            assert!((stat.mean() + 2.75).abs() < 1e-12);
            assert!(stat.variance(None).abs() < 1e-12);
        }
    }

    #[test]
    fn test_variance_about_supplied_mean() {
        let mut stat = RunningStatistic::new(4);
        stat.set(2.0);
        stat.set(2.0);
        assert!((stat.variance(Some(0.0)) - 4.0).abs() < 1e-12);
    }
}
