use super::RunningStatistic;

/// Circular mean over angles
///
/// Angles are averaged through their sine and cosine components so that
/// values either side of the ±π wrap average correctly (170° and -170° give
/// 180°, not 0°).
///
/// Two entry points feed the same statistics:
/// - [`AngularStatistic::set`] decomposes an angle in radians.
/// - [`AngularStatistic::set_sc`] stores components that are already
///   normalized, such as sine/cosine potentiometer voltage ratios.
#[derive(Debug, Clone)]
pub struct AngularStatistic {
    sin: RunningStatistic,
    cos: RunningStatistic,
    last: f64,
}

impl AngularStatistic {
    pub fn new(capacity: usize) -> Self {
        Self {
            sin: RunningStatistic::new(capacity),
            cos: RunningStatistic::new(capacity),
            last: 0.0,
        }
    }

    /// Add an angle in radians
    pub fn set(&mut self, angle: f64) {
        self.sin.set(angle.sin());
        self.cos.set(angle.cos());
        self.last = angle;
    }

    /// Add pre-normalized sine and cosine components
    pub fn set_sc(&mut self, sin: f64, cos: f64) {
        self.sin.set(sin);
        self.cos.set(cos);
        self.last = sin.atan2(cos);
    }

    /// Circular mean in (-π, π], 0 when there is no resultant
    pub fn mean(&self) -> f64 {
        let s = self.sin.mean();
        let c = self.cos.mean();
        if s == 0.0 && c == 0.0 {
            return 0.0;
        }
        s.atan2(c)
    }

    /// Spread of the components: sine and cosine variances combined in quadrature
    ///
    /// An approximation, not the circular standard deviation.
    pub fn stdev(&self) -> f64 {
        let cos_var = self.cos.variance(None);
        let sin_var = self.sin.variance(None);
        (cos_var * cos_var + sin_var * sin_var).sqrt()
    }

    /// Most recent raw angle
    pub fn last(&self) -> f64 {
        self.last
    }

    pub fn sin_mean(&self) -> f64 {
        self.sin.mean()
    }

    pub fn cos_mean(&self) -> f64 {
        self.cos.mean()
    }

    pub fn sin(&self) -> &RunningStatistic {
        &self.sin
    }

    pub fn cos(&self) -> &RunningStatistic {
        &self.cos
    }
}
