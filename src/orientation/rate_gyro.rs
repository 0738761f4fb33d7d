use crate::hardware::Vector3;
use crate::stats::RunningStatistic;

/// Smoothed body rates in rad/s
///
/// Rates are not circular, so all three axes use linear means.
#[derive(Debug, Clone)]
pub struct RateGyro {
    pub roll: RunningStatistic,
    pub pitch: RunningStatistic,
    pub yaw: RunningStatistic,
}

impl RateGyro {
    pub fn new(window: usize) -> Self {
        Self {
            roll: RunningStatistic::new(window),
            pitch: RunningStatistic::new(window),
            yaw: RunningStatistic::new(window),
        }
    }

    pub fn set(&mut self, gyro: &Vector3) {
        self.roll.set(gyro.x);
        self.pitch.set(gyro.y);
        self.yaw.set(gyro.z);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates_average_linearly() {
        let mut gyro = RateGyro::new(2);
        gyro.set(&Vector3::new(0.2, -0.1, 3.0));
        gyro.set(&Vector3::new(0.4, 0.1, -3.0));
        assert!((gyro.roll.mean() - 0.3).abs() < 1e-12);
        assert!(gyro.pitch.mean().abs() < 1e-12);
        assert!(gyro.yaw.mean().abs() < 1e-12);
    }
}
