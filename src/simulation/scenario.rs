use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::path::Path;

use crate::config::PulseSensorConfig;
use crate::error::{Result, SensorError};
use crate::pulse::CalibrationTable;
use crate::wind::anemometer_heel_factor;

/// Sailing conditions for the simulated devices
///
/// Speeds in m/s, angles in radians, periods in seconds. The wind angle is
/// measured from the bow, positive to starboard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub seed: Option<u64>,
    pub true_wind_speed: f64,
    pub true_wind_angle: f64,
    pub boat_speed: f64,
    pub heading: f64,
    /// Mean roll, positive to starboard
    pub heel: f64,
    pub roll_amplitude: f64,
    pub roll_period: f64,
    pub pitch_amplitude: f64,
    pub pitch_period: f64,
    /// Standard deviation of each pulse period, as a fraction of the period
    pub pulse_jitter: f64,
    pub vane_noise_volts: f64,
    /// Standard deviation added to each IMU angle, radians
    pub imu_noise: f64,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            seed: None,
            true_wind_speed: 6.0,
            true_wind_angle: 45f64.to_radians(),
            boat_speed: 3.0,
            heading: 0.0,
            heel: 0.0,
            roll_amplitude: 3f64.to_radians(),
            roll_period: 4.0,
            pitch_amplitude: 2f64.to_radians(),
            pitch_period: 3.0,
            pulse_jitter: 0.02,
            vane_noise_volts: 0.01,
            imu_noise: 0.002,
        }
    }
}

impl Scenario {
    /// Flat water, no noise: every device reports exact values
    pub fn calm() -> Self {
        Self {
            roll_amplitude: 0.0,
            pitch_amplitude: 0.0,
            pulse_jitter: 0.0,
            vane_noise_volts: 0.0,
            imu_noise: 0.0,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_true_wind(mut self, speed: f64, angle: f64) -> Self {
        self.true_wind_speed = speed;
        self.true_wind_angle = angle;
        self
    }

    pub fn with_boat_speed(mut self, speed: f64) -> Self {
        self.boat_speed = speed;
        self
    }

    pub fn with_heel(mut self, heel: f64) -> Self {
        self.heel = heel;
        self
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| SensorError::Config(format!("invalid scenario: {}", e)))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            SensorError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Apparent wind speed and angle seen by a boat with no leeway
    pub fn apparent_wind(&self) -> (f64, f64) {
        let ahead = self.true_wind_speed * self.true_wind_angle.cos() + self.boat_speed;
        let abeam = self.true_wind_speed * self.true_wind_angle.sin();
        (ahead.hypot(abeam), abeam.atan2(ahead))
    }

    /// Masthead cup speed, before the heel corrections undo the tilt
    pub fn anemometer_speed(&self) -> f64 {
        let (speed, _) = self.apparent_wind();
        speed / (anemometer_heel_factor(self.heel.abs()) * self.heel.cos())
    }

    /// IMU yaw for the scenario heading, folded into (-π, π]
    pub fn imu_yaw(&self) -> f64 {
        crate::wind::normalize_angle(self.heading + TAU / 4.0)
    }

    /// Pulse frequency `sensor` produces at `speed`
    pub fn pulse_frequency(speed: f64, sensor: &PulseSensorConfig) -> Result<f64> {
        let table = CalibrationTable::new(sensor.calibration.clone())?;
        Ok(table.frequency_for(speed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::kn_to_ms;

    #[test]
    fn test_head_to_wind_adds_speeds() {
        let s = Scenario::calm().with_true_wind(5.0, 0.0).with_boat_speed(2.0);
        let (speed, angle) = s.apparent_wind();
        assert!((speed - 7.0).abs() < 1e-12);
        assert_eq!(angle, 0.0);
    }

    #[test]
    fn test_beam_wind_moves_forward() {
        let s = Scenario::calm()
            .with_true_wind(4.0, std::f64::consts::FRAC_PI_2)
            .with_boat_speed(3.0);
        let (speed, angle) = s.apparent_wind();
        assert!((speed - 5.0).abs() < 1e-12);
        assert!((angle - (4f64).atan2(3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_paddle_wheel_frequency() {
        let f = Scenario::pulse_frequency(kn_to_ms(6.0), &PulseSensorConfig::water()).unwrap();
        assert!((f - 33.0).abs() < 1e-9);
    }

    #[test]
    fn test_scenario_toml() {
        let s = Scenario::from_toml_str(
            r#"
            seed = 7
            true_wind_speed = 8.0
            heel = 0.2
            "#,
        )
        .unwrap();
        assert_eq!(s.seed, Some(7));
        assert_eq!(s.true_wind_speed, 8.0);
        assert_eq!(s.boat_speed, Scenario::default().boat_speed);
    }
}
