use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use super::{Scenario, make_rng};
use crate::config::WindVaneConfig;
use crate::error::{Result, SensorError};
use crate::hardware::AnalogConverter;

/// Sine/cosine vane potentiometers reporting the scenario's apparent wind
pub struct SimulatedAdc {
    sin_channel: u8,
    cos_channel: u8,
    sin_volts: f64,
    cos_volts: f64,
    noise: Option<Normal<f64>>,
    rng: ChaCha8Rng,
}

impl SimulatedAdc {
    pub fn new(scenario: &Scenario, vane: &WindVaneConfig) -> Self {
        let (_, angle) = scenario.apparent_wind();
        let to_volts = |component: f64, min: f64, max: f64| min + (component + 1.0) / 2.0 * (max - min);
        Self {
            sin_channel: vane.sin_channel,
            cos_channel: vane.cos_channel,
            sin_volts: to_volts(angle.sin(), vane.sin.min, vane.sin.max),
            cos_volts: to_volts(angle.cos(), vane.cos.min, vane.cos.max),
            noise: Normal::new(0.0, scenario.vane_noise_volts)
                .ok()
                .filter(|_| scenario.vane_noise_volts > 0.0),
            rng: make_rng(scenario.seed, 1),
        }
    }
}

impl AnalogConverter for SimulatedAdc {
    fn read_channel(&mut self, channel: u8, _gain: u16, _sample_rate: u16) -> Result<f64> {
        let volts = if channel == self.sin_channel {
            self.sin_volts
        } else if channel == self.cos_channel {
            self.cos_volts
        } else {
            return Err(SensorError::AnalogRead {
                channel,
                reason: "nothing connected".into(),
            });
        };
        let noise = self.noise.map_or(0.0, |n| n.sample(&mut self.rng));
        Ok(volts + noise)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voltages_decode_to_apparent_angle() {
        let scenario = Scenario::calm();
        let vane = WindVaneConfig::default();
        let mut adc = SimulatedAdc::new(&scenario, &vane);
        let sin = vane.sin.normalize(adc.read_channel(0, 4096, 250).unwrap());
        let cos = vane.cos.normalize(adc.read_channel(1, 4096, 250).unwrap());
        let (_, expected) = scenario.apparent_wind();
        assert!((sin.atan2(cos) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_unconnected_channel_fails() {
        let mut adc = SimulatedAdc::new(&Scenario::calm(), &WindVaneConfig::default());
        assert!(adc.read_channel(3, 4096, 250).is_err());
    }
}
