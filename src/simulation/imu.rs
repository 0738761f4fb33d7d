use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::TAU;
use std::time::Instant;

use super::{Scenario, make_rng};
use crate::error::Result;
use crate::hardware::{OrientationSample, OrientationSource, Vector3};

/// IMU rolling and pitching sinusoidally about the scenario's attitude
pub struct SimulatedImu {
    scenario: Scenario,
    started: Instant,
    noise: Option<Normal<f64>>,
    rng: ChaCha8Rng,
}

impl SimulatedImu {
    pub fn new(scenario: &Scenario) -> Self {
        Self {
            scenario: scenario.clone(),
            started: Instant::now(),
            noise: Normal::new(0.0, scenario.imu_noise)
                .ok()
                .filter(|_| scenario.imu_noise > 0.0),
            rng: make_rng(scenario.seed, 2),
        }
    }

    /// Noise-free sample `t` seconds into the run
    pub fn sample_at(&self, t: f64) -> OrientationSample {
        let s = &self.scenario;
        let (roll, roll_rate) = oscillation(s.roll_amplitude, s.roll_period, t);
        let (pitch, pitch_rate) = oscillation(s.pitch_amplitude, s.pitch_period, t);
        OrientationSample {
            fusion_pose: Vector3::new(s.heel + roll, pitch, s.imu_yaw()),
            gyro: Vector3::new(roll_rate, pitch_rate, 0.0),
        }
    }
}

/// Angle and rate of `amplitude × sin(2πt / period)`
fn oscillation(amplitude: f64, period: f64, t: f64) -> (f64, f64) {
    if amplitude == 0.0 || period <= 0.0 {
        return (0.0, 0.0);
    }
    let omega = TAU / period;
    (
        amplitude * (omega * t).sin(),
        amplitude * omega * (omega * t).cos(),
    )
}

impl OrientationSource for SimulatedImu {
    fn poll(&mut self) -> Result<OrientationSample> {
        let mut sample = self.sample_at(self.started.elapsed().as_secs_f64());
        if let Some(noise) = self.noise {
            sample.fusion_pose.x += noise.sample(&mut self.rng);
            sample.fusion_pose.y += noise.sample(&mut self.rng);
            sample.fusion_pose.z += noise.sample(&mut self.rng);
        }
        Ok(sample)
    }
}
