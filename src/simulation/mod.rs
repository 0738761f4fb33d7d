//! Simulated boat hardware driven by a [`Scenario`].

mod adc;
mod edge;
mod imu;
mod scenario;

pub use adc::SimulatedAdc;
pub use edge::SimulatedEdgeSource;
pub use imu::SimulatedImu;
pub use scenario::Scenario;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::SensorsConfig;
use crate::error::Result;
use crate::hardware::Hardware;

/// Deterministic generator when seeded, entropy-seeded otherwise
///
/// `stream` separates the devices sharing one seed.
pub(crate) fn make_rng(seed: Option<u64>, stream: u64) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s.wrapping_add(stream)),
        None => rand::make_rng(),
    }
}

/// Edge source, ADC and IMU all simulating `scenario`
pub fn simulated_hardware(scenario: &Scenario, config: &SensorsConfig) -> Result<Hardware> {
    Ok(Hardware::new(
        SimulatedEdgeSource::for_scenario(scenario, config)?,
        SimulatedAdc::new(scenario, &config.wind_vane),
        SimulatedImu::new(scenario),
    ))
}
