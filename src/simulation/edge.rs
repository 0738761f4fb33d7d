use crossbeam_channel::{RecvTimeoutError, Sender, bounded};
use rand_distr::{Distribution, Normal};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::{Scenario, make_rng};
use crate::config::SensorsConfig;
use crate::constants::NANOS_PER_SECOND;
use crate::error::{Result, SensorError};
use crate::hardware::{DigitalEdgeSource, EdgeCallback, EdgeMode, EdgeRegistration, PullConfig};

/// Longest sleep between checks of a stopped pin's frequency
const IDLE_POLL: Duration = Duration::from_millis(50);

type Frequencies = Arc<Mutex<HashMap<u8, f64>>>;

/// Edge source with one pulse train thread per registered pin
///
/// Each pin fires at the frequency set with [`SimulatedEdgeSource::set_frequency`],
/// with every period jittered by a Gaussian fraction of itself.
#[derive(Clone)]
pub struct SimulatedEdgeSource {
    frequencies: Frequencies,
    jitter: f64,
    seed: Option<u64>,
}

impl SimulatedEdgeSource {
    pub fn new(jitter: f64, seed: Option<u64>) -> Self {
        Self {
            frequencies: Arc::new(Mutex::new(HashMap::new())),
            jitter,
            seed,
        }
    }

    /// Anemometer and paddle wheel pins running at the scenario's speeds
    pub fn for_scenario(scenario: &Scenario, config: &SensorsConfig) -> Result<Self> {
        let source = Self::new(scenario.pulse_jitter, scenario.seed);
        source.set_frequency(
            config.wind_sensor.pin,
            Scenario::pulse_frequency(scenario.anemometer_speed(), &config.wind_sensor)?,
        );
        source.set_frequency(
            config.water_sensor.pin,
            Scenario::pulse_frequency(scenario.boat_speed, &config.water_sensor)?,
        );
        Ok(source)
    }

    /// Change the pulse rate of `pin`; 0 stops it
    pub fn set_frequency(&self, pin: u8, hz: f64) {
        if let Ok(mut frequencies) = self.frequencies.lock() {
            frequencies.insert(pin, hz);
        }
    }

    pub fn frequency(&self, pin: u8) -> f64 {
        self.frequencies
            .lock()
            .ok()
            .and_then(|f| f.get(&pin).copied())
            .unwrap_or(0.0)
    }
}

impl DigitalEdgeSource for SimulatedEdgeSource {
    fn register(
        &mut self,
        pin: u8,
        _mode: EdgeMode,
        _pull: PullConfig,
        mut on_edge: EdgeCallback,
    ) -> Result<Box<dyn EdgeRegistration>> {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let source = self.clone();
        let jitter = Normal::new(0.0, self.jitter)
            .ok()
            .filter(|_| self.jitter > 0.0);
        let mut rng = make_rng(self.seed, 16 + pin as u64);

        let handle = thread::Builder::new()
            .name(format!("pulse-pin-{}", pin))
            .spawn(move || {
                loop {
                    let hz = source.frequency(pin);
                    let period = if hz > 0.0 && hz.is_finite() {
                        let scale = jitter.map_or(1.0, |n| 1.0 + n.sample(&mut rng));
                        Some((scale / hz).max(1.0 / NANOS_PER_SECOND))
                    } else {
                        None
                    };
                    let wait = period.map_or(IDLE_POLL, Duration::from_secs_f64);
                    match stop_rx.recv_timeout(wait) {
                        Err(RecvTimeoutError::Timeout) => {
                            if let Some(seconds) = period {
                                on_edge((seconds * NANOS_PER_SECOND).round() as u64);
                            }
                        }
                        _ => break,
                    }
                }
            })
            .map_err(|e| SensorError::EdgeSource {
                pin,
                reason: format!("failed to spawn pulse thread: {}", e),
            })?;

        Ok(Box::new(SimulatedRegistration {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }))
    }
}

struct SimulatedRegistration {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl EdgeRegistration for SimulatedRegistration {
    fn cancel(&mut self) {
        self.stop_tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("Pulse thread panicked");
            }
        }
    }
}

impl Drop for SimulatedRegistration {
    fn drop(&mut self) {
        self.cancel();
    }
}
