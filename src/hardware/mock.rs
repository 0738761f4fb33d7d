//! Manually driven hardware for tests and headless hosts.
//!
//! Every mock is a cheap clonable handle over shared state, so a test can
//! keep one clone to drive the device while the sensor core owns another.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::{
    AnalogConverter, DigitalEdgeSource, EdgeCallback, EdgeMode, EdgeRegistration,
    OrientationSample, OrientationSource, PullConfig,
};
use crate::error::{Result, SensorError};

type PinMap = Arc<Mutex<HashMap<u8, EdgeCallback>>>;

/// Edge source whose edges are fired explicitly with [`ManualEdgeSource::fire`]
#[derive(Clone, Default)]
pub struct ManualEdgeSource {
    pins: PinMap,
}

impl ManualEdgeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver one edge to the callback registered on `pin`
    ///
    /// Returns false when nothing is registered on the pin.
    pub fn fire(&self, pin: u8, delta_ns: u64) -> bool {
        let Ok(mut pins) = self.pins.lock() else {
            return false;
        };
        match pins.get_mut(&pin) {
            Some(on_edge) => {
                on_edge(delta_ns);
                true
            }
            None => false,
        }
    }

    pub fn fire_all(&self, pin: u8, deltas: &[u64]) {
        for &delta in deltas {
            self.fire(pin, delta);
        }
    }

    pub fn is_registered(&self, pin: u8) -> bool {
        self.pins
            .lock()
            .map(|pins| pins.contains_key(&pin))
            .unwrap_or(false)
    }
}

impl DigitalEdgeSource for ManualEdgeSource {
    fn register(
        &mut self,
        pin: u8,
        _mode: EdgeMode,
        _pull: PullConfig,
        on_edge: EdgeCallback,
    ) -> Result<Box<dyn EdgeRegistration>> {
        let mut pins = self.pins.lock().map_err(|_| SensorError::EdgeSource {
            pin,
            reason: "pin table poisoned".into(),
        })?;
        if pins.contains_key(&pin) {
            return Err(SensorError::EdgeSource {
                pin,
                reason: "pin already registered".into(),
            });
        }
        pins.insert(pin, on_edge);
        Ok(Box::new(ManualRegistration {
            pin,
            pins: Arc::clone(&self.pins),
        }))
    }
}

struct ManualRegistration {
    pin: u8,
    pins: PinMap,
}

impl EdgeRegistration for ManualRegistration {
    fn cancel(&mut self) {
        if let Ok(mut pins) = self.pins.lock() {
            pins.remove(&self.pin);
        }
    }
}

#[derive(Default)]
struct AdcScript {
    voltages: HashMap<u8, f64>,
    failing: Option<u8>,
    reads: Vec<u8>,
}

/// ADC returning fixed per-channel voltages
///
/// One channel can be set to fail, and every attempted read is logged in
/// order so tests can check sequencing.
#[derive(Clone, Default)]
pub struct ScriptedAdc {
    script: Arc<Mutex<AdcScript>>,
}

impl ScriptedAdc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_voltage(self, channel: u8, volts: f64) -> Self {
        self.set_voltage(channel, volts);
        self
    }

    pub fn set_voltage(&self, channel: u8, volts: f64) {
        if let Ok(mut script) = self.script.lock() {
            script.voltages.insert(channel, volts);
        }
    }

    pub fn fail_channel(&self, channel: Option<u8>) {
        if let Ok(mut script) = self.script.lock() {
            script.failing = channel;
        }
    }

    /// Channels read so far, in the order they were issued
    pub fn reads(&self) -> Vec<u8> {
        self.script
            .lock()
            .map(|script| script.reads.clone())
            .unwrap_or_default()
    }
}

impl AnalogConverter for ScriptedAdc {
    fn read_channel(&mut self, channel: u8, _gain: u16, _sample_rate: u16) -> Result<f64> {
        let mut script = self.script.lock().map_err(|_| SensorError::AnalogRead {
            channel,
            reason: "script poisoned".into(),
        })?;
        script.reads.push(channel);
        if script.failing == Some(channel) {
            return Err(SensorError::AnalogRead {
                channel,
                reason: "scripted failure".into(),
            });
        }
        Ok(script.voltages.get(&channel).copied().unwrap_or(0.0))
    }
}

/// IMU returning a settable sample
#[derive(Clone, Default)]
pub struct ScriptedOrientation {
    sample: Arc<Mutex<Option<OrientationSample>>>,
    polls: Arc<AtomicU64>,
}

impl ScriptedOrientation {
    pub fn new(sample: OrientationSample) -> Self {
        let source = Self::default();
        source.set_sample(Some(sample));
        source
    }

    /// Replace the sample; `None` makes every poll fail
    pub fn set_sample(&self, sample: Option<OrientationSample>) {
        if let Ok(mut current) = self.sample.lock() {
            *current = sample;
        }
    }

    pub fn polls(&self) -> u64 {
        self.polls.load(Ordering::Acquire)
    }
}

impl OrientationSource for ScriptedOrientation {
    fn poll(&mut self) -> Result<OrientationSample> {
        self.polls.fetch_add(1, Ordering::AcqRel);
        let sample = self
            .sample
            .lock()
            .map_err(|_| SensorError::Orientation("script poisoned".into()))?;
        sample.ok_or_else(|| SensorError::Orientation("no sample available".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_edges_reach_callback() {
        let mut source = ManualEdgeSource::new();
        let total = Arc::new(AtomicU64::new(0));
        let sink = Arc::clone(&total);
        let mut registration = source
            .register(
                3,
                EdgeMode::Falling,
                PullConfig::Up,
                Box::new(move |delta| {
                    sink.fetch_add(delta, Ordering::Relaxed);
                }),
            )
            .unwrap();

        source.fire_all(3, &[10, 20, 30]);
        assert_eq!(total.load(Ordering::Relaxed), 60);

        registration.cancel();
        registration.cancel();
        assert!(!source.fire(3, 100));
        assert_eq!(total.load(Ordering::Relaxed), 60);
    }

    #[test]
    fn test_duplicate_pin_rejected() {
        let mut source = ManualEdgeSource::new();
        let _first = source
            .register(1, EdgeMode::Falling, PullConfig::Up, Box::new(|_| {}))
            .unwrap();
        let second = source.register(1, EdgeMode::Falling, PullConfig::Up, Box::new(|_| {}));
        assert!(second.is_err());
    }

    #[test]
    fn test_scripted_orientation_failure() {
        let mut imu = ScriptedOrientation::default();
        assert!(imu.poll().is_err());
        imu.set_sample(Some(OrientationSample::default()));
        assert!(imu.poll().is_ok());
        assert_eq!(imu.polls(), 2);
    }
}
