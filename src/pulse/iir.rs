use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{CalibrationTable, PulseReading};
use crate::constants::{MAX_FILTER_WEIGHT, MIN_FILTER_WEIGHT, NANOS_PER_SECOND};
use crate::error::Result;
use crate::hardware::{DigitalEdgeSource, EdgeMode, EdgeRegistration, PullConfig};

/// State written by the edge context
///
/// The edge handler is the only writer. The average is published before the
/// pulse count with release ordering, so a reader that observes a count also
/// observes an average at least that fresh.
#[derive(Debug)]
struct IirEdgeState {
    shift: u32,
    average_ns: AtomicU64,
    pulses: AtomicU64,
}

impl IirEdgeState {
    fn on_edge(&self, delta_ns: u64) {
        let count = self.pulses.load(Ordering::Relaxed);
        let average = self.average_ns.load(Ordering::Relaxed);
        let next = if count == 0 {
            delta_ns
        } else {
            let diff = delta_ns as i64 - average as i64;
            (average as i64 + (diff >> self.shift)).max(0) as u64
        };
        self.average_ns.store(next, Ordering::Release);
        self.pulses.store(count + 1, Ordering::Release);
    }
}

/// Pulse meter smoothing the edge period with a power-of-two IIR filter
///
/// Each edge moves the average period by `(delta - average) / 2^filter_weight`,
/// which is cheap enough to run in the interrupt context. The first edge
/// seeds the average. The pulse count itself is unfiltered.
pub struct IirPulseMeter {
    pin: u8,
    calibration: CalibrationTable,
    state: Arc<IirEdgeState>,
    registration: Option<Box<dyn EdgeRegistration>>,
    consumed: u64,
    reading: PulseReading,
}

impl IirPulseMeter {
    /// Register on `pin` of `source`
    ///
    /// `filter_weight` is clamped to 1..=31.
    pub fn register(
        source: &mut dyn DigitalEdgeSource,
        pin: u8,
        filter_weight: u32,
        calibration: CalibrationTable,
    ) -> Result<Self> {
        let state = Arc::new(IirEdgeState {
            shift: filter_weight.clamp(MIN_FILTER_WEIGHT, MAX_FILTER_WEIGHT),
            average_ns: AtomicU64::new(0),
            pulses: AtomicU64::new(0),
        });
        let edge_state = Arc::clone(&state);
        let registration = source.register(
            pin,
            EdgeMode::Falling,
            PullConfig::Up,
            Box::new(move |delta_ns| edge_state.on_edge(delta_ns)),
        )?;

        Ok(Self {
            pin,
            calibration,
            state,
            registration: Some(registration),
            consumed: 0,
            reading: PulseReading::default(),
        })
    }

    /// Consume the pulses received since the last read
    ///
    /// With no new pulses the speed drops to zero and the distance is kept.
    pub fn read(&mut self) -> PulseReading {
        let received = self.state.pulses.load(Ordering::Acquire);
        if received == self.consumed {
            self.reading.speed = 0.0;
            self.reading.frequency = 0.0;
            return self.reading;
        }
        let pulse_delta = received - self.consumed;
        self.consumed = received;

        let average_ns = self.state.average_ns.load(Ordering::Acquire);
        if average_ns == 0 {
            self.reading.distance += pulse_delta as f64 * self.calibration.last_scale();
            self.reading.frequency = f64::INFINITY;
            self.reading.speed = crate::constants::SENTINEL_MAX_SPEED;
        } else {
            let frequency = NANOS_PER_SECOND / average_ns as f64;
            let scale = self.calibration.scale_for(frequency);
            self.reading.frequency = frequency;
            self.reading.speed = frequency * scale;
            self.reading.distance += pulse_delta as f64 * scale;
        }
        self.reading.pulse_count = received;
        self.reading
    }

    /// Pulses accounted for by the last read
    pub fn pulse_count(&self) -> u64 {
        self.consumed
    }

    pub fn filter_weight(&self) -> u32 {
        self.state.shift
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    pub fn reading(&self) -> PulseReading {
        self.reading
    }

    /// Release the edge registration; later calls do nothing
    pub fn close(&mut self) {
        if let Some(mut registration) = self.registration.take() {
            registration.cancel();
            log::debug!("released pulse input on pin {}", self.pin);
        }
    }
}

impl Drop for IirPulseMeter {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::mock::ManualEdgeSource;
    use crate::pulse::CalibrationPoint;

    fn meter(source: &mut ManualEdgeSource, weight: u32) -> IirPulseMeter {
        let calibration = CalibrationTable::new(vec![CalibrationPoint::new(0.0, 0.5)]).unwrap();
        IirPulseMeter::register(source, 7, weight, calibration).unwrap()
    }

    #[test]
    fn test_no_pulses_reads_zero() {
        let mut source = ManualEdgeSource::new();
        let mut meter = meter(&mut source, 3);
        let reading = meter.read();
        assert_eq!(reading.speed, 0.0);
        assert_eq!(reading.distance, 0.0);
    }

    #[test]
    fn test_constant_period() {
        let mut source = ManualEdgeSource::new();
        let mut meter = meter(&mut source, 3);

        // 10 ms period = 100 Hz
        source.fire_all(7, &[10_000_000; 20]);
        let reading = meter.read();
        assert!((reading.frequency - 100.0).abs() < 1e-9);
        assert!((reading.speed - 50.0).abs() < 1e-9);
        assert!((reading.distance - 10.0).abs() < 1e-9);
        assert_eq!(meter.pulse_count(), 20);

        // nothing new: speed drops, distance stays
        let reading = meter.read();
        assert_eq!(reading.speed, 0.0);
        assert!((reading.distance - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_filter_converges_towards_new_period() {
        let mut source = ManualEdgeSource::new();
        let mut meter = meter(&mut source, 1);

        source.fire(7, 10_000_000);
        source.fire_all(7, &[5_000_000; 40]);
        let reading = meter.read();
        assert!((reading.frequency - 200.0).abs() < 0.01);
    }

    #[test]
    fn test_weight_is_clamped() {
        let mut source = ManualEdgeSource::new();
        assert_eq!(meter(&mut source, 0).filter_weight(), 1);
        let mut source = ManualEdgeSource::new();
        assert_eq!(meter(&mut source, 40).filter_weight(), 31);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut source = ManualEdgeSource::new();
        let mut meter = meter(&mut source, 3);
        assert!(source.is_registered(7));
        meter.close();
        meter.close();
        assert!(!source.is_registered(7));
    }
}
