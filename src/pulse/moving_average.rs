use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use super::{CalibrationTable, PulseReading};
use crate::constants::{
    NANOS_PER_SECOND, OUTLIER_HIGH_RATIO, OUTLIER_LOW_RATIO, SENTINEL_MAX_SPEED,
};
use crate::error::Result;
use crate::hardware::{DigitalEdgeSource, EdgeMode, EdgeRegistration, PullConfig};

/// Circular buffer of raw edge periods written by the edge context
///
/// Slots fill from index 0, so the first `min(pulses, len)` slots are valid.
#[derive(Debug)]
struct DeltaRing {
    slots: Box<[AtomicU64]>,
    head: AtomicUsize,
    pulses: AtomicU64,
}

impl DeltaRing {
    fn new(window: usize) -> Self {
        Self {
            slots: (0..window.max(1)).map(|_| AtomicU64::new(0)).collect(),
            head: AtomicUsize::new(0),
            pulses: AtomicU64::new(0),
        }
    }

    fn on_edge(&self, delta_ns: u64) {
        let head = self.head.load(Ordering::Relaxed);
        self.slots[head].store(delta_ns, Ordering::Relaxed);
        self.head
            .store((head + 1) % self.slots.len(), Ordering::Relaxed);
        self.pulses.fetch_add(1, Ordering::Release);
    }

    fn copy_valid(&self, received: u64, into: &mut Vec<u64>) {
        let valid = (received as usize).min(self.slots.len());
        into.clear();
        into.extend(self.slots[..valid].iter().map(|s| s.load(Ordering::Relaxed)));
    }
}

/// Pulse meter averaging the last N edge periods with outlier rejection
///
/// On read, periods outside `[0.2, 2.0)` times the unfiltered mean are
/// dropped before the frequency is computed. This rejects contact bounce and
/// missed edges from the paddle wheel.
pub struct MovingAveragePulseMeter {
    pin: u8,
    calibration: CalibrationTable,
    ring: Arc<DeltaRing>,
    registration: Option<Box<dyn EdgeRegistration>>,
    consumed: u64,
    scratch: Vec<u64>,
    reading: PulseReading,
}

impl MovingAveragePulseMeter {
    pub fn register(
        source: &mut dyn DigitalEdgeSource,
        pin: u8,
        window: usize,
        calibration: CalibrationTable,
    ) -> Result<Self> {
        let ring = Arc::new(DeltaRing::new(window));
        let edge_ring = Arc::clone(&ring);
        let registration = source.register(
            pin,
            EdgeMode::Falling,
            PullConfig::Up,
            Box::new(move |delta_ns| edge_ring.on_edge(delta_ns)),
        )?;
        let scratch = Vec::with_capacity(ring.slots.len());

        Ok(Self {
            pin,
            calibration,
            ring,
            registration: Some(registration),
            consumed: 0,
            scratch,
            reading: PulseReading::default(),
        })
    }

    pub fn read(&mut self) -> PulseReading {
        let received = self.ring.pulses.load(Ordering::Acquire);
        if received == self.consumed {
            self.reading.speed = 0.0;
            self.reading.frequency = 0.0;
            return self.reading;
        }
        let pulse_delta = received - self.consumed;
        self.consumed = received;
        self.reading.pulse_count = received;

        self.ring.copy_valid(received, &mut self.scratch);
        match filtered_frequency(&self.scratch) {
            Some(frequency) => {
                let scale = self.calibration.scale_for(frequency);
                self.reading.frequency = frequency;
                self.reading.speed = frequency * scale;
                self.reading.distance += pulse_delta as f64 * scale;
            }
            None => {
                log::debug!(
                    "pin {}: every buffered period rejected, reporting maximum speed",
                    self.pin
                );
                self.reading.frequency = f64::INFINITY;
                self.reading.speed = SENTINEL_MAX_SPEED;
                self.reading.distance += pulse_delta as f64 * self.calibration.last_scale();
            }
        }
        self.reading
    }

    /// Pulses accounted for by the last read
    pub fn pulse_count(&self) -> u64 {
        self.consumed
    }

    pub fn window(&self) -> usize {
        self.ring.slots.len()
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    pub fn reading(&self) -> PulseReading {
        self.reading
    }

    pub fn close(&mut self) {
        if let Some(mut registration) = self.registration.take() {
            registration.cancel();
            log::debug!("released pulse input on pin {}", self.pin);
        }
    }
}

impl Drop for MovingAveragePulseMeter {
    fn drop(&mut self) {
        self.close();
    }
}

/// Frequency in Hz from edge periods in ns, ignoring outliers
///
/// Returns `None` when every period is rejected.
pub fn filtered_frequency(periods_ns: &[u64]) -> Option<f64> {
    if periods_ns.is_empty() {
        return None;
    }
    let unfiltered =
        periods_ns.iter().map(|&p| p as f64).sum::<f64>() / periods_ns.len() as f64;
    let low = unfiltered * OUTLIER_LOW_RATIO;
    let high = unfiltered * OUTLIER_HIGH_RATIO;

    let (sum, n) = periods_ns
        .iter()
        .map(|&p| p as f64)
        .filter(|&p| p >= low && p < high)
        .fold((0.0, 0usize), |(sum, n), p| (sum + p, n + 1));

    if n == 0 || sum <= 0.0 {
        return None;
    }
    Some(NANOS_PER_SECOND * n as f64 / sum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::mock::ManualEdgeSource;
    use crate::pulse::CalibrationPoint;

    fn meter(source: &mut ManualEdgeSource, window: usize) -> MovingAveragePulseMeter {
        let calibration = CalibrationTable::new(vec![
            CalibrationPoint::new(50.0, 0.2),
            CalibrationPoint::new(1000.0, 0.25),
        ])
        .unwrap();
        MovingAveragePulseMeter::register(source, 6, window, calibration).unwrap()
    }

    #[test]
    fn test_outlier_is_excluded() {
        let frequency = filtered_frequency(&[10, 10, 10, 10, 100]).unwrap();
        // mean of the four 10 ns periods
        assert!((frequency - 1e8).abs() < 1e-3);
    }

    #[test]
    fn test_all_zero_periods_are_degenerate() {
        assert_eq!(filtered_frequency(&[0, 0, 0]), None);
        assert_eq!(filtered_frequency(&[]), None);
    }

    #[test]
    fn test_meter_rejects_glitch() {
        let mut source = ManualEdgeSource::new();
        let mut meter = meter(&mut source, 5);
        // 40 ms periods = 25 Hz, one bounce at 1 ms
        source.fire_all(6, &[40_000_000, 40_000_000, 1_000_000, 40_000_000, 40_000_000]);

        let reading = meter.read();
        assert!((reading.frequency - 25.0).abs() < 1e-9);
        assert!((reading.speed - 5.0).abs() < 1e-9);
        assert!((reading.distance - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_window_uses_written_slots_only() {
        let mut source = ManualEdgeSource::new();
        let mut meter = meter(&mut source, 10);
        source.fire_all(6, &[2_000_000, 2_000_000]);
        let reading = meter.read();
        assert!((reading.frequency - 500.0).abs() < 1e-9);
        assert!((reading.speed - 125.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_train_reports_sentinel() {
        let mut source = ManualEdgeSource::new();
        let mut meter = meter(&mut source, 4);
        source.fire_all(6, &[0, 0, 0, 0]);

        let reading = meter.read();
        assert_eq!(reading.speed, SENTINEL_MAX_SPEED);
        // distance still accumulates with the last segment's scale
        assert!((reading.distance - 4.0 * 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_idle_read_zeroes_speed() {
        let mut source = ManualEdgeSource::new();
        let mut meter = meter(&mut source, 4);
        source.fire_all(6, &[40_000_000; 4]);
        assert!(meter.read().speed > 0.0);
        let idle = meter.read();
        assert_eq!(idle.speed, 0.0);
        assert!(idle.distance > 0.0);
        assert_eq!(meter.pulse_count(), 4);
    }
}
