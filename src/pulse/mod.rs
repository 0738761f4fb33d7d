//! Pulse-to-speed measurement for the paddle wheel and anemometer cups.
//!
//! Two filtering strategies are available, selected per sensor with
//! [`PulseFilter`](crate::config::PulseFilter):
//! - [`IirPulseMeter`]: power-of-two IIR filter over the edge period
//! - [`MovingAveragePulseMeter`]: moving average with outlier rejection

pub mod calibration;
pub mod iir;
pub mod moving_average;

pub use calibration::{CalibrationPoint, CalibrationTable};
pub use iir::IirPulseMeter;
pub use moving_average::{MovingAveragePulseMeter, filtered_frequency};

use crate::config::{PulseFilter, PulseSensorConfig};
use crate::error::Result;
use crate::hardware::DigitalEdgeSource;

/// Snapshot of a pulse meter after a read
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PulseReading {
    /// Calibrated speed in m/s
    pub speed: f64,
    /// Accumulated distance in metres, never decreases
    pub distance: f64,
    /// Total pulses consumed
    pub pulse_count: u64,
    /// Filtered pulse frequency in Hz (0 when idle)
    pub frequency: f64,
}

pub enum PulseFrequencyMeter {
    Iir(IirPulseMeter),
    MovingAverage(MovingAveragePulseMeter),
}

impl PulseFrequencyMeter {
    /// Validate the calibration and register the meter's edge handler
    pub fn register(source: &mut dyn DigitalEdgeSource, config: &PulseSensorConfig) -> Result<Self> {
        let calibration = CalibrationTable::new(config.calibration.clone())?;
        match config.filter {
            PulseFilter::Iir { weight } => Ok(Self::Iir(IirPulseMeter::register(
                source,
                config.pin,
                weight,
                calibration,
            )?)),
            PulseFilter::MovingAverage { window } => Ok(Self::MovingAverage(
                MovingAveragePulseMeter::register(source, config.pin, window, calibration)?,
            )),
        }
    }

    pub fn read(&mut self) -> PulseReading {
        match self {
            Self::Iir(meter) => meter.read(),
            Self::MovingAverage(meter) => meter.read(),
        }
    }

    /// Last reading without consuming new pulses
    pub fn reading(&self) -> PulseReading {
        match self {
            Self::Iir(meter) => meter.reading(),
            Self::MovingAverage(meter) => meter.reading(),
        }
    }

    pub fn pulse_count(&self) -> u64 {
        match self {
            Self::Iir(meter) => meter.pulse_count(),
            Self::MovingAverage(meter) => meter.pulse_count(),
        }
    }

    pub fn pin(&self) -> u8 {
        match self {
            Self::Iir(meter) => meter.pin(),
            Self::MovingAverage(meter) => meter.pin(),
        }
    }

    pub fn close(&mut self) {
        match self {
            Self::Iir(meter) => meter.close(),
            Self::MovingAverage(meter) => meter.close(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::mock::ManualEdgeSource;

    #[test]
    fn test_register_selects_variant() {
        let mut source = ManualEdgeSource::new();
        let mut config = PulseSensorConfig::water();
        config.filter = PulseFilter::MovingAverage { window: 8 };
        let meter = PulseFrequencyMeter::register(&mut source, &config).unwrap();
        assert!(matches!(meter, PulseFrequencyMeter::MovingAverage(_)));

        let config = PulseSensorConfig::wind();
        let meter = PulseFrequencyMeter::register(&mut source, &config).unwrap();
        assert!(matches!(meter, PulseFrequencyMeter::Iir(_)));
    }

    #[test]
    fn test_invalid_calibration_registers_nothing() {
        let mut source = ManualEdgeSource::new();
        let mut config = PulseSensorConfig::water();
        config.calibration.clear();
        assert!(PulseFrequencyMeter::register(&mut source, &config).is_err());
        assert!(!source.is_registered(config.pin));
    }
}
