use serde::{Deserialize, Serialize};

use crate::error::{Result, SensorError};
use crate::units::metres_per_pulse;

/// One segment of a pulse sensor calibration
///
/// Applies to frequencies below `frequency` (Hz). `scale` is metres per pulse,
/// equivalently m/s per Hz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    pub frequency: f64,
    /// Metres per pulse. Speed is `frequency × scale` and distance
    /// `pulses × scale`; dividing pulses by the scale would not give metres.
    pub scale: f64,
}

impl CalibrationPoint {
    pub fn new(frequency: f64, scale: f64) -> Self {
        Self { frequency, scale }
    }

    /// Segment for a sensor rated in Hz per knot
    pub fn from_hz_per_knot(frequency: f64, hz_per_kn: f64) -> Self {
        Self::new(frequency, metres_per_pulse(hz_per_kn))
    }
}

/// Frequency to scale lookup for a non-linear pulse sensor
///
/// Points are ordered by ascending frequency threshold. Frequencies above
/// every threshold use the last point's scale.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationTable {
    points: Vec<CalibrationPoint>,
}

impl CalibrationTable {
    /// Build a validated calibration table
    ///
    /// # Arguments
    /// * `points` - Segments in ascending frequency order; the last one covers
    ///   every frequency above the previous thresholds
    ///
    /// # Returns
    /// The table, or `SensorError::Calibration` when `points` is empty, out of
    /// order, or holds a non-finite threshold or a non-positive scale.
    pub fn new(points: Vec<CalibrationPoint>) -> Result<Self> {
        if points.is_empty() {
            return Err(SensorError::Calibration(
                "at least one calibration point is required".into(),
            ));
        }
        for (i, point) in points.iter().enumerate() {
            if !point.frequency.is_finite() {
                return Err(SensorError::Calibration(format!(
                    "point {} has a non-finite frequency threshold",
                    i
                )));
            }
            if !(point.scale.is_finite() && point.scale > 0.0) {
                return Err(SensorError::Calibration(format!(
                    "point {} has scale {}, must be positive",
                    i, point.scale
                )));
            }
        }
        if let Some(i) = points
            .windows(2)
            .position(|w| w[1].frequency < w[0].frequency)
        {
            return Err(SensorError::Calibration(format!(
                "thresholds must ascend: point {} ({} Hz) follows {} Hz",
                i + 1,
                points[i + 1].frequency,
                points[i].frequency
            )));
        }
        Ok(Self { points })
    }

    /// Single-segment table for a linear sensor rated in Hz per knot
    pub fn linear_hz_per_knot(hz_per_kn: f64) -> Result<Self> {
        Self::new(vec![CalibrationPoint::from_hz_per_knot(0.0, hz_per_kn)])
    }

    /// Scale of the first point whose threshold exceeds `frequency`
    pub fn scale_for(&self, frequency: f64) -> f64 {
        self.points
            .iter()
            .find(|p| frequency < p.frequency)
            .map_or_else(|| self.last_scale(), |p| p.scale)
    }

    /// Pulse frequency that reads as `speed`, inverting [`Self::scale_for`]
    pub fn frequency_for(&self, speed: f64) -> f64 {
        self.points
            .iter()
            .map(|p| (speed / p.scale, p.frequency))
            .find(|&(frequency, threshold)| frequency < threshold)
            .map_or_else(|| speed / self.last_scale(), |(frequency, _)| frequency)
    }

    /// Scale of the catch-all segment
    pub fn last_scale(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.scale)
    }

    pub fn points(&self) -> &[CalibrationPoint] {
        &self.points
    }
}
