use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

use crate::constants::{ANEMOMETER_HEEL_BANDS, HEEL_POLE_TOLERANCE};
use crate::error::{Result, SensorError};

/// Angle of heel of the mast from vertical, combining pitch and roll
///
/// Either angle within tolerance of ±π/2 means the mast is horizontal.
pub fn angle_of_heel(roll: f64, pitch: f64) -> f64 {
    if (pitch.abs() - FRAC_PI_2).abs() < HEEL_POLE_TOLERANCE
        || (roll.abs() - FRAC_PI_2).abs() < HEEL_POLE_TOLERANCE
    {
        return FRAC_PI_2;
    }
    let tan_pitch = pitch.tan();
    let tan_roll = roll.tan();
    (tan_pitch * tan_pitch + tan_roll * tan_roll).sqrt().atan()
}

/// Empirical cup anemometer correction for heel
///
/// Cup anemometers under-read when tilted; the multiplier steps up through
/// three heel bands before the cosine projection is applied.
pub fn anemometer_heel_factor(heel: f64) -> f64 {
    ANEMOMETER_HEEL_BANDS
        .iter()
        .find(|(threshold, _)| heel > *threshold)
        .map_or(1.0, |&(_, factor)| factor)
}

/// Water speed multiplier for heel above `angle_of_heel` (radians)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeelCorrectionEntry {
    pub angle_of_heel: f64,
    pub factor: f64,
}

impl HeelCorrectionEntry {
    pub fn new(angle_of_heel: f64, factor: f64) -> Self {
        Self {
            angle_of_heel,
            factor,
        }
    }
}

/// Paddle-wheel heel corrections, largest heel first
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeelCorrectionTable {
    entries: Vec<HeelCorrectionEntry>,
}

impl HeelCorrectionTable {
    /// Build a table, rejecting entries not sorted by descending heel
    pub fn new(entries: Vec<HeelCorrectionEntry>) -> Result<Self> {
        for (i, entry) in entries.iter().enumerate() {
            if !entry.angle_of_heel.is_finite() || !(entry.factor.is_finite() && entry.factor > 0.0)
            {
                return Err(SensorError::Config(format!(
                    "heel correction {} is invalid: angle {}, factor {}",
                    i, entry.angle_of_heel, entry.factor
                )));
            }
        }
        if let Some(i) = entries
            .windows(2)
            .position(|w| w[1].angle_of_heel > w[0].angle_of_heel)
        {
            return Err(SensorError::Config(format!(
                "heel corrections must be sorted largest first: entry {} ({} rad) follows {} rad",
                i + 1,
                entries[i + 1].angle_of_heel,
                entries[i].angle_of_heel
            )));
        }
        Ok(Self { entries })
    }

    /// Factor of the first entry whose threshold `heel` exceeds
    pub fn factor_for(&self, heel: f64) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| heel > e.angle_of_heel)
            .map(|e| e.factor)
    }

    /// Apply the matching correction, leaving `speed` unchanged when none matches
    pub fn apply(&self, speed: f64, heel: f64) -> f64 {
        self.factor_for(heel).map_or(speed, |factor| speed * factor)
    }

    pub fn entries(&self) -> &[HeelCorrectionEntry] {
        &self.entries
    }
}
