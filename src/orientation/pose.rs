use std::f64::consts::{FRAC_PI_2, TAU};

use crate::hardware::Vector3;
use crate::stats::{AngularStatistic, RunningStatistic};

/// Smoothed attitude of the boat
///
/// Roll and pitch use plain running means, which holds while both stay
/// within ±90°. Yaw wraps and is averaged circularly.
#[derive(Debug, Clone)]
pub struct Pose {
    pub roll: RunningStatistic,
    pub pitch: RunningStatistic,
    pub yaw: AngularStatistic,
}

impl Pose {
    pub fn new(window: usize) -> Self {
        Self {
            roll: RunningStatistic::new(window),
            pitch: RunningStatistic::new(window),
            yaw: AngularStatistic::new(window),
        }
    }

    /// Add a fusion pose: x roll, y pitch, z yaw
    pub fn set(&mut self, fusion_pose: &Vector3) {
        self.roll.set(fusion_pose.x);
        self.pitch.set(fusion_pose.y);
        self.yaw.set(fusion_pose.z);
    }

    pub fn yaw_to_heading(&self, deviation: f64) -> f64 {
        yaw_to_heading(self.yaw.mean(), deviation)
    }
}

/// Convert IMU yaw to a magnetic heading in [0, 2π)
///
/// The IMU is mounted with its yaw zero a quarter turn off the bow.
pub fn yaw_to_heading(yaw: f64, deviation: f64) -> f64 {
    let corrected = yaw - deviation;
    let mut heading = if corrected < FRAC_PI_2 {
        corrected + 3.0 * FRAC_PI_2
    } else {
        corrected - FRAC_PI_2
    };
    if heading < 0.0 {
        heading += TAU;
    } else if heading >= TAU {
        heading -= TAU;
    }
    // -ε + 2π rounds to 2π
    if heading >= TAU {
        heading = 0.0;
    }
    heading
}
