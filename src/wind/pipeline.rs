use std::f64::consts::FRAC_PI_2;

use super::heel::{HeelCorrectionTable, anemometer_heel_factor, angle_of_heel};
use super::triangle::solve_true_wind;
use crate::config::BoatConfig;
use crate::constants::{MIN_LEEWAY_WATER_SPEED, UPWASH_MAX_SPEED_KN};
use crate::orientation::yaw_to_heading;
use crate::pulse::PulseReading;
use crate::units::{kn_to_ms, ms_to_kn};

/// Wind solution of one calculation cycle
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindState {
    pub apparent_speed: f64,
    pub apparent_angle: f64,
    pub upwash_angle: f64,
    pub true_speed: f64,
    pub true_angle: f64,
}

/// Everything derived in one calculation cycle
///
/// Speeds in m/s, angles in radians, distance in metres.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NavigationState {
    pub heel: f64,
    pub roll: f64,
    pub pitch: f64,
    pub leeway: f64,
    pub heading: f64,
    pub water_speed: f64,
    pub water_distance: f64,
    pub wind: WindState,
}

/// Statistic means and meter readings taken at the start of a cycle
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CycleSnapshot {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
    pub roll_rate: f64,
    pub pitch_rate: f64,
    /// Vane sine component mean, normalized to [-1, 1]
    pub vane_sin: f64,
    /// Vane cosine component mean, normalized to [-1, 1]
    pub vane_cos: f64,
    pub water: PulseReading,
    pub wind: PulseReading,
}

/// Leeway from heel and speed through the water
pub fn leeway(k_factor: f64, roll: f64, water_speed: f64) -> f64 {
    if water_speed < MIN_LEEWAY_WATER_SPEED {
        return 0.0;
    }
    k_factor * roll / (water_speed * water_speed)
}

/// Deflection of the masthead airflow by the rig
///
/// Only modelled for apparent wind below 30 kn and forward of the beam;
/// exactly 0 elsewhere.
pub fn upwash_angle(upwash_k: f64, apparent_speed: f64, apparent_angle: f64) -> f64 {
    if apparent_speed >= kn_to_ms(UPWASH_MAX_SPEED_KN) || apparent_angle.abs() >= FRAC_PI_2 {
        return 0.0;
    }
    let speed_kn = ms_to_kn(apparent_speed);
    (upwash_k * apparent_angle.cos() * (3.0 * speed_kn).to_radians().cos()).to_radians()
}

/// Correct the masthead reading for heel and mast motion
///
/// Returns apparent speed and angle. The vane components are scaled by the
/// heel-corrected speed, then the mast tip velocity from the roll and pitch
/// rates is removed from each axis.
pub fn correct_apparent_wind(
    raw_speed: f64,
    heel: f64,
    snapshot: &CycleSnapshot,
    mast_height: f64,
) -> (f64, f64) {
    let speed = raw_speed * anemometer_heel_factor(heel) * heel.cos();
    let roll_component = snapshot.vane_sin * speed - snapshot.roll_rate * mast_height;
    let pitch_component = snapshot.vane_cos * speed - snapshot.pitch_rate * mast_height;
    (
        roll_component.hypot(pitch_component),
        roll_component.atan2(pitch_component),
    )
}

/// Runs the per-cycle corrections in their fixed order
///
/// Leeway and upwash are computed before this cycle's water speed and
/// apparent wind, so they use the previous cycle's values.
#[derive(Debug, Clone)]
pub struct CorrectionPipeline {
    boat: BoatConfig,
    heel_corrections: HeelCorrectionTable,
    state: NavigationState,
}

impl CorrectionPipeline {
    pub fn new(boat: BoatConfig, heel_corrections: HeelCorrectionTable) -> Self {
        Self {
            boat,
            heel_corrections,
            state: NavigationState::default(),
        }
    }

    pub fn run(&mut self, snapshot: &CycleSnapshot) -> &NavigationState {
        let previous = self.state;
        let state = &mut self.state;

        state.roll = snapshot.roll;
        state.pitch = snapshot.pitch;
        state.heel = angle_of_heel(snapshot.roll, snapshot.pitch);
        state.leeway = leeway(self.boat.k_factor, snapshot.roll, previous.water_speed);
        state.heading = yaw_to_heading(snapshot.yaw, self.boat.deviation);
        state.wind.upwash_angle = upwash_angle(
            self.boat.upwash_k,
            previous.wind.apparent_speed,
            previous.wind.apparent_angle,
        );

        state.water_speed = self
            .heel_corrections
            .apply(snapshot.water.speed, state.heel);
        state.water_distance = snapshot.water.distance;

        let (apparent_speed, apparent_angle) = correct_apparent_wind(
            snapshot.wind.speed,
            state.heel,
            snapshot,
            self.boat.mast_height,
        );
        state.wind.apparent_speed = apparent_speed;
        state.wind.apparent_angle = apparent_angle;

        let true_wind = solve_true_wind(
            state.water_speed,
            apparent_speed,
            apparent_angle,
            state.leeway,
        );
        state.wind.true_speed = true_wind.speed;
        state.wind.true_angle = true_wind.angle;

        log::debug!(
            "heel {:.3} leeway {:.3} heading {:.3} stw {:.2} aws {:.2} awa {:.3} tws {:.2} twa {:.3}",
            state.heel,
            state.leeway,
            state.heading,
            state.water_speed,
            apparent_speed,
            apparent_angle,
            true_wind.speed,
            true_wind.angle
        );

        &self.state
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn boat(&self) -> &BoatConfig {
        &self.boat
    }
}
