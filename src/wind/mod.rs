//! Wind and water corrections, from raw statistics to true wind.

pub mod heel;
pub mod pipeline;
pub mod triangle;

pub use heel::{HeelCorrectionEntry, HeelCorrectionTable, anemometer_heel_factor, angle_of_heel};
pub use pipeline::{
    CorrectionPipeline, CycleSnapshot, NavigationState, WindState, correct_apparent_wind, leeway,
    upwash_angle,
};
pub use triangle::{TrueWind, leeway_adjusted_angle, normalize_angle, solve_true_wind};
