//! Numeric constants for the sensor pipeline
//!
//! Thresholds and epsilon values shared by the pulse meters and the
//! correction pipeline.

/// Nanoseconds per second, used to turn an averaged edge delta into a frequency.
pub const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// Speed reported when every buffered pulse delta is rejected as an outlier.
/// The paddle wheel is turning faster than edges can be timestamped.
pub const SENTINEL_MAX_SPEED: f64 = 999.0;

/// Lower outlier bound as a fraction of the unfiltered mean delta (inclusive).
pub const OUTLIER_LOW_RATIO: f64 = 0.2;

/// Upper outlier bound as a fraction of the unfiltered mean delta (exclusive).
pub const OUTLIER_HIGH_RATIO: f64 = 2.0;

/// IIR filter weight bounds; the weight is a power-of-two shift.
pub const MIN_FILTER_WEIGHT: u32 = 1;
pub const MAX_FILTER_WEIGHT: u32 = 31;

/// Pitch or roll closer than this to ±π/2 is treated as a full knockdown.
pub const HEEL_POLE_TOLERANCE: f64 = 0.001;

/// Water speeds below this (m/s) produce no leeway.
pub const MIN_LEEWAY_WATER_SPEED: f64 = 1e-3;

/// True wind speeds below this (m/s) have no defined angle.
pub const MIN_TRUE_WIND_SPEED: f64 = 1e-3;

/// Clamp for the `acos` argument of the wind triangle.
pub const TRUE_ANGLE_ACOS_LIMIT: f64 = 0.9999;

/// Upwash is only modelled below this apparent wind speed, in knots.
pub const UPWASH_MAX_SPEED_KN: f64 = 30.0;

/// Heel bands for the anemometer cosine-response correction, descending.
/// Each entry is (heel threshold in radians, speed multiplier).
pub const ANEMOMETER_HEEL_BANDS: [(f64, f64); 3] =
    [(0.174533, 1.03), (0.139626, 1.02), (0.10472, 1.01)];

/// Significant digits kept in published values.
pub const OUTPUT_PRECISION: u32 = 4;
