//! Unit conversions used at the configuration and output boundaries.
//!
//! Internally every speed is in m/s and every angle in radians.

const METRES_PER_NAUTICAL_MILE: f64 = 1852.0;
const SECONDS_PER_HOUR: f64 = 3600.0;

pub fn kn_to_ms(kn: f64) -> f64 {
    kn * METRES_PER_NAUTICAL_MILE / SECONDS_PER_HOUR
}

pub fn ms_to_kn(ms: f64) -> f64 {
    ms * SECONDS_PER_HOUR / METRES_PER_NAUTICAL_MILE
}

/// Convert a sensor rating in Hz per knot to Hz per m/s.
pub fn hz_per_kn_to_hz_per_ms(hz_per_kn: f64) -> f64 {
    hz_per_kn * SECONDS_PER_HOUR / METRES_PER_NAUTICAL_MILE
}

/// Metres per pulse for a linear sensor rated in Hz per knot.
pub fn metres_per_pulse(hz_per_kn: f64) -> f64 {
    1.0 / hz_per_kn_to_hz_per_ms(hz_per_kn)
}

/// Round to `digits` significant digits.
///
/// Zero and non-finite values are returned unchanged.
pub fn to_precision(value: f64, digits: u32) -> f64 {
    if value == 0.0 || !value.is_finite() || digits == 0 {
        return value;
    }
    let magnitude = value.abs().log10().floor() as i32;
    let shift = digits as i32 - 1 - magnitude;
    let rounded = if shift >= 0 {
        let factor = 10f64.powi(shift);
        (value * factor).round() / factor
    } else {
        let factor = 10f64.powi(-shift);
        (value / factor).round() * factor
    };
    if rounded.is_finite() { rounded } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knot_round_trip() {
        assert!((kn_to_ms(1.0) - 0.514444).abs() < 1e-5);
        assert!((ms_to_kn(kn_to_ms(12.5)) - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_metres_per_pulse() {
        // 5.5 Hz per knot paddle wheel
        let scale = metres_per_pulse(5.5);
        let speed = 5.5 * 6.0 * scale;
        assert!((ms_to_kn(speed) - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_to_precision() {
        assert_eq!(to_precision(3.14159265, 4), 3.142);
        assert_eq!(to_precision(-0.000123456, 4), -0.0001235);
        assert_eq!(to_precision(12345.6, 4), 12350.0);
        assert_eq!(to_precision(0.0, 4), 0.0);
        assert!(to_precision(f64::NAN, 4).is_nan());
    }
}
