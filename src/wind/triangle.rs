use std::f64::consts::{PI, TAU};

use crate::constants::{MIN_TRUE_WIND_SPEED, TRUE_ANGLE_ACOS_LIMIT};

/// True wind relative to the boat's course through the water
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrueWind {
    /// m/s
    pub speed: f64,
    /// Radians, positive to starboard
    pub angle: f64,
}

/// Fold an angle into (-π, π]
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI { wrapped - TAU } else { wrapped }
}

/// Apparent wind angle seen from the course through the water
///
/// Leeway opens the angle on either tack.
pub fn leeway_adjusted_angle(apparent_angle: f64, leeway: f64) -> f64 {
    let adjusted = if apparent_angle > 0.0 {
        apparent_angle + leeway
    } else {
        apparent_angle - leeway
    };
    normalize_angle(adjusted)
}

/// Solve the wind triangle for true wind
///
/// Water speed is first projected onto the course with `cos(leeway)`. When the
/// `acos` argument is within the clamp of ±1 the true angle is taken as 0, and
/// below the minimum true speed the angle is undefined and reported as 0.
pub fn solve_true_wind(
    water_speed: f64,
    apparent_speed: f64,
    apparent_angle: f64,
    leeway: f64,
) -> TrueWind {
    let stw = water_speed * leeway.cos();
    let awa = leeway_adjusted_angle(apparent_angle, leeway);

    let speed_sq =
        stw * stw + apparent_speed * apparent_speed - 2.0 * stw * apparent_speed * awa.cos();
    let speed = speed_sq.max(0.0).sqrt();

    let mut angle = 0.0;
    if speed > MIN_TRUE_WIND_SPEED {
        let cos_angle = (apparent_speed * awa.cos() - stw) / speed;
        if cos_angle.abs() <= TRUE_ANGLE_ACOS_LIMIT {
            angle = cos_angle.acos();
        }
    }
    if awa < 0.0 {
        angle = -angle;
    }

    TrueWind { speed, angle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_normalize_angle() {
        assert!((normalize_angle(3.0 * PI / 2.0) + FRAC_PI_2).abs() < 1e-12);
        assert!((normalize_angle(-3.0 * PI / 2.0) - FRAC_PI_2).abs() < 1e-12);
        assert_eq!(normalize_angle(PI), PI);
        assert!((normalize_angle(-PI) - PI).abs() < 1e-12);
        assert_eq!(normalize_angle(0.25), 0.25);
    }

    #[test]
    fn test_leeway_opens_angle_on_both_tacks() {
        assert!((leeway_adjusted_angle(0.5, 0.05) - 0.55).abs() < 1e-12);
        assert!((leeway_adjusted_angle(-0.5, 0.05) + 0.55).abs() < 1e-12);
    }

    #[test]
    fn test_beam_reach() {
        // boat at 3 m/s, apparent wind 5 m/s at 90°: true wind 5.83 m/s aft of beam
        let tw = solve_true_wind(3.0, 5.0, FRAC_PI_2, 0.0);
        assert!((tw.speed - 34f64.sqrt()).abs() < 1e-12);
        let expected = (-3.0 / 34f64.sqrt()).acos();
        assert!((tw.angle - expected).abs() < 1e-12);
    }

    #[test]
    fn test_port_tack_is_negative() {
        let tw = solve_true_wind(3.0, 5.0, -FRAC_PI_2, 0.0);
        assert!(tw.angle < 0.0);
    }
}
