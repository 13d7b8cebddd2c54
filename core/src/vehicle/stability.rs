//! Static rollover threshold for a rigid vehicle in a steady turn.
//!
//! The vehicle tips once lateral acceleration `v² / r` exceeds
//! `g · track_width / (2 · h_cm)`.

use crate::prelude::{ensure_positive, StageError, StageResult};

pub const GRAVITY: f64 = 9.81;

/// Miles per hour in one metre per second.
pub const MPS_TO_MPH: f64 = 2.23694;

/// Highest speed (mph) a vehicle can hold through a turn of `radius_m`
/// before the rollover threshold is reached.
///
/// `radius_m` may be `+inf` (straight line), which yields `+inf`.
pub fn critical_speed(radius_m: f64, h_cm_m: f64, track_width_m: f64) -> StageResult<f64> {
    if radius_m.is_nan() || radius_m <= 0.0 {
        return Err(StageError::InvalidParameter(format!(
            "radius must be positive, got {}",
            radius_m
        )));
    }
    ensure_positive("h_cm", h_cm_m)?;
    ensure_positive("track_width", track_width_m)?;

    let crit_mps = ((GRAVITY * track_width_m) / (2.0 * h_cm_m) * radius_m).sqrt();
    Ok(crit_mps * MPS_TO_MPH)
}

/// Tightest radius (m) a vehicle travelling at `speed_mph` can take without
/// reaching the rollover threshold.
pub fn critical_radius(speed_mph: f64, h_cm_m: f64, track_width_m: f64) -> StageResult<f64> {
    if !speed_mph.is_finite() || speed_mph < 0.0 {
        return Err(StageError::InvalidParameter(format!(
            "speed must be a non-negative finite number, got {}",
            speed_mph
        )));
    }
    ensure_positive("h_cm", h_cm_m)?;
    ensure_positive("track_width", track_width_m)?;

    let speed_mps = speed_mph / MPS_TO_MPH;
    Ok(speed_mps * speed_mps * (2.0 * h_cm_m) / (GRAVITY * track_width_m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifty_metre_turn_matches_hand_calculation() {
        let speed = critical_speed(50.0, 1.0, 2.47).unwrap();
        let expected = (9.81f64 * 2.47 / 2.0 * 50.0).sqrt() * 2.23694;
        assert!((speed - expected).abs() < 1e-9);
        assert!((speed - 55.06).abs() < 0.01);
    }

    #[test]
    fn speed_increases_with_radius_and_track_width() {
        let radii = [1.0, 10.0, 50.0, 200.0, 5000.0];
        for pair in radii.windows(2) {
            let low = critical_speed(pair[0], 1.2, 2.47).unwrap();
            let high = critical_speed(pair[1], 1.2, 2.47).unwrap();
            assert!(high > low);
        }
        let tracks = [1.5, 2.0, 2.47, 3.0];
        for pair in tracks.windows(2) {
            let low = critical_speed(80.0, 1.2, pair[0]).unwrap();
            let high = critical_speed(80.0, 1.2, pair[1]).unwrap();
            assert!(high > low);
        }
    }

    #[test]
    fn speed_decreases_with_cog_height() {
        let heights = [0.5, 0.9, 1.2, 1.8, 2.5];
        for pair in heights.windows(2) {
            let low_cog = critical_speed(80.0, pair[0], 2.47).unwrap();
            let high_cog = critical_speed(80.0, pair[1], 2.47).unwrap();
            assert!(high_cog < low_cog);
        }
    }

    #[test]
    fn straight_line_has_no_speed_limit() {
        assert_eq!(
            critical_speed(f64::INFINITY, 1.2, 2.47).unwrap(),
            f64::INFINITY
        );
    }

    #[test]
    fn non_positive_inputs_are_rejected() {
        assert!(critical_speed(0.0, 1.0, 2.47).is_err());
        assert!(critical_speed(50.0, -1.0, 2.47).is_err());
        assert!(critical_speed(50.0, 1.0, 0.0).is_err());
        assert!(critical_speed(f64::NAN, 1.0, 2.47).is_err());
    }

    #[test]
    fn critical_radius_inverts_critical_speed() {
        let radius = critical_radius(45.0, 1.19, 2.47).unwrap();
        let speed = critical_speed(radius, 1.19, 2.47).unwrap();
        assert!((speed - 45.0).abs() < 1e-9);
    }
}
