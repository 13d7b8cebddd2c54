//! Circular heading arithmetic and turn-radius derivation.

use crate::prelude::{ensure_positive, StageError, StageResult};
use std::f64::consts::PI;

/// Angles this close to `0` or `π` are treated as straight-line driving.
pub const STRAIGHT_LINE_TOLERANCE: f64 = 1e-9;

/// Keeps `tan(angle)` away from an exact zero divisor.
pub const TAN_EPSILON: f64 = 1e-5;

/// Metres per second in one mile per hour.
pub const MPH_TO_MPS: f64 = 0.44704;

/// Folds a heading in degrees into `[0, 360)`.
///
/// `rem_euclid` rounds tiny negative inputs up to exactly `360.0`; those
/// land on `0.0`.
pub fn normalize_heading(heading_deg: f64) -> f64 {
    let heading = heading_deg.rem_euclid(360.0);
    if heading >= 360.0 {
        0.0
    } else {
        heading
    }
}

/// Shortest-arc distance between two headings in degrees, returned in radians.
///
/// The sign follows which normalized heading is larger, not the turn
/// direction: positive when `angle1 > angle2`, negative otherwise. Equal
/// headings return `-0.0`. Callers that need a turn direction must not rely
/// on the sign across the 0/360 seam.
pub fn angular_distance(angle1_deg: f64, angle2_deg: f64) -> f64 {
    let angle1 = normalize_heading(angle1_deg);
    let angle2 = normalize_heading(angle2_deg);

    let raw = (angle1 - angle2).abs();
    let distance = raw.min(360.0 - raw).to_radians();

    if angle1 > angle2 {
        distance
    } else {
        -distance
    }
}

/// Radius of the circle subtended by `angle_radians` over `vehicle_length`.
///
/// Returns `+inf` when the angle is within tolerance of `0` or `π`.
pub fn turn_radius_from_angle(angle_radians: f64, vehicle_length: f64) -> StageResult<f64> {
    if !angle_radians.is_finite() {
        return Err(StageError::InvalidParameter(format!(
            "angle must be finite, got {}",
            angle_radians
        )));
    }
    ensure_positive("vehicle_length", vehicle_length)?;

    if angle_radians.abs() <= STRAIGHT_LINE_TOLERANCE
        || (angle_radians - PI).abs() <= STRAIGHT_LINE_TOLERANCE
    {
        return Ok(f64::INFINITY);
    }

    Ok((vehicle_length / (angle_radians.tan() + TAN_EPSILON)).abs())
}

/// Kinematic turn radius `v / w` for a speed in mph and a yaw rate in rad/s.
///
/// A stationary vehicle or a zero yaw rate traces no circle: `+inf`.
pub fn turn_radius_from_speed(speed_mph: f64, angular_velocity: f64) -> StageResult<f64> {
    if !speed_mph.is_finite() || speed_mph < 0.0 {
        return Err(StageError::InvalidParameter(format!(
            "speed must be a non-negative finite number, got {}",
            speed_mph
        )));
    }
    if !angular_velocity.is_finite() {
        return Err(StageError::InvalidParameter(format!(
            "angular velocity must be finite, got {}",
            angular_velocity
        )));
    }

    if speed_mph <= STRAIGHT_LINE_TOLERANCE
        || angular_velocity.abs() <= STRAIGHT_LINE_TOLERANCE
    {
        return Ok(f64::INFINITY);
    }

    Ok((speed_mph * MPH_TO_MPS / angular_velocity).abs())
}
