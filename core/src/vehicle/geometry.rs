use crate::prelude::{ensure_positive, StageResult};
use serde::{Deserialize, Serialize};

/// Static tractor-trailer description. Masses in kg, lengths in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleGeometry {
    pub mass_head: f64,
    pub mass_trailer: f64,
    /// Center-of-gravity height of the tractor unit.
    pub h_head: f64,
    /// Center-of-gravity height of the loaded trailer.
    pub h_trailer: f64,
    pub track_width: f64,
    pub vehicle_length: f64,
}

impl Default for VehicleGeometry {
    /// Partially loaded semi with a reefer trailer.
    fn default() -> Self {
        Self {
            mass_head: 9071.85,
            mass_trailer: 22679.619,
            h_head: 0.8,
            h_trailer: 1.35,
            track_width: 2.47,
            vehicle_length: 25.0,
        }
    }
}

impl VehicleGeometry {
    pub fn validate(&self) -> StageResult<()> {
        ensure_positive("mass_head", self.mass_head)?;
        ensure_positive("mass_trailer", self.mass_trailer)?;
        ensure_positive("h_head", self.h_head)?;
        ensure_positive("h_trailer", self.h_trailer)?;
        ensure_positive("track_width", self.track_width)?;
        ensure_positive("vehicle_length", self.vehicle_length)
    }

    /// Combined center-of-gravity height of tractor and trailer.
    pub fn cog_height(&self) -> StageResult<f64> {
        combined_cog_height(
            self.mass_head,
            self.mass_trailer,
            self.h_head,
            self.h_trailer,
        )
    }
}

/// Mass-weighted average of the tractor and trailer center-of-gravity heights.
pub fn combined_cog_height(
    mass_head: f64,
    mass_trailer: f64,
    h_head: f64,
    h_trailer: f64,
) -> StageResult<f64> {
    ensure_positive("mass_head", mass_head)?;
    ensure_positive("mass_trailer", mass_trailer)?;
    ensure_positive("h_head", h_head)?;
    ensure_positive("h_trailer", h_trailer)?;

    Ok((mass_head * h_head + mass_trailer * h_trailer) / (mass_head + mass_trailer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::StageError;

    #[test]
    fn default_semi_has_expected_cog_height() {
        let h_cm = VehicleGeometry::default().cog_height().unwrap();
        assert!((h_cm - 1.19286).abs() < 1e-4);
    }

    #[test]
    fn equal_heights_average_to_same_height() {
        let h_cm = combined_cog_height(100.0, 300.0, 1.0, 1.0).unwrap();
        assert!((h_cm - 1.0).abs() < 1e-12);
    }

    #[test]
    fn heavier_trailer_pulls_cog_towards_trailer_height() {
        let h_cm = combined_cog_height(1.0, 3.0, 1.0, 2.0).unwrap();
        assert!((h_cm - 1.75).abs() < 1e-12);
    }

    #[test]
    fn non_positive_inputs_are_rejected() {
        assert!(matches!(
            combined_cog_height(0.0, 1.0, 1.0, 1.0),
            Err(StageError::InvalidParameter(_))
        ));
        let geometry = VehicleGeometry {
            track_width: -2.0,
            ..Default::default()
        };
        assert!(geometry.validate().is_err());
    }
}
