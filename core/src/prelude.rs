use crate::vehicle::VehicleGeometry;
use serde::{Deserialize, Serialize};

pub use crate::records::{EnrichedSample, Sample};

/// Rule used to turn a window's angular velocity into a turn radius.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadiusModel {
    /// Feeds the angular velocity into the angle-to-radius geometry
    /// (`vehicle_length / tan(w)`).
    #[default]
    Geometric,
    /// Kinematic radius `v / w` from the sample's own speed.
    Kinematic,
}

/// Shared configuration for every pipeline stage. One value per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub geometry: VehicleGeometry,
    pub window_size: usize,
    /// Divisor used when a window's timestamps do not advance.
    pub nominal_window_secs: f64,
    pub radius_model: RadiusModel,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            geometry: VehicleGeometry::default(),
            window_size: 5,
            nominal_window_secs: 10.0,
            radius_model: RadiusModel::Geometric,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> StageResult<()> {
        self.geometry.validate()?;
        if self.window_size == 0 {
            return Err(StageError::InvalidParameter(
                "window_size must be at least 1".into(),
            ));
        }
        ensure_positive("nominal_window_secs", self.nominal_window_secs)
    }
}

/// Input payload for the windowing stage.
#[derive(Debug, Clone)]
pub struct StageInput {
    pub samples: Vec<Sample>,
    /// Emit the trailing partial window instead of holding it back.
    pub flush: bool,
}

/// Common error type for stage execution.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum StageError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("malformed batch at record {record}: {reason}")]
    MalformedBatch { record: usize, reason: String },
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type StageResult<T> = Result<T, StageError>;

/// Trait describing the pipeline's processing stages.
pub trait ProcessingStage {
    type Input;
    type Output;

    fn initialize(&mut self, config: &PipelineConfig) -> StageResult<()>;
    fn execute(&mut self, input: Self::Input) -> StageResult<Self::Output>;
    fn cleanup(&mut self);
}

/// Rejects zero, negative, NaN and infinite values.
pub(crate) fn ensure_positive(name: &str, value: f64) -> StageResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(StageError::InvalidParameter(format!(
            "{} must be a positive finite number, got {}",
            name, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_window_is_rejected() {
        let config = PipelineConfig {
            window_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(StageError::InvalidParameter(_))
        ));
    }

    #[test]
    fn ensure_positive_rejects_nan_and_infinity() {
        assert!(ensure_positive("x", f64::NAN).is_err());
        assert!(ensure_positive("x", f64::INFINITY).is_err());
        assert!(ensure_positive("x", -1.0).is_err());
        assert!(ensure_positive("x", 0.5).is_ok());
    }
}
