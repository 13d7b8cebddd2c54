use crate::math::angular::{turn_radius_from_angle, turn_radius_from_speed};
use crate::prelude::{
    EnrichedSample, PipelineConfig, ProcessingStage, RadiusModel, StageError, StageResult,
};
use crate::records::DetectionResult;
use crate::vehicle::critical_speed;

/// Constants the risk stage needs, fixed for the whole run.
#[derive(Debug, Clone, Copy)]
struct RiskParameters {
    h_cm: f64,
    track_width: f64,
    vehicle_length: f64,
    radius_model: RadiusModel,
}

/// Compares each sample's speed against the rollover-critical speed of its turn.
#[derive(Default)]
pub struct RiskStage {
    params: Option<RiskParameters>,
}

impl RiskStage {
    pub fn new() -> Self {
        Self { params: None }
    }

    /// Combined center-of-gravity height in use, once initialized.
    pub fn cog_height(&self) -> Option<f64> {
        self.params.map(|params| params.h_cm)
    }

    pub fn assess(&self, enriched: &EnrichedSample) -> StageResult<DetectionResult> {
        let params = self
            .params
            .as_ref()
            .ok_or_else(|| StageError::Internal("risk stage not initialized".into()))?;

        let sample = &enriched.sample;
        // Angular rate stands in for the angle in the geometric model.
        let radius_m = match params.radius_model {
            RadiusModel::Geometric => {
                turn_radius_from_angle(enriched.angular_velocity, params.vehicle_length)?
            }
            RadiusModel::Kinematic => {
                turn_radius_from_speed(sample.speed_mph, enriched.angular_velocity)?
            }
        };
        let critical_speed_mph = critical_speed(radius_m, params.h_cm, params.track_width)?;

        Ok(DetectionResult {
            sample_index: sample.index,
            timestamp: sample.timestamp,
            angular_velocity: enriched.angular_velocity,
            radius_m,
            critical_speed_mph,
            actual_speed_mph: sample.speed_mph,
            flagged: sample.speed_mph >= critical_speed_mph,
        })
    }
}

impl ProcessingStage for RiskStage {
    type Input = Vec<EnrichedSample>;
    type Output = Vec<DetectionResult>;

    fn initialize(&mut self, config: &PipelineConfig) -> StageResult<()> {
        config.geometry.validate()?;
        self.params = Some(RiskParameters {
            h_cm: config.geometry.cog_height()?,
            track_width: config.geometry.track_width,
            vehicle_length: config.geometry.vehicle_length,
            radius_model: config.radius_model,
        });
        Ok(())
    }

    fn execute(&mut self, input: Vec<EnrichedSample>) -> StageResult<Vec<DetectionResult>> {
        input.iter().map(|enriched| self.assess(enriched)).collect()
    }

    fn cleanup(&mut self) {
        self.params = None;
    }
}
