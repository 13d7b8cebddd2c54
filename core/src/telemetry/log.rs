use crate::prelude::StageError;
use crate::records::DetectionResult;
use log::{debug, info, warn};

/// Thin wrapper keeping the pipeline's log lines uniform.
pub struct LogManager;

impl LogManager {
    pub fn new() -> Self {
        Self
    }

    pub fn record(&self, message: &str) {
        info!("{}", message);
    }

    pub fn batch_accepted(&self, carried: usize, fresh: usize, windows: usize, emitted: usize) {
        debug!(
            "batch accepted: {} new samples, {} carried, {} windows, {} results",
            fresh, carried, windows, emitted
        );
    }

    pub fn batch_rejected(&self, error: &StageError) {
        warn!("batch rejected: {}", error);
    }

    pub fn flagged(&self, result: &DetectionResult) {
        info!(
            "sharp turn at {} (sample {}): {:.1} mph >= critical {:.1} mph, radius {:.1} m",
            result.timestamp,
            result.sample_index,
            result.actual_speed_mph,
            result.critical_speed_mph,
            result.radius_m
        );
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}
