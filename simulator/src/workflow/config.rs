use crate::generator::profile::GeneratorConfig;
use anyhow::Context;
use rollguardcore::prelude::{PipelineConfig, RadiusModel};
use rollguardcore::records::BatchFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub pipeline: PipelineConfig,
    pub format: BatchFormat,
    /// Rows per batch when splitting a file or a synthetic drive.
    pub batch_len: usize,
    /// Pacing of batches in follow mode.
    pub batch_interval_secs: f64,
    pub report_path: PathBuf,
    pub generator: GeneratorConfig,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            format: BatchFormat::default(),
            batch_len: 10,
            batch_interval_secs: 10.0,
            report_path: PathBuf::from("tools/data/rollover_events.log"),
            generator: GeneratorConfig::default(),
        }
    }
}

/// Command-line values that take precedence over the loaded file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub window_size: Option<usize>,
    pub vehicle_length: Option<f64>,
    pub track_width: Option<f64>,
    pub batch_len: Option<usize>,
    pub batch_interval_secs: Option<f64>,
    pub seed: Option<u64>,
    pub kinematic: bool,
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(window_size) = overrides.window_size {
            self.pipeline.window_size = window_size;
        }
        if let Some(vehicle_length) = overrides.vehicle_length {
            self.pipeline.geometry.vehicle_length = vehicle_length;
        }
        if let Some(track_width) = overrides.track_width {
            self.pipeline.geometry.track_width = track_width;
        }
        if let Some(batch_len) = overrides.batch_len {
            self.batch_len = batch_len;
        }
        if let Some(interval) = overrides.batch_interval_secs {
            self.batch_interval_secs = interval;
        }
        if let Some(seed) = overrides.seed {
            self.generator.seed = seed;
        }
        if overrides.kinematic {
            self.pipeline.radius_model = RadiusModel::Kinematic;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.pipeline
            .validate()
            .context("validating pipeline configuration")?;
        anyhow::ensure!(self.batch_len >= 1, "batch_len must be at least 1");
        anyhow::ensure!(
            self.batch_interval_secs.is_finite() && self.batch_interval_secs >= 0.0,
            "batch_interval_secs must be a non-negative number"
        );
        Ok(())
    }

    pub fn to_pipeline_config(&self) -> PipelineConfig {
        self.pipeline.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollguardcore::records::RecordLayout;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_config_is_valid() {
        let cfg = WorkflowConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.to_pipeline_config().window_size, 5);
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"pipeline:\n  window_size: 10\n  radius_model: kinematic\n  geometry:\n    track_width: 2.6\nformat:\n  layout: full\n  has_headers: true\nbatch_len: 25\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.pipeline.window_size, 10);
        assert_eq!(cfg.pipeline.radius_model, RadiusModel::Kinematic);
        assert_eq!(cfg.pipeline.geometry.track_width, 2.6);
        assert_eq!(cfg.pipeline.geometry.vehicle_length, 25.0);
        assert_eq!(cfg.format.layout, RecordLayout::Full);
        assert_eq!(cfg.batch_len, 25);
    }

    #[test]
    fn bundled_off_ramp_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/off_ramp.yaml");
        let cfg = WorkflowConfig::load(path).unwrap();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.generator.seed, 42);
        assert_eq!(cfg.generator.segments.len(), 5);
        assert_eq!(cfg.pipeline, PipelineConfig::default());
    }

    #[test]
    fn overrides_take_precedence() {
        let mut cfg = WorkflowConfig::default();
        cfg.apply(&Overrides {
            window_size: Some(3),
            track_width: Some(2.5),
            seed: Some(9),
            kinematic: true,
            ..Default::default()
        });
        assert_eq!(cfg.pipeline.window_size, 3);
        assert_eq!(cfg.pipeline.geometry.track_width, 2.5);
        assert_eq!(cfg.generator.seed, 9);
        assert_eq!(cfg.pipeline.radius_model, RadiusModel::Kinematic);
    }

    #[test]
    fn invalid_geometry_fails_validation() {
        let mut cfg = WorkflowConfig::default();
        cfg.apply(&Overrides {
            vehicle_length: Some(-1.0),
            ..Default::default()
        });
        assert!(cfg.validate().is_err());
    }
}
