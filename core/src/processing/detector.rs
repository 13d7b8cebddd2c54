use crate::prelude::{PipelineConfig, ProcessingStage, Sample, StageInput, StageResult};
use crate::processing::buffer::{BufferCheckpoint, ContinuousSequence, IngestionBuffer};
use crate::processing::risk::RiskStage;
use crate::processing::window::WindowStage;
use crate::records::{BatchFormat, DetectionReport, RawRecord};
use crate::telemetry::{LogManager, MetricsRecorder};

/// Pipeline orchestrator: buffer, then windowing, then risk assessment.
///
/// Every sample index is reported exactly once, when its window completes
/// or when [`Detector::finish`] flushes the end of the run.
pub struct Detector {
    config: PipelineConfig,
    buffer: IngestionBuffer,
    windows: WindowStage,
    risk: RiskStage,
    last_emitted: Option<u64>,
    logger: LogManager,
    metrics: MetricsRecorder,
}

impl Detector {
    pub fn new(config: PipelineConfig) -> StageResult<Self> {
        Self::with_format(config, BatchFormat::default())
    }

    pub fn with_format(config: PipelineConfig, format: BatchFormat) -> StageResult<Self> {
        config.validate()?;

        let mut windows = WindowStage::new();
        windows.initialize(&config)?;
        let mut risk = RiskStage::new();
        risk.initialize(&config)?;

        let logger = LogManager::new();
        logger.record(&format!(
            "detector ready: window {} samples, h_cm {:.3} m, track {:.2} m, length {:.1} m, {:?} radius",
            config.window_size,
            risk.cog_height().unwrap_or_default(),
            config.geometry.track_width,
            config.geometry.vehicle_length,
            config.radius_model
        ));

        Ok(Self {
            buffer: IngestionBuffer::new(config.window_size, format)?,
            config,
            windows,
            risk,
            last_emitted: None,
            logger,
            metrics: MetricsRecorder::new(),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }

    pub fn buffer(&self) -> &IngestionBuffer {
        &self.buffer
    }

    /// Ingests one CSV batch. A batch that fails anywhere in the pipeline is
    /// rejected as a whole: indexing and the seam are rolled back and the
    /// detector stays usable.
    pub fn process_batch(&mut self, batch: &str) -> StageResult<DetectionReport> {
        let checkpoint = self.buffer.checkpoint();
        let outcome = self
            .buffer
            .append(batch)
            .and_then(|sequence| self.accept(sequence));
        self.settle(checkpoint, outcome)
    }

    pub fn process_records(&mut self, records: Vec<RawRecord>) -> StageResult<DetectionReport> {
        let checkpoint = self.buffer.checkpoint();
        let sequence = self.buffer.append_records(records);
        let outcome = self.accept(sequence);
        self.settle(checkpoint, outcome)
    }

    /// Reports the samples still waiting on an incomplete trailing window.
    pub fn finish(&mut self) -> StageResult<DetectionReport> {
        let sequence = self.buffer.tail();
        let report = self.evaluate(sequence.samples, true)?;
        self.metrics
            .record_flush(report.results.len(), report.flagged_count());
        Ok(report)
    }

    /// Starts a new run with the same configuration.
    pub fn reset(&mut self) {
        self.buffer.reset();
        self.last_emitted = None;
        self.metrics.reset();
    }

    fn settle(
        &mut self,
        checkpoint: BufferCheckpoint,
        outcome: StageResult<DetectionReport>,
    ) -> StageResult<DetectionReport> {
        if let Err(err) = &outcome {
            self.buffer.restore(checkpoint);
            self.metrics.record_rejected();
            self.logger.batch_rejected(err);
        }
        outcome
    }

    fn accept(&mut self, sequence: ContinuousSequence) -> StageResult<DetectionReport> {
        let carried = sequence.carried;
        let fresh = sequence.fresh().len();

        let report = self.evaluate(sequence.samples, false)?;
        self.logger
            .batch_accepted(carried, fresh, report.windows.len(), report.results.len());
        self.metrics
            .record_batch(report.results.len(), report.flagged_count());
        Ok(report)
    }

    fn evaluate(&mut self, samples: Vec<Sample>, flush: bool) -> StageResult<DetectionReport> {
        let output = self.windows.execute(StageInput { samples, flush })?;

        let last_emitted = self.last_emitted;
        let pending = output
            .enriched
            .into_iter()
            .filter(|enriched| last_emitted.map_or(true, |last| enriched.sample.index > last))
            .collect();
        let results = self.risk.execute(pending)?;

        if let Some(last) = results.last() {
            self.last_emitted = Some(last.sample_index);
        }
        for result in results.iter().filter(|result| result.flagged) {
            self.logger.flagged(result);
        }

        Ok(DetectionReport::new(results, output.windows))
    }
}
