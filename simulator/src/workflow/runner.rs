use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use log::{info, warn};
use rollguardcore::processing::{batch_channel, consume_batches};
use rollguardcore::records::{DetectionReport, DetectionResult};
use rollguardcore::telemetry::MetricsSnapshot;
use rollguardcore::Detector;
use std::time::Duration;
use tokio::{signal, time};

pub struct WorkflowResult {
    pub flagged: Vec<DetectionResult>,
    pub metrics: MetricsSnapshot,
}

impl WorkflowResult {
    fn collect(&mut self, report: &DetectionReport) {
        self.flagged.extend(report.flagged().copied());
    }

    pub fn summary(&self) -> String {
        format!(
            "batches={} rejected={} samples={} flagged={}",
            self.metrics.batches_accepted,
            self.metrics.batches_rejected,
            self.metrics.samples_emitted,
            self.metrics.samples_flagged
        )
    }
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    fn detector(&self) -> anyhow::Result<Detector> {
        Detector::with_format(self.config.to_pipeline_config(), self.config.format)
            .context("building detector")
    }

    /// Runs every batch back to back, skipping rejected ones.
    pub fn execute(&self, batches: &[String]) -> anyhow::Result<WorkflowResult> {
        let mut detector = self.detector()?;
        let mut result = WorkflowResult {
            flagged: Vec::new(),
            metrics: MetricsSnapshot::default(),
        };

        for (position, batch) in batches.iter().enumerate() {
            match detector.process_batch(batch) {
                Ok(report) => result.collect(&report),
                Err(err) => warn!("skipping batch {}: {}", position, err),
            }
        }

        let tail = detector.finish().context("flushing trailing window")?;
        result.collect(&tail);
        result.metrics = detector.metrics().snapshot();
        Ok(result)
    }

    /// Feeds batches through the queue at the configured pace, printing
    /// flagged events as they appear. Ctrl+C stops the feed and flushes.
    pub async fn follow(&self, batches: Vec<String>) -> anyhow::Result<WorkflowResult> {
        let mut detector = self.detector()?;
        let (sender, receiver) = batch_channel(4);
        let period = Duration::from_secs_f64(self.config.batch_interval_secs.max(0.001));

        let producer = tokio::spawn(async move {
            let mut ticker = time::interval(period);
            for batch in batches {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = signal::ctrl_c() => {
                        info!("interrupted, flushing pending samples");
                        break;
                    }
                }
                if sender.send(batch).await.is_err() {
                    break;
                }
            }
        });

        let mut result = WorkflowResult {
            flagged: Vec::new(),
            metrics: MetricsSnapshot::default(),
        };
        consume_batches(&mut detector, receiver, |report| {
            match report.flagged_json_lines() {
                Ok(lines) => print!("{}", lines),
                Err(err) => warn!("dropping flagged events: {}", err),
            }
            result.collect(report);
        })
        .await
        .context("draining batch queue")?;
        producer.await.context("joining batch producer")?;

        result.metrics = detector.metrics().snapshot();
        Ok(result)
    }
}
