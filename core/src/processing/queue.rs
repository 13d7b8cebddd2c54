//! Serializes batches from concurrent producers onto one detector.

use crate::prelude::StageResult;
use crate::processing::detector::Detector;
use crate::records::DetectionReport;
use tokio::sync::mpsc;

pub type BatchSender = mpsc::Sender<String>;
pub type BatchReceiver = mpsc::Receiver<String>;

/// Bounded channel feeding [`consume_batches`].
pub fn batch_channel(capacity: usize) -> (BatchSender, BatchReceiver) {
    mpsc::channel(capacity.max(1))
}

/// Totals for one drained queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueSummary {
    pub accepted: usize,
    pub rejected: usize,
    pub flagged: usize,
}

/// Drains `batches` in arrival order until every sender is dropped, then
/// flushes the trailing window. Rejected batches are rolled back by the
/// detector and skipped; only a failed flush stops the consumer.
pub async fn consume_batches<F>(
    detector: &mut Detector,
    mut batches: BatchReceiver,
    mut sink: F,
) -> StageResult<QueueSummary>
where
    F: FnMut(&DetectionReport),
{
    let mut summary = QueueSummary::default();

    while let Some(batch) = batches.recv().await {
        match detector.process_batch(&batch) {
            Ok(report) => {
                summary.accepted += 1;
                summary.flagged += report.flagged_count();
                sink(&report);
            }
            Err(_) => summary.rejected += 1,
        }
    }

    let tail = detector.finish()?;
    summary.flagged += tail.flagged_count();
    sink(&tail);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::PipelineConfig;

    fn batch(start: u32, heading_rate: f64, count: u32) -> String {
        (start..start + count)
            .map(|second| {
                format!(
                    "2024-03-01 08:00:{:02},{},50\n",
                    second,
                    heading_rate * second as f64
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn consumer_drains_producers_in_order() {
        let mut detector = Detector::new(PipelineConfig::default()).unwrap();
        let (sender, receiver) = batch_channel(4);

        let producer = tokio::spawn(async move {
            sender.send(batch(0, 0.0, 7)).await.unwrap();
            sender.send("2024-03-01 08:00:07,0,oops\n".to_string()).await.unwrap();
            sender.send(batch(7, 0.0, 5)).await.unwrap();
        });

        let mut seen = Vec::new();
        let summary = consume_batches(&mut detector, receiver, |report| {
            seen.extend(report.results.iter().map(|r| r.sample_index));
        })
        .await
        .unwrap();
        producer.await.unwrap();

        assert_eq!(summary.accepted, 2);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.flagged, 0);
        assert_eq!(seen, (0..12).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn flagged_turns_are_counted() {
        let mut detector = Detector::new(PipelineConfig::default()).unwrap();
        let (sender, receiver) = batch_channel(1);
        sender.send(batch(0, 30.0, 10)).await.unwrap();
        drop(sender);

        let summary = consume_batches(&mut detector, receiver, |_| {})
            .await
            .unwrap();
        assert_eq!(summary.accepted, 1);
        assert_eq!(summary.flagged, 10);
    }
}
