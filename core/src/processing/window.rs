use crate::math::angular::angular_distance;
use crate::prelude::{
    EnrichedSample, PipelineConfig, ProcessingStage, Sample, StageError, StageInput, StageResult,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Heading/time change across one window of samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowAggregate {
    pub window_id: u64,
    pub first_index: u64,
    pub last_index: u64,
    pub len: usize,
    /// `angular_distance(last_heading, first_heading)`, radians.
    pub heading_diff: f64,
    /// Seconds between first and last timestamp.
    pub time_diff: f64,
    /// Average angular velocity, rad/s.
    pub angular_velocity: f64,
    pub complete: bool,
}

/// Splits a contiguous sample run into `index / window_size` windows.
#[derive(Debug, Clone, Copy)]
pub struct WindowedAggregator {
    window_size: usize,
    nominal_window_secs: f64,
}

impl WindowedAggregator {
    pub fn new(window_size: usize, nominal_window_secs: f64) -> StageResult<Self> {
        if window_size == 0 {
            return Err(StageError::InvalidParameter(
                "window_size must be at least 1".into(),
            ));
        }
        Ok(Self {
            window_size,
            nominal_window_secs,
        })
    }

    pub fn window_id(&self, index: u64) -> u64 {
        index / self.window_size as u64
    }

    /// Aggregates every window present in `samples`, partial ones included.
    ///
    /// Samples must be in strictly increasing index order.
    pub fn partition(&self, samples: &[Sample]) -> StageResult<Vec<WindowAggregate>> {
        if let Some(pair) = samples.windows(2).find(|pair| pair[1].index <= pair[0].index) {
            return Err(StageError::Internal(format!(
                "samples out of order: {} followed by {}",
                pair[0].index, pair[1].index
            )));
        }

        let mut aggregates = Vec::new();
        let mut start = 0;
        while start < samples.len() {
            let window_id = self.window_id(samples[start].index);
            let len = samples[start..]
                .iter()
                .take_while(|sample| self.window_id(sample.index) == window_id)
                .count();
            aggregates.push(self.aggregate(window_id, &samples[start..start + len]));
            start += len;
        }
        Ok(aggregates)
    }

    fn aggregate(&self, window_id: u64, members: &[Sample]) -> WindowAggregate {
        let first = &members[0];
        let last = &members[members.len() - 1];

        let heading_diff = angular_distance(last.heading_deg, first.heading_deg);
        let time_diff = last.seconds_since(first);

        let angular_velocity = if members.len() < 2 {
            0.0
        } else if time_diff > 0.0 {
            heading_diff / time_diff
        } else {
            heading_diff / self.nominal_window_secs
        };

        WindowAggregate {
            window_id,
            first_index: first.index,
            last_index: last.index,
            len: members.len(),
            heading_diff,
            time_diff,
            angular_velocity,
            complete: members.len() == self.window_size,
        }
    }

    /// Copies each window's angular velocity onto its member samples.
    ///
    /// An incomplete trailing window is held back unless `flush` is set.
    pub fn broadcast(
        &self,
        samples: &[Sample],
        aggregates: &[WindowAggregate],
        flush: bool,
    ) -> Vec<EnrichedSample> {
        let by_window: BTreeMap<u64, &WindowAggregate> = aggregates
            .iter()
            .map(|aggregate| (aggregate.window_id, aggregate))
            .collect();

        let held_back = match aggregates.last() {
            Some(trailing) if !trailing.complete && !flush => Some(trailing.window_id),
            _ => None,
        };

        samples
            .iter()
            .filter_map(|sample| {
                let window_id = self.window_id(sample.index);
                if held_back == Some(window_id) {
                    return None;
                }
                let angular_velocity = by_window
                    .get(&window_id)
                    .map(|aggregate| aggregate.angular_velocity)
                    .unwrap_or(0.0);
                Some(EnrichedSample {
                    sample: *sample,
                    angular_velocity,
                })
            })
            .collect()
    }
}

/// Output of the windowing stage.
#[derive(Debug, Clone, Default)]
pub struct WindowOutput {
    pub windows: Vec<WindowAggregate>,
    pub enriched: Vec<EnrichedSample>,
}

/// Windowing stage wrapping [`WindowedAggregator`].
#[derive(Default)]
pub struct WindowStage {
    aggregator: Option<WindowedAggregator>,
}

impl WindowStage {
    pub fn new() -> Self {
        Self { aggregator: None }
    }
}

impl ProcessingStage for WindowStage {
    type Input = StageInput;
    type Output = WindowOutput;

    fn initialize(&mut self, config: &PipelineConfig) -> StageResult<()> {
        self.aggregator = Some(WindowedAggregator::new(
            config.window_size,
            config.nominal_window_secs,
        )?);
        Ok(())
    }

    fn execute(&mut self, input: StageInput) -> StageResult<WindowOutput> {
        let aggregator = self
            .aggregator
            .as_ref()
            .ok_or_else(|| StageError::Internal("window stage not initialized".into()))?;

        let windows = aggregator.partition(&input.samples)?;
        let enriched = aggregator.broadcast(&input.samples, &windows, input.flush);
        Ok(WindowOutput { windows, enriched })
    }

    fn cleanup(&mut self) {
        self.aggregator = None;
    }
}
