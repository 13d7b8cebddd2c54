use crate::prelude::{Sample, StageError, StageResult};
use crate::records::{parse_batch, BatchFormat, RawRecord};

/// Indexed run of samples handed to the windowing stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContinuousSequence {
    pub samples: Vec<Sample>,
    /// Number of leading samples carried over from earlier batches.
    pub carried: usize,
}

impl ContinuousSequence {
    pub fn fresh(&self) -> &[Sample] {
        &self.samples[self.carried..]
    }
}

/// Buffer state captured before a batch, restored if the batch fails
/// downstream.
#[derive(Debug, Clone)]
pub struct BufferCheckpoint {
    next_index: u64,
    retained: Vec<Sample>,
}

/// Stitches successive batches into one continuously indexed sequence.
///
/// Only the seam is retained between batches: the last sample, or every
/// sample of the trailing window while that window is still incomplete.
/// Retained memory therefore never exceeds one window.
pub struct IngestionBuffer {
    window_size: usize,
    format: BatchFormat,
    next_index: u64,
    retained: Vec<Sample>,
}

impl IngestionBuffer {
    pub fn new(window_size: usize, format: BatchFormat) -> StageResult<Self> {
        if window_size == 0 {
            return Err(StageError::InvalidParameter(
                "window_size must be at least 1".into(),
            ));
        }
        Ok(Self {
            window_size,
            format,
            next_index: 0,
            retained: Vec::with_capacity(window_size),
        })
    }

    /// Parses and appends one CSV batch. A malformed batch changes nothing.
    pub fn append(&mut self, batch: &str) -> StageResult<ContinuousSequence> {
        let records = parse_batch(batch, &self.format)?;
        Ok(self.append_records(records))
    }

    pub fn append_records(&mut self, records: Vec<RawRecord>) -> ContinuousSequence {
        let carried = self.retained.len();
        let mut samples = Vec::with_capacity(carried + records.len());
        samples.extend_from_slice(&self.retained);

        for (offset, record) in records.into_iter().enumerate() {
            samples.push(Sample::from_record(self.next_index + offset as u64, record));
        }
        self.next_index += (samples.len() - carried) as u64;
        self.retained = self.seam(&samples);

        ContinuousSequence { samples, carried }
    }

    /// Retained samples as a sequence, for flushing the end of a run.
    pub fn tail(&self) -> ContinuousSequence {
        ContinuousSequence {
            samples: self.retained.clone(),
            carried: self.retained.len(),
        }
    }

    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    pub fn retained(&self) -> &[Sample] {
        &self.retained
    }

    pub fn checkpoint(&self) -> BufferCheckpoint {
        BufferCheckpoint {
            next_index: self.next_index,
            retained: self.retained.clone(),
        }
    }

    /// Rolls back every append made since `checkpoint` was taken.
    pub fn restore(&mut self, checkpoint: BufferCheckpoint) {
        self.next_index = checkpoint.next_index;
        self.retained = checkpoint.retained;
    }

    pub fn reset(&mut self) {
        self.next_index = 0;
        self.retained.clear();
    }

    fn seam(&self, samples: &[Sample]) -> Vec<Sample> {
        let Some(last) = samples.last() else {
            return Vec::new();
        };
        let size = self.window_size as u64;
        let trailing = samples
            .iter()
            .rev()
            .take_while(|sample| sample.index / size == last.index / size)
            .count();

        if trailing < self.window_size {
            samples[samples.len() - trailing..].to_vec()
        } else {
            vec![*last]
        }
    }
}
