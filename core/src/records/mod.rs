pub mod batch;
pub mod detection;
pub mod sample;

pub use batch::{parse_batch, parse_timestamp, BatchFormat, RecordLayout};
pub use detection::{DetectionReport, DetectionResult};
pub use sample::{EnrichedSample, RawRecord, Sample};
