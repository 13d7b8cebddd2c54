pub mod buffer;
pub mod detector;
pub mod queue;
pub mod risk;
pub mod window;

pub use buffer::{ContinuousSequence, IngestionBuffer};
pub use detector::Detector;
pub use queue::{batch_channel, consume_batches, BatchSender, QueueSummary};
pub use risk::RiskStage;
pub use window::{WindowAggregate, WindowOutput, WindowStage, WindowedAggregator};
