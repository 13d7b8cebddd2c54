//! Turn-risk detection core for tractor-trailer telemetry.
//!
//! Heading/speed samples arrive in small batches, are stitched into one
//! indexed sequence, windowed into angular-velocity estimates and compared
//! against the rollover-critical speed derived from the vehicle geometry.

pub mod math;
pub mod prelude;
pub mod processing;
pub mod records;
pub mod telemetry;
pub mod vehicle;

pub use prelude::{PipelineConfig, ProcessingStage, StageError, StageInput, StageResult};
pub use processing::Detector;
pub use records::{DetectionReport, DetectionResult};
