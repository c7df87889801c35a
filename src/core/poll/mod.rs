//! Poll slot allocation: per-client metrics and the strategies that adapt them.

pub mod algorithm;
pub mod metrics;
pub mod multi;
pub mod single;

pub use algorithm::{PollAlgorithm, PRIORITY_BASELINE};
pub use metrics::PollMetrics;
pub use multi::MultiClientPollAlgorithm;
pub use single::SingleClientPollAlgorithm;
