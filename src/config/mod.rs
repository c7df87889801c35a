//! Configuration models for client pools, partitions and poll tuning.

pub mod pool;

pub use pool::{ClientPoolConfig, PollSettings, PriorityPartition, ResetSettings, ResourceProfile};
