//! Builders to construct client pools from configuration.

pub mod pool_builder;

pub use pool_builder::{build_client_pool, build_client_pools};
