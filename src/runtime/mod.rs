//! Runtime adapters and status API surface.

pub mod api;
pub mod tokio_spawner;

pub use api::{health, pool_status, resource_status, Health, PoolStatusResponse};
pub use tokio_spawner::TokioSpawner;
