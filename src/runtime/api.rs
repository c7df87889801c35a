//! API-facing status models.

use serde::{Deserialize, Serialize};

use crate::core::{ClientPool, ClientStatus, ResourceRegistry, ResourceStatus};

/// Pool status payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolStatusResponse {
    /// Channel served.
    pub channel_id: String,
    /// Default priority resolved at start.
    pub default_priority: Option<i32>,
    /// Per-client status, ordered by priority level.
    pub clients: Vec<ClientStatus>,
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// True when the pool has at least one client and all are active.
    pub ok: bool,
    /// Active clients.
    pub active: usize,
    /// Total clients.
    pub total: usize,
}

/// Snapshot a pool for reporting.
pub fn pool_status<S>(pool: &ClientPool<S>) -> PoolStatusResponse {
    PoolStatusResponse {
        channel_id: pool.channel_id().to_string(),
        default_priority: pool.default_priority(),
        clients: pool.status(),
    }
}

/// Status of a named resource, if it has been referenced.
pub fn resource_status(registry: &ResourceRegistry, name: &str) -> Option<ResourceStatus> {
    registry.resource_status_get(name)
}

/// Health of a pool.
pub fn health<S>(pool: &ClientPool<S>) -> Health {
    let clients = pool.clients();
    let active = clients.iter().filter(|c| c.is_active()).count();
    Health {
        ok: !clients.is_empty() && active == clients.len(),
        active,
        total: clients.len(),
    }
}
