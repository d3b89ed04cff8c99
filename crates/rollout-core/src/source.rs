use std::collections::HashSet;

use async_trait::async_trait;
use rollout_model::{NodeId, Service, Task};

use crate::error::SourceError;

/// Read-only view of the orchestrator.
///
/// The monitor calls each method at most once per tick and never retries; any
/// error ends the run.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Current descriptor of the service, including its update status.
    async fn fetch_service(&self, service_id: &str) -> Result<Service, SourceError>;

    /// Tasks of the service that belong to its current generation.
    async fn fetch_up_to_date_tasks(&self, service_id: &str) -> Result<Vec<Task>, SourceError>;

    /// Nodes that are currently part of the cluster.
    async fn fetch_active_nodes(&self) -> Result<HashSet<NodeId>, SourceError>;
}
