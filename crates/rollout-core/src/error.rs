use thiserror::Error;

/// Failure reported by a [`SnapshotSource`](crate::SnapshotSource).
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("service not found: {0}")]
    ServiceNotFound(String),

    #[error("snapshot transport failed: {0}")]
    Transport(String),

    #[error("invalid snapshot: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("service update paused: {0}")]
    Paused(String),

    #[error("service rollback paused: {0}")]
    RollbackPaused(String),

    #[error("no replica count")]
    NoReplicaCount,

    #[error("service mode changed from {from} to {to} while monitoring")]
    ModeChanged {
        from: &'static str,
        to: &'static str,
    },

    #[error("snapshot source error: {0}")]
    Source(#[from] SourceError),
}
