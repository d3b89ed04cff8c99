use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{JobIteration, ModelError};

/// Scheduling mode of a service together with its sizing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServiceMode {
    /// A fixed number of replicas spread over the cluster.
    Replicated {
        /// Desired replica count; orchestrators may omit it.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        replicas: Option<u64>,
    },
    /// One task on every eligible node.
    Global,
    /// Run-to-completion job with a fixed number of completions.
    ReplicatedJob {
        /// Upper bound on simultaneously active tasks.
        max_concurrent: u64,
        /// Number of successful completions the job needs.
        total_completions: u64,
    },
    /// Run-to-completion job with one task per eligible node.
    GlobalJob,
}

impl ServiceMode {
    /// Short symbolic name of the mode, intended for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceMode::Replicated { .. } => "replicated",
            ServiceMode::Global => "global",
            ServiceMode::ReplicatedJob { .. } => "replicated-job",
            ServiceMode::GlobalJob => "global-job",
        }
    }

    /// Returns `true` for run-to-completion modes.
    pub fn is_job(&self) -> bool {
        matches!(self, ServiceMode::ReplicatedJob { .. } | ServiceMode::GlobalJob)
    }
}

/// Progress of the most recent service update as tracked by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateState {
    Updating,
    Paused,
    Completed,
    RollbackStarted,
    RollbackPaused,
    RollbackCompleted,
}

impl UpdateState {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateState::Updating => "updating",
            UpdateState::Paused => "paused",
            UpdateState::Completed => "completed",
            UpdateState::RollbackStarted => "rollback_started",
            UpdateState::RollbackPaused => "rollback_paused",
            UpdateState::RollbackCompleted => "rollback_completed",
        }
    }
}

impl fmt::Display for UpdateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpdateState {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "updating" => Ok(UpdateState::Updating),
            "paused" => Ok(UpdateState::Paused),
            "completed" => Ok(UpdateState::Completed),
            "rollback_started" => Ok(UpdateState::RollbackStarted),
            "rollback_paused" => Ok(UpdateState::RollbackPaused),
            "rollback_completed" => Ok(UpdateState::RollbackCompleted),
            _ => Err(ModelError::UnknownUpdateState(s.to_string())),
        }
    }
}

/// Update status attached to a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatus {
    pub state: UpdateState,
    /// Free-text explanation supplied by the orchestrator.
    #[serde(default)]
    pub message: String,
}

impl UpdateStatus {
    pub fn new(state: UpdateState, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
        }
    }
}

/// Snapshot of the declarative service being rolled out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub mode: ServiceMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_status: Option<UpdateStatus>,
    /// How long convergence must hold before it is reported; `None` keeps the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitor: Option<Duration>,
    /// Current run of a job-mode service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_iteration: Option<JobIteration>,
}

impl Service {
    pub fn new(id: impl Into<String>, mode: ServiceMode) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            mode,
            update_status: None,
            monitor: None,
            job_iteration: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_update_status(mut self, status: UpdateStatus) -> Self {
        self.update_status = Some(status);
        self
    }

    pub fn with_monitor(mut self, monitor: Duration) -> Self {
        self.monitor = Some(monitor);
        self
    }

    pub fn with_job_iteration(mut self, iteration: JobIteration) -> Self {
        self.job_iteration = Some(iteration);
        self
    }

    /// Current job iteration, `0` when the orchestrator reports none.
    pub fn current_iteration(&self) -> JobIteration {
        self.job_iteration.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_state_parse() {
        assert_eq!(
            "rollback_started".parse::<UpdateState>().unwrap(),
            UpdateState::RollbackStarted
        );
        assert_eq!("Paused".parse::<UpdateState>().unwrap(), UpdateState::Paused);
        assert!(matches!(
            "exploded".parse::<UpdateState>(),
            Err(ModelError::UnknownUpdateState(s)) if s == "exploded"
        ));
    }

    #[test]
    fn mode_kinds() {
        let replicated = ServiceMode::Replicated { replicas: Some(3) };
        assert_eq!(replicated.kind(), "replicated");
        assert!(!replicated.is_job());
        assert!(ServiceMode::GlobalJob.is_job());
    }

    #[test]
    fn service_serde_roundtrip() {
        let service = Service::new("svc", ServiceMode::ReplicatedJob {
            max_concurrent: 2,
            total_completions: 5,
        })
        .with_update_status(UpdateStatus::new(UpdateState::Updating, "update in progress"))
        .with_job_iteration(4);

        let json = serde_json::to_string(&service).unwrap();
        assert!(json.contains(r#""state":"updating""#));
        assert!(json.contains("replicatedJob"));

        let back: Service = serde_json::from_str(&json).unwrap();
        assert_eq!(back, service);
        assert_eq!(back.current_iteration(), 4);
    }
}
