//! Engine JSON shapes and their conversion into the model types.
//!
//! Only the fields the monitor reads are declared; everything else is ignored.

use std::time::Duration;

use rollout_model::{Service, ServiceMode, Task, TaskState, UpdateStatus};
use serde::Deserialize;

use crate::errors::EngineError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceBody {
    #[serde(rename = "ID")]
    pub id: String,
    pub spec: ServiceSpec,
    #[serde(default)]
    pub update_status: Option<UpdateStatusBody>,
    #[serde(default)]
    pub job_status: Option<JobStatusBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mode: ModeBody,
    #[serde(default)]
    pub update_config: Option<UpdateConfigBody>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModeBody {
    pub replicated: Option<ReplicatedBody>,
    pub global: Option<serde_json::Value>,
    pub replicated_job: Option<ReplicatedJobBody>,
    pub global_job: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReplicatedBody {
    pub replicas: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReplicatedJobBody {
    pub max_concurrent: Option<u64>,
    pub total_completions: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateConfigBody {
    /// Nanoseconds.
    #[serde(default)]
    pub monitor: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateStatusBody {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobStatusBody {
    pub job_iteration: Option<VersionBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VersionBody {
    #[serde(default)]
    pub index: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskBody {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(default)]
    pub slot: u64,
    #[serde(rename = "NodeID", default)]
    pub node_id: String,
    #[serde(default)]
    pub desired_state: TaskState,
    #[serde(default)]
    pub status: TaskStatusBody,
    #[serde(default)]
    pub job_iteration: Option<VersionBody>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskStatusBody {
    #[serde(default)]
    pub state: TaskState,
    #[serde(default)]
    pub err: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NodeBody {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(default)]
    pub status: NodeStatusBody,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NodeStatusBody {
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: String,
}

impl NodeBody {
    /// Down nodes cannot run tasks; every other state still counts.
    pub fn is_active(&self) -> bool {
        !self.status.state.eq_ignore_ascii_case("down")
    }
}

impl ModeBody {
    fn into_mode(self) -> Result<ServiceMode, EngineError> {
        if let Some(replicated) = self.replicated {
            return Ok(ServiceMode::Replicated {
                replicas: replicated.replicas,
            });
        }
        if self.global.is_some() {
            return Ok(ServiceMode::Global);
        }
        if let Some(job) = self.replicated_job {
            let max_concurrent = job.max_concurrent.unwrap_or(1);
            return Ok(ServiceMode::ReplicatedJob {
                max_concurrent,
                total_completions: job.total_completions.unwrap_or(max_concurrent),
            });
        }
        if self.global_job.is_some() {
            return Ok(ServiceMode::GlobalJob);
        }
        Err(EngineError::Invalid("service has no mode".into()))
    }
}

impl TryFrom<ServiceBody> for Service {
    type Error = EngineError;

    fn try_from(body: ServiceBody) -> Result<Self, Self::Error> {
        let mut service = Service::new(body.id, body.spec.mode.into_mode()?).with_name(body.spec.name);

        if let Some(status) = body.update_status
            && !status.state.is_empty()
        {
            service = service.with_update_status(UpdateStatus::new(
                status.state.parse()?,
                status.message,
            ));
        }
        if let Some(cfg) = body.spec.update_config
            && cfg.monitor > 0
        {
            service = service.with_monitor(Duration::from_nanos(cfg.monitor));
        }
        if let Some(iteration) = body.job_status.and_then(|status| status.job_iteration) {
            service = service.with_job_iteration(iteration.index);
        }
        Ok(service)
    }
}

impl From<TaskBody> for Task {
    fn from(body: TaskBody) -> Self {
        let mut task = Task::new(body.id, body.desired_state, body.status.state)
            .with_slot(body.slot)
            .with_node(body.node_id);
        if !body.status.err.is_empty() {
            task = task.with_err(body.status.err);
        }
        if let Some(iteration) = body.job_iteration {
            task = task.with_job_iteration(iteration.index);
        }
        task
    }
}

#[cfg(test)]
mod tests {
    use rollout_model::UpdateState;

    use super::*;

    fn service(json: &str) -> Result<Service, EngineError> {
        let body: ServiceBody = serde_json::from_str(json)?;
        Service::try_from(body)
    }

    #[test]
    fn decodes_replicated_service_under_rollback() {
        let svc = service(
            r#"{
                "ID": "9mnpnzenvg8p8tdbtq4wvbkcz",
                "Version": {"Index": 19},
                "Spec": {
                    "Name": "web",
                    "Mode": {"Replicated": {"Replicas": 3}},
                    "UpdateConfig": {"Parallelism": 1, "Monitor": 15000000000}
                },
                "UpdateStatus": {
                    "State": "rollback_started",
                    "Message": "update rolled back due to failure or early termination of task"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(svc.id, "9mnpnzenvg8p8tdbtq4wvbkcz");
        assert_eq!(svc.name, "web");
        assert_eq!(svc.mode, ServiceMode::Replicated { replicas: Some(3) });
        assert_eq!(svc.monitor, Some(Duration::from_secs(15)));
        let status = svc.update_status.unwrap();
        assert_eq!(status.state, UpdateState::RollbackStarted);
        assert!(status.message.starts_with("update rolled back"));
    }

    #[test]
    fn decodes_job_modes() {
        let svc = service(
            r#"{"ID":"j","Spec":{"Mode":{"ReplicatedJob":{"MaxConcurrent":2,"TotalCompletions":5}}},
                "JobStatus":{"JobIteration":{"Index":4}}}"#,
        )
        .unwrap();
        assert_eq!(svc.mode, ServiceMode::ReplicatedJob {
            max_concurrent: 2,
            total_completions: 5
        });
        assert_eq!(svc.job_iteration, Some(4));

        let svc = service(r#"{"ID":"g","Spec":{"Mode":{"GlobalJob":{}}}}"#).unwrap();
        assert_eq!(svc.mode, ServiceMode::GlobalJob);
        assert_eq!(svc.current_iteration(), 0);
    }

    #[test]
    fn replicated_job_defaults_follow_concurrency() {
        let svc = service(r#"{"ID":"j","Spec":{"Mode":{"ReplicatedJob":{"MaxConcurrent":3}}}}"#)
            .unwrap();
        assert_eq!(svc.mode, ServiceMode::ReplicatedJob {
            max_concurrent: 3,
            total_completions: 3
        });
    }

    #[test]
    fn empty_update_state_means_no_update() {
        let svc = service(
            r#"{"ID":"g","Spec":{"Mode":{"Global":{}}},"UpdateStatus":{"State":"","Message":""}}"#,
        )
        .unwrap();
        assert_eq!(svc.mode, ServiceMode::Global);
        assert!(svc.update_status.is_none());
        assert!(svc.monitor.is_none());
    }

    #[test]
    fn unknown_update_state_is_rejected() {
        let res = service(
            r#"{"ID":"w","Spec":{"Mode":{"Global":{}}},"UpdateStatus":{"State":"sideways"}}"#,
        );
        assert!(matches!(res, Err(EngineError::Model(_))));
    }

    #[test]
    fn missing_mode_is_invalid() {
        let res = service(r#"{"ID":"w","Spec":{"Name":"w"}}"#);
        assert!(matches!(res, Err(EngineError::Invalid(_))));
    }

    #[test]
    fn decodes_tasks() {
        let body: Vec<TaskBody> = serde_json::from_str(
            r#"[
                {"ID":"a","Slot":1,"NodeID":"n1","DesiredState":"running",
                 "Status":{"State":"rejected","Err":"no suitable node"}},
                {"ID":"b","NodeID":"n2","DesiredState":"complete",
                 "Status":{"State":"orphaned"},"JobIteration":{"Index":2}}
            ]"#,
        )
        .unwrap();
        let tasks: Vec<Task> = body.into_iter().map(Task::from).collect();

        assert_eq!(tasks[0].slot, 1);
        assert_eq!(tasks[0].state, TaskState::Rejected);
        assert_eq!(tasks[0].error(), Some("no suitable node"));

        assert_eq!(tasks[1].state, TaskState::Unknown);
        assert_eq!(tasks[1].job_iteration, Some(2));
        assert_eq!(tasks[1].error(), None);
        assert!(!tasks[1].has_known_states());
    }

    #[test]
    fn down_nodes_are_inactive() {
        let nodes: Vec<NodeBody> = serde_json::from_str(
            r#"[{"ID":"n1","Status":{"State":"ready"}},
                {"ID":"n2","Status":{"State":"down"}},
                {"ID":"n3","Status":{"State":"unknown"}}]"#,
        )
        .unwrap();
        let active: Vec<_> = nodes
            .iter()
            .filter(|n| n.is_active())
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(active, vec!["n1", "n3"]);
    }
}
