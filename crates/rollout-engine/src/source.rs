use std::{collections::HashSet, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use rollout_core::{SnapshotSource, SourceError};
use rollout_model::{NodeId, Service, Task};

use crate::{
    config::EngineConfig,
    errors::EngineError,
    wire::{ErrorBody, NodeBody, ServiceBody, TaskBody},
};

/// Reads service, task and node snapshots over HTTP.
#[derive(Debug, Clone)]
pub struct EngineSource {
    client: Client,
    config: EngineConfig,
}

impl EngineSource {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn service(&self, service_id: &str) -> Result<Service, EngineError> {
        let url = self.url(&format!("services/{service_id}"), &[])?;
        let body: ServiceBody = self.get(url).await?;
        Service::try_from(body)
    }

    /// Tasks of `service_id` that run its current spec.
    pub async fn up_to_date_tasks(&self, service_id: &str) -> Result<Vec<Task>, EngineError> {
        let filters = task_filters(service_id);
        let url = self.url("tasks", &[("filters", filters.as_str())])?;
        let body: Vec<TaskBody> = self.get(url).await?;
        Ok(body.into_iter().map(Task::from).collect())
    }

    pub async fn active_nodes(&self) -> Result<HashSet<NodeId>, EngineError> {
        let url = self.url("nodes", &[])?;
        let body: Vec<NodeBody> = self.get(url).await?;
        Ok(body
            .into_iter()
            .filter(NodeBody::is_active)
            .map(|node| node.id)
            .collect())
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, EngineError> {
        let raw = self.config.url(path);
        Url::parse_with_params(&raw, params)
            .map_err(|e| EngineError::Invalid(format!("bad url {raw}: {e}")))
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, EngineError> {
        debug!(%url, "engine request");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(EngineError::Status {
                code: status.as_u16(),
                message: error_message(&body),
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl SnapshotSource for EngineSource {
    #[instrument(level = "trace", skip(self))]
    async fn fetch_service(&self, service_id: &str) -> Result<Service, SourceError> {
        Ok(self.service(service_id).await?)
    }

    #[instrument(level = "trace", skip(self))]
    async fn fetch_up_to_date_tasks(&self, service_id: &str) -> Result<Vec<Task>, SourceError> {
        Ok(self.up_to_date_tasks(service_id).await?)
    }

    #[instrument(level = "trace", skip(self))]
    async fn fetch_active_nodes(&self) -> Result<HashSet<NodeId>, SourceError> {
        Ok(self.active_nodes().await?)
    }
}

/// `filters` query value selecting the up-to-date tasks of one service.
fn task_filters(service_id: &str) -> String {
    let mut service = serde_json::Map::new();
    service.insert(service_id.to_string(), serde_json::Value::Bool(true));
    serde_json::json!({
        "service": service,
        "_up-to-date": { "true": true },
    })
    .to_string()
}

/// Engine error bodies carry a `message` field; anything else is passed through.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(err) if !err.message.is_empty() => err.message,
        _ => body.trim().to_string(),
    }
}
