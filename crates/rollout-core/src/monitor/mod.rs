//! Polling loop that drives an [`Updater`] until the service converges.

mod config;
pub use config::MonitorConfig;

use std::time::Instant;

use rollout_model::{ProgressEvent, Service, UpdateState};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::MonitorError, output::ProgressOutput, source::SnapshotSource, updater::Updater,
};

/// Line id of the stability and final convergence messages.
pub const VERIFY: &str = "verify";
/// Line id of rollback messages.
pub const ROLLBACK: &str = "rollback";

/// How a monitoring run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The service reached its desired state and held it.
    Converged,
    /// The orchestrator rolled the update back.
    RolledBack { message: String },
    /// Monitoring was interrupted; the rollout itself continues.
    Cancelled,
}

pub struct ConvergenceMonitor<S, O> {
    source: S,
    output: O,
    config: MonitorConfig,
    cancel: CancellationToken,
}

impl<S, O> ConvergenceMonitor<S, O>
where
    S: SnapshotSource,
    O: ProgressOutput + Send,
{
    pub fn new(source: S, output: O) -> Self {
        Self {
            source,
            output,
            config: MonitorConfig::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    /// Stop between ticks once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn into_output(self) -> O {
        self.output
    }

    /// Poll `service_id` until it converges, rolls back, fails or is cancelled.
    ///
    /// Fetch errors end the run immediately.
    #[instrument(level = "debug", skip(self), fields(service = %service_id))]
    pub async fn run(&mut self, service_id: &str) -> Result<Outcome, MonitorError> {
        let mut updater: Option<Updater> = None;
        let mut converged = false;
        let mut converged_at: Option<Instant> = None;
        let mut monitor = self.config.default_monitor;
        let mut rollback = false;
        let mut rollback_message = String::new();
        // At most one rollback line per run.
        let mut rollback_announced = false;

        loop {
            let service = self.source.fetch_service(service_id).await?;
            if let Some(period) = service.monitor.filter(|period| !period.is_zero()) {
                monitor = period;
            }
            let current = select_updater(&mut updater, &service, self.config.max_progress_bars)?;

            if let Some(status) = &service.update_status {
                match status.state {
                    UpdateState::Updating => rollback = false,
                    UpdateState::Completed => {
                        if converged {
                            info!("update completed");
                            return Ok(self.finish(service_id, rollback, &rollback_message));
                        }
                    }
                    UpdateState::Paused => {
                        warn!(message = %status.message, "service update paused");
                        return Err(MonitorError::Paused(status.message.clone()));
                    }
                    UpdateState::RollbackStarted => {
                        if !rollback_announced && !status.message.is_empty() {
                            self.output
                                .write_progress(ProgressEvent::line(ROLLBACK, status.message.clone()));
                            rollback_announced = true;
                        }
                        rollback = true;
                        rollback_message.clone_from(&status.message);
                    }
                    UpdateState::RollbackPaused => {
                        warn!(message = %status.message, "service rollback paused");
                        return Err(MonitorError::RollbackPaused(status.message.clone()));
                    }
                    UpdateState::RollbackCompleted => {
                        rollback = true;
                        rollback_message.clone_from(&status.message);
                        if !converged {
                            if !rollback_announced && !rollback_message.is_empty() {
                                self.output.write_progress(ProgressEvent::line(
                                    ROLLBACK,
                                    rollback_message.clone(),
                                ));
                            }
                            info!("rollback completed");
                            return Ok(Outcome::RolledBack {
                                message: rollback_message,
                            });
                        }
                    }
                }
            }

            if converged && converged_at.is_some_and(|at| at.elapsed() >= monitor) {
                return Ok(self.finish(service_id, rollback, &rollback_message));
            }

            let tasks = self.source.fetch_up_to_date_tasks(service_id).await?;
            let active_nodes = self.source.fetch_active_nodes().await?;

            converged = current.update(&service, &tasks, &active_nodes, rollback, &mut self.output)?;
            debug!(
                tasks = tasks.len(),
                nodes = active_nodes.len(),
                converged,
                rollback,
                "tick processed"
            );

            if converged {
                // Jobs stay done once they are done: no stability window.
                if service.mode.is_job() {
                    return Ok(self.finish(service_id, rollback, &rollback_message));
                }
                let since = *converged_at.get_or_insert_with(Instant::now);
                if let Some(wait) = monitor.checked_sub(since.elapsed()) {
                    self.output.write_progress(ProgressEvent::line(
                        VERIFY,
                        format!(
                            "Waiting {} seconds to verify that tasks are stable...",
                            wait.as_secs() + 1
                        ),
                    ));
                }
            } else if converged_at.take().is_some() {
                warn!("task failure detected after convergence");
                self.output
                    .write_progress(ProgressEvent::line(VERIFY, "Detected task failure"));
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.tick_interval) => {}
                _ = self.cancel.cancelled() => {
                    if !converged {
                        self.output.write_progress(ProgressEvent::line(
                            "",
                            "Operation continuing in background.",
                        ));
                        self.output.write_progress(ProgressEvent::line(
                            "",
                            format!("Use `docker service ps {service_id}` to check progress."),
                        ));
                    }
                    info!("monitoring cancelled");
                    return Ok(Outcome::Cancelled);
                }
            }
        }
    }

    fn finish(&mut self, service_id: &str, rollback: bool, rollback_message: &str) -> Outcome {
        self.output.write_progress(ProgressEvent::line(
            VERIFY,
            format!("Service {service_id} converged"),
        ));
        if rollback {
            info!(message = %rollback_message, "service converged after rollback");
            Outcome::RolledBack {
                message: rollback_message.to_string(),
            }
        } else {
            info!("service converged");
            Outcome::Converged
        }
    }
}

/// Updater for this run, built on the first tick.
fn select_updater<'a>(
    slot: &'a mut Option<Updater>,
    service: &Service,
    max_bars: usize,
) -> Result<&'a mut Updater, MonitorError> {
    match slot {
        Some(existing) => {
            if !existing.matches(&service.mode) {
                return Err(MonitorError::ModeChanged {
                    from: existing.kind(),
                    to: service.mode.kind(),
                });
            }
            Ok(existing)
        }
        None => {
            let created = Updater::for_service(service, max_bars)?;
            info!(mode = created.kind(), "progress updater selected");
            Ok(slot.insert(created))
        }
    }
}
