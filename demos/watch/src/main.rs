use std::env;

use anyhow::{Context, bail};
use tracing::{error, info, warn};

use rollout_core::{ConvergenceMonitor, MonitorConfig, Outcome};
use rollout_engine::{EngineConfig, EngineSource};
use rollout_observe::{LoggerConfig, TracingOutput, logger_init};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1) Logger
    let format = env::var("ROLLOUT_LOG_FORMAT").ok();
    let level = env::var("ROLLOUT_LOG_LEVEL").ok();
    let cfg = LoggerConfig::default().with_overrides(format.as_deref(), level.as_deref())?;
    logger_init(&cfg)?;

    // 2) Arguments
    let Some(service_id) = env::args().nth(1) else {
        bail!("usage: rollout-watch <service-id>");
    };

    // 3) Engine source
    let mut engine = EngineConfig::default();
    if let Ok(endpoint) = env::var("ROLLOUT_ENDPOINT") {
        engine = engine.with_endpoint(endpoint);
    }
    if let Ok(version) = env::var("ROLLOUT_API_VERSION") {
        engine = engine.with_api_version(version);
    }
    info!(endpoint = %engine.endpoint, service = %service_id, "watching service rollout");
    let source = EngineSource::new(engine).context("building engine client")?;

    // 4) Monitor, stopped by ctrl-c
    let mut monitor = ConvergenceMonitor::new(source, TracingOutput::for_service(&service_id))
        .with_config(MonitorConfig::default());
    let cancel = monitor.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received");
            cancel.cancel();
        }
    });

    match monitor.run(&service_id).await {
        Ok(Outcome::Converged) => {
            info!("rollout converged");
            Ok(())
        }
        Ok(Outcome::RolledBack { message }) => {
            warn!(%message, "rollout rolled back");
            bail!("service {service_id} was rolled back: {message}")
        }
        Ok(Outcome::Cancelled) => Ok(()),
        Err(e) => {
            error!(error = %e, "monitoring failed");
            Err(e).with_context(|| format!("monitoring service {service_id}"))
        }
    }
}
