//! Progress rendering onto the `tracing` pipeline.

mod view;
pub use view::ProgressKind;

use rollout_core::ProgressOutput;
use rollout_model::ProgressEvent;
use tracing::{debug, info, trace, warn};

/// Logs every progress event instead of drawing it.
///
/// Suited to non-interactive runs where a redrawn terminal is not available.
#[derive(Debug, Default)]
pub struct TracingOutput {
    service: Option<String>,
    written: u64,
}

impl TracingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a service name to every record.
    pub fn for_service(service: impl Into<String>) -> Self {
        Self {
            service: Some(service.into()),
            written: 0,
        }
    }

    /// Events received so far, placeholders included.
    pub fn written(&self) -> u64 {
        self.written
    }
}

impl ProgressOutput for TracingOutput {
    fn write_progress(&mut self, event: ProgressEvent) {
        self.written += 1;
        log_progress(self.service.as_deref().unwrap_or(""), &event);
    }
}

/// Emit `event` at the level matching its [`ProgressKind`].
pub fn log_progress(service: &str, event: &ProgressEvent) {
    let kind = ProgressKind::of(event);
    let unit = event.id.as_str();
    let msg = event.action.trim_end();

    match kind {
        ProgressKind::Verify | ProgressKind::Rollback => {
            info!(service, kind = kind.as_str(), "{msg}")
        }
        ProgressKind::Aggregate => info!(service, id = unit, "{msg}"),
        ProgressKind::Notice => info!(service, "{msg}"),
        ProgressKind::TaskError => warn!(service, unit, "{msg}"),
        ProgressKind::Bar => debug!(
            service,
            unit,
            current = event.current,
            total = event.total,
            "{msg}"
        ),
        ProgressKind::Placeholder => trace!(service, unit, "unit reserved"),
    }
}
