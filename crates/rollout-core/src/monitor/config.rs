use std::time::Duration;

use crate::rank::MAX_PROGRESS_BARS;

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Pause between two polls of the orchestrator (default: 200 ms).
    pub tick_interval: Duration,
    /// How long convergence must hold when the service sets no monitor period (default: 5 seconds).
    pub default_monitor: Duration,
    /// Above this many units only aggregate lines are written (default: 20).
    pub max_progress_bars: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(200),
            default_monitor: Duration::from_secs(5),
            max_progress_bars: MAX_PROGRESS_BARS,
        }
    }
}

impl MonitorConfig {
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn with_default_monitor(mut self, monitor: Duration) -> Self {
        self.default_monitor = monitor;
        self
    }

    pub fn with_max_progress_bars(mut self, max: usize) -> Self {
        self.max_progress_bars = max;
        self
    }
}
