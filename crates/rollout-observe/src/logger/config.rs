use std::io::IsTerminal;

use serde::{Deserialize, Serialize};

use crate::logger::{error::LoggerError, format::LoggerFormat};

/// Settings for [`logger_init`](crate::logger_init).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// `EnvFilter` directive, e.g. `info` or `rollout_core=debug,warn`.
    pub level: String,
    pub with_targets: bool,
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        let use_color = cfg!(test) || std::io::stdout().is_terminal();
        Self {
            format: LoggerFormat::Text,
            level: "info".to_string(),
            with_targets: true,
            use_color,
        }
    }
}

impl LoggerConfig {
    /// Override the format and level from their textual forms.
    ///
    /// `None` keeps the current value.
    pub fn with_overrides(
        mut self,
        format: Option<&str>,
        level: Option<&str>,
    ) -> Result<Self, LoggerError> {
        if let Some(format) = format {
            self.format = format.parse()?;
        }
        if let Some(level) = level.map(str::trim).filter(|level| !level.is_empty()) {
            self.level = level.to_string();
        }
        Ok(self)
    }
}
