use serde::{Deserialize, Serialize};

/// A single progress line handed to the renderer.
///
/// Events with the same `id` describe the same line; a renderer is expected to
/// redraw that line in place.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub id: String,
    pub action: String,
    #[serde(default)]
    pub current: i64,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub hide_counts: bool,
}

impl ProgressEvent {
    /// A text-only line without a progress bar.
    pub fn line(id: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            action: action.into(),
            ..Default::default()
        }
    }

    /// A progress bar line whose numeric counts are hidden from the user.
    pub fn bar(id: impl Into<String>, action: impl Into<String>, current: i64, total: i64) -> Self {
        Self {
            id: id.into(),
            action: action.into(),
            current,
            total,
            hide_counts: true,
        }
    }

    /// Returns `true` if the event carries a progress bar.
    pub fn has_bar(&self) -> bool {
        self.total > 0
    }
}
