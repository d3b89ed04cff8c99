pub mod error;
pub use error::{MonitorError, SourceError};

pub mod rank;

pub mod source;
pub use source::SnapshotSource;

pub mod output;
pub use output::ProgressOutput;

pub mod reconcile;
pub use reconcile::Reconciler;

pub mod updater;
pub use updater::Updater;

pub mod monitor;
pub use monitor::{ConvergenceMonitor, MonitorConfig, Outcome};
