//! Snapshot source backed by a Docker-Engine compatible REST API.

mod config;
pub use config::EngineConfig;

mod errors;
pub use errors::EngineError;

mod wire;

mod source;
pub use source::EngineSource;
