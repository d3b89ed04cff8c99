use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown update state: {0}")]
    UnknownUpdateState(String),
}
