use rollout_core::SourceError;
use rollout_model::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("engine returned {code}: {message}")]
    Status { code: u16, message: String },

    #[error("failed to decode engine response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unexpected engine response: {0}")]
    Invalid(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl From<EngineError> for SourceError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Status { code: 404, message } => SourceError::ServiceNotFound(message),
            EngineError::Http(_) | EngineError::Status { .. } => {
                SourceError::Transport(err.to_string())
            }
            EngineError::Decode(_) | EngineError::Invalid(_) | EngineError::Model(_) => {
                SourceError::Invalid(err.to_string())
            }
        }
    }
}
