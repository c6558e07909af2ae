//! CLI error type.

use hf_core::Status;
use hf_engine::EngineError;
use hf_models::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {what}")]
    InvalidConfig { what: String },

    #[error("Unknown variable '{name}' in model '{model}'")]
    UnknownVariable { name: String, model: String },

    #[error("{op} returned {status}")]
    Status { op: &'static str, status: Status },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type CliResult<T> = Result<T, CliError>;

/// Fail on Error/Fatal; warnings were already reported through the host sink.
pub fn check(op: &'static str, status: Status) -> CliResult<()> {
    match status {
        Status::Ok | Status::Warning | Status::Discard => Ok(()),
        Status::Error | Status::Fatal => Err(CliError::Status { op, status }),
    }
}
