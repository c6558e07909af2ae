//! Error types for the reference models.

use hf_engine::BackendError;
use thiserror::Error;

/// Errors raised while building or evaluating a reference model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Non-physical value: {what}")]
    NonPhysical { what: &'static str },

    #[error("Unknown model '{name}'")]
    UnknownModel { name: String },
}

pub type ModelResult<T> = Result<T, ModelError>;

impl From<ModelError> for BackendError {
    fn from(e: ModelError) -> Self {
        BackendError::Internal {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ModelError::NonPhysical { what: "damping" };
        assert!(err.to_string().contains("damping"));
    }

    #[test]
    fn converts_to_backend_error() {
        let err: BackendError = ModelError::UnknownModel { name: "pendulum".into() }.into();
        assert!(matches!(err, BackendError::Internal { .. }));
    }
}
