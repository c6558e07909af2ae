//! Error types for engine operations.
//!
//! Errors never cross the caller-facing surface as-is: each one knows the
//! [`Status`] it is reported as, and its `Display` text becomes the host log
//! message.

use hf_core::{CoreError, Status, StatusKind};
use thiserror::Error;

use crate::phase::Phase;

/// Failures reported by a model backend evaluation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("Error reported by model backend: {message}")]
    Internal { message: String },

    #[error("Stop requested by model backend")]
    StopRequested,
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Errors encountered while serving a caller-facing operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("{op}: model is not initialized")]
    NotInitialized { op: &'static str },

    #[error("{op}: not allowed before call to enter_initialization_mode")]
    NotAllowedBeforeInitialization { op: &'static str },

    #[error("{op}: may only be called in {required:?}, instance is in {phase:?}")]
    WrongPhase {
        op: &'static str,
        phase: Phase,
        required: Phase,
    },

    #[error("{op}: only available for {required} instances")]
    WrongKind {
        op: &'static str,
        required: &'static str,
    },

    #[error("{op}: instance terminated in a previous step")]
    Terminated { op: &'static str },

    #[error("{op}: invalid reference {raw}: {source}")]
    InvalidReference {
        op: &'static str,
        raw: u32,
        #[source]
        source: CoreError,
    },

    #[error("{op}: may not change {raw} at this stage")]
    NotWritable { op: &'static str, raw: u32 },

    #[error("{op}: {raw} is not an input")]
    NotAnInput { op: &'static str, raw: u32 },

    #[error("{op}: {got} values supplied for {expected} references")]
    LengthMismatch {
        op: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{op}: invalid batch size {got} (declared {limit})")]
    InvalidBatch {
        op: &'static str,
        got: usize,
        limit: usize,
    },

    #[error("{op}: derivative order {order} is not supported")]
    UnsupportedOrder { op: &'static str, order: i32 },

    #[error("{op}: invalid communication point {got:.16}, expected {expected:.16}")]
    TimeMismatch {
        op: &'static str,
        expected: f64,
        got: f64,
    },

    #[error("{op}: invalid communication step size {h}")]
    InvalidStepSize { op: &'static str, h: f64 },

    #[error("{op}: asynchronous step completion is not supported")]
    AsyncUnsupported { op: &'static str },

    #[error("{op}: status kind {kind:?} is not supported")]
    UnsupportedStatusKind { op: &'static str, kind: StatusKind },

    #[error("setup_experiment: start time {start} other than 0.0 not supported")]
    NonZeroStartTime { start: f64 },

    #[error("{op}: currently not supported")]
    Unsupported { op: &'static str },

    #[error("Invalid model description: {what}")]
    InvalidDescription { what: String },

    #[error("{op}: {source}")]
    Backend {
        op: &'static str,
        #[source]
        source: BackendError,
    },
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Outcome this error is reported as.
    pub fn status(&self) -> Status {
        match self {
            EngineError::NonZeroStartTime { .. } | EngineError::Backend { .. } => Status::Error,
            EngineError::InvalidDescription { .. } => Status::Fatal,
            EngineError::AsyncUnsupported { .. } | EngineError::UnsupportedStatusKind { .. } => {
                Status::Discard
            }
            _ => Status::Warning,
        }
    }

    pub(crate) fn backend(op: &'static str) -> impl FnOnce(BackendError) -> EngineError {
        move |source| EngineError::Backend { op, source }
    }
}

impl From<CoreError> for EngineError {
    fn from(e: CoreError) -> Self {
        EngineError::InvalidDescription {
            what: e.to_string(),
        }
    }
}
