use thiserror::Error;

use crate::value_ref::ScalarType;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Unknown variable role {code} in reference {raw}")]
    UnknownRole { raw: u32, code: u32 },

    #[error("Unknown scalar type {code} in reference {raw}")]
    UnknownScalarType { raw: u32, code: u32 },

    #[error("Index out of range: {what} (index={index}, max={max})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        max: usize,
    },

    #[error("Scalar type mismatch in reference {raw}: encoded {encoded:?}, declared {declared:?}")]
    TypeMismatch {
        raw: u32,
        encoded: ScalarType,
        declared: ScalarType,
    },
}
