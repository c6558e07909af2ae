//! hf-core: stable foundation for hybrid-fmu.
//!
//! Contains:
//! - numeric (Real + time tolerance + sentinel times)
//! - value_ref (packed variable references: role, scalar type, index)
//! - status (three-tier operation outcome)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod status;
pub mod value_ref;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use status::{Status, StatusKind};
pub use value_ref::{MAX_INDEX, Role, ScalarType, ValueReference};
