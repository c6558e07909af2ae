//! hf-models: reference model backends.
//!
//! Provides:
//! - `Oscillator`: continuous damped oscillator with an input force
//! - `SampledCounter`: purely discrete, two periodic rates
//! - `BouncingBall`: zero-crossing event with a state reset
//!
//! `ReferenceModel` selects one of them by name for hosts such as the CLI.

pub mod bouncing_ball;
pub mod error;
pub mod oscillator;
pub mod sampled_counter;

pub use bouncing_ball::BouncingBall;
pub use error::{ModelError, ModelResult};
pub use oscillator::Oscillator;
pub use sampled_counter::SampledCounter;

use hf_core::Role;
use hf_engine::{BackendResult, Capabilities, EvalContext, ModelBackend, ModelDescription, NamedVariable};

pub(crate) fn named(name: &str, role: Role, index: usize) -> NamedVariable {
    NamedVariable {
        name: name.to_string(),
        role,
        index,
    }
}

/// Any of the bundled models.
#[derive(Debug, Clone, Copy)]
pub enum ReferenceModel {
    Oscillator(Oscillator),
    SampledCounter(SampledCounter),
    BouncingBall(BouncingBall),
}

impl ReferenceModel {
    pub const NAMES: [&'static str; 3] = ["oscillator", "sampled_counter", "bouncing_ball"];

    pub fn by_name(name: &str) -> ModelResult<Self> {
        match name {
            "oscillator" => Ok(ReferenceModel::Oscillator(Oscillator::default())),
            "sampled_counter" => Ok(ReferenceModel::SampledCounter(SampledCounter)),
            "bouncing_ball" => Ok(ReferenceModel::BouncingBall(BouncingBall)),
            _ => Err(ModelError::UnknownModel {
                name: name.to_string(),
            }),
        }
    }

    pub fn description(&self) -> ModelDescription {
        match self {
            ReferenceModel::Oscillator(_) => Oscillator::description(),
            ReferenceModel::SampledCounter(_) => SampledCounter::description(),
            ReferenceModel::BouncingBall(_) => BouncingBall::description(),
        }
    }

    fn inner(&mut self) -> &mut dyn ModelBackend {
        match self {
            ReferenceModel::Oscillator(m) => m,
            ReferenceModel::SampledCounter(m) => m,
            ReferenceModel::BouncingBall(m) => m,
        }
    }
}

impl ModelBackend for ReferenceModel {
    fn capabilities(&self) -> Capabilities {
        match self {
            ReferenceModel::Oscillator(m) => m.capabilities(),
            ReferenceModel::SampledCounter(m) => m.capabilities(),
            ReferenceModel::BouncingBall(m) => m.capabilities(),
        }
    }

    fn start(&mut self, cx: &mut EvalContext<'_>) -> BackendResult<()> {
        self.inner().start(cx)
    }

    fn initial_conditions(&mut self, cx: &mut EvalContext<'_>) -> BackendResult<()> {
        self.inner().initial_conditions(cx)
    }

    fn outputs(&mut self, cx: &mut EvalContext<'_>) -> BackendResult<()> {
        self.inner().outputs(cx)
    }

    fn derivatives(&mut self, cx: &mut EvalContext<'_>) -> BackendResult<()> {
        self.inner().derivatives(cx)
    }

    fn update(&mut self, cx: &mut EvalContext<'_>) -> BackendResult<()> {
        self.inner().update(cx)
    }

    fn zero_crossings(&mut self, cx: &mut EvalContext<'_>) -> BackendResult<()> {
        self.inner().zero_crossings(cx)
    }

    fn parameters_changed(&mut self, cx: &mut EvalContext<'_>) -> BackendResult<()> {
        self.inner().parameters_changed(cx)
    }

    fn terminate(&mut self, cx: &mut EvalContext<'_>) -> BackendResult<()> {
        self.inner().terminate(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_name_resolves_to_a_valid_description() {
        for name in ReferenceModel::NAMES {
            let model = ReferenceModel::by_name(name).unwrap();
            let desc = model.description();
            assert_eq!(desc.model_name, name);
            assert!(desc.validate().is_ok(), "{name}");
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = ReferenceModel::by_name("pendulum").unwrap_err();
        assert!(err.to_string().contains("pendulum"));
    }
}
