//! Model backend capability set.
//!
//! A backend evaluates the model's equations. It never holds a reference to
//! its instance: every call receives an [`EvalContext`] that borrows the
//! owning instance's time, storage and logger for the duration of the call.

use hf_core::{Role, Status};

use crate::error::BackendResult;
use crate::logging::HostLogger;
use crate::store::VariableStore;

/// Which optional evaluations a backend declares.
///
/// Undeclared evaluations are skipped by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub initial_conditions: bool,
    pub derivatives: bool,
    pub update: bool,
    pub zero_crossings: bool,
}

/// Equations of a model.
///
/// Only [`ModelBackend::outputs`] is required; the optional hooks default to
/// no-ops and are called only if declared in [`ModelBackend::capabilities`]
/// (`start`, `terminate` and `parameters_changed` are always called).
pub trait ModelBackend {
    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    /// Called once at instantiation and again on reset.
    fn start(&mut self, _cx: &mut EvalContext<'_>) -> BackendResult<()> {
        Ok(())
    }

    /// Compute consistent initial states.
    fn initial_conditions(&mut self, _cx: &mut EvalContext<'_>) -> BackendResult<()> {
        Ok(())
    }

    /// Compute outputs (and block signals) at the context time.
    fn outputs(&mut self, cx: &mut EvalContext<'_>) -> BackendResult<()>;

    /// Compute state derivatives.
    fn derivatives(&mut self, _cx: &mut EvalContext<'_>) -> BackendResult<()> {
        Ok(())
    }

    /// Discrete update at a major step.
    fn update(&mut self, _cx: &mut EvalContext<'_>) -> BackendResult<()> {
        Ok(())
    }

    /// Compute the event indicator vector.
    fn zero_crossings(&mut self, _cx: &mut EvalContext<'_>) -> BackendResult<()> {
        Ok(())
    }

    /// Parameters changed in the last set batch; refresh any internal mirror.
    fn parameters_changed(&mut self, _cx: &mut EvalContext<'_>) -> BackendResult<()> {
        Ok(())
    }

    /// Release resources before reset or free.
    fn terminate(&mut self, _cx: &mut EvalContext<'_>) -> BackendResult<()> {
        Ok(())
    }
}

/// Whether the current evaluation is a major (final) or minor (intermediate) step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepKind {
    Major,
    #[default]
    Minor,
}

/// Borrowed view of an instance handed to backend evaluations.
pub struct EvalContext<'a> {
    pub(crate) time: f64,
    pub(crate) step: StepKind,
    pub(crate) store: &'a mut VariableStore,
    pub(crate) states: &'a mut [f64],
    pub(crate) derivatives: &'a mut [f64],
    pub(crate) indicators: &'a mut [f64],
    pub(crate) hits: &'a [bool],
    pub(crate) logger: &'a mut HostLogger,
    pub(crate) solver_reset: &'a mut bool,
}

impl EvalContext<'_> {
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn is_major_step(&self) -> bool {
        self.step == StepKind::Major
    }

    /// Whether `rate` is due in the current cycle.
    pub fn is_sample_hit(&self, rate: usize) -> bool {
        self.hits.get(rate).copied().unwrap_or(false)
    }

    pub fn input(&self, index: usize) -> f64 {
        self.store.real(Role::Input, index)
    }

    pub fn parameter(&self, index: usize) -> f64 {
        self.store.real(Role::Parameter, index)
    }

    pub fn output(&self, index: usize) -> f64 {
        self.store.real(Role::Output, index)
    }

    pub fn set_output(&mut self, index: usize, value: f64) {
        self.store.set_real(Role::Output, index, value);
    }

    pub fn block_signal(&self, index: usize) -> f64 {
        self.store.real(Role::BlockSignal, index)
    }

    pub fn set_block_signal(&mut self, index: usize, value: f64) {
        self.store.set_real(Role::BlockSignal, index, value);
    }

    pub fn work_cell(&self, index: usize) -> f64 {
        self.store.real(Role::WorkCell, index)
    }

    pub fn set_work_cell(&mut self, index: usize, value: f64) {
        self.store.set_real(Role::WorkCell, index, value);
    }

    pub fn states(&self) -> &[f64] {
        &*self.states
    }

    pub fn states_mut(&mut self) -> &mut [f64] {
        &mut *self.states
    }

    pub fn derivatives_mut(&mut self) -> &mut [f64] {
        &mut *self.derivatives
    }

    pub fn indicators_mut(&mut self) -> &mut [f64] {
        &mut *self.indicators
    }

    /// Signal that continuous states were changed discontinuously.
    pub fn request_solver_reset(&mut self) {
        *self.solver_reset = true;
    }

    /// Print through the owning instance's host logger.
    pub fn log(&mut self, message: &str) {
        self.logger.emit(Status::Ok, message);
    }
}
