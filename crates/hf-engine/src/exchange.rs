//! Model-exchange operations: the host integrates and drives events.

use hf_core::Status;

use crate::backend::ModelBackend;
use crate::error::EngineResult;
use crate::event::{EventInfo, StepCompletion};
use crate::instance::{Instance, InterfaceKind};
use crate::phase::Transition;

const ME: InterfaceKind = InterfaceKind::ModelExchange;

impl<B: ModelBackend> Instance<B> {
    pub fn enter_event_mode(&mut self) -> Status {
        let result = self.try_enter_event_mode();
        self.report(result)
    }

    fn try_enter_event_mode(&mut self) -> EngineResult<Status> {
        const OP: &str = "enter_event_mode";
        self.require_kind(OP, ME)?;
        self.require_initialized(OP)?;
        self.phase = self.check_transition(OP, Transition::EnterEventMode)?;
        let message = format!("Entered event mode at t={}", self.clock);
        self.logger.emit(Status::Ok, &message);
        Ok(Status::Ok)
    }

    pub fn new_discrete_states(&mut self, info: &mut EventInfo) -> Status {
        let result = self.try_new_discrete_states(info);
        self.report(result)
    }

    fn try_new_discrete_states(&mut self, info: &mut EventInfo) -> EngineResult<Status> {
        const OP: &str = "new_discrete_states";
        self.require_kind(OP, ME)?;
        self.require_initialized(OP)?;
        *info = self.discrete_cycle(OP)?;
        Ok(Status::Ok)
    }

    pub fn enter_continuous_time_mode(&mut self) -> Status {
        let result = self.try_enter_continuous_time_mode();
        self.report(result)
    }

    fn try_enter_continuous_time_mode(&mut self) -> EngineResult<Status> {
        const OP: &str = "enter_continuous_time_mode";
        self.require_kind(OP, ME)?;
        self.require_initialized(OP)?;
        self.phase = self.check_transition(OP, Transition::EnterContinuousTimeMode)?;
        self.entered_continuous = true;
        Ok(Status::Ok)
    }

    /// Check the indicators for a sign change. Without one, the step is
    /// finished as a major step; with one, that work is left to the next
    /// event-mode cycle. Never requests event mode or termination itself.
    pub fn completed_integrator_step(
        &mut self,
        _no_set_fmu_state_prior: bool,
        completion: &mut StepCompletion,
    ) -> Status {
        let result = self.try_completed_integrator_step(completion);
        self.report(result)
    }

    fn try_completed_integrator_step(
        &mut self,
        completion: &mut StepCompletion,
    ) -> EngineResult<Status> {
        const OP: &str = "completed_integrator_step";
        self.require_kind(OP, ME)?;
        self.require_initialized(OP)?;

        self.eval_zero_crossings(OP)?;
        let crossing = self.detector.check(&self.indicators);
        self.last_crossing = crossing;
        match crossing {
            Some(c) => {
                tracing::trace!(t = self.clock, index = c.index, direction = ?c.direction, "zero crossing");
            }
            None if !self.purely_discrete => {
                self.schedule.set_offset_sampled_hit(true);
                let finished = self.major_step(|this| {
                    this.eval_outputs(OP)?;
                    this.eval_update(OP)
                });
                self.schedule.set_offset_sampled_hit(false);
                finished?;
            }
            None => {}
        }

        *completion = StepCompletion::default();
        self.should_recompute = true;
        Ok(Status::Ok)
    }

    pub fn set_time(&mut self, time: f64) -> Status {
        let result = self.require_kind("set_time", ME).map(|()| {
            self.clock = time;
            Status::Ok
        });
        self.report(result)
    }

    pub fn set_continuous_states(&mut self, x: &[f64]) -> Status {
        let result = self.try_set_continuous_states(x);
        self.report(result)
    }

    fn try_set_continuous_states(&mut self, x: &[f64]) -> EngineResult<Status> {
        const OP: &str = "set_continuous_states";
        self.require_kind(OP, ME)?;
        self.require_access(OP)?;
        let status = self.check_count(OP, x.len(), self.states.len());
        let n = x.len().min(self.states.len());
        self.states[..n].copy_from_slice(&x[..n]);
        self.should_recompute = true;
        Ok(status)
    }

    pub fn get_derivatives(&mut self, dx: &mut [f64]) -> Status {
        let result = self.try_get_derivatives(dx);
        self.report(result)
    }

    fn try_get_derivatives(&mut self, dx: &mut [f64]) -> EngineResult<Status> {
        const OP: &str = "get_derivatives";
        self.require_kind(OP, ME)?;
        self.require_access(OP)?;
        let status = self.check_count(OP, dx.len(), self.derivatives.len());
        self.eval_outputs(OP)?;
        self.eval_derivatives(OP)?;
        let n = dx.len().min(self.derivatives.len());
        dx[..n].copy_from_slice(&self.derivatives[..n]);
        Ok(status)
    }

    pub fn get_event_indicators(&mut self, z: &mut [f64]) -> Status {
        let result = self.try_get_event_indicators(z);
        self.report(result)
    }

    fn try_get_event_indicators(&mut self, z: &mut [f64]) -> EngineResult<Status> {
        const OP: &str = "get_event_indicators";
        self.require_kind(OP, ME)?;
        self.require_access(OP)?;
        let status = self.check_count(OP, z.len(), self.indicators.len());
        self.eval_outputs(OP)?;
        self.eval_zero_crossings(OP)?;
        let n = z.len().min(self.indicators.len());
        z[..n].copy_from_slice(&self.indicators[..n]);
        Ok(status)
    }

    pub fn get_continuous_states(&mut self, x: &mut [f64]) -> Status {
        let result = self.try_get_continuous_states(x);
        self.report(result)
    }

    fn try_get_continuous_states(&mut self, x: &mut [f64]) -> EngineResult<Status> {
        const OP: &str = "get_continuous_states";
        self.require_kind(OP, ME)?;
        self.require_access(OP)?;
        let status = self.check_count(OP, x.len(), self.states.len());
        let n = x.len().min(self.states.len());
        x[..n].copy_from_slice(&self.states[..n]);
        Ok(status)
    }

    /// Nominal values are unknown and reported as 1.0.
    pub fn get_nominals_of_continuous_states(&mut self, nominals: &mut [f64]) -> Status {
        let result = self.try_get_nominals(nominals);
        self.report(result)
    }

    fn try_get_nominals(&mut self, nominals: &mut [f64]) -> EngineResult<Status> {
        const OP: &str = "get_nominals_of_continuous_states";
        self.require_kind(OP, ME)?;
        self.require_access(OP)?;
        let status = self.check_count(OP, nominals.len(), self.states.len());
        let n = nominals.len().min(self.states.len());
        nominals[..n].fill(1.0);
        Ok(status)
    }

    /// Warn about a length differing from the declared count; the caller
    /// goes on with the common prefix.
    fn check_count(&mut self, op: &'static str, got: usize, declared: usize) -> Status {
        if got == declared {
            return Status::Ok;
        }
        let message = format!("{op}: expected {declared} elements, got {got}");
        self.logger.emit(Status::Warning, &message);
        Status::Warning
    }
}
