//! Model instance: lifecycle operations and shared plumbing.
//!
//! Each caller-facing method is a thin wrapper around a private `try_*`
//! function returning [`EngineResult<Status>`]. [`Instance::report`] turns an
//! error into its [`Status`] and logs its text through the host sink.
//! Variable access, model-exchange and co-simulation operations live in
//! sibling modules as further `impl` blocks.

use hf_core::{EPS, Status};

use crate::backend::{Capabilities, EvalContext, ModelBackend, StepKind};
use crate::description::ModelDescription;
use crate::error::{BackendResult, EngineError, EngineResult};
use crate::event::EventInfo;
use crate::logging::{HostLogger, LogSink};
use crate::phase::{Phase, Transition, TransitionOutcome};
use crate::schedule::SampleSchedule;
use crate::store::VariableStore;
use crate::zero_crossing::{Crossing, EventDetector};

/// Interface flavour requested at instantiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceKind {
    ModelExchange,
    CoSimulation,
}

impl InterfaceKind {
    fn label(self) -> &'static str {
        match self {
            InterfaceKind::ModelExchange => "model-exchange",
            InterfaceKind::CoSimulation => "co-simulation",
        }
    }
}

/// Host callbacks supplied at instantiation.
pub struct Callbacks {
    pub logger: Box<dyn LogSink>,
    /// Asynchronous step completion; accepted but never called.
    pub step_finished: Option<Box<dyn FnMut(Status)>>,
}

impl Callbacks {
    pub fn new(logger: impl LogSink + 'static) -> Self {
        Self {
            logger: Box::new(logger),
            step_finished: None,
        }
    }

    pub fn with_step_finished(mut self, step_finished: impl FnMut(Status) + 'static) -> Self {
        self.step_finished = Some(Box::new(step_finished));
        self
    }
}

/// One simulation model instance.
pub struct Instance<B: ModelBackend> {
    pub(crate) desc: ModelDescription,
    pub(crate) kind: InterfaceKind,
    pub(crate) backend: B,
    pub(crate) caps: Capabilities,
    pub(crate) logger: HostLogger,
    pub(crate) phase: Phase,
    pub(crate) store: VariableStore,
    pub(crate) states: Vec<f64>,
    pub(crate) derivatives: Vec<f64>,
    pub(crate) indicators: Vec<f64>,
    pub(crate) detector: EventDetector,
    pub(crate) schedule: SampleSchedule,
    /// Model time seen by the backend.
    pub(crate) clock: f64,
    /// Co-simulation communication time.
    pub(crate) comm_time: f64,
    pub(crate) last_get_time: Option<f64>,
    pub(crate) should_recompute: bool,
    pub(crate) purely_discrete: bool,
    pub(crate) entered_continuous: bool,
    /// Internal fixed steps taken by `do_step`.
    pub(crate) solver_steps: u64,
    /// Reference time of input extrapolation.
    pub(crate) derivative_time: f64,
    pub(crate) step: StepKind,
    pub(crate) solver_reset: bool,
    pub(crate) event_info: EventInfo,
    pub(crate) last_crossing: Option<Crossing>,
}

impl<B: ModelBackend> Instance<B> {
    /// Create an instance. Fails if the description is inconsistent or the
    /// backend's start hook fails.
    pub fn instantiate(
        name: impl Into<String>,
        kind: InterfaceKind,
        desc: ModelDescription,
        backend: B,
        callbacks: Callbacks,
        logging_on: bool,
    ) -> EngineResult<Self> {
        desc.validate()?;
        let mut logger = HostLogger::new(name, callbacks.logger, logging_on);
        if kind == InterfaceKind::CoSimulation && callbacks.step_finished.is_some() {
            logger.emit(
                Status::Warning,
                "Asynchronous do_step is not supported, step_finished will never be called",
            );
        }

        let nx = desc.num_states();
        let mut instance = Self {
            caps: backend.capabilities(),
            store: VariableStore::new(&desc),
            states: desc.states.clone(),
            derivatives: vec![0.0; nx],
            indicators: vec![0.0; desc.event_indicators],
            detector: EventDetector::new(desc.event_indicators),
            schedule: SampleSchedule::new(&desc),
            desc,
            kind,
            backend,
            logger,
            phase: Phase::Instantiated,
            clock: 0.0,
            comm_time: 0.0,
            last_get_time: None,
            should_recompute: false,
            purely_discrete: false,
            entered_continuous: false,
            solver_steps: 0,
            derivative_time: 0.0,
            step: StepKind::Minor,
            solver_reset: false,
            event_info: EventInfo::default(),
            last_crossing: None,
        };
        instance
            .eval(|b, cx| b.start(cx))
            .map_err(EngineError::backend("instantiate"))?;

        let message = format!(
            "Instantiated {} instance of '{}'",
            kind.label(),
            instance.desc.model_name
        );
        instance.logger.emit(Status::Ok, &message);
        Ok(instance)
    }

    /// Release the instance, running the backend's terminate hook.
    pub fn free_instance(self) {
        drop(self);
    }

    pub fn version() -> &'static str {
        "2.0"
    }

    pub fn types_platform() -> &'static str {
        "default"
    }

    pub fn name(&self) -> &str {
        self.logger.instance_name()
    }

    pub fn kind(&self) -> InterfaceKind {
        self.kind
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn description(&self) -> &ModelDescription {
        &self.desc
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Model time.
    pub fn time(&self) -> f64 {
        self.clock
    }

    pub fn communication_time(&self) -> f64 {
        self.comm_time
    }

    pub fn solver_steps(&self) -> u64 {
        self.solver_steps
    }

    pub fn hit_counts(&self) -> &[u64] {
        self.schedule.hit_counts()
    }

    pub fn is_purely_discrete(&self) -> bool {
        self.purely_discrete
    }

    /// Indicator values of the last event or completed step.
    pub fn zero_crossing_baseline(&self) -> &[f64] {
        self.detector.baseline()
    }

    /// Crossing found by the last completed integrator step.
    pub fn last_crossing(&self) -> Option<Crossing> {
        self.last_crossing
    }

    /// Result of the last discrete cycle run by `exit_initialization_mode`
    /// or `do_step` on a co-simulation instance.
    pub fn last_event_info(&self) -> EventInfo {
        self.event_info
    }

    pub fn set_debug_logging(&mut self, logging_on: bool, categories: &[&str]) -> Status {
        self.logger.set_enabled(logging_on, categories);
        Status::Ok
    }

    /// Tolerance is ignored; a stop time is accepted but not enforced.
    pub fn setup_experiment(
        &mut self,
        tolerance: Option<f64>,
        start_time: f64,
        stop_time: Option<f64>,
    ) -> Status {
        let result = self.try_setup_experiment(tolerance, start_time, stop_time);
        self.report(result)
    }

    fn try_setup_experiment(
        &mut self,
        _tolerance: Option<f64>,
        start_time: f64,
        stop_time: Option<f64>,
    ) -> EngineResult<Status> {
        if let Some(stop) = stop_time {
            let message = format!("Stop time {stop} is ignored");
            self.logger.emit(Status::Ok, &message);
        }
        if start_time.abs() > EPS {
            return Err(EngineError::NonZeroStartTime { start: start_time });
        }
        Ok(Status::Ok)
    }

    pub fn enter_initialization_mode(&mut self) -> Status {
        let result = self.try_enter_initialization_mode();
        self.report(result)
    }

    fn try_enter_initialization_mode(&mut self) -> EngineResult<Status> {
        const OP: &str = "enter_initialization_mode";
        let to = self.check_transition(OP, Transition::EnterInitialization)?;

        if let Err(e) = self.seed_initial_state(OP) {
            self.apply(Transition::Abort);
            return Err(e);
        }
        self.phase = to;
        self.logger.emit(Status::Ok, "Entered initialization mode");
        Ok(Status::Ok)
    }

    fn seed_initial_state(&mut self, op: &'static str) -> EngineResult<()> {
        if self.caps.initial_conditions {
            self.eval(|b, cx| b.initial_conditions(cx))
                .map_err(EngineError::backend(op))?;
        }
        self.clock = 0.0;
        if self.kind == InterfaceKind::ModelExchange {
            self.schedule.set_offset_sampled_hit(true);
            let outputs = self.eval_outputs(op);
            self.schedule.set_offset_sampled_hit(false);
            outputs?;
        }
        Ok(())
    }

    pub fn exit_initialization_mode(&mut self) -> Status {
        let result = self.try_exit_initialization_mode();
        self.report(result)
    }

    fn try_exit_initialization_mode(&mut self) -> EngineResult<Status> {
        const OP: &str = "exit_initialization_mode";
        self.phase = self.check_transition(OP, Transition::ExitInitialization)?;

        if self.kind == InterfaceKind::CoSimulation {
            match self.discrete_cycle(OP) {
                Ok(info) => self.event_info = info,
                Err(e) => {
                    self.apply(Transition::Abort);
                    return Err(e);
                }
            }
        }
        self.should_recompute = true;
        self.last_get_time = None;
        self.logger.emit(Status::Ok, "Exited initialization mode");
        Ok(Status::Ok)
    }

    pub fn terminate(&mut self) -> Status {
        if self.phase != Phase::Terminated {
            self.apply(Transition::Terminate);
            self.logger.emit(Status::Ok, "Terminated");
        }
        Status::Ok
    }

    /// Back to `Instantiated` with start values, cleared counters and a
    /// zeroed indicator history.
    pub fn reset(&mut self) -> Status {
        let result = self.try_reset();
        self.report(result)
    }

    fn try_reset(&mut self) -> EngineResult<Status> {
        const OP: &str = "reset";
        self.apply(Transition::Reset);
        self.states.clone_from(&self.desc.states);
        self.derivatives.iter_mut().for_each(|d| *d = 0.0);
        self.indicators.iter_mut().for_each(|z| *z = 0.0);
        self.store.reset(&self.desc);
        self.schedule.reset();
        self.detector.reset();
        self.clock = 0.0;
        self.comm_time = 0.0;
        self.last_get_time = None;
        self.should_recompute = false;
        self.purely_discrete = false;
        self.entered_continuous = false;
        self.solver_steps = 0;
        self.derivative_time = 0.0;
        self.step = StepKind::Minor;
        self.solver_reset = false;
        self.event_info = EventInfo::default();
        self.last_crossing = None;

        self.eval(|b, cx| b.terminate(cx))
            .map_err(EngineError::backend(OP))?;
        self.eval(|b, cx| b.start(cx))
            .map_err(EngineError::backend(OP))?;
        if self.caps.initial_conditions {
            self.eval(|b, cx| b.initial_conditions(cx))
                .map_err(EngineError::backend(OP))?;
        }
        self.logger.emit(Status::Ok, "Reset to instantiated");
        Ok(Status::Ok)
    }

    pub fn get_directional_derivative(
        &mut self,
        _unknowns: &[u32],
        _knowns: &[u32],
        _seed: &[f64],
        _sensitivity: &mut [f64],
    ) -> Status {
        self.unsupported("get_directional_derivative")
    }

    pub fn get_fmu_state(&mut self) -> Status {
        self.unsupported("get_fmu_state")
    }

    pub fn set_fmu_state(&mut self) -> Status {
        self.unsupported("set_fmu_state")
    }

    pub fn free_fmu_state(&mut self) -> Status {
        self.unsupported("free_fmu_state")
    }

    pub fn serialized_fmu_state_size(&mut self, _size: &mut usize) -> Status {
        self.unsupported("serialized_fmu_state_size")
    }

    pub fn serialize_fmu_state(&mut self, _bytes: &mut [u8]) -> Status {
        self.unsupported("serialize_fmu_state")
    }

    pub fn deserialize_fmu_state(&mut self, _bytes: &[u8]) -> Status {
        self.unsupported("deserialize_fmu_state")
    }

    pub(crate) fn unsupported(&mut self, op: &'static str) -> Status {
        self.report(Err(EngineError::Unsupported { op }))
    }

    /// Convert an operation result into its outcome, logging failures.
    pub(crate) fn report(&mut self, result: EngineResult<Status>) -> Status {
        match result {
            Ok(status) => status,
            Err(e) => {
                let status = e.status();
                self.logger.emit(status, &e.to_string());
                status
            }
        }
    }

    /// Validate a transition without committing it.
    pub(crate) fn check_transition(
        &self,
        op: &'static str,
        transition: Transition,
    ) -> EngineResult<Phase> {
        match self.phase.apply(transition) {
            TransitionOutcome::Accepted { to, .. } => Ok(to),
            TransitionOutcome::Rejected { from, required } => Err(EngineError::WrongPhase {
                op,
                phase: from,
                required,
            }),
        }
    }

    /// Commit a transition that is always accepted.
    fn apply(&mut self, transition: Transition) {
        if let TransitionOutcome::Accepted { from, to } = self.phase.apply(transition) {
            tracing::debug!(instance = %self.name(), ?from, ?to, "phase change");
            self.phase = to;
        }
    }

    /// Reads and writes require `enter_initialization_mode` first.
    pub(crate) fn require_access(&self, op: &'static str) -> EngineResult<()> {
        if self.phase.allows_access() {
            Ok(())
        } else {
            Err(EngineError::NotAllowedBeforeInitialization { op })
        }
    }

    /// Event and stepping operations require `exit_initialization_mode` first.
    pub(crate) fn require_initialized(&self, op: &'static str) -> EngineResult<()> {
        if self.phase.is_initialized() {
            Ok(())
        } else {
            Err(EngineError::NotInitialized { op })
        }
    }

    pub(crate) fn require_kind(&self, op: &'static str, kind: InterfaceKind) -> EngineResult<()> {
        if self.kind == kind {
            Ok(())
        } else {
            Err(EngineError::WrongKind {
                op,
                required: kind.label(),
            })
        }
    }

    /// Run a backend evaluation with a context borrowing this instance.
    pub(crate) fn eval<F>(&mut self, f: F) -> BackendResult<()>
    where
        F: FnOnce(&mut B, &mut EvalContext<'_>) -> BackendResult<()>,
    {
        let mut cx = EvalContext {
            time: self.clock,
            step: self.step,
            store: &mut self.store,
            states: &mut self.states,
            derivatives: &mut self.derivatives,
            indicators: &mut self.indicators,
            hits: self.schedule.hits(),
            logger: &mut self.logger,
            solver_reset: &mut self.solver_reset,
        };
        f(&mut self.backend, &mut cx)
    }

    pub(crate) fn eval_outputs(&mut self, op: &'static str) -> EngineResult<()> {
        self.eval(|b, cx| b.outputs(cx))
            .map_err(EngineError::backend(op))
    }

    pub(crate) fn eval_derivatives(&mut self, op: &'static str) -> EngineResult<()> {
        if !self.caps.derivatives {
            return Ok(());
        }
        self.eval(|b, cx| b.derivatives(cx))
            .map_err(EngineError::backend(op))
    }

    pub(crate) fn eval_update(&mut self, op: &'static str) -> EngineResult<()> {
        if !self.caps.update {
            return Ok(());
        }
        self.eval(|b, cx| b.update(cx))
            .map_err(EngineError::backend(op))
    }

    pub(crate) fn eval_zero_crossings(&mut self, op: &'static str) -> EngineResult<()> {
        if !self.caps.zero_crossings {
            return Ok(());
        }
        self.eval(|b, cx| b.zero_crossings(cx))
            .map_err(EngineError::backend(op))
    }

    /// Run `f` as a major step; the flag drops back to minor afterwards.
    pub(crate) fn major_step<F>(&mut self, f: F) -> EngineResult<()>
    where
        F: FnOnce(&mut Self) -> EngineResult<()>,
    {
        self.step = StepKind::Major;
        let result = f(self);
        self.step = StepKind::Minor;
        result
    }
}

impl<B: ModelBackend> Drop for Instance<B> {
    fn drop(&mut self) {
        if let Err(e) = self.eval(|b, cx| b.terminate(cx)) {
            let message = format!("free_instance: {e}");
            self.logger.emit(Status::Error, &message);
        }
    }
}

impl<B: ModelBackend> std::fmt::Debug for Instance<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("name", &self.name())
            .field("kind", &self.kind)
            .field("phase", &self.phase)
            .field("time", &self.clock)
            .field("solver_steps", &self.solver_steps)
            .finish_non_exhaustive()
    }
}
