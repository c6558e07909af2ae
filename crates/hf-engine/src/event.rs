//! Values reported back to the host after event handling and integrator steps.

/// Outcome of a discrete-update cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EventInfo {
    pub new_discrete_states_needed: bool,
    pub terminate_simulation: bool,
    /// Always false: nominal values are unknown.
    pub nominals_of_continuous_states_changed: bool,
    /// The backend changed continuous states discontinuously.
    pub values_of_continuous_states_changed: bool,
    pub next_event_time_defined: bool,
    pub next_event_time: f64,
}

/// Outcome of a completed integrator step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepCompletion {
    pub enter_event_mode: bool,
    pub terminate_simulation: bool,
}
