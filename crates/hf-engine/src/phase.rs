//! Model lifecycle state machine.
//!
//! Validation and mutation are separate: [`Phase::apply`] computes the
//! outcome of a transition without touching anything, and the instance
//! commits the resulting phase only when the outcome is accepted.

use serde::{Deserialize, Serialize};

/// Lifecycle phase, ordered by increasing capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    Instantiated,
    InitializationMode,
    EventMode,
    ContinuousTimeMode,
    Terminated,
}

/// Explicit lifecycle transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    EnterInitialization,
    ExitInitialization,
    EnterEventMode,
    EnterContinuousTimeMode,
    Terminate,
    Reset,
    /// Failure during initialization: fall back to `Instantiated`.
    Abort,
}

/// Result of applying a transition to a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Accepted { from: Phase, to: Phase },
    Rejected { from: Phase, required: Phase },
}

impl Phase {
    /// Compute the outcome of `transition` from this phase.
    pub fn apply(self, transition: Transition) -> TransitionOutcome {
        let accept = |to| TransitionOutcome::Accepted { from: self, to };
        let reject = |required| TransitionOutcome::Rejected {
            from: self,
            required,
        };
        match transition {
            Transition::EnterInitialization => match self {
                Phase::Instantiated => accept(Phase::InitializationMode),
                _ => reject(Phase::Instantiated),
            },
            Transition::ExitInitialization => match self {
                Phase::InitializationMode => accept(Phase::EventMode),
                _ => reject(Phase::InitializationMode),
            },
            Transition::EnterEventMode => match self {
                Phase::ContinuousTimeMode => accept(Phase::EventMode),
                _ => reject(Phase::ContinuousTimeMode),
            },
            Transition::EnterContinuousTimeMode => match self {
                Phase::EventMode => accept(Phase::ContinuousTimeMode),
                _ => reject(Phase::EventMode),
            },
            // Accepted from every phase, Instantiated included, so a host
            // may terminate an instance it never initialized.
            Transition::Terminate => accept(Phase::Terminated),
            Transition::Reset | Transition::Abort => accept(Phase::Instantiated),
        }
    }

    /// Past initialization (event mode or later).
    pub fn is_initialized(self) -> bool {
        self > Phase::InitializationMode
    }

    /// Variable access is gated on having entered initialization.
    pub fn allows_access(self) -> bool {
        self >= Phase::InitializationMode
    }
}

impl TransitionOutcome {
    pub fn is_accepted(self) -> bool {
        matches!(self, TransitionOutcome::Accepted { .. })
    }
}
