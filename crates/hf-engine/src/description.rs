//! Static model declaration.
//!
//! Everything sized at build time lives here: variable counts and types per
//! role, start values, the sample-time table and the fixed-step settings used
//! for co-simulation. Sizes never change after instantiation.

use hf_core::{EPS, MAX_INDEX, Role, ScalarType, ValueReference};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// A declared variable: stored scalar type and start value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariableDecl {
    #[serde(default)]
    pub scalar_type: ScalarType,
    #[serde(default)]
    pub start: f64,
}

impl VariableDecl {
    pub fn real(start: f64) -> Self {
        Self {
            scalar_type: ScalarType::F64,
            start,
        }
    }

    pub fn typed(scalar_type: ScalarType, start: f64) -> Self {
        Self { scalar_type, start }
    }
}

/// One entry of the sample-time table.
///
/// A period at or below [`EPS`] denotes a continuous rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleTime {
    pub period: f64,
    #[serde(default)]
    pub offset: f64,
}

impl SampleTime {
    pub fn continuous() -> Self {
        Self {
            period: 0.0,
            offset: 0.0,
        }
    }

    pub fn periodic(period: f64, offset: f64) -> Self {
        Self { period, offset }
    }

    pub fn is_periodic(&self) -> bool {
        self.period > EPS
    }
}

/// Fixed-step method used to advance continuous states in co-simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    /// Explicit Euler, one derivative evaluation per step.
    ForwardEuler,
    /// Classical 4th-order Runge-Kutta (default).
    #[default]
    Rk4,
}

/// Static declaration of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescription {
    pub model_name: String,
    #[serde(default)]
    pub guid: String,
    #[serde(default)]
    pub inputs: Vec<VariableDecl>,
    #[serde(default)]
    pub outputs: Vec<VariableDecl>,
    #[serde(default)]
    pub parameters: Vec<VariableDecl>,
    #[serde(default)]
    pub block_signals: Vec<VariableDecl>,
    #[serde(default)]
    pub work_cells: Vec<VariableDecl>,
    /// Start values of the continuous states.
    #[serde(default)]
    pub states: Vec<f64>,
    #[serde(default)]
    pub event_indicators: usize,
    /// Rate 0 is the base rate.
    pub sample_times: Vec<SampleTime>,
    /// Continuous rate sampled at major steps only ("fixed in minor step").
    #[serde(default)]
    pub offset_sampled_rate: Option<usize>,
    /// Internal step of the co-simulation loop (seconds).
    pub fixed_step: f64,
    #[serde(default)]
    pub solver: SolverKind,
    /// Names per role for host convenience; optional.
    #[serde(default)]
    pub names: Vec<NamedVariable>,
}

/// Human-readable name bound to a variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedVariable {
    pub name: String,
    pub role: Role,
    pub index: usize,
}

impl ModelDescription {
    /// Declared count for a role.
    pub fn count(&self, role: Role) -> usize {
        match role {
            Role::Parameter => self.parameters.len(),
            Role::State | Role::Derivative => self.states.len(),
            Role::Output => self.outputs.len(),
            Role::Input => self.inputs.len(),
            Role::BlockSignal => self.block_signals.len(),
            Role::WorkCell => self.work_cells.len(),
        }
    }

    /// Declaration for a stored (non-state) variable.
    pub fn decl(&self, role: Role, index: usize) -> Option<&VariableDecl> {
        let decls = match role {
            Role::Parameter => &self.parameters,
            Role::Output => &self.outputs,
            Role::Input => &self.inputs,
            Role::BlockSignal => &self.block_signals,
            Role::WorkCell => &self.work_cells,
            Role::State | Role::Derivative => return None,
        };
        decls.get(index)
    }

    /// Packed reference for a declared variable.
    pub fn value_reference(&self, role: Role, index: usize) -> EngineResult<u32> {
        if index >= self.count(role) {
            return Err(EngineError::InvalidDescription {
                what: format!("no {role} with index {index}"),
            });
        }
        let scalar_type = self
            .decl(role, index)
            .map_or(ScalarType::F64, |d| d.scalar_type);
        let vr = ValueReference::new(role, scalar_type, index)?;
        Ok(vr.encode())
    }

    /// Packed reference for a named variable.
    pub fn reference_by_name(&self, name: &str) -> Option<u32> {
        self.names
            .iter()
            .find(|n| n.name == name)
            .and_then(|n| self.value_reference(n.role, n.index).ok())
    }

    /// Number of continuous states.
    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    /// Check sizes and settings that the engine relies on.
    pub fn validate(&self) -> EngineResult<()> {
        if self.sample_times.is_empty() {
            return Err(invalid("sample time table must declare rate 0"));
        }
        for st in &self.sample_times {
            if !st.period.is_finite() || !st.offset.is_finite() || st.period < 0.0 {
                return Err(invalid("sample periods and offsets must be finite and non-negative"));
            }
        }
        if let Some(rate) = self.offset_sampled_rate {
            if rate >= self.sample_times.len() {
                return Err(invalid("offset-sampled rate is not in the sample time table"));
            }
        }
        if !(self.fixed_step.is_finite() && self.fixed_step > EPS) {
            return Err(invalid("fixed_step must be positive"));
        }
        for role in Role::ALL {
            if self.count(role) > MAX_INDEX + 1 {
                return Err(EngineError::InvalidDescription {
                    what: format!("too many {role} variables for 24-bit references"),
                });
            }
        }
        for named in &self.names {
            if named.index >= self.count(named.role) {
                return Err(EngineError::InvalidDescription {
                    what: format!("name '{}' points past the declared {}s", named.name, named.role),
                });
            }
        }
        Ok(())
    }
}

fn invalid(what: &str) -> EngineError {
    EngineError::InvalidDescription {
        what: what.to_string(),
    }
}
