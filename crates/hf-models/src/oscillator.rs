//! Damped harmonic oscillator driven by an external force.
//!
//! States `[x, v]`, `x' = v`, `v' = -omega^2 x - 2 zeta omega v + force`.

use hf_core::Role;
use hf_engine::{
    BackendResult, Capabilities, EvalContext, ModelBackend, ModelDescription, NamedVariable,
    SampleTime, SolverKind, VariableDecl,
};

use crate::error::ModelError;
use crate::named;

pub const OMEGA: usize = 0;
pub const ZETA: usize = 1;

/// Parameter mirror, refreshed whenever the host changes a parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Oscillator {
    omega: f64,
    zeta: f64,
}

impl Default for Oscillator {
    fn default() -> Self {
        Self {
            omega: 2.0,
            zeta: 0.0,
        }
    }
}

impl Oscillator {
    pub fn description() -> ModelDescription {
        let names: Vec<NamedVariable> = vec![
            named("force", Role::Input, 0),
            named("x", Role::Output, 0),
            named("v", Role::Output, 1),
            named("omega", Role::Parameter, OMEGA),
            named("zeta", Role::Parameter, ZETA),
            named("acceleration", Role::BlockSignal, 0),
        ];
        let defaults = Self::default();
        ModelDescription {
            model_name: "oscillator".into(),
            guid: "{6a1f0c52-oscillator}".into(),
            inputs: vec![VariableDecl::real(0.0)],
            outputs: vec![VariableDecl::real(1.0), VariableDecl::real(0.0)],
            parameters: vec![
                VariableDecl::real(defaults.omega),
                VariableDecl::real(defaults.zeta),
            ],
            block_signals: vec![VariableDecl::real(0.0)],
            work_cells: vec![],
            states: vec![1.0, 0.0],
            event_indicators: 0,
            sample_times: vec![SampleTime::continuous()],
            offset_sampled_rate: None,
            fixed_step: 1e-3,
            solver: SolverKind::Rk4,
            names,
        }
    }

    fn acceleration(&self, x: f64, v: f64, force: f64) -> f64 {
        -self.omega * self.omega * x - 2.0 * self.zeta * self.omega * v + force
    }

    fn mirror(&mut self, cx: &EvalContext<'_>) -> BackendResult<()> {
        let omega = cx.parameter(OMEGA);
        let zeta = cx.parameter(ZETA);
        if !(omega.is_finite() && omega > 0.0) {
            return Err(ModelError::NonPhysical {
                what: "omega must be positive",
            }
            .into());
        }
        if !(zeta.is_finite() && zeta >= 0.0) {
            return Err(ModelError::NonPhysical {
                what: "zeta must be non-negative",
            }
            .into());
        }
        self.omega = omega;
        self.zeta = zeta;
        Ok(())
    }
}

impl ModelBackend for Oscillator {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            derivatives: true,
            ..Capabilities::default()
        }
    }

    fn start(&mut self, cx: &mut EvalContext<'_>) -> BackendResult<()> {
        self.mirror(cx)
    }

    fn outputs(&mut self, cx: &mut EvalContext<'_>) -> BackendResult<()> {
        let (x, v) = (cx.states()[0], cx.states()[1]);
        let a = self.acceleration(x, v, cx.input(0));
        cx.set_output(0, x);
        cx.set_output(1, v);
        cx.set_block_signal(0, a);
        Ok(())
    }

    fn derivatives(&mut self, cx: &mut EvalContext<'_>) -> BackendResult<()> {
        let (x, v) = (cx.states()[0], cx.states()[1]);
        let a = self.acceleration(x, v, cx.input(0));
        let dx = cx.derivatives_mut();
        dx[0] = v;
        dx[1] = a;
        Ok(())
    }

    fn parameters_changed(&mut self, cx: &mut EvalContext<'_>) -> BackendResult<()> {
        self.mirror(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hf_core::Status;
    use hf_engine::{Callbacks, Instance, InterfaceKind, NullSink};

    fn instance(kind: InterfaceKind) -> Instance<Oscillator> {
        let mut inst = Instance::instantiate(
            "osc",
            kind,
            Oscillator::description(),
            Oscillator::default(),
            Callbacks::new(NullSink),
            false,
        )
        .unwrap();
        assert_eq!(inst.enter_initialization_mode(), Status::Ok);
        assert_eq!(inst.exit_initialization_mode(), Status::Ok);
        inst
    }

    #[test]
    fn description_is_valid() {
        let desc = Oscillator::description();
        assert!(desc.validate().is_ok());
        assert!(desc.reference_by_name("omega").is_some());
    }

    #[test]
    fn derivatives_at_rest_position() {
        let mut inst = instance(InterfaceKind::ModelExchange);
        let mut dx = [0.0; 2];
        assert_eq!(inst.get_derivatives(&mut dx), Status::Ok);
        assert_eq!(dx, [0.0, -4.0]);
    }

    #[test]
    fn non_physical_omega_is_an_error() {
        let mut inst = instance(InterfaceKind::ModelExchange);
        let omega = inst.description().reference_by_name("omega").unwrap();
        assert_eq!(inst.set_real(&[omega], &[-1.0]), Status::Error);
    }

    #[test]
    fn one_period_returns_to_start() {
        let mut inst = instance(InterfaceKind::CoSimulation);
        assert_eq!(inst.do_step(0.0, std::f64::consts::PI, true), Status::Ok);
        let x = inst.description().reference_by_name("x").unwrap();
        let mut out = [0.0];
        assert_eq!(inst.get_real(&[x], &mut out), Status::Ok);
        assert!((out[0] - 1.0).abs() < 1e-4, "x = {}", out[0]);
    }
}
