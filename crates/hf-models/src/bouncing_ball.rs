//! Bouncing ball: free fall with an inelastic impact at `h = 0`.
//!
//! The impact is located by the event indicator `h` in model exchange and
//! by the fixed step in co-simulation; either way the velocity reversal
//! happens in the discrete update at a major step.

use hf_core::{Role, ScalarType};
use hf_engine::{
    BackendResult, Capabilities, EvalContext, ModelBackend, ModelDescription, SampleTime,
    SolverKind, VariableDecl,
};

use crate::named;

pub const GRAVITY: usize = 0;
pub const RESTITUTION: usize = 1;
const BOUNCES: usize = 0;

#[derive(Debug, Default, Clone, Copy)]
pub struct BouncingBall;

impl BouncingBall {
    pub fn description() -> ModelDescription {
        ModelDescription {
            model_name: "bouncing_ball".into(),
            guid: "{b4c1e2d0-bouncing-ball}".into(),
            inputs: vec![],
            outputs: vec![VariableDecl::real(1.0), VariableDecl::real(0.0)],
            parameters: vec![VariableDecl::real(9.81), VariableDecl::real(0.7)],
            block_signals: vec![],
            work_cells: vec![VariableDecl::typed(ScalarType::I32, 0.0)],
            states: vec![1.0, 0.0],
            event_indicators: 1,
            sample_times: vec![SampleTime::continuous()],
            offset_sampled_rate: None,
            fixed_step: 1e-3,
            solver: SolverKind::Rk4,
            names: vec![
                named("h", Role::Output, 0),
                named("v", Role::Output, 1),
                named("g", Role::Parameter, GRAVITY),
                named("e", Role::Parameter, RESTITUTION),
                named("bounces", Role::WorkCell, BOUNCES),
            ],
        }
    }
}

impl ModelBackend for BouncingBall {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            derivatives: true,
            update: true,
            zero_crossings: true,
            ..Capabilities::default()
        }
    }

    fn outputs(&mut self, cx: &mut EvalContext<'_>) -> BackendResult<()> {
        let (h, v) = (cx.states()[0], cx.states()[1]);
        cx.set_output(0, h);
        cx.set_output(1, v);
        Ok(())
    }

    fn derivatives(&mut self, cx: &mut EvalContext<'_>) -> BackendResult<()> {
        let v = cx.states()[1];
        let g = cx.parameter(GRAVITY);
        let dx = cx.derivatives_mut();
        dx[0] = v;
        dx[1] = -g;
        Ok(())
    }

    fn update(&mut self, cx: &mut EvalContext<'_>) -> BackendResult<()> {
        let (h, v) = (cx.states()[0], cx.states()[1]);
        if h > 0.0 || v >= 0.0 {
            return Ok(());
        }
        let e = cx.parameter(RESTITUTION);
        let x = cx.states_mut();
        x[0] = 0.0;
        x[1] = -e * v;
        let bounces = cx.work_cell(BOUNCES) + 1.0;
        cx.set_work_cell(BOUNCES, bounces);
        cx.request_solver_reset();
        let message = format!("bounce #{bounces} at t={:.4}", cx.time());
        cx.log(&message);
        Ok(())
    }

    fn zero_crossings(&mut self, cx: &mut EvalContext<'_>) -> BackendResult<()> {
        let h = cx.states()[0];
        cx.indicators_mut()[0] = h;
        Ok(())
    }
}
