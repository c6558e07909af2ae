//! Purely discrete two-rate counter.
//!
//! Rate 0 (period 0.5 s) adds `increment` to a count; rate 1 (period 1 s,
//! offset 0.25 s) flips a toggle. Both live in work cells and are copied to
//! the outputs before each update.

use hf_core::{Role, ScalarType};
use hf_engine::{
    BackendResult, Capabilities, EvalContext, ModelBackend, ModelDescription, SampleTime,
    SolverKind, VariableDecl,
};

use crate::named;

const COUNT: usize = 0;
const TOGGLE: usize = 1;

#[derive(Debug, Default, Clone, Copy)]
pub struct SampledCounter;

impl SampledCounter {
    pub fn description() -> ModelDescription {
        ModelDescription {
            model_name: "sampled_counter".into(),
            guid: "{0d3e9b77-sampled-counter}".into(),
            inputs: vec![],
            outputs: vec![
                VariableDecl::typed(ScalarType::I32, 0.0),
                VariableDecl::typed(ScalarType::Bool, 0.0),
            ],
            parameters: vec![VariableDecl::typed(ScalarType::I32, 1.0)],
            block_signals: vec![],
            work_cells: vec![
                VariableDecl::typed(ScalarType::I32, 0.0),
                VariableDecl::typed(ScalarType::Bool, 0.0),
            ],
            states: vec![],
            event_indicators: 0,
            sample_times: vec![SampleTime::periodic(0.5, 0.0), SampleTime::periodic(1.0, 0.25)],
            offset_sampled_rate: None,
            fixed_step: 0.25,
            solver: SolverKind::ForwardEuler,
            names: vec![
                named("count", Role::Output, COUNT),
                named("toggle", Role::Output, TOGGLE),
                named("increment", Role::Parameter, 0),
                named("count_state", Role::WorkCell, COUNT),
                named("toggle_state", Role::WorkCell, TOGGLE),
            ],
        }
    }
}

impl ModelBackend for SampledCounter {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            update: true,
            ..Capabilities::default()
        }
    }

    fn outputs(&mut self, cx: &mut EvalContext<'_>) -> BackendResult<()> {
        let count = cx.work_cell(COUNT);
        let toggle = cx.work_cell(TOGGLE);
        cx.set_output(COUNT, count);
        cx.set_output(TOGGLE, toggle);
        Ok(())
    }

    fn update(&mut self, cx: &mut EvalContext<'_>) -> BackendResult<()> {
        if cx.is_sample_hit(0) {
            let next = cx.work_cell(COUNT) + cx.parameter(0);
            cx.set_work_cell(COUNT, next);
        }
        if cx.is_sample_hit(1) {
            let flipped = if cx.work_cell(TOGGLE) != 0.0 { 0.0 } else { 1.0 };
            cx.set_work_cell(TOGGLE, flipped);
            tracing::trace!(t = cx.time(), flipped, "toggle");
        }
        Ok(())
    }
}
