//! Shared test backends and a recording log sink.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use hf_core::{Role, ScalarType, Status};
use hf_engine::{
    BackendResult, Callbacks, Capabilities, EvalContext, Instance, InterfaceKind, LogSink,
    ModelBackend, ModelDescription, SampleTime, SolverKind, VariableDecl,
};

/// One captured host message.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub status: Status,
    pub category: String,
    pub message: String,
}

/// Host sink that keeps every message it receives.
#[derive(Clone, Default)]
pub struct RecordingSink {
    records: Rc<RefCell<Vec<Record>>>,
}

impl RecordingSink {
    pub fn records(&self) -> Vec<Record> {
        self.records.borrow().clone()
    }

    pub fn clear(&self) {
        self.records.borrow_mut().clear();
    }

    /// Whether a message at `status` containing `needle` was logged.
    pub fn contains(&self, status: Status, needle: &str) -> bool {
        self.records
            .borrow()
            .iter()
            .any(|r| r.status == status && r.message.contains(needle))
    }
}

impl LogSink for RecordingSink {
    fn log(&mut self, _instance_name: &str, status: Status, category: &str, message: &str) {
        self.records.borrow_mut().push(Record {
            status,
            category: category.to_string(),
            message: message.to_string(),
        });
    }
}

/// `x' = slope`, `y0 = x + u`, `y1 = 2 x`, indicator `x - threshold`.
///
/// Rate 1 is periodic with period 0.5.
#[derive(Debug, Default)]
pub struct Ramp {
    pub starts: usize,
    pub terminates: usize,
    pub updates: usize,
    pub major_outputs: usize,
    pub param_syncs: usize,
    pub rate1_hits: usize,
}

impl ModelBackend for Ramp {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            initial_conditions: true,
            derivatives: true,
            update: true,
            zero_crossings: true,
        }
    }

    fn start(&mut self, _cx: &mut EvalContext<'_>) -> BackendResult<()> {
        self.starts += 1;
        Ok(())
    }

    fn outputs(&mut self, cx: &mut EvalContext<'_>) -> BackendResult<()> {
        if cx.is_major_step() {
            self.major_outputs += 1;
        }
        let x = cx.states()[0];
        let y0 = x + cx.input(0);
        cx.set_output(0, y0);
        cx.set_output(1, 2.0 * x);
        Ok(())
    }

    fn derivatives(&mut self, cx: &mut EvalContext<'_>) -> BackendResult<()> {
        let slope = cx.parameter(0);
        cx.derivatives_mut()[0] = slope;
        Ok(())
    }

    fn update(&mut self, cx: &mut EvalContext<'_>) -> BackendResult<()> {
        self.updates += 1;
        if cx.is_sample_hit(1) {
            self.rate1_hits += 1;
        }
        Ok(())
    }

    fn zero_crossings(&mut self, cx: &mut EvalContext<'_>) -> BackendResult<()> {
        let z = cx.states()[0] - cx.parameter(1);
        cx.indicators_mut()[0] = z;
        Ok(())
    }

    fn parameters_changed(&mut self, _cx: &mut EvalContext<'_>) -> BackendResult<()> {
        self.param_syncs += 1;
        Ok(())
    }

    fn terminate(&mut self, _cx: &mut EvalContext<'_>) -> BackendResult<()> {
        self.terminates += 1;
        Ok(())
    }
}

pub fn ramp_description() -> ModelDescription {
    ModelDescription {
        model_name: "ramp".into(),
        guid: "{ramp}".into(),
        inputs: vec![VariableDecl::real(0.0)],
        outputs: vec![VariableDecl::real(0.0), VariableDecl::real(0.0)],
        parameters: vec![VariableDecl::real(1.0), VariableDecl::real(0.5)],
        block_signals: vec![VariableDecl::real(0.0)],
        work_cells: vec![VariableDecl::typed(ScalarType::I32, 0.0)],
        states: vec![0.0],
        event_indicators: 1,
        sample_times: vec![SampleTime::continuous(), SampleTime::periodic(0.5, 0.0)],
        offset_sampled_rate: None,
        fixed_step: 0.1,
        solver: SolverKind::Rk4,
        names: vec![],
    }
}

/// Rate 0 is periodic: a purely discrete model that counts its hits.
#[derive(Debug, Default)]
pub struct Ticker {
    pub ticks: usize,
}

impl ModelBackend for Ticker {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            update: true,
            ..Capabilities::default()
        }
    }

    fn outputs(&mut self, cx: &mut EvalContext<'_>) -> BackendResult<()> {
        let ticks = self.ticks as f64;
        cx.set_output(0, ticks);
        Ok(())
    }

    fn update(&mut self, cx: &mut EvalContext<'_>) -> BackendResult<()> {
        if cx.is_sample_hit(0) {
            self.ticks += 1;
        }
        Ok(())
    }
}

pub fn ticker_description() -> ModelDescription {
    ModelDescription {
        model_name: "ticker".into(),
        guid: String::new(),
        inputs: vec![],
        outputs: vec![VariableDecl::real(0.0)],
        parameters: vec![],
        block_signals: vec![],
        work_cells: vec![],
        states: vec![],
        event_indicators: 0,
        sample_times: vec![SampleTime::periodic(1.0, 0.0)],
        offset_sampled_rate: None,
        fixed_step: 1.0,
        solver: SolverKind::ForwardEuler,
        names: vec![],
    }
}

pub fn vr(desc: &ModelDescription, role: Role, index: usize) -> u32 {
    desc.value_reference(role, index).unwrap()
}

pub fn ramp(kind: InterfaceKind) -> (Instance<Ramp>, RecordingSink) {
    let sink = RecordingSink::default();
    let inst = Instance::instantiate(
        "ramp",
        kind,
        ramp_description(),
        Ramp::default(),
        Callbacks::new(sink.clone()),
        true,
    )
    .unwrap();
    (inst, sink)
}

/// Instance past `exit_initialization_mode`.
pub fn initialized_ramp(kind: InterfaceKind) -> (Instance<Ramp>, RecordingSink) {
    let (mut inst, sink) = ramp(kind);
    assert_eq!(inst.enter_initialization_mode(), Status::Ok);
    assert_eq!(inst.exit_initialization_mode(), Status::Ok);
    (inst, sink)
}
