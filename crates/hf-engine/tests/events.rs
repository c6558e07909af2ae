//! Discrete-update cycles, time events and zero crossings in model exchange.

mod common;

use common::{RecordingSink, Ticker, initialized_ramp, ticker_description};
use hf_core::{MAX_TIME, Status};
use hf_engine::{
    BackendResult, Callbacks, Capabilities, Direction, EvalContext, EventInfo, Instance,
    InterfaceKind, ModelBackend, ModelDescription, SampleTime, StepCompletion, VariableDecl,
};

fn initialized_ticker() -> Instance<Ticker> {
    let mut inst = Instance::instantiate(
        "ticker",
        InterfaceKind::ModelExchange,
        ticker_description(),
        Ticker::default(),
        Callbacks::new(hf_engine::NullSink),
        false,
    )
    .unwrap();
    assert_eq!(inst.enter_initialization_mode(), Status::Ok);
    assert_eq!(inst.exit_initialization_mode(), Status::Ok);
    inst
}

#[test]
fn periodic_rate_hits_within_tolerance() {
    let mut inst = initialized_ticker();
    let mut info = EventInfo::default();

    assert_eq!(inst.new_discrete_states(&mut info), Status::Ok);
    assert_eq!(inst.hit_counts(), &[1]);
    assert!(inst.is_purely_discrete());
    assert!(info.next_event_time_defined);
    assert_eq!(info.next_event_time, 1.0);

    assert_eq!(inst.set_time(0.999999999999), Status::Ok);
    assert_eq!(inst.new_discrete_states(&mut info), Status::Ok);
    assert_eq!(inst.hit_counts(), &[2]);
    assert_eq!(inst.backend().ticks, 2);
    assert_eq!(info.next_event_time, 2.0);
}

#[test]
fn repeated_cycle_at_same_time_is_idempotent() {
    let mut inst = initialized_ticker();
    let mut first = EventInfo::default();
    let mut second = EventInfo::default();

    assert_eq!(inst.new_discrete_states(&mut first), Status::Ok);
    let counts = inst.hit_counts().to_vec();
    assert_eq!(inst.new_discrete_states(&mut second), Status::Ok);
    assert_eq!(first, second);
    assert_eq!(inst.hit_counts(), counts.as_slice());
    assert_eq!(inst.backend().ticks, 1);
}

#[test]
fn continuous_model_cycle_is_idempotent() {
    let (mut inst, _) = initialized_ramp(InterfaceKind::ModelExchange);
    let mut first = EventInfo::default();
    let mut second = EventInfo::default();
    assert_eq!(inst.new_discrete_states(&mut first), Status::Ok);
    assert_eq!(inst.new_discrete_states(&mut second), Status::Ok);
    assert_eq!(first.next_event_time, 0.5);
    assert_eq!(first, second);
    assert_eq!(inst.hit_counts(), &[0, 1]);
    assert!(!inst.is_purely_discrete());
}

#[test]
fn next_event_undefined_without_periodic_rates() {
    let mut desc = common::ramp_description();
    desc.sample_times = vec![SampleTime::continuous()];
    let mut inst = Instance::instantiate(
        "free",
        InterfaceKind::ModelExchange,
        desc,
        common::Ramp::default(),
        Callbacks::new(hf_engine::NullSink),
        false,
    )
    .unwrap();
    assert_eq!(inst.enter_initialization_mode(), Status::Ok);
    assert_eq!(inst.exit_initialization_mode(), Status::Ok);
    let mut info = EventInfo::default();
    assert_eq!(inst.new_discrete_states(&mut info), Status::Ok);
    assert!(!info.next_event_time_defined);
    assert_eq!(info.next_event_time, MAX_TIME);
}

#[test]
fn completed_step_without_crossing_is_a_major_step() {
    let (mut inst, _) = initialized_ramp(InterfaceKind::ModelExchange);
    let mut info = EventInfo::default();
    let mut done = StepCompletion {
        enter_event_mode: true,
        terminate_simulation: true,
    };
    assert_eq!(inst.new_discrete_states(&mut info), Status::Ok);
    assert_eq!(inst.enter_continuous_time_mode(), Status::Ok);

    let majors = inst.backend().major_outputs;
    let updates = inst.backend().updates;
    assert_eq!(inst.set_time(0.1), Status::Ok);
    assert_eq!(inst.set_continuous_states(&[0.1]), Status::Ok);
    assert_eq!(inst.completed_integrator_step(true, &mut done), Status::Ok);

    assert!(inst.last_crossing().is_none());
    assert_eq!(done, StepCompletion::default());
    assert_eq!(inst.backend().major_outputs, majors + 1);
    assert_eq!(inst.backend().updates, updates + 1);
}

#[test]
fn crossing_defers_major_step() {
    let (mut inst, _) = initialized_ramp(InterfaceKind::ModelExchange);
    let mut info = EventInfo::default();
    let mut done = StepCompletion::default();
    assert_eq!(inst.new_discrete_states(&mut info), Status::Ok);
    assert_eq!(inst.enter_continuous_time_mode(), Status::Ok);

    let majors = inst.backend().major_outputs;
    assert_eq!(inst.set_time(0.6), Status::Ok);
    assert_eq!(inst.set_continuous_states(&[0.6]), Status::Ok);
    assert_eq!(inst.completed_integrator_step(true, &mut done), Status::Ok);

    let crossing = inst.last_crossing().unwrap();
    assert_eq!(crossing.index, 0);
    assert_eq!(crossing.direction, Direction::Rising);
    assert_eq!(inst.backend().major_outputs, majors);
    assert!(!done.enter_event_mode);
    assert!((inst.zero_crossing_baseline()[0] - 0.1).abs() < 1e-12);

    assert_eq!(inst.set_continuous_states(&[0.2]), Status::Ok);
    assert_eq!(inst.completed_integrator_step(true, &mut done), Status::Ok);
    assert_eq!(inst.last_crossing().unwrap().direction, Direction::Falling);
}

#[test]
fn size_mismatch_truncates_with_warning() {
    let (mut inst, sink) = initialized_ramp(InterfaceKind::ModelExchange);
    assert_eq!(inst.set_continuous_states(&[0.3, 9.0]), Status::Warning);
    let mut x = [0.0; 3];
    assert_eq!(inst.get_continuous_states(&mut x), Status::Warning);
    assert_eq!(x, [0.3, 0.0, 0.0]);

    let mut dx = [7.0; 2];
    assert_eq!(inst.get_derivatives(&mut dx), Status::Warning);
    assert_eq!(dx, [1.0, 7.0]);

    let mut z: [f64; 0] = [];
    assert_eq!(inst.get_event_indicators(&mut z), Status::Warning);

    let mut nominal = [0.0];
    assert_eq!(inst.get_nominals_of_continuous_states(&mut nominal), Status::Ok);
    assert_eq!(nominal, [1.0]);
    assert!(sink.contains(Status::Warning, "expected 1 elements, got 2"));
}

#[test]
fn event_indicators_follow_states() {
    let (mut inst, _) = initialized_ramp(InterfaceKind::ModelExchange);
    assert_eq!(inst.set_continuous_states(&[2.0]), Status::Ok);
    let mut z = [0.0];
    assert_eq!(inst.get_event_indicators(&mut z), Status::Ok);
    assert_eq!(z, [1.5]);
}

/// Bounces a state back when it hits zero and logs through the context.
struct Resetting;

impl ModelBackend for Resetting {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            update: true,
            ..Capabilities::default()
        }
    }

    fn outputs(&mut self, _cx: &mut EvalContext<'_>) -> BackendResult<()> {
        Ok(())
    }

    fn update(&mut self, cx: &mut EvalContext<'_>) -> BackendResult<()> {
        if cx.states()[0] <= 0.0 {
            cx.states_mut()[0] = 1.0;
            cx.request_solver_reset();
            cx.log("state reset");
        }
        Ok(())
    }
}

#[test]
fn backend_state_reset_is_reported_once() {
    let desc = ModelDescription {
        model_name: "resetting".into(),
        guid: String::new(),
        inputs: vec![],
        outputs: vec![VariableDecl::real(0.0)],
        parameters: vec![],
        block_signals: vec![],
        work_cells: vec![],
        states: vec![0.0],
        event_indicators: 0,
        sample_times: vec![SampleTime::continuous()],
        offset_sampled_rate: None,
        fixed_step: 0.01,
        solver: Default::default(),
        names: vec![],
    };
    let sink = RecordingSink::default();
    let mut inst = Instance::instantiate(
        "resetting",
        InterfaceKind::ModelExchange,
        desc,
        Resetting,
        Callbacks::new(sink.clone()),
        true,
    )
    .unwrap();
    assert_eq!(inst.enter_initialization_mode(), Status::Ok);
    assert_eq!(inst.exit_initialization_mode(), Status::Ok);

    let mut info = EventInfo::default();
    assert_eq!(inst.new_discrete_states(&mut info), Status::Ok);
    assert!(info.values_of_continuous_states_changed);
    assert!(!info.nominals_of_continuous_states_changed);
    assert!(sink.contains(Status::Ok, "state reset"));

    assert_eq!(inst.new_discrete_states(&mut info), Status::Ok);
    assert!(!info.values_of_continuous_states_changed);
}

/// Counts updates seen with the offset-sampled rate flagged.
#[derive(Default)]
struct OffsetProbe {
    offset_updates: usize,
    offset_outputs: usize,
}

impl ModelBackend for OffsetProbe {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            update: true,
            ..Capabilities::default()
        }
    }

    fn outputs(&mut self, cx: &mut EvalContext<'_>) -> BackendResult<()> {
        if cx.is_sample_hit(1) {
            self.offset_outputs += 1;
        }
        Ok(())
    }

    fn update(&mut self, cx: &mut EvalContext<'_>) -> BackendResult<()> {
        if cx.is_sample_hit(1) {
            self.offset_updates += 1;
        }
        Ok(())
    }
}

#[test]
fn offset_sampled_rate_waits_for_continuous_mode() {
    let desc = ModelDescription {
        model_name: "offset".into(),
        guid: String::new(),
        inputs: vec![],
        outputs: vec![],
        parameters: vec![],
        block_signals: vec![],
        work_cells: vec![],
        states: vec![0.0],
        event_indicators: 0,
        sample_times: vec![SampleTime::continuous(), SampleTime::continuous()],
        offset_sampled_rate: Some(1),
        fixed_step: 0.01,
        solver: Default::default(),
        names: vec![],
    };
    let mut inst = Instance::instantiate(
        "offset",
        InterfaceKind::ModelExchange,
        desc,
        OffsetProbe::default(),
        Callbacks::new(hf_engine::NullSink),
        false,
    )
    .unwrap();
    assert_eq!(inst.enter_initialization_mode(), Status::Ok);
    // Initialization evaluates outputs with the offset rate flagged.
    assert_eq!(inst.backend().offset_outputs, 1);
    assert_eq!(inst.exit_initialization_mode(), Status::Ok);

    let mut info = EventInfo::default();
    assert_eq!(inst.new_discrete_states(&mut info), Status::Ok);
    assert_eq!(inst.backend().offset_updates, 0);

    assert_eq!(inst.enter_continuous_time_mode(), Status::Ok);
    let mut done = StepCompletion::default();
    assert_eq!(inst.completed_integrator_step(true, &mut done), Status::Ok);
    assert_eq!(inst.backend().offset_updates, 1);

    assert_eq!(inst.enter_event_mode(), Status::Ok);
    assert_eq!(inst.new_discrete_states(&mut info), Status::Ok);
    assert_eq!(inst.backend().offset_updates, 2);
}
