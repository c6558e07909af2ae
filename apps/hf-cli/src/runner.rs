//! Drive an instance over an experiment and write CSV rows.

use std::io::Write;

use hf_core::{EPS, Role, Status, time_eq};
use hf_engine::{EventInfo, Instance, InterfaceKind, ModelBackend, StepCompletion};

use crate::config::ExperimentConfig;
use crate::error::{CliError, CliResult, check};

/// What a run produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub rows: usize,
    pub final_time: f64,
    pub events: usize,
    pub solver_steps: u64,
}

/// Recorded columns: every output, by name when the model names it.
fn output_columns<B: ModelBackend>(inst: &Instance<B>) -> CliResult<Vec<(String, u32)>> {
    let desc = inst.description();
    (0..desc.count(Role::Output))
        .map(|i| {
            let name = desc
                .names
                .iter()
                .find(|n| n.role == Role::Output && n.index == i)
                .map_or_else(|| format!("y{i}"), |n| n.name.clone());
            Ok((name, desc.value_reference(Role::Output, i)?))
        })
        .collect()
}

fn lookup<B: ModelBackend>(inst: &Instance<B>, name: &str) -> CliResult<u32> {
    let desc = inst.description();
    desc.reference_by_name(name)
        .ok_or_else(|| CliError::UnknownVariable {
            name: name.to_string(),
            model: desc.model_name.clone(),
        })
}

/// Enter initialization, apply overrides and leave initialization.
fn initialize<B: ModelBackend>(inst: &mut Instance<B>, config: &ExperimentConfig) -> CliResult<()> {
    check(
        "setup_experiment",
        inst.setup_experiment(None, 0.0, Some(config.stop_time)),
    )?;
    check("enter_initialization_mode", inst.enter_initialization_mode())?;
    for (name, value) in config.parameters.iter().chain(&config.inputs) {
        let vr = lookup(inst, name)?;
        let status = inst.set_real(&[vr], &[*value]);
        if status != Status::Ok {
            return Err(CliError::Status {
                op: "set_real",
                status,
            });
        }
        tracing::debug!(%name, value, "override applied");
    }
    check("exit_initialization_mode", inst.exit_initialization_mode())
}

struct CsvWriter<'w, W: Write> {
    out: &'w mut W,
    refs: Vec<u32>,
    values: Vec<f64>,
    rows: usize,
}

impl<'w, W: Write> CsvWriter<'w, W> {
    fn new(out: &'w mut W, columns: Vec<(String, u32)>) -> CliResult<Self> {
        let header: Vec<&str> = columns.iter().map(|(n, _)| n.as_str()).collect();
        writeln!(out, "time,{}", header.join(","))?;
        let refs: Vec<u32> = columns.into_iter().map(|(_, r)| r).collect();
        Ok(Self {
            out,
            values: vec![0.0; refs.len()],
            refs,
            rows: 0,
        })
    }

    fn row<B: ModelBackend>(&mut self, inst: &mut Instance<B>, t: f64) -> CliResult<()> {
        check("get_real", inst.get_real(&self.refs, &mut self.values))?;
        let cells: Vec<String> = self.values.iter().map(|v| format!("{v:.6}")).collect();
        writeln!(self.out, "{t:.6},{}", cells.join(","))?;
        self.rows += 1;
        Ok(())
    }
}

/// Run the experiment on a freshly instantiated model.
pub fn run<B: ModelBackend, W: Write>(
    inst: &mut Instance<B>,
    config: &ExperimentConfig,
    out: &mut W,
) -> CliResult<RunSummary> {
    initialize(inst, config)?;
    let mut csv = CsvWriter::new(out, output_columns(inst)?)?;
    let (final_time, events) = match inst.kind() {
        InterfaceKind::CoSimulation => (co_simulate(inst, config, &mut csv)?, 0),
        InterfaceKind::ModelExchange => model_exchange(inst, config, &mut csv)?,
    };
    check("terminate", inst.terminate())?;
    Ok(RunSummary {
        rows: csv.rows,
        final_time,
        events,
        solver_steps: inst.solver_steps(),
    })
}

fn co_simulate<B: ModelBackend, W: Write>(
    inst: &mut Instance<B>,
    config: &ExperimentConfig,
    csv: &mut CsvWriter<'_, W>,
) -> CliResult<f64> {
    let mut t = 0.0;
    csv.row(inst, t)?;
    while config.stop_time - t > EPS {
        let h = config.step_size.min(config.stop_time - t);
        let status = inst.do_step(t, h, true);
        if status != Status::Ok {
            return Err(CliError::Status {
                op: "do_step",
                status,
            });
        }
        t += h;
        csv.row(inst, t)?;
    }
    Ok(t)
}

/// Forward Euler host. Events are triggered by indicator sign changes and
/// by the instance's next time event, which the host step lands on exactly.
fn model_exchange<B: ModelBackend, W: Write>(
    inst: &mut Instance<B>,
    config: &ExperimentConfig,
    csv: &mut CsvWriter<'_, W>,
) -> CliResult<(f64, usize)> {
    let nx = inst.description().num_states();
    let nz = inst.description().event_indicators;
    let (mut x, mut dx) = (vec![0.0; nx], vec![0.0; nx]);
    let (mut z, mut z_prev) = (vec![0.0; nz], vec![0.0; nz]);
    let mut info = EventInfo::default();
    let mut completion = StepCompletion::default();
    let mut events = 0;

    check("new_discrete_states", inst.new_discrete_states(&mut info))?;
    check("enter_continuous_time_mode", inst.enter_continuous_time_mode())?;
    check("get_continuous_states", inst.get_continuous_states(&mut x))?;
    check("get_event_indicators", inst.get_event_indicators(&mut z_prev))?;

    let mut t = 0.0;
    csv.row(inst, t)?;
    while config.stop_time - t > EPS {
        let mut t_next = (t + config.step_size).min(config.stop_time);
        if info.next_event_time_defined && t_next > info.next_event_time {
            t_next = info.next_event_time;
        }
        check("get_derivatives", inst.get_derivatives(&mut dx))?;
        for (xi, di) in x.iter_mut().zip(&dx) {
            *xi += (t_next - t) * di;
        }
        t = t_next;
        check("set_time", inst.set_time(t))?;
        check("set_continuous_states", inst.set_continuous_states(&x))?;
        check("get_event_indicators", inst.get_event_indicators(&mut z))?;
        check(
            "completed_integrator_step",
            inst.completed_integrator_step(true, &mut completion),
        )?;

        let crossed = z_prev.iter().zip(&z).any(|(a, b)| a * b < 0.0);
        let timed = info.next_event_time_defined && time_eq(t, info.next_event_time);
        if crossed || timed || completion.enter_event_mode {
            events += 1;
            tracing::debug!(t, crossed, timed, "handling event");
            check("enter_event_mode", inst.enter_event_mode())?;
            check("new_discrete_states", inst.new_discrete_states(&mut info))?;
            check("enter_continuous_time_mode", inst.enter_continuous_time_mode())?;
            if info.values_of_continuous_states_changed {
                check("get_continuous_states", inst.get_continuous_states(&mut x))?;
            }
            check("get_event_indicators", inst.get_event_indicators(&mut z))?;
        }
        z_prev.clone_from(&z);
        csv.row(inst, t)?;
    }
    Ok((t, events))
}
