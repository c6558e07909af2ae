//! Co-simulation operations: the instance integrates across a whole
//! communication interval with its own fixed step.

use hf_core::{EPS, Role, ScalarType, Status, StatusKind, time_eq, time_le};

use crate::backend::{ModelBackend, StepKind};
use crate::error::{BackendResult, EngineError, EngineResult};
use crate::instance::{Instance, InterfaceKind};
use crate::integrator::ContinuousSystem;
use crate::phase::Phase;

const CS: InterfaceKind = InterfaceKind::CoSimulation;

/// Derivative evaluation at minor steps, driven by the integrator.
struct Stages<'a, B: ModelBackend> {
    instance: &'a mut Instance<B>,
}

impl<B: ModelBackend> ContinuousSystem for Stages<'_, B> {
    fn rhs(&mut self, t: f64, x: &[f64]) -> BackendResult<Vec<f64>> {
        let inst = &mut *self.instance;
        inst.clock = t;
        inst.states.copy_from_slice(x);
        inst.step = StepKind::Minor;
        inst.eval(|b, cx| b.outputs(cx))?;
        if inst.caps.derivatives {
            inst.eval(|b, cx| b.derivatives(cx))?;
        }
        Ok(inst.derivatives.clone())
    }
}

impl<B: ModelBackend> Instance<B> {
    /// Advance from `current_communication_point` by `step_size`.
    pub fn do_step(
        &mut self,
        current_communication_point: f64,
        step_size: f64,
        _no_set_fmu_state_prior: bool,
    ) -> Status {
        let result = self.try_do_step(current_communication_point, step_size);
        self.report(result)
    }

    fn try_do_step(&mut self, t0: f64, h: f64) -> EngineResult<Status> {
        const OP: &str = "do_step";
        self.require_kind(OP, CS)?;
        self.require_initialized(OP)?;
        if self.phase == Phase::Terminated {
            return Err(EngineError::Terminated { op: OP });
        }
        if !time_eq(self.comm_time, t0) {
            return Err(EngineError::TimeMismatch {
                op: OP,
                expected: self.comm_time,
                got: t0,
            });
        }
        if !h.is_finite() || h < -EPS {
            return Err(EngineError::InvalidStepSize { op: OP, h });
        }
        if h.abs() < EPS {
            // Output refresh only.
            self.major_step(|this| this.eval_outputs(OP))?;
            return Ok(Status::Ok);
        }

        let end = t0 + h;
        let fixed = self.desc.fixed_step;
        let mut next = (self.solver_steps + 1) as f64 * fixed;
        while time_le(next, end) {
            let last = self.solver_steps as f64 * fixed;
            tracing::trace!(last, next, "internal step");
            self.clock = last;
            if !self.states.is_empty() {
                self.integrate(OP, last, fixed)?;
            }
            self.clock = next;
            self.extrapolate_inputs(next);
            self.event_info = self.discrete_cycle(OP)?;
            self.solver_steps += 1;
            next = (self.solver_steps + 1) as f64 * fixed;
        }
        // The communication time is clamped to the interval end even when
        // no internal boundary lands on it; the model clock stays at the
        // last boundary and later steps resume from there.
        self.comm_time = end;
        Ok(Status::Ok)
    }

    fn integrate(&mut self, op: &'static str, t: f64, dt: f64) -> EngineResult<()> {
        let solver = self.desc.solver;
        let x0 = self.states.clone();
        let x1 = solver
            .step(&mut Stages { instance: self }, t, &x0, dt)
            .map_err(EngineError::backend(op))?;
        self.states.copy_from_slice(&x1);
        Ok(())
    }

    fn extrapolate_inputs(&mut self, t: f64) {
        self.store.extrapolate_inputs(t - self.derivative_time);
        self.derivative_time = t;
    }

    pub fn cancel_step(&mut self) -> Status {
        let result = self
            .require_kind("cancel_step", CS)
            .and(Err(EngineError::AsyncUnsupported { op: "cancel_step" }));
        self.report(result)
    }

    pub fn get_status(&mut self, kind: StatusKind, _value: &mut Status) -> Status {
        let result = self.unsupported_status("get_status", kind);
        self.report(result)
    }

    /// `LastSuccessfulTime` reports the communication time.
    pub fn get_real_status(&mut self, kind: StatusKind, value: &mut f64) -> Status {
        const OP: &str = "get_real_status";
        let result = match kind {
            StatusKind::LastSuccessfulTime => self.require_kind(OP, CS).map(|()| {
                *value = self.comm_time;
                Status::Ok
            }),
            _ => self.unsupported_status(OP, kind),
        };
        self.report(result)
    }

    pub fn get_integer_status(&mut self, kind: StatusKind, _value: &mut i32) -> Status {
        let result = self.unsupported_status("get_integer_status", kind);
        self.report(result)
    }

    /// `Terminated` is always false: the instance never asks to stop.
    pub fn get_boolean_status(&mut self, kind: StatusKind, value: &mut bool) -> Status {
        const OP: &str = "get_boolean_status";
        let result = match kind {
            StatusKind::Terminated => self.require_kind(OP, CS).map(|()| {
                *value = false;
                Status::Ok
            }),
            _ => self.unsupported_status(OP, kind),
        };
        self.report(result)
    }

    pub fn get_string_status(&mut self, kind: StatusKind, _value: &mut String) -> Status {
        let result = self.unsupported_status("get_string_status", kind);
        self.report(result)
    }

    fn unsupported_status(&self, op: &'static str, kind: StatusKind) -> EngineResult<Status> {
        self.require_kind(op, CS)?;
        Err(EngineError::UnsupportedStatusKind { op, kind })
    }

    /// First-order derivatives of real inputs, used to extrapolate them
    /// across internal steps.
    pub fn set_real_input_derivatives(
        &mut self,
        vrs: &[u32],
        orders: &[i32],
        values: &[f64],
    ) -> Status {
        let result = self.try_set_real_input_derivatives(vrs, orders, values);
        self.report(result)
    }

    fn try_set_real_input_derivatives(
        &mut self,
        vrs: &[u32],
        orders: &[i32],
        values: &[f64],
    ) -> EngineResult<Status> {
        const OP: &str = "set_real_input_derivatives";
        self.check_derivative_batch(OP, vrs, orders.len(), values.len(), Role::Input)?;

        for ((&raw, &order), &value) in vrs.iter().zip(orders).zip(values) {
            if order != 1 {
                return Err(EngineError::UnsupportedOrder { op: OP, order });
            }
            let (vr, index) = self.resolve(OP, raw)?;
            if vr.role != Role::Input {
                return Err(EngineError::NotAnInput { op: OP, raw });
            }
            if vr.scalar_type == ScalarType::F64 {
                self.store.set_input_derivative(index, value);
            }
        }
        self.derivative_time = self.comm_time;
        Ok(Status::Ok)
    }

    /// Output derivatives are not computed; every order >= 1 reads 0.0.
    pub fn get_real_output_derivatives(
        &mut self,
        vrs: &[u32],
        orders: &[i32],
        values: &mut [f64],
    ) -> Status {
        let result = self.try_get_real_output_derivatives(vrs, orders, values);
        self.report(result)
    }

    fn try_get_real_output_derivatives(
        &mut self,
        vrs: &[u32],
        orders: &[i32],
        values: &mut [f64],
    ) -> EngineResult<Status> {
        const OP: &str = "get_real_output_derivatives";
        self.check_derivative_batch(OP, vrs, orders.len(), values.len(), Role::Output)?;
        if let Some(&order) = orders.iter().find(|&&o| o <= 0) {
            return Err(EngineError::UnsupportedOrder { op: OP, order });
        }
        values.fill(0.0);
        Ok(Status::Ok)
    }

    fn check_derivative_batch(
        &self,
        op: &'static str,
        vrs: &[u32],
        orders: usize,
        values: usize,
        role: Role,
    ) -> EngineResult<()> {
        self.require_kind(op, CS)?;
        self.require_initialized(op)?;
        for got in [orders, values] {
            if got != vrs.len() {
                return Err(EngineError::LengthMismatch {
                    op,
                    expected: vrs.len(),
                    got,
                });
            }
        }
        let limit = self.desc.count(role);
        if vrs.is_empty() || vrs.len() > limit {
            return Err(EngineError::InvalidBatch {
                op,
                got: vrs.len(),
                limit,
            });
        }
        Ok(())
    }
}
