//! Batched get/set of real, integer and boolean variables.
//!
//! One generic path serves all three value kinds. Batches run in caller
//! order and stop at the first rejected reference; earlier elements stay
//! applied.

use hf_core::{CoreError, Role, ScalarType, Status, ValueReference, time_eq};

use crate::backend::ModelBackend;
use crate::error::{EngineError, EngineResult};
use crate::instance::{Instance, InterfaceKind};
use crate::store::FmiValue;

impl<B: ModelBackend> Instance<B> {
    pub fn get_real(&mut self, vrs: &[u32], values: &mut [f64]) -> Status {
        let result = self.try_get("get_real", vrs, values);
        self.report(result)
    }

    pub fn get_integer(&mut self, vrs: &[u32], values: &mut [i32]) -> Status {
        let result = self.try_get("get_integer", vrs, values);
        self.report(result)
    }

    pub fn get_boolean(&mut self, vrs: &[u32], values: &mut [bool]) -> Status {
        let result = self.try_get("get_boolean", vrs, values);
        self.report(result)
    }

    pub fn set_real(&mut self, vrs: &[u32], values: &[f64]) -> Status {
        let result = self.try_set("set_real", vrs, values);
        self.report(result)
    }

    pub fn set_integer(&mut self, vrs: &[u32], values: &[i32]) -> Status {
        let result = self.try_set("set_integer", vrs, values);
        self.report(result)
    }

    pub fn set_boolean(&mut self, vrs: &[u32], values: &[bool]) -> Status {
        let result = self.try_set("set_boolean", vrs, values);
        self.report(result)
    }

    pub fn get_string(&mut self, _vrs: &[u32], _values: &mut [String]) -> Status {
        self.unsupported("get_string")
    }

    pub fn set_string(&mut self, _vrs: &[u32], _values: &[&str]) -> Status {
        self.unsupported("set_string")
    }

    fn try_get<T: FmiValue>(
        &mut self,
        op: &'static str,
        vrs: &[u32],
        values: &mut [T],
    ) -> EngineResult<Status> {
        self.require_access(op)?;
        check_lengths(op, vrs.len(), values.len())?;
        tracing::trace!(kind = T::KIND, count = vrs.len(), "get batch");
        self.recompute_if_stale(op)?;
        for (&raw, slot) in vrs.iter().zip(values.iter_mut()) {
            *slot = self.read_one(op, raw)?;
        }
        Ok(Status::Ok)
    }

    fn try_set<T: FmiValue>(
        &mut self,
        op: &'static str,
        vrs: &[u32],
        values: &[T],
    ) -> EngineResult<Status> {
        self.require_access(op)?;
        check_lengths(op, vrs.len(), values.len())?;
        tracing::trace!(kind = T::KIND, count = vrs.len(), "set batch");

        let mut params_changed = false;
        let applied = vrs
            .iter()
            .zip(values)
            .try_for_each(|(&raw, &value)| self.write_one(op, raw, value, &mut params_changed));

        // Elements applied before a rejection are kept, so the mirror is
        // refreshed either way.
        let resync = if params_changed {
            self.eval(|b, cx| b.parameters_changed(cx))
                .map_err(EngineError::backend(op))
        } else {
            Ok(())
        };
        applied?;
        resync?;
        Ok(Status::Ok)
    }

    /// Evaluate outputs and derivatives if time moved or inputs changed
    /// since the last evaluation.
    pub(crate) fn recompute_if_stale(&mut self, op: &'static str) -> EngineResult<()> {
        if self.kind != InterfaceKind::ModelExchange || self.purely_discrete {
            return Ok(());
        }
        let moved = self
            .last_get_time
            .is_none_or(|last| !time_eq(last, self.clock));
        if !(moved || self.should_recompute) {
            return Ok(());
        }
        tracing::trace!(t = self.clock, moved, "recomputing before read");
        self.eval_outputs(op)?;
        self.eval_derivatives(op)?;
        self.last_get_time = Some(self.clock);
        self.should_recompute = false;
        Ok(())
    }

    /// Decode `raw` and check it against the declared variables.
    pub(crate) fn resolve(&self, op: &'static str, raw: u32) -> EngineResult<(ValueReference, usize)> {
        let invalid = |source| EngineError::InvalidReference { op, raw, source };
        let vr = ValueReference::decode(raw).map_err(invalid)?;
        let count = self.desc.count(vr.role);
        if vr.index >= count {
            return Err(invalid(CoreError::IndexOutOfRange {
                what: "value reference",
                index: vr.index,
                max: count,
            }));
        }
        let declared = self
            .desc
            .decl(vr.role, vr.index)
            .map_or(ScalarType::F64, |d| d.scalar_type);
        if vr.scalar_type != declared {
            return Err(invalid(CoreError::TypeMismatch {
                raw,
                encoded: vr.scalar_type,
                declared,
            }));
        }
        Ok((vr, vr.index))
    }

    fn read_one<T: FmiValue>(&self, op: &'static str, raw: u32) -> EngineResult<T> {
        let (vr, index) = self.resolve(op, raw)?;
        let value = match vr.role {
            Role::State => T::from_f64(self.states[index]),
            Role::Derivative => T::from_f64(self.derivatives[index]),
            role => self
                .store
                .load(role, index)
                .ok_or_else(|| EngineError::InvalidReference {
                    op,
                    raw,
                    source: CoreError::IndexOutOfRange {
                        what: "value reference",
                        index,
                        max: self.store.len(role),
                    },
                })?,
        };
        Ok(value)
    }

    fn write_one<T: FmiValue>(
        &mut self,
        op: &'static str,
        raw: u32,
        value: T,
        params_changed: &mut bool,
    ) -> EngineResult<()> {
        let (vr, index) = self.resolve(op, raw)?;
        let pre_init = !self.phase.is_initialized();
        match vr.role {
            Role::Input | Role::Parameter => {
                self.store.set(vr.role, index, value);
                self.should_recompute = true;
                if vr.role == Role::Parameter {
                    *params_changed = true;
                }
            }
            Role::State => {
                if self.kind == InterfaceKind::CoSimulation && !pre_init {
                    return Err(EngineError::NotWritable { op, raw });
                }
                self.states[index] = value.to_f64();
                self.should_recompute = true;
            }
            Role::Derivative => {
                if !pre_init {
                    return Err(EngineError::NotWritable { op, raw });
                }
                self.derivatives[index] = value.to_f64();
            }
            Role::Output | Role::BlockSignal | Role::WorkCell => {
                if !pre_init {
                    return Err(EngineError::NotWritable { op, raw });
                }
                self.store.set(vr.role, index, value);
            }
        }
        Ok(())
    }
}

fn check_lengths(op: &'static str, expected: usize, got: usize) -> EngineResult<()> {
    if expected == got {
        Ok(())
    } else {
        Err(EngineError::LengthMismatch { op, expected, got })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::EvalContext;
    use crate::description::{ModelDescription, SampleTime, VariableDecl};
    use crate::error::BackendResult;
    use crate::instance::Callbacks;
    use crate::logging::NullSink;

    /// Output 0 mirrors input 0 times parameter 0.
    struct Gain;

    impl ModelBackend for Gain {
        fn outputs(&mut self, cx: &mut EvalContext<'_>) -> BackendResult<()> {
            let y = cx.input(0) * cx.parameter(0);
            cx.set_output(0, y);
            Ok(())
        }
    }

    fn desc() -> ModelDescription {
        ModelDescription {
            model_name: "gain".into(),
            guid: String::new(),
            inputs: vec![VariableDecl::real(1.0)],
            outputs: vec![VariableDecl::real(0.0)],
            parameters: vec![VariableDecl::real(2.0), VariableDecl::typed(ScalarType::I16, 3.0)],
            block_signals: vec![],
            work_cells: vec![],
            states: vec![],
            event_indicators: 0,
            sample_times: vec![SampleTime::continuous()],
            offset_sampled_rate: None,
            fixed_step: 0.1,
            solver: Default::default(),
            names: vec![],
        }
    }

    fn initialized() -> Instance<Gain> {
        let mut inst = Instance::instantiate(
            "gain",
            InterfaceKind::ModelExchange,
            desc(),
            Gain,
            Callbacks::new(NullSink),
            false,
        )
        .unwrap();
        assert_eq!(inst.enter_initialization_mode(), Status::Ok);
        inst
    }

    #[test]
    fn get_recomputes_after_input_change() {
        let mut inst = initialized();
        let d = inst.description().clone();
        let u = d.value_reference(Role::Input, 0).unwrap();
        let y = d.value_reference(Role::Output, 0).unwrap();

        assert_eq!(inst.set_real(&[u], &[4.0]), Status::Ok);
        let mut out = [0.0];
        assert_eq!(inst.get_real(&[y], &mut out), Status::Ok);
        assert_eq!(out[0], 8.0);
    }

    #[test]
    fn integer_access_converts_through_slot_type() {
        let mut inst = initialized();
        let k = inst.description().value_reference(Role::Parameter, 1).unwrap();
        assert_eq!(inst.set_integer(&[k], &[-7]), Status::Ok);
        let mut out = [0];
        assert_eq!(inst.get_integer(&[k], &mut out), Status::Ok);
        assert_eq!(out[0], -7);
        let mut real = [0.0];
        assert_eq!(inst.get_real(&[k], &mut real), Status::Ok);
        assert_eq!(real[0], -7.0);
    }

    #[test]
    fn batch_stops_at_first_bad_reference() {
        let mut inst = initialized();
        let d = inst.description().clone();
        let p0 = d.value_reference(Role::Parameter, 0).unwrap();
        let bad = ValueReference::new(Role::Parameter, ScalarType::F64, 5)
            .unwrap()
            .encode();
        let p1 = d.value_reference(Role::Parameter, 1).unwrap();

        assert_eq!(inst.set_real(&[p0, bad, p1], &[10.0, 11.0, 12.0]), Status::Warning);
        let mut out = [0.0; 2];
        assert_eq!(inst.get_real(&[p0, p1], &mut out), Status::Ok);
        assert_eq!(out, [10.0, 3.0]);
    }

    #[test]
    fn length_mismatch_is_rejected_before_processing() {
        let mut inst = initialized();
        let p0 = inst.description().value_reference(Role::Parameter, 0).unwrap();
        assert_eq!(inst.set_real(&[p0], &[1.0, 2.0]), Status::Warning);
        let mut out = [0.0];
        inst.get_real(&[p0], &mut out);
        assert_eq!(out[0], 2.0);
    }

    #[test]
    fn strings_are_unsupported() {
        let mut inst = initialized();
        assert_eq!(inst.set_string(&[0], &["x"]), Status::Warning);
    }
}
