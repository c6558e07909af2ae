//! Variable store and scalar coercion.
//!
//! Inputs, outputs, parameters, block signals and work cells are stored as
//! typed scalars fixed at declaration time. Interface values (real, integer,
//! boolean) are converted to and from the stored type with plain numeric
//! casts; there is no range checking.

use hf_core::{Role, ScalarType};

use crate::description::{ModelDescription, VariableDecl};

/// A stored scalar of one of the declared types.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalarValue {
    F64(f64),
    F32(f32),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    Bool(bool),
}

impl ScalarValue {
    pub fn scalar_type(self) -> ScalarType {
        match self {
            ScalarValue::F64(_) => ScalarType::F64,
            ScalarValue::F32(_) => ScalarType::F32,
            ScalarValue::I8(_) => ScalarType::I8,
            ScalarValue::U8(_) => ScalarType::U8,
            ScalarValue::I16(_) => ScalarType::I16,
            ScalarValue::U16(_) => ScalarType::U16,
            ScalarValue::I32(_) => ScalarType::I32,
            ScalarValue::U32(_) => ScalarType::U32,
            ScalarValue::Bool(_) => ScalarType::Bool,
        }
    }

    pub fn from_real(ty: ScalarType, v: f64) -> Self {
        match ty {
            ScalarType::F64 => ScalarValue::F64(v),
            ScalarType::F32 => ScalarValue::F32(v as f32),
            ScalarType::I8 => ScalarValue::I8(v as i8),
            ScalarType::U8 => ScalarValue::U8(v as u8),
            ScalarType::I16 => ScalarValue::I16(v as i16),
            ScalarType::U16 => ScalarValue::U16(v as u16),
            ScalarType::I32 => ScalarValue::I32(v as i32),
            ScalarType::U32 => ScalarValue::U32(v as u32),
            ScalarType::Bool => ScalarValue::Bool(v != 0.0),
        }
    }

    pub fn from_integer(ty: ScalarType, v: i32) -> Self {
        match ty {
            ScalarType::F64 => ScalarValue::F64(f64::from(v)),
            ScalarType::F32 => ScalarValue::F32(v as f32),
            ScalarType::I8 => ScalarValue::I8(v as i8),
            ScalarType::U8 => ScalarValue::U8(v as u8),
            ScalarType::I16 => ScalarValue::I16(v as i16),
            ScalarType::U16 => ScalarValue::U16(v as u16),
            ScalarType::I32 => ScalarValue::I32(v),
            ScalarType::U32 => ScalarValue::U32(v as u32),
            ScalarType::Bool => ScalarValue::Bool(v != 0),
        }
    }

    pub fn from_boolean(ty: ScalarType, v: bool) -> Self {
        Self::from_integer(ty, i32::from(v))
    }

    pub fn to_real(self) -> f64 {
        match self {
            ScalarValue::F64(v) => v,
            ScalarValue::F32(v) => f64::from(v),
            ScalarValue::I8(v) => f64::from(v),
            ScalarValue::U8(v) => f64::from(v),
            ScalarValue::I16(v) => f64::from(v),
            ScalarValue::U16(v) => f64::from(v),
            ScalarValue::I32(v) => f64::from(v),
            ScalarValue::U32(v) => f64::from(v),
            ScalarValue::Bool(v) => f64::from(u8::from(v)),
        }
    }

    pub fn to_integer(self) -> i32 {
        match self {
            ScalarValue::F64(v) => v as i32,
            ScalarValue::F32(v) => v as i32,
            ScalarValue::I8(v) => i32::from(v),
            ScalarValue::U8(v) => i32::from(v),
            ScalarValue::I16(v) => i32::from(v),
            ScalarValue::U16(v) => i32::from(v),
            ScalarValue::I32(v) => v,
            ScalarValue::U32(v) => v as i32,
            ScalarValue::Bool(v) => i32::from(v),
        }
    }

    pub fn to_boolean(self) -> bool {
        match self {
            ScalarValue::Bool(v) => v,
            other => other.to_integer() != 0,
        }
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for f64 {}
    impl Sealed for i32 {}
    impl Sealed for bool {}
}

/// Interface value kinds: real, integer and boolean.
///
/// Closed set; get/set are written once, generic over this trait.
pub trait FmiValue: Copy + sealed::Sealed {
    /// Name used in log messages ("Real", "Integer", "Boolean").
    const KIND: &'static str;

    fn store_as(self, ty: ScalarType) -> ScalarValue;
    fn load(v: ScalarValue) -> Self;
    /// Conversion for state/derivative slots, which are always `f64`.
    fn from_f64(v: f64) -> Self;
    fn to_f64(self) -> f64;
}

impl FmiValue for f64 {
    const KIND: &'static str = "Real";

    fn store_as(self, ty: ScalarType) -> ScalarValue {
        ScalarValue::from_real(ty, self)
    }
    fn load(v: ScalarValue) -> Self {
        v.to_real()
    }
    fn from_f64(v: f64) -> Self {
        v
    }
    fn to_f64(self) -> f64 {
        self
    }
}

impl FmiValue for i32 {
    const KIND: &'static str = "Integer";

    fn store_as(self, ty: ScalarType) -> ScalarValue {
        ScalarValue::from_integer(ty, self)
    }
    fn load(v: ScalarValue) -> Self {
        v.to_integer()
    }
    fn from_f64(v: f64) -> Self {
        v as i32
    }
    fn to_f64(self) -> f64 {
        f64::from(self)
    }
}

impl FmiValue for bool {
    const KIND: &'static str = "Boolean";

    fn store_as(self, ty: ScalarType) -> ScalarValue {
        ScalarValue::from_boolean(ty, self)
    }
    fn load(v: ScalarValue) -> Self {
        v.to_boolean()
    }
    fn from_f64(v: f64) -> Self {
        v != 0.0
    }
    fn to_f64(self) -> f64 {
        f64::from(u8::from(self))
    }
}

/// Flat storage for the stored roles plus first-order input derivatives.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableStore {
    inputs: Vec<ScalarValue>,
    outputs: Vec<ScalarValue>,
    parameters: Vec<ScalarValue>,
    block_signals: Vec<ScalarValue>,
    work_cells: Vec<ScalarValue>,
    input_derivatives: Vec<f64>,
}

fn seed(decls: &[VariableDecl]) -> Vec<ScalarValue> {
    decls
        .iter()
        .map(|d| ScalarValue::from_real(d.scalar_type, d.start))
        .collect()
}

impl VariableStore {
    /// Allocate and fill with start values. Sizes are fixed from here on.
    pub fn new(desc: &ModelDescription) -> Self {
        Self {
            inputs: seed(&desc.inputs),
            outputs: seed(&desc.outputs),
            parameters: seed(&desc.parameters),
            block_signals: seed(&desc.block_signals),
            work_cells: seed(&desc.work_cells),
            input_derivatives: vec![0.0; desc.inputs.len()],
        }
    }

    /// Re-seed start values in place without resizing.
    pub fn reset(&mut self, desc: &ModelDescription) {
        let fresh = Self::new(desc);
        debug_assert_eq!(fresh.inputs.len(), self.inputs.len());
        *self = fresh;
    }

    fn slots(&self, role: Role) -> Option<&[ScalarValue]> {
        match role {
            Role::Input => Some(&self.inputs),
            Role::Output => Some(&self.outputs),
            Role::Parameter => Some(&self.parameters),
            Role::BlockSignal => Some(&self.block_signals),
            Role::WorkCell => Some(&self.work_cells),
            Role::State | Role::Derivative => None,
        }
    }

    fn slots_mut(&mut self, role: Role) -> Option<&mut [ScalarValue]> {
        match role {
            Role::Input => Some(&mut self.inputs),
            Role::Output => Some(&mut self.outputs),
            Role::Parameter => Some(&mut self.parameters),
            Role::BlockSignal => Some(&mut self.block_signals),
            Role::WorkCell => Some(&mut self.work_cells),
            Role::State | Role::Derivative => None,
        }
    }

    /// Stored value, or `None` for state/derivative roles and bad indices.
    pub fn get(&self, role: Role, index: usize) -> Option<ScalarValue> {
        self.slots(role)?.get(index).copied()
    }

    /// Stored value as `f64` (0.0 when absent). Convenient for backends.
    pub fn real(&self, role: Role, index: usize) -> f64 {
        self.get(role, index).map_or(0.0, ScalarValue::to_real)
    }

    /// Write an interface value, converting to the slot's stored type.
    ///
    /// Returns `false` for state/derivative roles and bad indices.
    pub fn set<T: FmiValue>(&mut self, role: Role, index: usize, value: T) -> bool {
        match self.slots_mut(role).and_then(|s| s.get_mut(index)) {
            Some(slot) => {
                *slot = value.store_as(slot.scalar_type());
                true
            }
            None => false,
        }
    }

    /// Read an interface value, converting from the slot's stored type.
    pub fn load<T: FmiValue>(&self, role: Role, index: usize) -> Option<T> {
        self.get(role, index).map(T::load)
    }

    /// Write a real value, keeping the slot's type. Used by backends.
    pub fn set_real(&mut self, role: Role, index: usize, value: f64) {
        self.set(role, index, value);
    }

    pub fn len(&self, role: Role) -> usize {
        self.slots(role).map_or(0, <[ScalarValue]>::len)
    }

    pub fn set_input_derivative(&mut self, index: usize, value: f64) {
        if let Some(d) = self.input_derivatives.get_mut(index) {
            *d = value;
        }
    }

    /// Linear extrapolation of real inputs with a nonzero derivative.
    pub fn extrapolate_inputs(&mut self, dt: f64) {
        for (input, &d) in self.inputs.iter_mut().zip(&self.input_derivatives) {
            if d != 0.0 {
                if let ScalarValue::F64(v) = input {
                    *v += d * dt;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::SampleTime;

    fn desc() -> ModelDescription {
        ModelDescription {
            model_name: "store".into(),
            guid: String::new(),
            inputs: vec![VariableDecl::real(1.0), VariableDecl::typed(ScalarType::I8, 0.0)],
            outputs: vec![VariableDecl::real(0.0)],
            parameters: vec![VariableDecl::typed(ScalarType::Bool, 1.0)],
            block_signals: vec![VariableDecl::typed(ScalarType::F32, 0.5)],
            work_cells: vec![VariableDecl::typed(ScalarType::U16, 7.0)],
            states: vec![],
            event_indicators: 0,
            sample_times: vec![SampleTime::continuous()],
            offset_sampled_rate: None,
            fixed_step: 0.1,
            solver: Default::default(),
            names: vec![],
        }
    }

    #[test]
    fn start_values_are_seeded_with_declared_types() {
        let s = VariableStore::new(&desc());
        assert_eq!(s.get(Role::Input, 0), Some(ScalarValue::F64(1.0)));
        assert_eq!(s.get(Role::Input, 1), Some(ScalarValue::I8(0)));
        assert_eq!(s.get(Role::Parameter, 0), Some(ScalarValue::Bool(true)));
        assert_eq!(s.get(Role::WorkCell, 0), Some(ScalarValue::U16(7)));
        assert_eq!(s.get(Role::State, 0), None);
        assert_eq!(s.get(Role::Output, 1), None);
    }

    #[test]
    fn set_converts_to_slot_type() {
        let mut s = VariableStore::new(&desc());
        assert!(s.set(Role::Input, 1, 3.9_f64));
        assert_eq!(s.get(Role::Input, 1), Some(ScalarValue::I8(3)));
        assert_eq!(s.load::<i32>(Role::Input, 1), Some(3));

        assert!(s.set(Role::BlockSignal, 0, 2_i32));
        assert_eq!(s.load::<f64>(Role::BlockSignal, 0), Some(2.0));

        assert!(s.set(Role::Parameter, 0, false));
        assert_eq!(s.load::<bool>(Role::Parameter, 0), Some(false));
        assert_eq!(s.load::<f64>(Role::Parameter, 0), Some(0.0));

        assert!(!s.set(Role::State, 0, 1.0_f64));
        assert!(!s.set(Role::Output, 5, 1.0_f64));
    }

    #[test]
    fn narrowing_wraps_without_range_check() {
        assert_eq!(ScalarValue::from_integer(ScalarType::U8, 300), ScalarValue::U8(44));
        assert_eq!(ScalarValue::from_integer(ScalarType::I8, -1).to_integer(), -1);
    }

    #[test]
    fn extrapolation_touches_real_inputs_with_derivative_only() {
        let mut s = VariableStore::new(&desc());
        s.set_input_derivative(0, 2.0);
        s.set_input_derivative(1, 5.0);
        s.extrapolate_inputs(0.5);
        assert_eq!(s.load::<f64>(Role::Input, 0), Some(2.0));
        assert_eq!(s.load::<i32>(Role::Input, 1), Some(0));
    }

    #[test]
    fn reset_restores_start_values() {
        let d = desc();
        let mut s = VariableStore::new(&d);
        s.set(Role::Input, 0, 42.0_f64);
        s.set_input_derivative(0, 1.0);
        s.reset(&d);
        assert_eq!(s, VariableStore::new(&d));
    }
}
