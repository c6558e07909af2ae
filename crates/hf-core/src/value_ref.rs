//! Packed variable references.
//!
//! A reference is a 32-bit word laid out as
//! `role (bits 31-28) | scalar type (bits 27-24) | index (bits 23-0)`.
//! The layout is part of the external interface; everything past the
//! boundary works with the decoded [`ValueReference`].

use core::fmt;

use crate::error::{CoreError, CoreResult};

/// Largest index representable in a packed reference.
pub const MAX_INDEX: usize = 0x00ff_ffff;

const ROLE_SHIFT: u32 = 28;
const TYPE_SHIFT: u32 = 24;
const NIBBLE: u32 = 0xf;

/// Variable role (storage category).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Role {
    Parameter,
    State,
    Derivative,
    Output,
    Input,
    /// Block-local signal (debug channel).
    BlockSignal,
    /// Persistent work cell (debug channel).
    WorkCell,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Parameter,
        Role::State,
        Role::Derivative,
        Role::Output,
        Role::Input,
        Role::BlockSignal,
        Role::WorkCell,
    ];

    pub fn code(self) -> u32 {
        match self {
            Role::Parameter => 1,
            Role::State => 2,
            Role::Derivative => 3,
            Role::Output => 4,
            Role::Input => 5,
            Role::BlockSignal => 6,
            Role::WorkCell => 7,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.code() == code)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Parameter => "parameter",
            Role::State => "state",
            Role::Derivative => "derivative",
            Role::Output => "output",
            Role::Input => "input",
            Role::BlockSignal => "block signal",
            Role::WorkCell => "work cell",
        };
        f.write_str(s)
    }
}

/// Stored scalar type of a variable, independent of the interface value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ScalarType {
    #[default]
    F64,
    F32,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    Bool,
}

impl ScalarType {
    pub const ALL: [ScalarType; 9] = [
        ScalarType::F64,
        ScalarType::F32,
        ScalarType::I8,
        ScalarType::U8,
        ScalarType::I16,
        ScalarType::U16,
        ScalarType::I32,
        ScalarType::U32,
        ScalarType::Bool,
    ];

    pub fn code(self) -> u32 {
        match self {
            ScalarType::F64 => 0,
            ScalarType::F32 => 1,
            ScalarType::I8 => 2,
            ScalarType::U8 => 3,
            ScalarType::I16 => 4,
            ScalarType::U16 => 5,
            ScalarType::I32 => 6,
            ScalarType::U32 => 7,
            ScalarType::Bool => 8,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }
}

/// Decoded variable reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueReference {
    pub role: Role,
    pub scalar_type: ScalarType,
    pub index: usize,
}

impl ValueReference {
    /// Build a reference, rejecting indices that do not fit in 24 bits.
    pub fn new(role: Role, scalar_type: ScalarType, index: usize) -> CoreResult<Self> {
        if index > MAX_INDEX {
            return Err(CoreError::IndexOutOfRange {
                what: "value reference index",
                index,
                max: MAX_INDEX,
            });
        }
        Ok(Self {
            role,
            scalar_type,
            index,
        })
    }

    /// Decode a packed reference. Pure; never allocates.
    pub fn decode(raw: u32) -> CoreResult<Self> {
        let role_code = raw >> ROLE_SHIFT;
        let type_code = (raw >> TYPE_SHIFT) & NIBBLE;
        let role = Role::from_code(role_code).ok_or(CoreError::UnknownRole {
            raw,
            code: role_code,
        })?;
        let scalar_type = ScalarType::from_code(type_code).ok_or(CoreError::UnknownScalarType {
            raw,
            code: type_code,
        })?;
        Ok(Self {
            role,
            scalar_type,
            index: (raw & MAX_INDEX as u32) as usize,
        })
    }

    /// Pack into the external 32-bit layout.
    pub fn encode(self) -> u32 {
        self.role.code() << ROLE_SHIFT
            | self.scalar_type.code() << TYPE_SHIFT
            | self.index as u32 & MAX_INDEX as u32
    }
}

impl fmt::Display for ValueReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.role, self.index)
    }
}
