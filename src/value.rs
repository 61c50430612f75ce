//! Tagged values exchanged on the script evaluation stack
//!
//! Every value carries its discriminator, so the kind of a popped value is
//! always known. The only reinterpretations allowed across kinds are the
//! explicit numeric coercions `as_int` and `as_float`.

use crate::error::BridgeError;
use std::fmt;

/// Index into the interpreter's string table
pub type StringHandle = u32;

/// Opaque reference to a host object; 0 is the null reference
pub type ObjectRef = usize;

/// Discriminator of a tagged value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Integer,
    Float,
    StringHandle,
    Pointer,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ValueKind::Integer => write!(f, "integer"),
            ValueKind::Float => write!(f, "float"),
            ValueKind::StringHandle => write!(f, "string"),
            ValueKind::Pointer => write!(f, "pointer"),
        }
    }
}

/// A value as it lives on the evaluation stack
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TaggedValue {
    Int(i32),
    Float(f32),
    String(StringHandle),
    Pointer(ObjectRef),
}

impl Default for TaggedValue {
    fn default() -> Self {
        TaggedValue::Int(0)
    }
}

impl TaggedValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            TaggedValue::Int(_) => ValueKind::Integer,
            TaggedValue::Float(_) => ValueKind::Float,
            TaggedValue::String(_) => ValueKind::StringHandle,
            TaggedValue::Pointer(_) => ValueKind::Pointer,
        }
    }

    pub fn is_int(&self) -> bool {
        matches!(self, TaggedValue::Int(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, TaggedValue::Float(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, TaggedValue::String(_))
    }

    /// Integer view of a numeric value. Floats truncate toward zero.
    pub fn as_int(&self) -> Result<i32, BridgeError> {
        match *self {
            TaggedValue::Int(value) => Ok(value),
            TaggedValue::Float(value) => Ok(value.trunc() as i32),
            other => Err(BridgeError::TypeMismatch(
                "number".to_string(),
                other.kind().to_string(),
            )),
        }
    }

    /// Float view of a numeric value. Integers widen.
    pub fn as_float(&self) -> Result<f32, BridgeError> {
        match *self {
            TaggedValue::Int(value) => Ok(value as f32),
            TaggedValue::Float(value) => Ok(value),
            other => Err(BridgeError::TypeMismatch(
                "number".to_string(),
                other.kind().to_string(),
            )),
        }
    }

    /// Type code reported by the `typeof` opcode
    pub fn type_code(&self) -> i32 {
        match self {
            TaggedValue::Int(_) => 1,
            TaggedValue::Float(_) => 2,
            _ => 3,
        }
    }
}

impl fmt::Display for TaggedValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TaggedValue::Int(value) => write!(f, "{}", value),
            TaggedValue::Float(value) => write!(f, "{:.5}", value),
            TaggedValue::String(handle) => write!(f, "string#{}", handle),
            TaggedValue::Pointer(0) => write!(f, "null"),
            TaggedValue::Pointer(ptr) => write!(f, "object@{:#x}", ptr),
        }
    }
}

impl From<i32> for TaggedValue {
    fn from(value: i32) -> Self {
        TaggedValue::Int(value)
    }
}

impl From<f32> for TaggedValue {
    fn from(value: f32) -> Self {
        TaggedValue::Float(value)
    }
}
