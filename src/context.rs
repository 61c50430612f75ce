//! The interpreter surface every operation is written against
//!
//! Handlers only see the evaluation stack, the string table, the temp array
//! store, the settings accessor and the debug log through this trait, so the
//! same handlers run inside a host interpreter or the in-memory [`Program`].
//!
//! [`Program`]: crate::program::Program

use crate::error::BridgeError;
use crate::ini::IniAccessor;
use crate::value::{ObjectRef, StringHandle, TaggedValue};

pub trait ScriptContext {
    /// Pop the top value of the evaluation stack
    fn pop_value(&mut self) -> Result<TaggedValue, BridgeError>;

    /// Push a value onto the evaluation stack
    fn push_value(&mut self, value: TaggedValue) -> Result<(), BridgeError>;

    /// Current number of values on the evaluation stack
    fn depth(&self) -> usize;

    /// Text behind a string handle
    fn get_string(&self, handle: StringHandle) -> Result<&str, BridgeError>;

    /// Intern `text` and return a string-kind value referring to it
    fn make_string(&mut self, text: &str) -> TaggedValue;

    /// Create a temp array (length -1 for a map) and return its id
    fn create_temp_array(&mut self, len: i32, flags: i32) -> i32;

    fn set_array(&mut self, id: i32, key: TaggedValue, value: TaggedValue);

    /// Value stored under `key`; integer 0 when absent
    fn get_array(&self, id: i32, key: TaggedValue) -> TaggedValue;

    /// Number of elements, -1 for an unknown id
    fn len_array(&self, id: i32) -> i32;

    /// Key at position `index`; integer 0 when out of range
    fn array_key(&self, id: i32, index: i32) -> TaggedValue;

    /// Accessor for `file|section|key` settings
    fn ini(&self) -> &IniAccessor;

    /// Script-visible debug output
    fn debug_print(&mut self, message: &str);

    /// Pop a number as an integer. Floats truncate toward zero.
    fn pop_int(&mut self) -> Result<i32, BridgeError> {
        self.pop_value()?.as_int()
    }

    /// Pop a number as a float. Integers widen.
    fn pop_float(&mut self) -> Result<f32, BridgeError> {
        self.pop_value()?.as_float()
    }

    fn pop_string(&mut self) -> Result<String, BridgeError> {
        match self.pop_value()? {
            TaggedValue::String(handle) => Ok(self.get_string(handle)?.to_string()),
            other => Err(BridgeError::TypeMismatch(
                "string".to_string(),
                other.kind().to_string(),
            )),
        }
    }

    /// Pop an object reference. The integer 0 is accepted as null.
    fn pop_pointer(&mut self) -> Result<ObjectRef, BridgeError> {
        match self.pop_value()? {
            TaggedValue::Pointer(ptr) => Ok(ptr),
            TaggedValue::Int(0) => Ok(0),
            other => Err(BridgeError::TypeMismatch(
                "pointer".to_string(),
                other.kind().to_string(),
            )),
        }
    }

    fn push_int(&mut self, value: i32) -> Result<(), BridgeError> {
        self.push_value(TaggedValue::Int(value))
    }

    fn push_float(&mut self, value: f32) -> Result<(), BridgeError> {
        self.push_value(TaggedValue::Float(value))
    }

    fn push_string(&mut self, text: &str) -> Result<(), BridgeError> {
        let value = self.make_string(text);
        self.push_value(value)
    }

    fn push_pointer(&mut self, ptr: ObjectRef) -> Result<(), BridgeError> {
        self.push_value(TaggedValue::Pointer(ptr))
    }

    /// Text of any value, used where a script may pass either kind
    fn value_text(&self, value: TaggedValue) -> Result<String, BridgeError> {
        match value {
            TaggedValue::String(handle) => Ok(self.get_string(handle)?.to_string()),
            other => Ok(other.to_string()),
        }
    }
}
