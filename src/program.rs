use crate::arrays::ArrayStore;
use crate::context::ScriptContext;
use crate::error::BridgeError;
use crate::ini::IniAccessor;
use crate::opcode_tables::sfall_func_opcode;
use crate::opcodes::execute_opcode;
use crate::registry::MAX_METARULE_ARGS;
use crate::settings::BridgeSettings;
use crate::value::{StringHandle, TaggedValue};
use indexmap::IndexSet;
use log::{debug, error};

/// Default capacity of the evaluation stack
pub const STACK_SIZE: usize = 1024;

/// An in-memory script execution context
pub struct Program {
    /// Main evaluation stack
    stack: Vec<TaggedValue>,
    /// Capacity of the evaluation stack
    stack_size: usize,
    /// Interned strings; a handle is an index into this set
    strings: IndexSet<String>,
    /// Temp arrays created by operations
    pub arrays: ArrayStore,
    /// Settings accessor with the configured base path
    ini: IniAccessor,
    /// Everything written through `debug_print`
    debug_output: Vec<String>,
    /// Set once a fatal error stopped the script
    halt_reason: Option<BridgeError>,
}

impl Program {
    pub fn new(ini: IniAccessor) -> Self {
        Program::with_stack_size(ini, STACK_SIZE)
    }

    pub fn with_stack_size(ini: IniAccessor, stack_size: usize) -> Self {
        Program {
            stack: Vec::with_capacity(stack_size),
            stack_size,
            strings: IndexSet::new(),
            arrays: ArrayStore::new(),
            ini,
            debug_output: Vec::new(),
            halt_reason: None,
        }
    }

    /// Build a program from runner settings
    pub fn from_settings(settings: &BridgeSettings) -> Self {
        let ini = IniAccessor::new(settings.ini_base_path.as_deref());
        Program::with_stack_size(ini, settings.stack_size)
    }

    /// Stop the script. Only the first reason is kept.
    pub fn halt(&mut self, reason: BridgeError) {
        error!("script halted: {}", reason);
        if self.halt_reason.is_none() {
            self.halt_reason = Some(reason);
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halt_reason.is_some()
    }

    pub fn halt_reason(&self) -> Option<&BridgeError> {
        self.halt_reason.as_ref()
    }

    /// Execute one opcode. A fatal error halts the program; a halted
    /// program refuses to run anything further.
    pub fn execute(&mut self, opcode: u16) -> Result<(), BridgeError> {
        if let Some(reason) = &self.halt_reason {
            return Err(BridgeError::ScriptError(format!(
                "script halted: {}",
                reason
            )));
        }

        execute_opcode(self, opcode).map_err(|e| {
            if e.is_fatal() {
                self.halt(e.clone());
            }
            e
        })
    }

    /// Push `name` and `args` and issue the matching named-call opcode
    pub fn call_metarule(&mut self, name: &str, args: &[TaggedValue]) -> Result<(), BridgeError> {
        let opcode = sfall_func_opcode(args.len()).ok_or_else(|| BridgeError::ArityMismatch {
            name: name.to_string(),
            args: args.len(),
            min: 0,
            max: MAX_METARULE_ARGS,
        })?;

        self.push_string(name)?;
        for arg in args {
            self.push_value(*arg)?;
        }
        self.execute(opcode)
    }

    pub fn debug_output(&self) -> &[String] {
        &self.debug_output
    }

    /// Text of a value for display; strings are resolved through the table
    pub fn display_value(&self, value: TaggedValue) -> String {
        self.value_text(value)
            .unwrap_or_else(|_| format!("<bad string {}>", value))
    }
}

impl ScriptContext for Program {
    fn pop_value(&mut self) -> Result<TaggedValue, BridgeError> {
        let value = self.stack.pop().ok_or(BridgeError::StackUnderflow)?;
        debug!("pop {:?}, depth={}", value, self.stack.len());
        Ok(value)
    }

    fn push_value(&mut self, value: TaggedValue) -> Result<(), BridgeError> {
        if self.stack.len() >= self.stack_size {
            return Err(BridgeError::StackOverflow(self.stack_size));
        }
        debug!("push {:?}, depth={}", value, self.stack.len());
        self.stack.push(value);
        Ok(())
    }

    fn depth(&self) -> usize {
        self.stack.len()
    }

    fn get_string(&self, handle: StringHandle) -> Result<&str, BridgeError> {
        self.strings
            .get_index(handle as usize)
            .map(String::as_str)
            .ok_or_else(|| {
                BridgeError::ScriptError(format!("invalid string handle {}", handle))
            })
    }

    fn make_string(&mut self, text: &str) -> TaggedValue {
        let (index, _) = self.strings.insert_full(text.to_string());
        TaggedValue::String(index as StringHandle)
    }

    fn create_temp_array(&mut self, len: i32, _flags: i32) -> i32 {
        self.arrays.create(len)
    }

    fn set_array(&mut self, id: i32, key: TaggedValue, value: TaggedValue) {
        self.arrays.set(id, key, value);
    }

    fn get_array(&self, id: i32, key: TaggedValue) -> TaggedValue {
        self.arrays
            .get(id)
            .and_then(|array| array.get(key))
            .unwrap_or_default()
    }

    fn len_array(&self, id: i32) -> i32 {
        self.arrays.get(id).map_or(-1, |array| array.len() as i32)
    }

    fn array_key(&self, id: i32, index: i32) -> TaggedValue {
        self.arrays
            .get(id)
            .and_then(|array| array.key_at(index))
            .unwrap_or_default()
    }

    fn ini(&self) -> &IniAccessor {
        &self.ini
    }

    fn debug_print(&mut self, message: &str) {
        debug!("debug_print: {}", message);
        self.debug_output.push(message.to_string());
    }
}
