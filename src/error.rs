// Bridge Error Handling

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum BridgeError {
    // Dispatch errors
    UnknownOperation(String),
    ArityMismatch {
        name: String,
        args: usize,
        min: usize,
        max: usize,
    },
    UnknownOpcode(u16),

    // Stack contract errors
    StackUnderflow,
    StackOverflow(usize),
    TypeMismatch(String, String), // expected, found
    StackImbalance {
        name: String,
        expected: usize,
        found: usize,
    },

    // Raised by a handler through the fatal-error primitive
    ScriptError(String),

    // Configuration key errors
    MalformedTriplet(String),
    StorageUnavailable(String),
    KeyNotFound(String),

    // Format engine errors
    FormatOverflow(usize),

    // Ambient errors
    Io(String),
    Settings(String),
}

impl BridgeError {
    /// Errors that break the evaluation-stack contract and must halt the script.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BridgeError::UnknownOperation(_)
                | BridgeError::ArityMismatch { .. }
                | BridgeError::UnknownOpcode(_)
                | BridgeError::StackUnderflow
                | BridgeError::StackOverflow(_)
                | BridgeError::TypeMismatch(_, _)
                | BridgeError::StackImbalance { .. }
                | BridgeError::ScriptError(_)
        )
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BridgeError::UnknownOperation(name) => {
                write!(f, "op_sfall_func: '{}' is not implemented", name)
            }
            BridgeError::ArityMismatch {
                name,
                args,
                min,
                max,
            } => {
                write!(
                    f,
                    "op_sfall_func: '{}': invalid number of args ({}, expected {}..={})",
                    name, args, min, max
                )
            }
            BridgeError::UnknownOpcode(opcode) => {
                write!(f, "Unknown opcode 0x{:04x}", opcode)
            }
            BridgeError::StackUnderflow => write!(f, "Stack underflow"),
            BridgeError::StackOverflow(size) => {
                write!(f, "Stack overflow (capacity {})", size)
            }
            BridgeError::TypeMismatch(expected, found) => {
                write!(f, "{} expected, got {}", expected, found)
            }
            BridgeError::StackImbalance {
                name,
                expected,
                found,
            } => {
                write!(
                    f,
                    "'{}' left the stack unbalanced: expected depth {}, found {}",
                    name, expected, found
                )
            }
            BridgeError::ScriptError(msg) => write!(f, "{}", msg),
            BridgeError::MalformedTriplet(triplet) => {
                write!(f, "Malformed setting identifier '{}'", triplet)
            }
            BridgeError::StorageUnavailable(path) => {
                write!(f, "Unable to load configuration file '{}'", path)
            }
            BridgeError::KeyNotFound(triplet) => {
                write!(f, "Setting '{}' not found", triplet)
            }
            BridgeError::FormatOverflow(len) => {
                write!(
                    f,
                    "Format string of {} characters exceeds the maximum length",
                    len
                )
            }
            BridgeError::Io(msg) => write!(f, "IO error: {}", msg),
            BridgeError::Settings(msg) => write!(f, "Settings error: {}", msg),
        }
    }
}

impl std::error::Error for BridgeError {}

impl From<std::io::Error> for BridgeError {
    fn from(error: std::io::Error) -> Self {
        BridgeError::Io(error.to_string())
    }
}

impl From<toml::de::Error> for BridgeError {
    fn from(error: toml::de::Error) -> Self {
        BridgeError::Settings(error.to_string())
    }
}

impl From<BridgeError> for String {
    fn from(error: BridgeError) -> String {
        error.to_string()
    }
}
