#![crate_name = "sfall_bridge"]

#[macro_use]
extern crate lazy_static;

pub mod arrays;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod ini;
pub mod metarules;
pub mod opcode_tables;
pub mod opcodes;
pub mod opcodes_math;
pub mod program;
pub mod registry;
pub mod safe_format;
pub mod script;
pub mod settings;
pub mod util;
pub mod value;


pub use context::ScriptContext;
pub use error::BridgeError;
pub use program::Program;
pub use value::TaggedValue;
