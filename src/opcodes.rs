//! Fixed-number extension opcodes
//!
//! Opcodes pop their operands in reverse order: the rightmost argument is on
//! top of the stack.

use crate::context::ScriptContext;
use crate::dispatch::sfall_metarule;
use crate::error::BridgeError;
use crate::opcode_tables::{get_opcode_name, sfall_func_arg_count};
use crate::opcodes_math::execute_math_op;
use crate::safe_format::{safe_format, OUTPUT_MAX_LEN};
use crate::util::{parse_c_float, parse_c_int};
use crate::value::TaggedValue;
use log::debug;

/// Version reported by `sfall_ver_major`, `sfall_ver_minor` and `sfall_ver_build`
pub const VERSION_MAJOR: i32 = 4;
pub const VERSION_MINOR: i32 = 3;
pub const VERSION_BUILD: i32 = 4;

/// Buffer size used by `get_ini_string`
const INI_STRING_BUFFER_SIZE: usize = 256;

/// Execute one extension opcode against `ctx`
pub fn execute_opcode(ctx: &mut dyn ScriptContext, opcode: u16) -> Result<(), BridgeError> {
    debug!("opcode 0x{:04x} ({})", opcode, get_opcode_name(opcode));

    if let Some(args) = sfall_func_arg_count(opcode) {
        return sfall_metarule(ctx, args);
    }

    if execute_math_op(ctx, opcode)? {
        return Ok(());
    }

    match opcode {
        // get_ini_setting
        0x81AC => {
            let triplet = ctx.pop_string()?;
            let value = ctx.ini().get_int(&triplet).unwrap_or_else(|e| {
                debug!("get_ini_setting: {}", e);
                -1
            });
            ctx.push_int(value)
        }

        // get_ini_string
        0x81EB => {
            let triplet = ctx.pop_string()?;
            match ctx.ini().get_string(&triplet, INI_STRING_BUFFER_SIZE) {
                Ok(value) => ctx.push_string(&value),
                Err(e) => {
                    debug!("get_ini_string: {}", e);
                    ctx.push_int(-1)
                }
            }
        }

        0x8210 => ctx.push_int(VERSION_MAJOR),
        0x8211 => ctx.push_int(VERSION_MINOR),
        0x8212 => ctx.push_int(VERSION_BUILD),

        // set_array(id, key, value)
        0x822E => {
            let value = ctx.pop_value()?;
            let key = ctx.pop_value()?;
            let id = ctx.pop_int()?;
            ctx.set_array(id, key, value);
            Ok(())
        }

        // get_array(id, key); a string id indexes its bytes
        0x822F => {
            let key = ctx.pop_value()?;
            let target = ctx.pop_value()?;
            match (target, key) {
                (TaggedValue::String(handle), TaggedValue::Int(pos)) => {
                    let text = ctx.get_string(handle)?;
                    let byte = usize::try_from(pos)
                        .ok()
                        .and_then(|pos| text.as_bytes().get(pos).copied());
                    let piece = byte
                        .map(|b| String::from_utf8_lossy(&[b]).into_owned())
                        .unwrap_or_default();
                    ctx.push_string(&piece)
                }
                (target, key) => {
                    let value = ctx.get_array(target.as_int()?, key);
                    ctx.push_value(value)
                }
            }
        }

        // len_array
        0x8231 => {
            let id = ctx.pop_int()?;
            let len = ctx.len_array(id);
            ctx.push_int(len)
        }

        // temp_array(len, flags)
        0x8233 => {
            let flags = ctx.pop_int()?;
            let len = ctx.pop_int()?;
            let id = ctx.create_temp_array(len, flags);
            ctx.push_int(id)
        }

        // atoi
        0x8237 => {
            let text = ctx.pop_string()?;
            ctx.push_int(parse_c_int(&text))
        }

        // atof
        0x8238 => {
            let text = ctx.pop_string()?;
            ctx.push_float(parse_c_float(&text))
        }

        // substr(text, start, length)
        0x824E => {
            let length = ctx.pop_int()?;
            let start = ctx.pop_int()?;
            let text = ctx.pop_string()?;
            ctx.push_string(&substr(&text, start, length))
        }

        // strlen
        0x824F => {
            let text = ctx.pop_string()?;
            ctx.push_int(text.len() as i32)
        }

        // sprintf(format, value)
        0x8250 => {
            let value = ctx.pop_value()?;
            let format = ctx.pop_string()?;
            let text = safe_format(&*ctx, &format, &[value], "op_sprintf");
            ctx.push_string(&text)
        }

        // charcode: first byte as a signed char
        0x8251 => {
            let text = ctx.pop_string()?;
            ctx.push_int(text.as_bytes().first().map_or(0, |&b| b as i8 as i32))
        }

        // typeof
        0x8253 => {
            let value = ctx.pop_value()?;
            ctx.push_int(value.type_code())
        }

        // get_array_key(id, index)
        0x8256 => {
            let index = ctx.pop_int()?;
            let id = ctx.pop_int()?;
            let key = ctx.array_key(id, index);
            ctx.push_value(key)
        }

        _ => Err(BridgeError::UnknownOpcode(opcode)),
    }
}

/// Byte substring with the extension standard's rules: a negative start
/// counts from the end, a negative length cuts from the end.
pub fn substr(text: &str, start: i32, length: i32) -> String {
    let bytes = text.as_bytes();
    let len = bytes.len() as i64;
    let mut start = start as i64;
    let mut length = length as i64;

    if start < 0 {
        start = (start + len).max(0);
    }

    if length < 0 {
        length += len - start;
        if length == 0 {
            return String::new();
        }
        length = length.abs();
    }

    if start >= len {
        return String::new();
    }

    if length == 0 || length + start > len {
        length = len - start;
    }
    length = length.min(OUTPUT_MAX_LEN as i64 - 1);

    let start = start as usize;
    String::from_utf8_lossy(&bytes[start..start + length as usize]).into_owned()
}
