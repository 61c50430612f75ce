//! Mathematical opcodes of the extension standard
//!
//! Unary functions accept either number kind and push a float. `abs` keeps
//! the kind of its argument; `ceil` and `round` push integers; `^` pushes an
//! integer only when both operands are integers.

use crate::context::ScriptContext;
use crate::error::BridgeError;
use crate::value::TaggedValue;
use log::debug;

/// Handle a math opcode. Returns `Ok(false)` if `opcode` is not one.
pub fn execute_math_op(ctx: &mut dyn ScriptContext, opcode: u16) -> Result<bool, BridgeError> {
    match opcode {
        // sqrt
        0x81EC => {
            let value = ctx.pop_float()?;
            debug!("sqrt {}", value);
            ctx.push_float(value.sqrt())?;
        }

        // abs
        0x81ED => {
            let value = ctx.pop_value()?;
            debug!("abs {}", value);
            match value {
                TaggedValue::Int(v) => ctx.push_int(v.wrapping_abs())?,
                other => ctx.push_float(other.as_float()?.abs())?,
            }
        }

        // sin
        0x81EE => {
            let value = ctx.pop_float()?;
            ctx.push_float(value.sin())?;
        }

        // cos
        0x81EF => {
            let value = ctx.pop_float()?;
            ctx.push_float(value.cos())?;
        }

        // tan
        0x81F0 => {
            let value = ctx.pop_float()?;
            ctx.push_float(value.tan())?;
        }

        // arctan(y, x)
        0x81F1 => {
            let x = ctx.pop_float()?;
            let y = ctx.pop_float()?;
            debug!("arctan {} {}", y, x);
            ctx.push_float(y.atan2(x))?;
        }

        // ^ (power)
        0x8263 => {
            let exponent = ctx.pop_value()?;
            let base = ctx.pop_value()?;
            debug!("power {} {}", base, exponent);
            let result = base.as_float()?.powf(exponent.as_float()?);
            if base.is_int() && exponent.is_int() {
                // negative exponents truncate to 0 for integer bases
                ctx.push_int(result as i32)?;
            } else {
                ctx.push_float(result)?;
            }
        }

        // log
        0x8264 => {
            let value = ctx.pop_float()?;
            ctx.push_float(value.ln())?;
        }

        // exponent
        0x8265 => {
            let value = ctx.pop_float()?;
            ctx.push_float(value.exp())?;
        }

        // ceil
        0x8266 => {
            let value = ctx.pop_float()?;
            ctx.push_int(value.ceil() as i32)?;
        }

        // round (half away from zero)
        0x8267 => {
            let value = ctx.pop_float()?;
            ctx.push_int(value.round() as i32)?;
        }

        // div (unsigned for integers)
        0x827F => {
            let divisor = ctx.pop_value()?;
            let dividend = ctx.pop_value()?;
            debug!("div {} {}", dividend, divisor);

            if divisor.as_float()? == 0.0 {
                ctx.debug_print("Division by zero");
                ctx.push_int(0)?;
            } else if dividend.is_float() || divisor.is_float() {
                ctx.push_float(dividend.as_float()? / divisor.as_float()?)?;
            } else {
                let quotient = (dividend.as_int()? as u32) / (divisor.as_int()? as u32);
                ctx.push_int(quotient as i32)?;
            }
        }

        _ => return Ok(false),
    }

    Ok(true)
}
