use crate::context::ScriptContext;
use crate::error::BridgeError;
use crate::registry::{self, MAX_METARULE_ARGS};
use log::debug;

/// Call a named operation with `args` arguments.
///
/// The stack holds the name followed by the arguments in call order. The
/// name is taken out from under the arguments, the entry is resolved and
/// its arity checked, and then the handler runs against the arguments
/// alone. Every error returned here is fatal to the calling script.
pub fn sfall_metarule(ctx: &mut dyn ScriptContext, args: usize) -> Result<(), BridgeError> {
    let mut values = Vec::with_capacity(args);
    for _ in 0..args {
        values.push(ctx.pop_value()?);
    }

    let name = ctx.pop_string()?;

    // Restore call order: last popped is the leftmost argument
    for value in values.into_iter().rev() {
        ctx.push_value(value)?;
    }

    let entry =
        registry::lookup(&name).ok_or_else(|| BridgeError::UnknownOperation(name.clone()))?;

    if args > MAX_METARULE_ARGS || !entry.accepts(args) {
        return Err(BridgeError::ArityMismatch {
            name,
            args,
            min: entry.min_args,
            max: entry.max_args,
        });
    }

    debug!("sfall_func{} {}", args, name);

    let before = ctx.depth();
    (entry.handler)(ctx, args)?;

    // `before` includes the arguments the handler was given
    let expected = before - args + 1;
    let found = ctx.depth();
    if found != expected {
        return Err(BridgeError::StackImbalance {
            name,
            expected,
            found,
        });
    }

    Ok(())
}
