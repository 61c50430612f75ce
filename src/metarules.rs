//! Handlers of the operations reachable through the named-call opcodes
//!
//! Every handler pops its arguments rightmost first and pushes exactly one
//! result. Operations without a meaningful result push -1.

use crate::context::ScriptContext;
use crate::error::BridgeError;
use crate::registry;
use crate::safe_format::safe_format;
use crate::value::TaggedValue;
use log::debug;

/// Result pushed by operations that produce nothing
const VOID_RESULT: i32 = -1;

/// floor2(value)
pub fn mf_floor2(ctx: &mut dyn ScriptContext, _args: usize) -> Result<(), BridgeError> {
    let value = ctx.pop_value()?;
    ctx.push_int(value.as_float()?.floor() as i32)
}

/// get_ini_section(file, section): map of key -> value, empty when missing
pub fn mf_get_ini_section(ctx: &mut dyn ScriptContext, _args: usize) -> Result<(), BridgeError> {
    let section_name = ctx.pop_string()?;
    let file_name = ctx.pop_string()?;

    let array_id = ctx.create_temp_array(crate::arrays::MAP_LENGTH, 0);

    let pairs: Vec<(String, String)> = match ctx.ini().load_named(&file_name) {
        Ok(config) => config
            .section(&section_name)
            .map(|section| {
                section
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.to_string()))
                    .collect()
            })
            .unwrap_or_default(),
        Err(e) => {
            debug!("get_ini_section: {}", e);
            Vec::new()
        }
    };

    for (key, value) in pairs {
        let key = ctx.make_string(&key);
        let value = ctx.make_string(&value);
        ctx.set_array(array_id, key, value);
    }

    ctx.push_int(array_id)
}

/// get_ini_sections(file): list of section names, empty when missing
pub fn mf_get_ini_sections(ctx: &mut dyn ScriptContext, _args: usize) -> Result<(), BridgeError> {
    let file_name = ctx.pop_string()?;

    let names: Vec<String> = match ctx.ini().load_named(&file_name) {
        Ok(config) => config.section_names().map(str::to_string).collect(),
        Err(e) => {
            debug!("get_ini_sections: {}", e);
            Vec::new()
        }
    };

    let array_id = ctx.create_temp_array(names.len() as i32, 0);
    for (index, name) in names.iter().enumerate() {
        let name = ctx.make_string(name);
        ctx.set_array(array_id, TaggedValue::Int(index as i32), name);
    }

    ctx.push_int(array_id)
}

/// get_metarule_table(): list of every registered name
pub fn mf_get_metarule_table(ctx: &mut dyn ScriptContext, _args: usize) -> Result<(), BridgeError> {
    let names: Vec<&str> = registry::names().collect();

    let array_id = ctx.create_temp_array(names.len() as i32, 0);
    for (index, name) in names.into_iter().enumerate() {
        let name = ctx.make_string(name);
        ctx.set_array(array_id, TaggedValue::Int(index as i32), name);
    }

    ctx.push_int(array_id)
}

/// metarule_exist(name)
pub fn mf_metarule_exist(ctx: &mut dyn ScriptContext, _args: usize) -> Result<(), BridgeError> {
    let name = ctx.pop_string()?;
    ctx.push_int(registry::exists(&name) as i32)
}

/// set_ini_setting(triplet, value)
pub fn mf_set_ini_setting(ctx: &mut dyn ScriptContext, _args: usize) -> Result<(), BridgeError> {
    let value = ctx.pop_value()?;
    let triplet = ctx.pop_string()?;

    let result = match value {
        TaggedValue::String(handle) => {
            let text = ctx.get_string(handle)?.to_string();
            ctx.ini().set_string(&triplet, &text).map_err(|e| (text, e))
        }
        other => {
            let number = other.as_int()?;
            ctx.ini()
                .set_int(&triplet, number)
                .map_err(|e| (number.to_string(), e))
        }
    };

    if let Err((text, e)) = result {
        ctx.debug_print(&format!(
            "set_ini_setting: unable to write '{}' to '{}': {}",
            text, triplet, e
        ));
    }

    ctx.push_int(VOID_RESULT)
}

/// Case folding for one byte pair under a legacy single-byte code page.
/// Returns the folded bytes, or `None` when they can never match.
fn fold_code_page(mut c1: u8, mut c2: u8, code_page: i32) -> Option<(u8, u8)> {
    if code_page == 866 {
        // Cyrillic 'х' is written with the Latin letter in game fonts
        if c1 == 229 {
            c1 = b'x';
        }
        if c2 == 229 {
            c2 = b'x';
        }
    }

    c1 = c1.to_ascii_lowercase();
    c2 = c2.to_ascii_lowercase();
    if c1 == c2 {
        return Some((c1, c2));
    }
    if c1 < 128 || c2 < 128 {
        return None;
    }

    match code_page {
        866 => {
            // 149 is the bullet glyph, never folded
            if c1 != 149 && c2 != 149 {
                c1 = fold_cp866(c1);
                c2 = fold_cp866(c2);
            }
        }
        1251 => {
            c1 = fold_cp1251(c1);
            c2 = fold_cp1251(c2);
        }
        1250 | 1252 => {
            // multiplication and division signs sit inside the letter range
            if c1 != 0xD7 && c1 != 0xF7 && c2 != 0xD7 && c2 != 0xF7 {
                c1 = fold_latin_upper(c1);
                c2 = fold_latin_upper(c2);
            }
        }
        _ => {}
    }
    Some((c1, c2))
}

fn fold_cp866(c: u8) -> u8 {
    match c {
        128..=159 => c | 32,
        224..=239 => c - 48,
        240 => c + 1,
        _ => c,
    }
}

fn fold_cp1251(c: u8) -> u8 {
    match c {
        0xC0..=0xDF => c | 32,
        0xA8 => c + 16,
        _ => c,
    }
}

fn fold_latin_upper(c: u8) -> u8 {
    match c {
        0xC0..=0xDE => c | 32,
        _ => c,
    }
}

/// Case-insensitive equality with code page specific folding of bytes >= 128
pub fn code_page_equal(a: &str, b: &str, code_page: i32) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b).all(|(&c1, &c2)| {
        c1 == c2 || matches!(fold_code_page(c1, c2, code_page), Some((f1, f2)) if f1 == f2)
    })
}

/// string_compare(a, b[, code_page])
pub fn mf_string_compare(ctx: &mut dyn ScriptContext, args: usize) -> Result<(), BridgeError> {
    let code_page = if args == 3 { Some(ctx.pop_int()?) } else { None };
    let second = ctx.pop_string()?;
    let first = ctx.pop_string()?;

    let equal = match code_page {
        Some(code_page) => code_page_equal(&first, &second, code_page),
        None => first.eq_ignore_ascii_case(&second),
    };

    ctx.push_int(equal as i32)
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// string_find(haystack, needle[, start]): byte offset or -1
pub fn mf_string_find(ctx: &mut dyn ScriptContext, args: usize) -> Result<(), BridgeError> {
    let start = if args == 3 { ctx.pop_int()? } else { 0 };
    let needle = ctx.pop_string()?;
    let haystack = ctx.pop_string()?;

    let start = match usize::try_from(start) {
        Ok(start) if start < haystack.len() => start,
        _ => {
            ctx.debug_print(&format!("string_find: invalid start position {}", start));
            return ctx.push_int(-1);
        }
    };

    let found = find_bytes(&haystack.as_bytes()[start..], needle.as_bytes())
        .map_or(-1, |offset| (start + offset) as i32);
    ctx.push_int(found)
}

/// string_format(format, values...)
pub fn mf_string_format(ctx: &mut dyn ScriptContext, args: usize) -> Result<(), BridgeError> {
    let mut values = Vec::with_capacity(args.saturating_sub(1));
    for _ in 1..args {
        values.push(ctx.pop_value()?);
    }
    values.reverse();
    let format = ctx.pop_string()?;

    let text = safe_format(&*ctx, &format, &values, "string_format");
    ctx.push_string(&text)
}

/// string_to_case(text, 1 upper / 0 lower)
pub fn mf_string_to_case(ctx: &mut dyn ScriptContext, _args: usize) -> Result<(), BridgeError> {
    let case_type = ctx.pop_int()?;
    let text = ctx.pop_string()?;

    let converted = match case_type {
        1 => text.to_ascii_uppercase(),
        0 => text.to_ascii_lowercase(),
        _ => {
            ctx.debug_print(&format!("string_to_case: invalid case type {}", case_type));
            text
        }
    };

    ctx.push_string(&converted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_page_866() {
        assert_eq!(fold_cp866(0x80), 0xA0);
        assert_eq!(fold_cp866(0xE0), 0xB0);
        assert_eq!(fold_cp866(240), 241);
        assert_eq!(fold_code_page(229, b'X', 866), Some((b'x', b'x')));
        assert_eq!(fold_code_page(149, 181, 866), Some((149, 181)));
    }

    #[test]
    fn test_code_page_1251_and_1252() {
        assert_eq!(fold_code_page(0xC0, 0xE0, 1251), Some((0xE0, 0xE0)));
        assert_eq!(fold_code_page(0xA8, 0xB8, 1251), Some((0xB8, 0xB8)));
        assert_eq!(fold_code_page(0xC9, 0xE9, 1252), Some((0xE9, 0xE9)));
        // × and ÷ are not letters
        assert_eq!(fold_code_page(0xD7, 0xF7, 1252), Some((0xD7, 0xF7)));
        assert_eq!(fold_code_page(b'a', 0xE1, 1252), None);
    }

    #[test]
    fn test_code_page_equal_ascii() {
        assert!(code_page_equal("Vault", "VAULT", 1252));
        assert!(!code_page_equal("Vault", "Vaults", 1252));
        assert!(!code_page_equal("abc", "abd", 866));
    }

    #[test]
    fn test_find_bytes() {
        assert_eq!(find_bytes(b"hello", b"ll"), Some(2));
        assert_eq!(find_bytes(b"hello", b""), Some(0));
        assert_eq!(find_bytes(b"hello", b"xyz"), None);
        assert_eq!(find_bytes(b"hi", b"high"), None);
    }
}
