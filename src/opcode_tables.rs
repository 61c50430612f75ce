/// First of the seven contiguous named-call opcodes (0 to 6 arguments)
const SFALL_FUNC0: u16 = 0x8276;
const SFALL_FUNC6: u16 = 0x827C;
/// The 7 and 8 argument named calls were added later at separate numbers
const SFALL_FUNC7: u16 = 0x8280;
const SFALL_FUNC8: u16 = 0x8281;

/// Get the name of an extension opcode
pub fn get_opcode_name(opcode: u16) -> &'static str {
    match opcode {
        0x81AC => "get_ini_setting",
        0x81EB => "get_ini_string",
        0x81EC => "sqrt",
        0x81ED => "abs",
        0x81EE => "sin",
        0x81EF => "cos",
        0x81F0 => "tan",
        0x81F1 => "arctan",
        0x8210 => "sfall_ver_major",
        0x8211 => "sfall_ver_minor",
        0x8212 => "sfall_ver_build",
        0x822E => "set_array",
        0x822F => "get_array",
        0x8231 => "len_array",
        0x8233 => "temp_array",
        0x8237 => "atoi",
        0x8238 => "atof",
        0x824E => "substr",
        0x824F => "strlen",
        0x8250 => "sprintf",
        0x8251 => "charcode",
        0x8253 => "typeof",
        0x8256 => "get_array_key",
        0x8263 => "^",
        0x8264 => "log",
        0x8265 => "exponent",
        0x8266 => "ceil",
        0x8267 => "round",
        0x8276 => "sfall_func0",
        0x8277 => "sfall_func1",
        0x8278 => "sfall_func2",
        0x8279 => "sfall_func3",
        0x827A => "sfall_func4",
        0x827B => "sfall_func5",
        0x827C => "sfall_func6",
        0x827F => "div",
        0x8280 => "sfall_func7",
        0x8281 => "sfall_func8",
        _ => "unknown",
    }
}

/// Look up an opcode by name, for the runner
pub fn get_opcode_by_name(name: &str) -> Option<u16> {
    (0x8100..=0x82FF).find(|&opcode| {
        let known = get_opcode_name(opcode);
        known != "unknown" && known == name
    })
}

/// Argument count carried by a named-call opcode
pub fn sfall_func_arg_count(opcode: u16) -> Option<usize> {
    match opcode {
        SFALL_FUNC0..=SFALL_FUNC6 => Some((opcode - SFALL_FUNC0) as usize),
        SFALL_FUNC7 => Some(7),
        SFALL_FUNC8 => Some(8),
        _ => None,
    }
}

/// Named-call opcode for a given argument count
pub fn sfall_func_opcode(args: usize) -> Option<u16> {
    match args {
        0..=6 => Some(SFALL_FUNC0 + args as u16),
        7 => Some(SFALL_FUNC7),
        8 => Some(SFALL_FUNC8),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_call_arg_counts() {
        assert_eq!(sfall_func_arg_count(0x8276), Some(0));
        assert_eq!(sfall_func_arg_count(0x827C), Some(6));
        assert_eq!(sfall_func_arg_count(0x827D), None);
        assert_eq!(sfall_func_arg_count(0x8280), Some(7));
        assert_eq!(sfall_func_arg_count(0x8281), Some(8));
        for args in 0..=8 {
            let opcode = sfall_func_opcode(args).unwrap();
            assert_eq!(sfall_func_arg_count(opcode), Some(args));
        }
        assert_eq!(sfall_func_opcode(9), None);
    }

    #[test]
    fn test_names_round_trip() {
        assert_eq!(get_opcode_by_name("sprintf"), Some(0x8250));
        assert_eq!(get_opcode_by_name("sfall_func8"), Some(0x8281));
        assert_eq!(get_opcode_by_name("no_such_op"), None);
        assert_eq!(get_opcode_name(0x8000), "unknown");
    }
}
