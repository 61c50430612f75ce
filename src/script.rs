//! Line-oriented command scripts for driving a [`Program`] from the runner
//!
//! ```text
//! ; comments start with a semicolon
//! push "Vault %d"          ; push a literal (integer, float or string)
//! push 13
//! op sprintf               ; execute an opcode by name or number
//! print                    ; pop the top value and print it
//! call string_to_case "abc" 1   ; named call with literal arguments
//! ```

use crate::context::ScriptContext;
use crate::error::BridgeError;
use crate::opcode_tables::get_opcode_by_name;
use crate::program::Program;
use crate::value::TaggedValue;
use log::{debug, info};
use std::io::Write;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i32),
    Float(f32),
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Push(Literal),
    Op(u16),
    Call(String, Vec<Literal>),
    Print,
}

/// A parsed command with the line it came from
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptLine {
    pub line: usize,
    pub command: Command,
}

fn script_error(line: usize, message: impl std::fmt::Display) -> BridgeError {
    BridgeError::ScriptError(format!("line {}: {}", line, message))
}

/// Split a line into tokens. Quoted tokens keep their quotes so literals
/// can tell strings from numbers.
fn tokenize(text: &str, line: usize) -> Result<Vec<String>, BridgeError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == ';' {
            break;
        }

        let mut token = String::new();
        if c == '"' {
            chars.next();
            token.push('"');
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' => match chars.next() {
                        Some('n') => token.push('\n'),
                        Some('t') => token.push('\t'),
                        Some(other) => token.push(other),
                        None => break,
                    },
                    other => token.push(other),
                }
            }
            if !closed {
                return Err(script_error(line, "unterminated string"));
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() || c == ';' {
                    break;
                }
                token.push(c);
                chars.next();
            }
        }
        tokens.push(token);
    }

    Ok(tokens)
}

fn parse_literal(token: &str, line: usize) -> Result<Literal, BridgeError> {
    if let Some(text) = token.strip_prefix('"') {
        return Ok(Literal::Str(text.to_string()));
    }
    if let Ok(value) = token.parse::<i32>() {
        return Ok(Literal::Int(value));
    }
    if let Some(hex) = token.strip_prefix("0x") {
        if let Ok(value) = u32::from_str_radix(hex, 16) {
            return Ok(Literal::Int(value as i32));
        }
    }
    token
        .parse::<f32>()
        .map(Literal::Float)
        .map_err(|_| script_error(line, format!("invalid literal '{}'", token)))
}

fn parse_opcode(token: &str, line: usize) -> Result<u16, BridgeError> {
    if let Some(hex) = token.strip_prefix("0x") {
        return u16::from_str_radix(hex, 16)
            .map_err(|_| script_error(line, format!("invalid opcode '{}'", token)));
    }
    get_opcode_by_name(token).ok_or_else(|| script_error(line, format!("unknown opcode '{}'", token)))
}

/// Parse a whole script
pub fn parse_script(text: &str) -> Result<Vec<ScriptLine>, BridgeError> {
    let mut commands = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let tokens = tokenize(raw, line)?;
        let Some((keyword, rest)) = tokens.split_first() else {
            continue;
        };

        let command = match (keyword.as_str(), rest) {
            ("push", [value]) => Command::Push(parse_literal(value, line)?),
            ("op", [opcode]) => Command::Op(parse_opcode(opcode, line)?),
            ("call", [name, args @ ..]) => {
                let args = args
                    .iter()
                    .map(|arg| parse_literal(arg, line))
                    .collect::<Result<Vec<_>, _>>()?;
                Command::Call(name.trim_start_matches('"').to_string(), args)
            }
            ("print", []) => Command::Print,
            _ => return Err(script_error(line, format!("cannot parse '{}'", raw.trim()))),
        };
        commands.push(ScriptLine { line, command });
    }

    Ok(commands)
}

fn literal_value(program: &mut Program, literal: &Literal) -> TaggedValue {
    match literal {
        Literal::Int(v) => TaggedValue::Int(*v),
        Literal::Float(v) => TaggedValue::Float(*v),
        Literal::Str(text) => program.make_string(text),
    }
}

/// Run parsed commands, writing `print` output to `out`.
/// Stops at the first error; a fatal one leaves the program halted.
pub fn run_script<W: Write>(
    program: &mut Program,
    commands: &[ScriptLine],
    out: &mut W,
) -> Result<(), BridgeError> {
    for ScriptLine { line, command } in commands {
        debug!("line {}: {:?}", line, command);
        match command {
            Command::Push(literal) => {
                let value = literal_value(program, literal);
                program.push_value(value)?;
            }
            Command::Op(opcode) => program.execute(*opcode)?,
            Command::Call(name, args) => {
                let values: Vec<TaggedValue> = args
                    .iter()
                    .map(|arg| literal_value(program, arg))
                    .collect();
                program.call_metarule(name, &values)?;
            }
            Command::Print => {
                let value = program.pop_value()?;
                writeln!(out, "{}", program.display_value(value))?;
            }
        }
    }

    info!("script finished, stack depth {}", program.depth());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ini::IniAccessor;
    use test_log::test;

    #[test]
    fn test_tokenize_quotes_and_comments() {
        let tokens = tokenize(r#"call string_format "a \"b\"; c" 5 ; trailing"#, 1).unwrap();
        assert_eq!(tokens, vec!["call", "string_format", "\"a \"b\"; c", "5"]);
        assert!(tokenize("push \"open", 3).is_err());
    }

    #[test]
    fn test_parse_commands() {
        let script = parse_script("push 1\npush 2.5\n\n; note\nop 0x8250\nop typeof\nprint\n").unwrap();
        assert_eq!(script.len(), 5);
        assert_eq!(script[0].command, Command::Push(Literal::Int(1)));
        assert_eq!(script[1].command, Command::Push(Literal::Float(2.5)));
        assert_eq!(script[2].command, Command::Op(0x8250));
        assert_eq!(script[3].command, Command::Op(0x8253));
        assert_eq!(script[4].line, 7);
    }

    #[test]
    fn test_parse_errors_name_the_line() {
        let err = parse_script("push 1\nfrobnicate\n").unwrap_err();
        assert!(err.to_string().starts_with("line 2:"));
        assert!(parse_script("op not_an_opcode").is_err());
        assert!(parse_script("push abc").is_err());
    }

    #[test]
    fn test_run_script_prints_results() {
        let script = parse_script(
            "push \"%d-%s\"\npush 42\nop sprintf\nprint\ncall string_to_case \"abc\" 1\nprint\n",
        )
        .unwrap();
        let mut program = Program::new(IniAccessor::new(None));
        let mut out = Vec::new();
        run_script(&mut program, &script, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "42-42\nABC\n");
        assert_eq!(program.depth(), 0);
    }
}
