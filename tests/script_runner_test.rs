//! End-to-end tests of the command script runner used by the binary

use sfall_bridge::ini::IniAccessor;
use sfall_bridge::script::{parse_script, run_script};
use sfall_bridge::settings::BridgeSettings;
use sfall_bridge::{BridgeError, Program};
use std::fs;
use test_log::test;

fn run(program: &mut Program, text: &str) -> (Result<(), BridgeError>, String) {
    let commands = parse_script(text).unwrap();
    let mut out = Vec::new();
    let result = run_script(program, &commands, &mut out);
    (result, String::from_utf8(out).unwrap())
}

#[test]
fn test_script_with_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("mods.ini"), "[Main]\nLevel=7\n").unwrap();
    let settings = BridgeSettings::from_toml(&format!(
        "ini_base_path = {:?}\nstack_size = 64\n",
        dir.path().to_str().unwrap()
    ))
    .unwrap();

    let mut program = Program::from_settings(&settings);
    let (result, output) = run(
        &mut program,
        r#"
        ; read a setting and format it
        push "Level %d"
        push "mods.ini|Main|Level"
        op get_ini_setting
        op sprintf
        print
        call string_find "abcabc" "c" 3
        print
        push 2
        push 0.5
        op ^
        print
        "#,
    );

    result.unwrap();
    assert_eq!(output, "Level 7\n5\n1.41421\n");
}

#[test]
fn test_script_stops_at_fatal_error() {
    let mut program = Program::new(IniAccessor::new(None));
    let (result, output) = run(
        &mut program,
        "push 1\nprint\ncall no_such_call 1\npush 2\nprint\n",
    );

    assert_eq!(
        result,
        Err(BridgeError::UnknownOperation("no_such_call".to_string()))
    );
    assert_eq!(output, "1\n");
    assert!(program.is_halted());
}

#[test]
fn test_stack_size_from_settings_is_enforced() {
    let settings = BridgeSettings::from_toml("stack_size = 2\n").unwrap();
    let mut program = Program::from_settings(&settings);
    let (result, _) = run(&mut program, "push 1\npush 2\npush 3\n");
    assert_eq!(result, Err(BridgeError::StackOverflow(2)));
}
