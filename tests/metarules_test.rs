//! Integration tests for the operations reachable by name
//!
//! Every call goes through `Program::call_metarule`, which pushes the name
//! and arguments and issues the named-call opcode for the argument count,
//! the same path a compiled script takes.

use sfall_bridge::context::ScriptContext;
use sfall_bridge::ini::IniAccessor;
use sfall_bridge::{BridgeError, Program, TaggedValue};
use std::fs;
use test_log::test;

fn program() -> Program {
    Program::new(IniAccessor::new(None))
}

/// Call `name`, check that exactly one value came back and return it
fn call(p: &mut Program, name: &str, args: &[TaggedValue]) -> TaggedValue {
    let before = p.depth();
    p.call_metarule(name, args)
        .unwrap_or_else(|e| panic!("{} failed: {}", name, e));
    assert_eq!(p.depth(), before + 1, "{} must push one result", name);
    p.pop_value().unwrap()
}

fn text(p: &Program, value: TaggedValue) -> String {
    match value {
        TaggedValue::String(handle) => p.get_string(handle).unwrap().to_string(),
        other => panic!("expected a string, got {:?}", other),
    }
}

/// Strings of a list array, in index order
fn list_strings(p: &Program, id: i32) -> Vec<String> {
    (0..p.len_array(id))
        .map(|i| text(p, p.get_array(id, TaggedValue::Int(i))))
        .collect()
}

#[test]
fn test_string_compare() {
    let mut p = program();
    let a = p.make_string("Vault");
    let b = p.make_string("vAULT");
    let c = p.make_string("Vaults");

    assert_eq!(call(&mut p, "string_compare", &[a, b]), TaggedValue::Int(1));
    assert_eq!(call(&mut p, "string_compare", &[a, c]), TaggedValue::Int(0));
    assert_eq!(
        call(&mut p, "string_compare", &[a, b, TaggedValue::Int(1251)]),
        TaggedValue::Int(1)
    );
}

#[test]
fn test_string_find() {
    let mut p = program();
    let hay = p.make_string("hello world");
    let o = p.make_string("o");
    let z = p.make_string("z");

    assert_eq!(call(&mut p, "string_find", &[hay, o]), TaggedValue::Int(4));
    assert_eq!(
        call(&mut p, "string_find", &[hay, o, TaggedValue::Int(5)]),
        TaggedValue::Int(7)
    );
    assert_eq!(call(&mut p, "string_find", &[hay, z]), TaggedValue::Int(-1));
}

#[test]
fn test_string_find_bad_start_is_reported() {
    let mut p = program();
    let hay = p.make_string("abc");
    let a = p.make_string("a");

    assert_eq!(
        call(&mut p, "string_find", &[hay, a, TaggedValue::Int(3)]),
        TaggedValue::Int(-1)
    );
    assert_eq!(
        call(&mut p, "string_find", &[hay, a, TaggedValue::Int(-1)]),
        TaggedValue::Int(-1)
    );
    assert_eq!(p.debug_output().len(), 2);
    assert!(!p.is_halted());
}

#[test]
fn test_string_format() {
    let mut p = program();
    let fmt = p.make_string("%s has %d HP (%.1f%%)");
    let name = p.make_string("Marcus");
    let result = call(
        &mut p,
        "string_format",
        &[fmt, name, TaggedValue::Int(120), TaggedValue::Float(87.5)],
    );
    assert_eq!(text(&p, result), "Marcus has 120 HP (87.5%)");
}

#[test]
fn test_string_format_with_all_seven_values() {
    let mut p = program();
    let fmt = p.make_string("%d%d%d%d%d%d%d");
    let mut args = vec![fmt];
    args.extend((1..=7).map(TaggedValue::Int));
    let result = call(&mut p, "string_format", &args);
    assert_eq!(text(&p, result), "1234567");
}

#[test]
fn test_string_to_case() {
    let mut p = program();
    let word = p.make_string("Sulik");
    let upper = call(&mut p, "string_to_case", &[word, TaggedValue::Int(1)]);
    assert_eq!(text(&p, upper), "SULIK");
    let lower = call(&mut p, "string_to_case", &[word, TaggedValue::Int(0)]);
    assert_eq!(text(&p, lower), "sulik");
}

#[test]
fn test_floor2() {
    let mut p = program();
    assert_eq!(
        call(&mut p, "floor2", &[TaggedValue::Float(-1.5)]),
        TaggedValue::Int(-2)
    );
    assert_eq!(call(&mut p, "floor2", &[TaggedValue::Int(4)]), TaggedValue::Int(4));
}

#[test]
fn test_metarule_exist() {
    let mut p = program();
    let known = p.make_string("string_find");
    let unknown = p.make_string("string_find2");
    let wrong_case = p.make_string("STRING_FIND");

    assert_eq!(call(&mut p, "metarule_exist", &[known]), TaggedValue::Int(1));
    assert_eq!(call(&mut p, "metarule_exist", &[unknown]), TaggedValue::Int(0));
    assert_eq!(call(&mut p, "metarule_exist", &[wrong_case]), TaggedValue::Int(0));
}

#[test]
fn test_get_metarule_table_lists_every_name() {
    let mut p = program();
    let id = call(&mut p, "get_metarule_table", &[]).as_int().unwrap();
    let names = list_strings(&p, id);

    let expected: Vec<String> = sfall_bridge::registry::names().map(str::to_string).collect();
    assert_eq!(names, expected);
    assert!(names.iter().any(|n| n == "get_metarule_table"));
}

#[test]
fn test_get_ini_sections_and_section() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("party.ini"),
        "[Sulik]\nLevel=4\nWeapon=Club\n\n[Vic]\nLevel=3\n",
    )
    .unwrap();

    let mut p = Program::new(IniAccessor::new(dir.path().to_str()));
    let file = p.make_string("party.ini");

    let sections = call(&mut p, "get_ini_sections", &[file]).as_int().unwrap();
    assert_eq!(list_strings(&p, sections), ["Sulik", "Vic"]);

    let sulik = p.make_string("Sulik");
    let map = call(&mut p, "get_ini_section", &[file, sulik]).as_int().unwrap();
    assert_eq!(p.len_array(map), 2);

    let first_key = p.array_key(map, 0);
    assert_eq!(text(&p, first_key), "Level");
    let weapon = p.make_string("Weapon");
    assert_eq!(text(&p, p.get_array(map, weapon)), "Club");
}

#[test]
fn test_missing_ini_file_gives_empty_arrays() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = Program::new(IniAccessor::new(dir.path().to_str()));
    let file = p.make_string("nothing_here.ini");
    let section = p.make_string("Main");

    let sections = call(&mut p, "get_ini_sections", &[file]).as_int().unwrap();
    assert_eq!(p.len_array(sections), 0);

    let map = call(&mut p, "get_ini_section", &[file, section]).as_int().unwrap();
    assert_eq!(p.len_array(map), 0);
    assert!(!p.is_halted());
}

#[test]
fn test_set_ini_setting_writes_string_and_int() {
    let dir = tempfile::tempdir().unwrap();
    // A file missing everywhere is created in the working directory, so
    // start from an empty one under the base path
    fs::write(dir.path().join("save.ini"), "").unwrap();
    let mut p = Program::new(IniAccessor::new(dir.path().to_str()));

    let name_key = p.make_string("save.ini|Player|Name");
    let name = p.make_string("Chosen One");
    assert_eq!(call(&mut p, "set_ini_setting", &[name_key, name]), TaggedValue::Int(-1));

    let level_key = p.make_string("save.ini|Player|Level");
    assert_eq!(
        call(&mut p, "set_ini_setting", &[level_key, TaggedValue::Int(12)]),
        TaggedValue::Int(-1)
    );

    let written = fs::read_to_string(dir.path().join("save.ini")).unwrap();
    assert!(written.contains("[Player]"));
    assert!(written.contains("Name=Chosen One"));
    assert!(written.contains("Level=12"));
    assert!(p.debug_output().is_empty());
}

#[test]
fn test_set_ini_setting_failure_is_not_fatal() {
    let mut p = program();
    let bad = p.make_string("missing separators");
    assert_eq!(
        call(&mut p, "set_ini_setting", &[bad, TaggedValue::Int(1)]),
        TaggedValue::Int(-1)
    );
    assert_eq!(p.debug_output().len(), 1);
    assert!(!p.is_halted());
}

#[test]
fn test_wrong_argument_kind_halts() {
    let mut p = program();
    assert!(matches!(
        p.call_metarule("string_to_case", &[TaggedValue::Int(5), TaggedValue::Int(1)]),
        Err(BridgeError::TypeMismatch(_, _))
    ));
    assert!(p.is_halted());
}
