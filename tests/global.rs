mod common;

use loxc::Instruction;

#[test]
fn test_def() {
    let source = r#"
var boring_car;
var sports_car = "mcLaren F1";

print boring_car;
print sports_car;
"#;
    let compiled = common::compile(source);
    assert!(compiled.result.is_ok());
    assert_eq!(common::simulate(&compiled), vec!["nil", "mcLaren F1"]);
}

#[test]
fn test_get_set() {
    let source = r#"
var my_car;
var sports_car = "mcLaren F1";
my_car = sports_car;

print my_car;
print sports_car;
"#;
    let compiled = common::compile(source);
    assert!(compiled.result.is_ok());
    assert_eq!(
        common::simulate(&compiled),
        vec!["mcLaren F1", "mcLaren F1"]
    );
}

#[test]
fn test_redefinition_is_allowed() {
    let compiled = common::compile("var a = 1; var a = 2; print a;");
    assert!(compiled.result.is_ok());
    assert!(compiled.stderr.is_empty());
    assert_eq!(common::simulate(&compiled), vec!["2"]);
}

#[test]
fn test_name_constant_per_occurrence() {
    let compiled = common::compile("var a = 1; print a; a = 2;");
    assert!(compiled.result.is_ok());
    assert_eq!(
        common::instructions(&compiled.chunk),
        vec![
            Instruction::OpConstant(1),
            Instruction::OpDefineGlobal(0),
            Instruction::OpGetGlobal(2),
            Instruction::OpPrint,
            Instruction::OpConstant(4),
            Instruction::OpSetGlobal(3),
            Instruction::OpPop,
            Instruction::OpReturn,
        ]
    );
    let names: Vec<_> = [0u8, 2, 3]
        .iter()
        .map(|&ix| compiled.chunk.get_constant(ix).unwrap())
        .collect();
    for name in &names {
        assert_eq!(name.as_string(&compiled.heap).unwrap().as_str(), "a");
    }
    assert_ne!(names[0], names[1]);
    assert_ne!(names[1], names[2]);
}
