mod common;

use loxc::{Chunk, Heap, Instruction, Location};

#[test]
fn test_self_reference_in_initializer() {
    let compiled = common::compile("{ var a = a; }");
    let err = compiled.result.unwrap_err();
    assert_eq!(err.diagnostics.len(), 1);
    assert_eq!(
        compiled.stderr,
        "[line 1] Error at 'a': Can't read local variable in its own initializer.\n"
    );
}

#[test]
fn test_broken_initializer_still_closes_scope() {
    let compiled = common::compile("{ var a = ; print 1; }");
    let err = compiled.result.unwrap_err();
    assert_eq!(err.diagnostics.len(), 1);
    assert_eq!(compiled.stderr, "[line 1] Error at ';': Expect expression.\n");
    assert_eq!(
        common::instructions(&compiled.chunk),
        vec![
            Instruction::OpConstant(0),
            Instruction::OpPrint,
            Instruction::OpPop,
            Instruction::OpReturn
        ]
    );
    assert_eq!(compiled.chunk.code().len(), compiled.chunk.lines().len());
}

#[test]
fn test_duplicate_local() {
    let compiled = common::compile("{ var a=1; var a=2; }");
    assert!(compiled.result.is_err());
    assert_eq!(
        compiled.stderr,
        "[line 1] Error at 'a': Already a variable with this name in this scope.\n"
    );

    let compiled = common::compile("var a=1; var a=2;");
    assert!(compiled.result.is_ok());
}

#[test]
fn test_too_many_constants() {
    let mut source = String::new();
    for i in 0..257 {
        source.push_str(&format!("print {};\n", i));
    }
    let compiled = common::compile(&source);
    let err = compiled.result.unwrap_err();
    assert_eq!(err.diagnostics.len(), 1);
    assert_eq!(
        compiled.stderr,
        "[line 257] Error at '256': Too many constants in one chunk.\n"
    );
    assert_eq!(compiled.chunk.constants().len(), 257);
    assert_eq!(compiled.chunk.code().len(), compiled.chunk.lines().len());
    assert_eq!(
        common::instructions(&compiled.chunk).last(),
        Some(&Instruction::OpReturn)
    );
}

#[test]
fn test_one_diagnostic_per_defect() {
    let source = "print 1 +;\nprint 2;\nvar x = 3;\nprint x;\n";
    let compiled = common::compile(source);
    let err = compiled.result.unwrap_err();
    assert_eq!(err.diagnostics.len(), 1);
    assert_eq!(compiled.stderr, "[line 1] Error at ';': Expect expression.\n");
}

#[test]
fn test_every_defect_reported() {
    let compiled = common::compile("print ;\nprint ;\nprint 1;\n");
    let err = compiled.result.unwrap_err();
    assert_eq!(
        compiled.stderr,
        "[line 1] Error at ';': Expect expression.\n\
         [line 2] Error at ';': Expect expression.\n"
    );
    assert_eq!(err.to_string(), compiled.stderr.trim_end());
}

#[test]
fn test_invalid_assignment_target() {
    let compiled = common::compile("var a; var b; a + b = 3;");
    assert!(compiled.result.is_err());
    assert_eq!(
        compiled.stderr,
        "[line 1] Error at '=': Invalid assignment target.\n"
    );
}

#[test]
fn test_error_at_end() {
    let compiled = common::compile("print 1");
    let err = compiled.result.unwrap_err();
    assert_eq!(err.diagnostics[0].location, Location::AtEnd);
    assert_eq!(
        compiled.stderr,
        "[line 1] Error at end: Expect ';' after value.\n"
    );

    let compiled = common::compile("{ var a = 1;\n");
    assert_eq!(
        compiled.stderr,
        "[line 2] Error at end: Expect '}' after block.\n"
    );
}

#[test]
fn test_lexical_errors() {
    let compiled = common::compile("print @;");
    let err = compiled.result.unwrap_err();
    assert_eq!(err.diagnostics[0].location, Location::Lexical);
    assert_eq!(compiled.stderr, "[line 1] Error: Unexpected character.\n");

    let compiled = common::compile("print \"never closed;");
    assert_eq!(compiled.stderr, "[line 1] Error: Unterminated string.\n");
}

#[test]
fn test_missing_variable_name() {
    let compiled = common::compile("var 1 = 2;\nprint 3;");
    assert_eq!(
        compiled.stderr,
        "[line 1] Error at '1': Expect variable name.\n"
    );
}

#[test]
fn test_failed_chunk_can_be_freed_twice() {
    let mut chunk = Chunk::new();
    let mut heap = Heap::new();
    let mut out = Vec::new();
    assert!(loxc::compile_with_output("print (1;", &mut chunk, &mut heap, &mut out).is_err());
    assert!(!chunk.is_empty());
    chunk.free();
    chunk.free();
    assert!(chunk.is_empty());
    assert!(chunk.constants().is_empty());

    out.clear();
    assert!(loxc::compile_with_output("print 1;", &mut chunk, &mut heap, &mut out).is_ok());
    assert!(out.is_empty());
}

#[test]
fn test_independent_compilations() {
    let handles: Vec<_> = (0..4)
        .map(|i| {
            std::thread::spawn(move || {
                let source = format!("{{ var a = {}; print a; }}", i);
                let compiled = common::compile(&source);
                assert!(compiled.result.is_ok());
                common::simulate(&compiled)
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), vec![i.to_string()]);
    }
}
