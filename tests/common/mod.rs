#![allow(dead_code)]

use loxc::{Chunk, CompileError, Heap, Instruction, Value};
use std::collections::HashMap;

pub struct Compiled {
    pub result: Result<(), CompileError>,
    pub chunk: Chunk,
    pub heap: Heap,
    pub stderr: String,
}

pub fn compile(source: &str) -> Compiled {
    let mut chunk = Chunk::new();
    let mut heap = Heap::new();
    let mut out = Vec::new();
    let result = loxc::compile_with_output(source, &mut chunk, &mut heap, &mut out);
    Compiled {
        result,
        chunk,
        heap,
        stderr: String::from_utf8(out).unwrap(),
    }
}

pub fn instructions(chunk: &Chunk) -> Vec<Instruction> {
    chunk.iter().map(|(_, instr)| instr).collect()
}

fn number(value: Value) -> f64 {
    value.as_number().expect("number operand")
}

/// Replays the chunk on a plain value stack and returns what `print` wrote.
pub fn simulate(compiled: &Compiled) -> Vec<String> {
    let Compiled { chunk, heap, .. } = compiled;
    let mut stack: Vec<Value> = Vec::new();
    let mut globals: HashMap<String, Value> = HashMap::new();
    let mut printed = Vec::new();
    let global_name = |ix: u8| {
        let name = chunk.get_constant(ix).expect("name constant");
        name.as_string(heap).expect("string name").as_str().to_string()
    };

    for (_, instr) in chunk.iter() {
        match instr {
            Instruction::OpConstant(ix) => stack.push(chunk.get_constant(ix).unwrap()),
            Instruction::OpNil => stack.push(Value::Nil),
            Instruction::OpTrue => stack.push(Value::Bool(true)),
            Instruction::OpFalse => stack.push(Value::Bool(false)),
            Instruction::OpPop => {
                stack.pop().unwrap();
            }
            Instruction::OpGetLocal(slot) => stack.push(stack[slot as usize]),
            Instruction::OpSetLocal(slot) => stack[slot as usize] = *stack.last().unwrap(),
            Instruction::OpGetGlobal(ix) => stack.push(globals[&global_name(ix)]),
            Instruction::OpDefineGlobal(ix) => {
                let value = stack.pop().unwrap();
                globals.insert(global_name(ix), value);
            }
            Instruction::OpSetGlobal(ix) => {
                let value = *stack.last().unwrap();
                *globals.get_mut(&global_name(ix)).expect("defined global") = value;
            }
            Instruction::OpEqual => {
                let (b, a) = (stack.pop().unwrap(), stack.pop().unwrap());
                stack.push(Value::Bool(a.equals(&b, heap)));
            }
            Instruction::OpGreater
            | Instruction::OpLess
            | Instruction::OpAdd
            | Instruction::OpSubtract
            | Instruction::OpMultiply
            | Instruction::OpDivide => {
                let b = number(stack.pop().unwrap());
                let a = number(stack.pop().unwrap());
                stack.push(match instr {
                    Instruction::OpGreater => Value::Bool(a > b),
                    Instruction::OpLess => Value::Bool(a < b),
                    Instruction::OpAdd => Value::Number(a + b),
                    Instruction::OpSubtract => Value::Number(a - b),
                    Instruction::OpMultiply => Value::Number(a * b),
                    _ => Value::Number(a / b),
                });
            }
            Instruction::OpNot => {
                let value = stack.pop().unwrap();
                stack.push(Value::Bool(value.is_falsey()));
            }
            Instruction::OpNegate => {
                let value = number(stack.pop().unwrap());
                stack.push(Value::Number(-value));
            }
            Instruction::OpPrint => {
                let value = stack.pop().unwrap();
                printed.push(value.display(heap).to_string());
            }
            Instruction::OpReturn => break,
            Instruction::OpInvalid(byte) => panic!("invalid opcode {}", byte),
        }
    }
    printed
}
