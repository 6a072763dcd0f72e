use crate::chunk::{Chunk, Instruction, InstructionIter};
use crate::memory::Heap;
use std::fmt::Write;

/// Renders one line per instruction of a chunk.
pub struct Disassembler<'a> {
    chunk: &'a Chunk,
    heap: &'a Heap,
    iter: InstructionIter<'a>,
}

impl<'a> Disassembler<'a> {
    pub fn new(chunk: &'a Chunk, heap: &'a Heap) -> Self {
        Disassembler {
            chunk,
            heap,
            iter: chunk.iter(),
        }
    }

    fn line_column(&self, offset: usize) -> String {
        let line = self.chunk.get_line(offset);
        if offset > 0 && line == self.chunk.get_line(offset - 1) {
            format!("{:>4} ", "|")
        } else {
            match line {
                Some(line) => format!("{:>4} ", line),
                None => format!("{:>4} ", "?"),
            }
        }
    }

    fn constant(&self, const_index: u8) -> String {
        match self.chunk.get_constant(const_index) {
            Some(val) => format!("'{}'", val.display(self.heap)),
            None => "<out-of-bound>".to_string(),
        }
    }

    fn render(&self, offset: usize, instr: Instruction) -> String {
        let mut result = format!("{:04} {}", offset, self.line_column(offset));
        let op = match instr.op_code() {
            Some(op) => op,
            None => {
                if let Instruction::OpInvalid(byte) = instr {
                    let _ = write!(result, "Unknown opcode {}", byte);
                }
                return result;
            }
        };
        match instr {
            Instruction::OpConstant(ix)
            | Instruction::OpGetGlobal(ix)
            | Instruction::OpDefineGlobal(ix)
            | Instruction::OpSetGlobal(ix) => {
                let _ = write!(result, "{:<16} {:>4} {}", op.name(), ix, self.constant(ix));
            }
            Instruction::OpGetLocal(slot) | Instruction::OpSetLocal(slot) => {
                let _ = write!(result, "{:<16} {:>4}", op.name(), slot);
            }
            _ => result.push_str(op.name()),
        }
        result
    }
}

impl Iterator for Disassembler<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let (offset, instr) = self.iter.next()?;
        Some(self.render(offset, instr))
    }
}

pub fn disassemble_instruction(chunk: &Chunk, heap: &Heap, offset: usize) -> Option<String> {
    let (_, instr) = chunk.read_instruction(offset)?;
    Some(Disassembler::new(chunk, heap).render(offset, instr))
}

pub fn disassemble_chunk(chunk: &Chunk, heap: &Heap, name: &str) -> String {
    let mut out = format!("== {} ==\n", name);
    for instr_str in Disassembler::new(chunk, heap) {
        out.push_str(&instr_str);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn renders_operands_and_lines() {
        let mut heap = Heap::new();
        let mut chunk = Chunk::new();
        let num = chunk.add_constant(Value::Number(1.5)) as u8;
        let name = chunk.add_constant(Value::Obj(heap.copy_string("x"))) as u8;
        chunk.push_instruction(Instruction::OpConstant(num), 1);
        chunk.push_instruction(Instruction::OpDefineGlobal(name), 1);
        chunk.push_instruction(Instruction::OpGetLocal(3), 2);
        chunk.push_instruction(Instruction::OpReturn, 2);
        chunk.write(99, 2);

        assert_eq!(
            disassemble_chunk(&chunk, &heap, "test"),
            "== test ==\n\
             0000    1 OP_CONSTANT         0 '1.5'\n\
             0002    | OP_DEFINE_GLOBAL    1 'x'\n\
             0004    2 OP_GET_LOCAL        3\n\
             0006    | OP_RETURN\n\
             0007    | Unknown opcode 99\n"
        );
        assert_eq!(
            disassemble_instruction(&chunk, &heap, 4).as_deref(),
            Some("0004    2 OP_GET_LOCAL        3")
        );
        assert_eq!(disassemble_instruction(&chunk, &heap, 8), None);
    }
}
