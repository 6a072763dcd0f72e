use crate::error::AllocError;
use crate::memory::{grow_capacity, out_of_memory, reallocate};
use crate::value::{Value, ValueArray};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    Constant,
    Nil,
    True,
    False,
    Pop,
    GetLocal,
    SetLocal,
    GetGlobal,
    DefineGlobal,
    SetGlobal,
    Equal,
    Greater,
    Less,
    Add,
    Subtract,
    Multiply,
    Divide,
    Not,
    Negate,
    Print,
    Return,
}

impl OpCode {
    const ALL: [OpCode; 21] = [
        OpCode::Constant,
        OpCode::Nil,
        OpCode::True,
        OpCode::False,
        OpCode::Pop,
        OpCode::GetLocal,
        OpCode::SetLocal,
        OpCode::GetGlobal,
        OpCode::DefineGlobal,
        OpCode::SetGlobal,
        OpCode::Equal,
        OpCode::Greater,
        OpCode::Less,
        OpCode::Add,
        OpCode::Subtract,
        OpCode::Multiply,
        OpCode::Divide,
        OpCode::Not,
        OpCode::Negate,
        OpCode::Print,
        OpCode::Return,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OpCode::Constant => "OP_CONSTANT",
            OpCode::Nil => "OP_NIL",
            OpCode::True => "OP_TRUE",
            OpCode::False => "OP_FALSE",
            OpCode::Pop => "OP_POP",
            OpCode::GetLocal => "OP_GET_LOCAL",
            OpCode::SetLocal => "OP_SET_LOCAL",
            OpCode::GetGlobal => "OP_GET_GLOBAL",
            OpCode::DefineGlobal => "OP_DEFINE_GLOBAL",
            OpCode::SetGlobal => "OP_SET_GLOBAL",
            OpCode::Equal => "OP_EQUAL",
            OpCode::Greater => "OP_GREATER",
            OpCode::Less => "OP_LESS",
            OpCode::Add => "OP_ADD",
            OpCode::Subtract => "OP_SUBTRACT",
            OpCode::Multiply => "OP_MULTIPLY",
            OpCode::Divide => "OP_DIVIDE",
            OpCode::Not => "OP_NOT",
            OpCode::Negate => "OP_NEGATE",
            OpCode::Print => "OP_PRINT",
            OpCode::Return => "OP_RETURN",
        }
    }
}

impl TryFrom<u8> for OpCode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, u8> {
        OpCode::ALL.get(byte as usize).copied().ok_or(byte)
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> u8 {
        op as u8
    }
}

/// A decoded opcode together with its operand, if any.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    OpConstant(u8),
    OpNil,
    OpTrue,
    OpFalse,
    OpPop,
    OpGetLocal(u8),
    OpSetLocal(u8),
    OpGetGlobal(u8),
    OpDefineGlobal(u8),
    OpSetGlobal(u8),
    OpEqual,
    OpGreater,
    OpLess,
    OpAdd,
    OpSubtract,
    OpMultiply,
    OpDivide,
    OpNot,
    OpNegate,
    OpPrint,
    OpReturn,
    OpInvalid(u8),
}

impl Instruction {
    /// Pairs `op` with `operand`; the operand is ignored for ops without one.
    pub fn new(op: OpCode, operand: u8) -> Self {
        match op {
            OpCode::Constant => Instruction::OpConstant(operand),
            OpCode::Nil => Instruction::OpNil,
            OpCode::True => Instruction::OpTrue,
            OpCode::False => Instruction::OpFalse,
            OpCode::Pop => Instruction::OpPop,
            OpCode::GetLocal => Instruction::OpGetLocal(operand),
            OpCode::SetLocal => Instruction::OpSetLocal(operand),
            OpCode::GetGlobal => Instruction::OpGetGlobal(operand),
            OpCode::DefineGlobal => Instruction::OpDefineGlobal(operand),
            OpCode::SetGlobal => Instruction::OpSetGlobal(operand),
            OpCode::Equal => Instruction::OpEqual,
            OpCode::Greater => Instruction::OpGreater,
            OpCode::Less => Instruction::OpLess,
            OpCode::Add => Instruction::OpAdd,
            OpCode::Subtract => Instruction::OpSubtract,
            OpCode::Multiply => Instruction::OpMultiply,
            OpCode::Divide => Instruction::OpDivide,
            OpCode::Not => Instruction::OpNot,
            OpCode::Negate => Instruction::OpNegate,
            OpCode::Print => Instruction::OpPrint,
            OpCode::Return => Instruction::OpReturn,
        }
    }

    /// `None` for bytes that are not a known opcode.
    pub fn op_code(&self) -> Option<OpCode> {
        let op = match self {
            Instruction::OpConstant(_) => OpCode::Constant,
            Instruction::OpNil => OpCode::Nil,
            Instruction::OpTrue => OpCode::True,
            Instruction::OpFalse => OpCode::False,
            Instruction::OpPop => OpCode::Pop,
            Instruction::OpGetLocal(_) => OpCode::GetLocal,
            Instruction::OpSetLocal(_) => OpCode::SetLocal,
            Instruction::OpGetGlobal(_) => OpCode::GetGlobal,
            Instruction::OpDefineGlobal(_) => OpCode::DefineGlobal,
            Instruction::OpSetGlobal(_) => OpCode::SetGlobal,
            Instruction::OpEqual => OpCode::Equal,
            Instruction::OpGreater => OpCode::Greater,
            Instruction::OpLess => OpCode::Less,
            Instruction::OpAdd => OpCode::Add,
            Instruction::OpSubtract => OpCode::Subtract,
            Instruction::OpMultiply => OpCode::Multiply,
            Instruction::OpDivide => OpCode::Divide,
            Instruction::OpNot => OpCode::Not,
            Instruction::OpNegate => OpCode::Negate,
            Instruction::OpPrint => OpCode::Print,
            Instruction::OpReturn => OpCode::Return,
            Instruction::OpInvalid(_) => return None,
        };
        Some(op)
    }

    pub fn operand(&self) -> Option<u8> {
        match *self {
            Instruction::OpConstant(operand)
            | Instruction::OpGetLocal(operand)
            | Instruction::OpSetLocal(operand)
            | Instruction::OpGetGlobal(operand)
            | Instruction::OpDefineGlobal(operand)
            | Instruction::OpSetGlobal(operand) => Some(operand),
            _ => None,
        }
    }
}

// `bytes` and `lines` only ever grow together, through `try_write`.
#[derive(Debug, Clone)]
struct Code {
    bytes: Vec<u8>,
    lines: Vec<u32>,
    capacity: usize,
    ceiling: usize,
}

impl Code {
    fn new(ceiling: usize) -> Self {
        Code {
            bytes: Vec::new(),
            lines: Vec::new(),
            capacity: 0,
            ceiling,
        }
    }

    fn try_write(&mut self, byte: u8, line: u32) -> Result<(), AllocError> {
        if self.capacity < self.bytes.len() + 1 {
            let new_capacity = grow_capacity(self.capacity);
            reallocate(&mut self.bytes, new_capacity, self.ceiling)?;
            reallocate(&mut self.lines, new_capacity, self.ceiling)?;
            self.capacity = new_capacity;
        }
        self.bytes.push(byte);
        self.lines.push(line);
        Ok(())
    }

    fn free(&mut self) {
        self.bytes = Vec::new();
        self.lines = Vec::new();
        self.capacity = 0;
    }
}

/// Bytecode, the source line of every byte, and the constant pool.
#[derive(Debug, Clone)]
pub struct Chunk {
    code: Code,
    constants: ValueArray,
}

impl Chunk {
    pub fn new() -> Self {
        Self::with_ceiling(usize::MAX)
    }

    /// A chunk whose code and constant buffers refuse to grow past `ceiling`
    /// elements.
    pub fn with_ceiling(ceiling: usize) -> Self {
        Chunk {
            code: Code::new(ceiling),
            constants: ValueArray::with_ceiling(ceiling),
        }
    }

    pub fn try_write(&mut self, byte: u8, line: u32) -> Result<(), AllocError> {
        self.code.try_write(byte, line)
    }

    pub fn write(&mut self, byte: u8, line: u32) {
        self.try_write(byte, line)
            .unwrap_or_else(|err| out_of_memory(err))
    }

    /// Appends `instr` and returns the offset of its opcode byte.
    pub fn push_instruction(&mut self, instr: Instruction, line: u32) -> usize {
        let offset = self.code_len();
        match instr.op_code() {
            Some(op) => self.write(op.into(), line),
            None => {
                if let Instruction::OpInvalid(byte) = instr {
                    self.write(byte, line)
                }
            }
        }
        if let Some(operand) = instr.operand() {
            self.write(operand, line);
        }
        offset
    }

    pub fn try_add_constant(&mut self, value: Value) -> Result<usize, AllocError> {
        self.constants.try_write(value)
    }

    /// Appends to the constant pool without deduplicating and returns the new
    /// slot. Callers encoding the slot in one byte must check its range.
    pub fn add_constant(&mut self, value: Value) -> usize {
        self.constants.write(value)
    }

    /// Releases every buffer. The chunk stays usable, as if just created.
    pub fn free(&mut self) {
        self.code.free();
        self.constants.free();
    }

    pub fn code(&self) -> &[u8] {
        &self.code.bytes
    }

    pub fn lines(&self) -> &[u32] {
        &self.code.lines
    }

    pub fn constants(&self) -> &[Value] {
        self.constants.as_slice()
    }

    pub fn code_len(&self) -> usize {
        self.code.bytes.len()
    }

    pub fn capacity(&self) -> usize {
        self.code.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.code.bytes.is_empty()
    }

    pub fn get_line(&self, index: usize) -> Option<u32> {
        self.code.lines.get(index).copied()
    }

    pub fn get_constant(&self, index: u8) -> Option<Value> {
        self.constants.get(index as usize).copied()
    }

    fn read_u8(&self, index: usize) -> Option<u8> {
        self.code.bytes.get(index).copied()
    }

    /// Decodes the instruction at `index`, returning it with its size. A
    /// truncated operand decodes as `OpInvalid`.
    pub fn read_instruction(&self, index: usize) -> Option<(usize, Instruction)> {
        let byte = self.read_u8(index)?;
        let op = match OpCode::try_from(byte) {
            Ok(op) => op,
            Err(byte) => return Some((1, Instruction::OpInvalid(byte))),
        };
        let instr = Instruction::new(op, 0);
        if instr.operand().is_none() {
            return Some((1, instr));
        }
        match self.read_u8(index + 1) {
            Some(operand) => Some((2, Instruction::new(op, operand))),
            None => Some((1, Instruction::OpInvalid(byte))),
        }
    }

    pub fn iter(&self) -> InstructionIter<'_> {
        InstructionIter::new(self)
    }
}

impl Default for Chunk {
    fn default() -> Self {
        Self::new()
    }
}

pub struct InstructionIter<'a> {
    chunk: &'a Chunk,
    ip: usize,
}

impl<'a> InstructionIter<'a> {
    pub fn new(chunk: &'a Chunk) -> Self {
        InstructionIter { chunk, ip: 0 }
    }
}

impl Iterator for InstructionIter<'_> {
    type Item = (usize, Instruction);

    fn next(&mut self) -> Option<Self::Item> {
        let (instr_size, instr) = self.chunk.read_instruction(self.ip)?;
        let result = (self.ip, instr);
        self.ip += instr_size;
        Some(result)
    }
}
