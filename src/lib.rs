//! Single-pass compiler from Lox source text to bytecode chunks, together
//! with the value, object and growable-array types the bytecode refers to.

pub mod chunk;
pub mod compiler;
pub mod debug;
pub mod error;
pub mod memory;
pub mod object;
pub mod scanner;
pub mod value;

pub use chunk::{Chunk, Instruction, OpCode};
pub use compiler::{compile, compile_with_output};
pub use error::{AllocError, CompileError, Diagnostic, Location, ValueError};
pub use memory::{DynArray, Heap};
pub use object::{Obj, ObjRef, ObjString, ObjType};
pub use value::{Value, ValueArray};
