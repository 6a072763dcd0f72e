use crate::object::ObjRef;
use std::fmt;
use thiserror::Error;

/// Failure to grow one of the chunk's buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocError {
    #[error("capacity {requested} exceeds the ceiling of {ceiling} elements")]
    CeilingExceeded { requested: usize, ceiling: usize },
    #[error("out of memory growing buffer to {requested} elements")]
    OutOfMemory { requested: usize },
}

/// Checked extraction from a `Value` or an object handle failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("object handle {0:?} does not belong to this heap")]
    DanglingRef(ObjRef),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    AtEnd,
    AtLexeme(String),
    // lexical errors carry their own description
    Lexical,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: u32,
    pub location: Location,
    pub message: String,
}

impl Diagnostic {
    pub fn new(line: u32, location: Location, message: &str) -> Self {
        Diagnostic {
            line,
            location,
            message: message.to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("[line {}] Error", self.line))?;
        match self.location {
            Location::AtEnd => f.write_str(" at end")?,
            Location::AtLexeme(ref lexeme) => f.write_fmt(format_args!(" at '{}'", lexeme))?,
            Location::Lexical => {}
        }
        f.write_fmt(format_args!(": {}", self.message))
    }
}

/// Every diagnostic reported while compiling one source text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct CompileError {
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileError {
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.diagnostics.iter().map(|d| d.message.as_str())
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diag) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_fmt(format_args!("{}", diag))?;
        }
        Ok(())
    }
}
