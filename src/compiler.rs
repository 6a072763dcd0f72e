use crate::chunk::{Chunk, Instruction, OpCode};
use crate::debug;
use crate::error::{CompileError, Diagnostic, Location};
use crate::memory::Heap;
use crate::scanner::{Scanner, Token, TokenKind};
use crate::value::Value;
use std::io::{self, Write};

/// Local slots are addressed by a one byte operand.
const LOCALS_MAX: usize = u8::MAX as usize + 1;

/// Compiles `source` into `chunk`, reporting diagnostics on stderr.
///
/// On failure `chunk` may hold a partial program and must not be executed.
pub fn compile(source: &str, chunk: &mut Chunk, heap: &mut Heap) -> Result<(), CompileError> {
    compile_with_output(source, chunk, heap, &mut io::stderr())
}

/// Like [`compile`], writing each diagnostic line to `err_out` instead.
pub fn compile_with_output(
    source: &str,
    chunk: &mut Chunk,
    heap: &mut Heap,
    err_out: &mut dyn Write,
) -> Result<(), CompileError> {
    let mut parser = Parser::new(Scanner::new(source), chunk, heap, err_out);
    parser.parse();
    parser.finish()
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    None,
    Assignment,
    Or,
    And,
    Equality,
    Comparison,
    Term,
    Factor,
    Unary,
    Call,
    Primary,
}

impl Precedence {
    fn next(self) -> Precedence {
        match self {
            Precedence::None => Precedence::Assignment,
            Precedence::Assignment => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Equality,
            Precedence::Equality => Precedence::Comparison,
            Precedence::Comparison => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Unary,
            Precedence::Unary => Precedence::Call,
            Precedence::Call | Precedence::Primary => Precedence::Primary,
        }
    }
}

type ParseFn<'src, 'c> = fn(&mut Parser<'src, 'c>, bool);

struct ParseRule<'src, 'c> {
    prefix: Option<ParseFn<'src, 'c>>,
    infix: Option<ParseFn<'src, 'c>>,
    precedence: Precedence,
}

impl<'src, 'c> ParseRule<'src, 'c> {
    fn new(
        prefix: Option<ParseFn<'src, 'c>>,
        infix: Option<ParseFn<'src, 'c>>,
        precedence: Precedence,
    ) -> Self {
        ParseRule {
            prefix,
            infix,
            precedence,
        }
    }
}

struct Local<'src> {
    name: &'src str,
    // None while the initializer is still being compiled
    depth: Option<usize>,
}

/// Lexical scope bookkeeping for one compilation unit.
struct Compiler<'src> {
    locals: Vec<Local<'src>>,
    scope_depth: usize,
}

impl<'src> Compiler<'src> {
    fn new() -> Self {
        Compiler {
            locals: Vec::with_capacity(LOCALS_MAX),
            scope_depth: 0,
        }
    }

    fn mark_initialized(&mut self) {
        let depth = self.scope_depth;
        if let Some(local) = self.locals.last_mut() {
            local.depth = Some(depth);
        }
    }
}

struct Parser<'src, 'c> {
    scanner: Scanner<'src>,
    chunk: &'c mut Chunk,
    heap: &'c mut Heap,
    err_out: &'c mut dyn Write,
    compiler: Compiler<'src>,
    current: Token<'src>,
    previous: Token<'src>,
    had_error: bool,
    panic_mode: bool,
    diagnostics: Vec<Diagnostic>,
}

impl<'src, 'c> Parser<'src, 'c> {
    fn new(
        scanner: Scanner<'src>,
        chunk: &'c mut Chunk,
        heap: &'c mut Heap,
        err_out: &'c mut dyn Write,
    ) -> Self {
        Parser {
            scanner,
            chunk,
            heap,
            err_out,
            compiler: Compiler::new(),
            current: Token::new(TokenKind::Eof, "", 1),
            previous: Token::new(TokenKind::Eof, "", 1),
            had_error: false,
            panic_mode: false,
            diagnostics: Vec::new(),
        }
    }

    fn parse(&mut self) {
        self.advance();
        while !self.match_token(TokenKind::Eof) {
            self.declaration();
        }
        self.emit(Instruction::OpReturn);
    }

    fn finish(self) -> Result<(), CompileError> {
        if self.had_error {
            return Err(CompileError {
                diagnostics: self.diagnostics,
            });
        }
        if log::log_enabled!(log::Level::Debug) {
            log::debug!(
                "{}{} objects, {} bytes on the heap",
                debug::disassemble_chunk(self.chunk, self.heap, "code"),
                self.heap.len(),
                self.heap.bytes_allocated()
            );
        }
        Ok(())
    }

    // === token plumbing ===

    fn advance(&mut self) {
        self.previous = self.current;
        loop {
            self.current = self.scanner.scan_token();
            if self.current.kind != TokenKind::Error {
                break;
            }
            let tok = self.current;
            self.error_at(tok, tok.lexeme);
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if !self.check(kind) {
            return false;
        }
        self.advance();
        true
    }

    fn consume(&mut self, kind: TokenKind, msg: &str) {
        if self.check(kind) {
            self.advance();
        } else {
            self.error_at_current(msg);
        }
    }

    // === diagnostics ===

    fn error(&mut self, msg: &str) {
        self.error_at(self.previous, msg);
    }

    fn error_at_current(&mut self, msg: &str) {
        self.error_at(self.current, msg);
    }

    fn error_at(&mut self, tok: Token<'src>, msg: &str) {
        if self.panic_mode {
            return;
        }
        // cleared at the next synchronization point
        self.panic_mode = true;
        self.had_error = true;

        let location = match tok.kind {
            TokenKind::Eof => Location::AtEnd,
            TokenKind::Error => Location::Lexical,
            _ => Location::AtLexeme(tok.lexeme.to_string()),
        };
        let diag = Diagnostic::new(tok.line, location, msg);
        log::warn!("{}", diag);
        if let Err(err) = writeln!(self.err_out, "{}", diag) {
            log::error!("failed to write diagnostic: {}", err);
        }
        self.diagnostics.push(diag);
    }

    fn synchronize(&mut self) {
        self.panic_mode = false;

        while self.current.kind != TokenKind::Eof {
            if self.previous.kind == TokenKind::Semicolon {
                return;
            }
            match self.current.kind {
                TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return => return,
                _ => self.advance(),
            }
        }
    }

    // === emission ===

    fn emit(&mut self, instr: Instruction) {
        let line = self.previous.line;
        self.chunk.push_instruction(instr, line);
    }

    fn make_constant(&mut self, value: Value) -> u8 {
        let const_ix = self.chunk.add_constant(value);
        match u8::try_from(const_ix) {
            Ok(ix) => ix,
            Err(_) => {
                self.error("Too many constants in one chunk.");
                0
            }
        }
    }

    fn emit_constant(&mut self, value: Value) {
        let const_ix = self.make_constant(value);
        self.emit(Instruction::OpConstant(const_ix));
    }

    fn identifier_constant(&mut self, name: Token<'src>) -> u8 {
        let name_ref = self.heap.copy_string(name.lexeme);
        self.make_constant(Value::Obj(name_ref))
    }

    // === declarations and statements ===

    fn declaration(&mut self) {
        if self.match_token(TokenKind::Var) {
            self.var_declaration();
        } else {
            self.statement();
        }

        if self.panic_mode {
            self.synchronize();
        }
    }

    fn var_declaration(&mut self) {
        let global = self.parse_variable("Expect variable name.");

        if self.match_token(TokenKind::Equal) {
            self.expression();
        } else {
            self.emit(Instruction::OpNil);
        }
        self.consume(
            TokenKind::Semicolon,
            "Expect ';' after variable declaration.",
        );

        self.define_variable(global);
    }

    fn parse_variable(&mut self, msg: &str) -> u8 {
        self.consume(TokenKind::Identifier, msg);

        self.declare_variable();
        if self.compiler.scope_depth > 0 {
            return 0;
        }

        self.identifier_constant(self.previous)
    }

    fn declare_variable(&mut self) {
        let scope_depth = self.compiler.scope_depth;
        if scope_depth == 0 {
            return;
        }

        let name = self.previous;
        let duplicate = self
            .compiler
            .locals
            .iter()
            .rev()
            .take_while(|local| local.depth.map_or(true, |depth| depth >= scope_depth))
            .any(|local| local.name == name.lexeme);
        if duplicate {
            self.error("Already a variable with this name in this scope.");
        }

        self.add_local(name);
    }

    fn add_local(&mut self, name: Token<'src>) {
        if self.compiler.locals.len() == LOCALS_MAX {
            self.error("Too many local variables in function.");
            return;
        }
        log::trace!(
            "local '{}' in slot {} at depth {}",
            name.lexeme,
            self.compiler.locals.len(),
            self.compiler.scope_depth
        );
        self.compiler.locals.push(Local {
            name: name.lexeme,
            depth: None,
        });
    }

    fn define_variable(&mut self, global: u8) {
        if self.compiler.scope_depth > 0 {
            // the initializer's value already sits in the local's slot
            self.compiler.mark_initialized();
            return;
        }
        self.emit(Instruction::OpDefineGlobal(global));
    }

    fn statement(&mut self) {
        if self.match_token(TokenKind::Print) {
            self.print_statement();
        } else if self.match_token(TokenKind::LeftBrace) {
            self.begin_scope();
            self.block();
            self.end_scope();
        } else {
            self.expression_statement();
        }
    }

    fn print_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::Semicolon, "Expect ';' after value.");
        self.emit(Instruction::OpPrint);
    }

    fn expression_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.");
        self.emit(Instruction::OpPop);
    }

    fn block(&mut self) {
        while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::Eof) {
            self.declaration();
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block.");
    }

    fn begin_scope(&mut self) {
        self.compiler.scope_depth += 1;
        log::trace!("enter scope depth {}", self.compiler.scope_depth);
    }

    fn end_scope(&mut self) {
        self.compiler.scope_depth -= 1;
        let scope_depth = self.compiler.scope_depth;

        while let Some(local) = self.compiler.locals.last() {
            if local.depth.map_or(false, |depth| depth <= scope_depth) {
                break;
            }
            self.emit(Instruction::OpPop);
            self.compiler.locals.pop();
        }
        log::trace!(
            "leave scope, depth {} with {} locals",
            scope_depth,
            self.compiler.locals.len()
        );
    }

    // === expressions ===

    fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    fn parse_precedence(&mut self, prec: Precedence) {
        self.advance();

        // parse prefix
        let can_assign = prec <= Precedence::Assignment;
        match Self::rule(self.previous.kind).prefix {
            Some(parselet) => parselet(self, can_assign),
            None => {
                self.error("Expect expression.");
                return;
            }
        }

        // parse infix
        while prec <= Self::rule(self.current.kind).precedence {
            self.advance();
            if let Some(parselet) = Self::rule(self.previous.kind).infix {
                parselet(self, can_assign);
            }
        }

        if can_assign && self.match_token(TokenKind::Equal) {
            self.error("Invalid assignment target.");
        }
    }

    fn rule(kind: TokenKind) -> ParseRule<'src, 'c> {
        match kind {
            TokenKind::LeftParen => ParseRule::new(Some(Self::grouping), None, Precedence::None),
            TokenKind::Minus => {
                ParseRule::new(Some(Self::unary), Some(Self::binary), Precedence::Term)
            }
            TokenKind::Plus => ParseRule::new(None, Some(Self::binary), Precedence::Term),
            TokenKind::Slash | TokenKind::Star => {
                ParseRule::new(None, Some(Self::binary), Precedence::Factor)
            }
            TokenKind::Bang => ParseRule::new(Some(Self::unary), None, Precedence::None),
            TokenKind::BangEqual | TokenKind::EqualEqual => {
                ParseRule::new(None, Some(Self::binary), Precedence::Equality)
            }
            TokenKind::Greater
            | TokenKind::GreaterEqual
            | TokenKind::Less
            | TokenKind::LessEqual => {
                ParseRule::new(None, Some(Self::binary), Precedence::Comparison)
            }
            TokenKind::Identifier => ParseRule::new(Some(Self::variable), None, Precedence::None),
            TokenKind::String => ParseRule::new(Some(Self::string), None, Precedence::None),
            TokenKind::Number => ParseRule::new(Some(Self::number), None, Precedence::None),
            TokenKind::False | TokenKind::True | TokenKind::Nil => {
                ParseRule::new(Some(Self::literal), None, Precedence::None)
            }
            _ => ParseRule::new(None, None, Precedence::None),
        }
    }

    fn grouping(&mut self, _can_assign: bool) {
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after expression.");
    }

    fn number(&mut self, _can_assign: bool) {
        // The scanner only yields `digits[.digits]`, which always parses.
        let val = self.previous.lexeme.parse::<f64>().unwrap_or(f64::NAN);
        self.emit_constant(Value::Number(val));
    }

    fn string(&mut self, _can_assign: bool) {
        // drop the surrounding quotes
        let lexeme = self.previous.lexeme;
        let chars = &lexeme[1..lexeme.len() - 1];
        let str_ref = self.heap.copy_string(chars);
        self.emit_constant(Value::Obj(str_ref));
    }

    fn literal(&mut self, _can_assign: bool) {
        match self.previous.kind {
            TokenKind::True => self.emit(Instruction::OpTrue),
            TokenKind::False => self.emit(Instruction::OpFalse),
            TokenKind::Nil => self.emit(Instruction::OpNil),
            _ => {}
        }
    }

    fn variable(&mut self, can_assign: bool) {
        self.named_variable(self.previous, can_assign);
    }

    fn named_variable(&mut self, name: Token<'src>, can_assign: bool) {
        let (get_op, set_op, arg) = match self.resolve_local(name) {
            Some(slot) => (OpCode::GetLocal, OpCode::SetLocal, slot),
            None => {
                let const_ix = self.identifier_constant(name);
                (OpCode::GetGlobal, OpCode::SetGlobal, const_ix)
            }
        };

        if can_assign && self.match_token(TokenKind::Equal) {
            self.expression();
            self.emit(Instruction::new(set_op, arg));
        } else {
            self.emit(Instruction::new(get_op, arg));
        }
    }

    /// Slot of the innermost local called `name`, if any.
    fn resolve_local(&mut self, name: Token<'src>) -> Option<u8> {
        let (slot, initialized) = self
            .compiler
            .locals
            .iter()
            .enumerate()
            .rev()
            .find(|(_, local)| local.name == name.lexeme)
            .map(|(slot, local)| (slot, local.depth.is_some()))?;

        if !initialized {
            self.error("Can't read local variable in its own initializer.");
        }
        // at most LOCALS_MAX locals exist, so every slot fits
        u8::try_from(slot).ok()
    }

    fn unary(&mut self, _can_assign: bool) {
        let op_kind = self.previous.kind;
        self.parse_precedence(Precedence::Unary);

        match op_kind {
            TokenKind::Minus => self.emit(Instruction::OpNegate),
            TokenKind::Bang => self.emit(Instruction::OpNot),
            _ => {}
        }
    }

    fn binary(&mut self, _can_assign: bool) {
        let op_kind = self.previous.kind;
        let my_prec = Self::rule(op_kind).precedence;
        self.parse_precedence(my_prec.next());

        match op_kind {
            TokenKind::Plus => self.emit(Instruction::OpAdd),
            TokenKind::Minus => self.emit(Instruction::OpSubtract),
            TokenKind::Star => self.emit(Instruction::OpMultiply),
            TokenKind::Slash => self.emit(Instruction::OpDivide),
            TokenKind::BangEqual => {
                self.emit(Instruction::OpEqual);
                self.emit(Instruction::OpNot);
            }
            TokenKind::EqualEqual => self.emit(Instruction::OpEqual),
            TokenKind::Greater => self.emit(Instruction::OpGreater),
            TokenKind::GreaterEqual => {
                self.emit(Instruction::OpLess);
                self.emit(Instruction::OpNot);
            }
            TokenKind::Less => self.emit(Instruction::OpLess),
            TokenKind::LessEqual => {
                self.emit(Instruction::OpGreater);
                self.emit(Instruction::OpNot);
            }
            _ => {}
        }
    }
}
