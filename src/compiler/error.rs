//! Error types for the compiler.

use std::fmt;

use super::token::Position;

/// An error that occurred while compiling or evaluating a program.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub message: String,
    pub line: usize,
    pub col: usize,
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Character outside the literal, operator and whitespace sets.
    Lex,
    /// Mismatched brackets, misplaced separators, bad assignment targets,
    /// malformed expressions.
    Syntax,
    /// Undeclared variables, unknown overloads, arithmetic faults.
    Eval,
}

impl CompileError {
    pub fn lex(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            message: message.into(),
            line,
            col,
            kind: ErrorKind::Lex,
        }
    }

    pub fn syntax(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            message: message.into(),
            line,
            col,
            kind: ErrorKind::Syntax,
        }
    }

    pub fn eval(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            message: message.into(),
            line,
            col,
            kind: ErrorKind::Eval,
        }
    }

    pub fn syntax_at(message: impl Into<String>, position: Position) -> Self {
        Self::syntax(message, position.line, position.col)
    }

    pub fn eval_at(message: impl Into<String>, position: Position) -> Self {
        Self::eval(message, position.line, position.col)
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}:{}] {:?}: {}",
            self.line, self.col, self.kind, self.message
        )
    }
}

impl std::error::Error for CompileError {}
