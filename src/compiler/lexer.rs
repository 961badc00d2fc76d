//! Character readers — splits source text into literals and operators.
//!
//! Characters are consumed one at a time. Alphanumerics accumulate into a
//! pending literal; an operator character or whitespace completes it. A
//! completed word is first offered to the reducer as an operator (`plus`,
//! `val`, ...) and only emitted as a literal when that fails. Callable
//! names are emitted as literals too; the reducer promotes one to a call
//! when `(` follows it. Newline is an operator, not whitespace: it ends a
//! statement.

use std::collections::BTreeSet;

use super::error::CompileError;
use super::operator::Registry;
use super::reducer::AstOnp;
use super::token::{Position, Token};

/// The reader responsible for a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderKind {
    Literal,
    Operator,
    Whitespace,
}

pub struct Lexer {
    operator_chars: BTreeSet<char>,
    pending: Option<Token>,
    position: Position,
}

impl Lexer {
    /// Readers accepting every operator character known to `registry`.
    pub fn new(registry: &Registry) -> Self {
        Self {
            operator_chars: registry.symbol_chars(),
            pending: None,
            position: Position::default(),
        }
    }

    pub fn classify(&self, ch: char) -> Option<ReaderKind> {
        if ch.is_ascii_alphanumeric() {
            Some(ReaderKind::Literal)
        } else if self.operator_chars.contains(&ch) {
            Some(ReaderKind::Operator)
        } else if matches!(ch, ' ' | '\t' | '\r') {
            Some(ReaderKind::Whitespace)
        } else {
            None
        }
    }

    /// Position of the next character to be read.
    pub fn position(&self) -> Position {
        self.position
    }

    /// The literal currently being accumulated, if any.
    pub fn pending(&self) -> Option<&Token> {
        self.pending.as_ref()
    }

    /// Feed all of `source` followed by a terminating newline.
    pub fn read_source(&mut self, source: &str, state: &mut AstOnp<'_>) -> Result<(), CompileError> {
        for ch in source.chars() {
            self.read(ch, state)?;
        }
        self.read('\n', state)
    }

    pub fn read(&mut self, ch: char, state: &mut AstOnp<'_>) -> Result<(), CompileError> {
        let position = self.position;
        match self.classify(ch) {
            Some(ReaderKind::Literal) => match &mut self.pending {
                Some(token) => token.text.push(ch),
                None => self.pending = Some(Token::literal(position, ch)),
            },
            Some(ReaderKind::Operator) => {
                self.flush(state)?;
                state.handle_symbol(Token::operator(position, ch))?;
            }
            Some(ReaderKind::Whitespace) => self.flush(state)?,
            None => {
                return Err(CompileError::lex(
                    format!(
                        "unexpected character '{}' at {}",
                        ch.escape_debug(),
                        position
                    ),
                    position.line,
                    position.col,
                ))
            }
        }
        self.position = position.advance(ch);
        Ok(())
    }

    /// Complete the pending literal, if any.
    pub fn flush(&mut self, state: &mut AstOnp<'_>) -> Result<(), CompileError> {
        if let Some(token) = self.pending.take() {
            if !state.offer_word(&token)? {
                state.push_literal(token)?;
            }
        }
        Ok(())
    }
}
