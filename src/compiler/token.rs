//! Token types produced by the character readers.

use std::fmt;

/// A location in the source text.
///
/// `offset` counts characters from the start of the source; `line` and
/// `col` are 1-based and `col` restarts at every newline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn new(offset: usize, line: usize, col: usize) -> Self {
        Self { offset, line, col }
    }

    /// Position of the character following `ch` read at `self`.
    pub fn advance(self, ch: char) -> Self {
        if ch == '\n' {
            Self {
                offset: self.offset + 1,
                line: self.line + 1,
                col: 1,
            }
        } else {
            Self {
                offset: self.offset + 1,
                line: self.line,
                col: self.col + 1,
            }
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self {
            offset: 0,
            line: 1,
            col: 1,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// The kind of token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Literal,
    Operator,
}

/// A token read from the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub position: Position,
    pub text: String,
    pub kind: TokenKind,
}

impl Token {
    pub fn literal(position: Position, text: impl Into<String>) -> Self {
        Self {
            position,
            text: text.into(),
            kind: TokenKind::Literal,
        }
    }

    pub fn operator(position: Position, text: impl Into<String>) -> Self {
        Self {
            position,
            text: text.into(),
            kind: TokenKind::Operator,
        }
    }

    /// Same occurrence, different spelling (used for the `EOL` marker).
    pub fn respelled(&self, text: impl Into<String>) -> Self {
        Self {
            position: self.position,
            text: text.into(),
            kind: self.kind,
        }
    }

    pub fn is(&self, text: &str) -> bool {
        self.text == text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_moves_column() {
        let pos = Position::default().advance('a').advance('b');
        assert_eq!(pos, Position::new(2, 1, 3));
    }

    #[test]
    fn newline_resets_column() {
        let pos = Position::default().advance('a').advance('\n');
        assert_eq!(pos.line, 2);
        assert_eq!(pos.col, 1);
        assert_eq!(pos.offset, 2);
    }

    #[test]
    fn respelled_keeps_position() {
        let token = Token::operator(Position::new(4, 1, 5), "\n");
        let eol = token.respelled("EOL");
        assert_eq!(eol.text, "EOL");
        assert_eq!(eol.position, token.position);
        assert_eq!(eol.kind, TokenKind::Operator);
    }

    #[test]
    fn position_display() {
        assert_eq!(Position::new(10, 3, 7).to_string(), "3:7");
    }
}
