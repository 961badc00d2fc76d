//! Operator registry — the table of recognised operators, keywords and callables.
//!
//! Every entry carries the spelling it is matched by, a priority used by the
//! reducer, and a kind that decides how the reducer treats it. Callables are
//! keyed by [`CallKey`] (`name$arity`) so that overloads differing only in
//! arity coexist.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Priority of the end-of-statement markers: above everything, so they
/// always force a full reduction.
pub const END_OF_LINE_PRIORITY: i32 = i32::MAX;

/// Priority given to every callable, builtin or declared.
pub const CALL_PRIORITY: i32 = 3;

/// Which side of a bracket pair an operator is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bracket {
    Open,
    Close,
}

/// How the reducer treats an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    /// Binary arithmetic operator.
    Math,
    /// `(` / `)`.
    Parenthesis(Bracket),
    /// A named callable; `arguments` grows while the call's argument list is read.
    FunctionCall { arguments: usize },
    /// `=` / `is`.
    Assignment,
    /// `,`.
    Separator,
    /// `val`.
    VariableDeclaration,
    /// `fun`; `arguments` counts declared parameters.
    FunctionDeclaration { arguments: usize },
    /// Newline / `;`.
    EndOfLine,
    /// `{` / `}`.
    CodeBlock(Bracket),
}

/// A resolved operator definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    pub symbol: String,
    pub priority: i32,
    pub kind: OperatorKind,
}

impl Operator {
    pub fn new(symbol: impl Into<String>, priority: i32, kind: OperatorKind) -> Self {
        Self {
            symbol: symbol.into(),
            priority,
            kind,
        }
    }

    pub fn math(symbol: &str, priority: i32) -> Self {
        Self::new(symbol, priority, OperatorKind::Math)
    }

    pub fn call(name: impl Into<String>, arguments: usize) -> Self {
        Self::new(name, CALL_PRIORITY, OperatorKind::FunctionCall { arguments })
    }

    /// Key under which this operator is stored in a [`Registry`].
    pub fn key(&self) -> String {
        match self.kind {
            OperatorKind::FunctionCall { arguments } => {
                CallKey::new(self.symbol.as_str(), arguments).to_string()
            }
            _ => self.symbol.clone(),
        }
    }

    /// `(` or `{`: only removable by the matching closer.
    pub fn is_opening(&self) -> bool {
        matches!(
            self.kind,
            OperatorKind::Parenthesis(Bracket::Open) | OperatorKind::CodeBlock(Bracket::Open)
        )
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.kind, OperatorKind::FunctionCall { .. })
    }

    /// Entries that take part in ordinary priority comparison.
    pub fn is_reducible(&self) -> bool {
        !self.is_opening()
    }

    /// Argument count for calls and function declarations.
    pub fn arguments(&self) -> Option<usize> {
        match self.kind {
            OperatorKind::FunctionCall { arguments }
            | OperatorKind::FunctionDeclaration { arguments } => Some(arguments),
            _ => None,
        }
    }

    /// Copy of a call or declaration with one more argument counted.
    pub fn with_extra_argument(&self) -> Self {
        let kind = match self.kind {
            OperatorKind::FunctionCall { arguments } => OperatorKind::FunctionCall {
                arguments: arguments + 1,
            },
            OperatorKind::FunctionDeclaration { arguments } => OperatorKind::FunctionDeclaration {
                arguments: arguments + 1,
            },
            other => other,
        };
        Self {
            symbol: self.symbol.clone(),
            priority: self.priority,
            kind,
        }
    }
}

/// Identity of a callable: its name together with its arity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallKey {
    pub name: String,
    pub arity: usize,
}

impl CallKey {
    pub fn new(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            arity,
        }
    }
}

impl fmt::Display for CallKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}${}", self.name, self.arity)
    }
}

/// The operators every compilation starts with.
pub fn builtin_operators() -> Vec<Operator> {
    vec![
        Operator::new("{", -6, OperatorKind::CodeBlock(Bracket::Open)),
        Operator::new("}", -5, OperatorKind::CodeBlock(Bracket::Close)),
        Operator::new("=", -4, OperatorKind::Assignment),
        Operator::new("is", -4, OperatorKind::Assignment),
        Operator::new("fun", -3, OperatorKind::FunctionDeclaration { arguments: 0 }),
        Operator::new("val", -3, OperatorKind::VariableDeclaration),
        Operator::new(",", -2, OperatorKind::Separator),
        Operator::new("(", -1, OperatorKind::Parenthesis(Bracket::Open)),
        Operator::math("-", 0),
        Operator::math("+", 1),
        Operator::math("plus", 1),
        Operator::new(")", 1, OperatorKind::Parenthesis(Bracket::Close)),
        Operator::math("*", 2),
        Operator::math("times", 2),
        Operator::math("/", 2),
        Operator::math("%", 2),
        Operator::math("^", 3),
        Operator::call("pow", 2),
        Operator::call("pow2", 1),
        Operator::call("pow", 1),
        Operator::call("min3", 3),
        Operator::new("\n", END_OF_LINE_PRIORITY, OperatorKind::EndOfLine),
        Operator::new(";", END_OF_LINE_PRIORITY, OperatorKind::EndOfLine),
    ]
}

/// A lookup table of operators keyed by symbol (or `name$arity` for callables).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    operators: HashMap<String, Operator>,
}

impl Registry {
    /// Registry pre-seeded with [`builtin_operators`].
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        for operator in builtin_operators() {
            registry.register(operator);
        }
        registry
    }

    /// Add or replace an operator.
    pub fn register(&mut self, operator: Operator) {
        self.operators.insert(operator.key(), operator);
    }

    /// Look an operator up by its registry key.
    pub fn lookup(&self, key: &str) -> Option<&Operator> {
        self.operators.get(key)
    }

    /// A non-callable operator spelled `symbol`.
    pub fn symbol(&self, symbol: &str) -> Option<&Operator> {
        self.lookup(symbol).filter(|op| !op.is_callable())
    }

    /// Whether any overload of `name` is registered.
    pub fn has_callable(&self, name: &str) -> bool {
        self.operators
            .values()
            .any(|op| op.is_callable() && op.symbol == name)
    }

    /// Whether the exact overload is registered.
    pub fn has_overload(&self, key: &CallKey) -> bool {
        self.lookup(&key.to_string()).is_some()
    }

    /// Characters the operator reader accepts: every non-alphanumeric
    /// character of every registered symbol.
    pub fn symbol_chars(&self) -> BTreeSet<char> {
        self.operators
            .values()
            .flat_map(|op| op.symbol.chars())
            .filter(|c| !c.is_ascii_alphanumeric())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operator> {
        self.operators.values()
    }
}
