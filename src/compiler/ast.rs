//! Abstract syntax tree built by the reducer.
//!
//! [`Node`] is a closed sum type, so the reducer and the evaluator match on
//! every variant exhaustively. A [`Block`] owns its statements and the table
//! of callables declared directly inside it.

use std::fmt;
use std::rc::Rc;

use super::operator::{CallKey, Operator, Registry};
use super::token::Position;

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

impl BinaryOp {
    /// Resolve an arithmetic spelling, synonyms included.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" | "plus" => Some(Self::Add),
            "-" => Some(Self::Sub),
            "*" | "times" => Some(Self::Mul),
            "/" => Some(Self::Div),
            "%" => Some(Self::Rem),
            "^" => Some(Self::Pow),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Pow => "^",
        }
    }
}

/// A user-declared function.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
    pub position: Position,
}

impl Function {
    pub fn key(&self) -> CallKey {
        CallKey::new(self.name.as_str(), self.params.len())
    }
}

/// An executable AST node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Integer literal.
    Primitive(i64),
    /// Reference to a bound variable.
    Variable { name: String, position: Position },
    Binary {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
        position: Position,
    },
    Call {
        key: CallKey,
        arguments: Vec<Node>,
        position: Position,
    },
    /// `val name` with an optional `= value`.
    VariableDeclaration {
        name: String,
        value: Option<Box<Node>>,
        position: Position,
    },
    FunctionDeclaration(Rc<Function>),
    Block(Block),
}

impl Node {
    /// Nodes that can stand as an operand or argument.
    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            Node::Primitive(_) | Node::Variable { .. } | Node::Binary { .. } | Node::Call { .. }
        )
    }

    /// Short description used in diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            Node::Primitive(_) => "integer",
            Node::Variable { .. } => "variable",
            Node::Binary { .. } => "expression",
            Node::Call { .. } => "function call",
            Node::VariableDeclaration { .. } => "variable declaration",
            Node::FunctionDeclaration(_) => "function declaration",
            Node::Block(_) => "code block",
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Primitive(value) => write!(f, "{value}"),
            Node::Variable { name, .. } => write!(f, "{name}"),
            Node::Binary {
                op, left, right, ..
            } => write!(f, "({left} {} {right})", op.symbol()),
            Node::Call { key, arguments, .. } => {
                write!(f, "{}(", key.name)?;
                for (i, argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{argument}")?;
                }
                write!(f, ")")
            }
            Node::VariableDeclaration { name, value, .. } => match value {
                Some(value) => write!(f, "val {name} = {value}"),
                None => write!(f, "val {name}"),
            },
            Node::FunctionDeclaration(function) => write!(
                f,
                "fun {}({}) {}",
                function.name,
                function.params.join(", "),
                function.body
            ),
            Node::Block(block) => write!(f, "{block}"),
        }
    }
}

/// An ordered list of statements forming one lexical scope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub statements: Vec<Node>,
    /// Callables declared directly in this block.
    pub operators: Registry,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, statement: Node) {
        if let Node::FunctionDeclaration(function) = &statement {
            self.operators
                .register(Operator::call(function.name.as_str(), function.params.len()));
        }
        self.statements.push(statement);
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, statement) in self.statements.iter().enumerate() {
            if i > 0 {
                write!(f, ";")?;
            }
            write!(f, " {statement}")?;
        }
        if !self.statements.is_empty() {
            write!(f, "; ")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Node {
        Node::Variable {
            name: name.to_string(),
            position: Position::default(),
        }
    }

    #[test]
    fn binary_op_synonyms() {
        assert_eq!(BinaryOp::from_symbol("plus"), Some(BinaryOp::Add));
        assert_eq!(BinaryOp::from_symbol("times"), Some(BinaryOp::Mul));
        assert_eq!(BinaryOp::from_symbol("^"), Some(BinaryOp::Pow));
        assert_eq!(BinaryOp::from_symbol("("), None);
    }

    #[test]
    fn pushing_function_registers_overload() {
        let mut block = Block::new();
        block.push(Node::FunctionDeclaration(Rc::new(Function {
            name: "add".to_string(),
            params: vec!["a".to_string(), "b".to_string()],
            body: Block::new(),
            position: Position::default(),
        })));
        assert_eq!(block.len(), 1);
        assert!(block.operators.has_overload(&CallKey::new("add", 2)));
        assert!(block.operators.has_callable("add"));
    }

    #[test]
    fn expression_nodes() {
        assert!(Node::Primitive(1).is_expression());
        assert!(var("a").is_expression());
        assert!(!Node::Block(Block::new()).is_expression());
        assert!(!Node::VariableDeclaration {
            name: "a".to_string(),
            value: None,
            position: Position::default(),
        }
        .is_expression());
    }

    #[test]
    fn display_renders_tree() {
        let node = Node::Binary {
            op: BinaryOp::Mul,
            left: Box::new(Node::Binary {
                op: BinaryOp::Add,
                left: Box::new(Node::Primitive(2)),
                right: Box::new(Node::Primitive(3)),
                position: Position::default(),
            }),
            right: Box::new(var("x")),
            position: Position::default(),
        };
        assert_eq!(node.to_string(), "((2 + 3) * x)");

        let mut block = Block::new();
        block.push(Node::Call {
            key: CallKey::new("pow", 2),
            arguments: vec![Node::Primitive(2), var("y")],
            position: Position::default(),
        });
        assert_eq!(block.to_string(), "{ pow(2, y); }");
        assert_eq!(Block::new().to_string(), "{}");
    }
}
