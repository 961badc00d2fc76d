//! Evaluator — walks the AST top-down against a chain of immutable scopes.
//!
//! A [`Scope`] is a frame of bindings over an optional parent. Blocks and
//! function calls never mutate their parent: each declaration produces a new
//! frame on top of the running one, and user functions capture the frame in
//! effect where they were declared.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use super::ast::{BinaryOp, Block, Function, Node};
use super::error::CompileError;
use super::operator::CallKey;
use super::token::Position;

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Unit,
    /// Result of a `val` statement.
    Variable { name: String, value: Box<Value> },
    /// Result of a `fun` statement.
    Function(CallKey),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(value) => write!(f, "{value}"),
            Value::Unit => write!(f, "Unit"),
            Value::Variable { name, value } => match value.as_ref() {
                Value::Unit => write!(f, "val {name}"),
                value => write!(f, "val {name} = {value}"),
            },
            Value::Function(key) => write!(f, "fun {}/{}", key.name, key.arity),
        }
    }
}

/// Native implementation of a builtin callable.
pub type NativeFn = fn(&[i64]) -> Result<i64, &'static str>;

/// Something a call can resolve to.
#[derive(Debug, Clone)]
pub enum Callable {
    Builtin { key: CallKey, function: NativeFn },
    User {
        function: Rc<Function>,
        closure: Rc<Scope>,
    },
}

fn pow(args: &[i64]) -> Result<i64, &'static str> {
    float_pow(args[0], args[1]).ok_or("arithmetic overflow in pow")
}

fn square(args: &[i64]) -> Result<i64, &'static str> {
    args[0].checked_mul(args[0]).ok_or("arithmetic overflow in square")
}

fn min3(args: &[i64]) -> Result<i64, &'static str> {
    Ok(args[0].min(args[1]).min(args[2]))
}

/// Builtin callables: `pow/2`, `pow/1`, `pow2/1`, `min3/3`.
pub fn builtins() -> Vec<Callable> {
    let entries: [(&str, usize, NativeFn); 4] = [
        ("pow", 2, pow),
        ("pow", 1, square),
        ("pow2", 1, square),
        ("min3", 3, min3),
    ];
    entries
        .into_iter()
        .map(|(name, arity, function)| Callable::Builtin {
            key: CallKey::new(name, arity),
            function,
        })
        .collect()
}

/// Exponentiation through floating point, truncated toward zero.
fn float_pow(base: i64, exponent: i64) -> Option<i64> {
    let result = (base as f64).powf(exponent as f64).trunc();
    if result.is_finite() && result >= i64::MIN as f64 && result < i64::MAX as f64 {
        Some(result as i64)
    } else {
        None
    }
}

/// A frame of variable and function bindings.
#[derive(Debug, Default)]
pub struct Scope {
    parent: Option<Rc<Scope>>,
    variables: HashMap<String, Value>,
    functions: HashMap<CallKey, Callable>,
}

impl Scope {
    /// Outermost scope: builtins plus configured global variables.
    pub fn root(globals: &BTreeMap<String, i64>) -> Rc<Scope> {
        let mut scope = Scope::default();
        for callable in builtins() {
            if let Callable::Builtin { key, .. } = &callable {
                scope.functions.insert(key.clone(), callable.clone());
            }
        }
        for (name, value) in globals {
            scope.variables.insert(name.clone(), Value::Int(*value));
        }
        Rc::new(scope)
    }

    /// Empty frame over `parent`.
    pub fn child(parent: &Rc<Scope>) -> Scope {
        Scope {
            parent: Some(Rc::clone(parent)),
            ..Scope::default()
        }
    }

    /// New frame binding one variable over `self`.
    pub fn with_variable(self: &Rc<Self>, name: &str, value: Value) -> Rc<Scope> {
        let mut frame = Scope::child(self);
        frame.variables.insert(name.to_string(), value);
        Rc::new(frame)
    }

    /// New frame binding one callable over `self`.
    pub fn with_function(self: &Rc<Self>, key: CallKey, callable: Callable) -> Rc<Scope> {
        let mut frame = Scope::child(self);
        frame.functions.insert(key, callable);
        Rc::new(frame)
    }

    /// Nearest binding of `name`.
    pub fn variable(&self, name: &str) -> Option<&Value> {
        match self.variables.get(name) {
            Some(value) => Some(value),
            None => self.parent.as_deref().and_then(|p| p.variable(name)),
        }
    }

    /// Nearest binding of the exact overload.
    pub fn function(&self, key: &CallKey) -> Option<&Callable> {
        match self.functions.get(key) {
            Some(callable) => Some(callable),
            None => self.parent.as_deref().and_then(|p| p.function(key)),
        }
    }
}

/// Evaluate a block in a fresh frame over `parent`; yields its last value.
pub fn eval_block(block: &Block, parent: &Rc<Scope>) -> Result<Value, CompileError> {
    let mut scope = Rc::new(Scope::child(parent));
    let mut result = Value::Unit;
    for statement in &block.statements {
        result = match statement {
            Node::VariableDeclaration { name, value, .. } => {
                let value = match value {
                    Some(node) => eval_node(node, &scope)?,
                    None => Value::Unit,
                };
                scope = scope.with_variable(name, value.clone());
                Value::Variable {
                    name: name.clone(),
                    value: Box::new(value),
                }
            }
            Node::FunctionDeclaration(function) => {
                let key = function.key();
                let callable = Callable::User {
                    function: Rc::clone(function),
                    closure: Rc::clone(&scope),
                };
                scope = scope.with_function(key.clone(), callable);
                Value::Function(key)
            }
            other => eval_node(other, &scope)?,
        };
    }
    Ok(result)
}

/// Evaluate a single node. Declarations outside statement position only
/// describe themselves; binding happens in [`eval_block`].
pub fn eval_node(node: &Node, scope: &Rc<Scope>) -> Result<Value, CompileError> {
    match node {
        Node::Primitive(value) => Ok(Value::Int(*value)),
        Node::Variable { name, position } => scope
            .variable(name)
            .cloned()
            .ok_or_else(|| CompileError::eval_at(format!("variable not found: {name}"), *position)),
        Node::Binary {
            op,
            left,
            right,
            position,
        } => {
            let left = expect_int(eval_node(left, scope)?, *position)?;
            let right = expect_int(eval_node(right, scope)?, *position)?;
            apply(*op, left, right, *position).map(Value::Int)
        }
        Node::Call {
            key,
            arguments,
            position,
        } => {
            let callable = scope.function(key).cloned().ok_or_else(|| {
                CompileError::eval_at(
                    format!(
                        "function not found: {} with {} arguments",
                        key.name, key.arity
                    ),
                    *position,
                )
            })?;
            let values = arguments
                .iter()
                .map(|argument| eval_node(argument, scope))
                .collect::<Result<Vec<_>, _>>()?;
            call(&callable, values, *position)
        }
        Node::VariableDeclaration { name, value, .. } => {
            let value = match value {
                Some(node) => eval_node(node, scope)?,
                None => Value::Unit,
            };
            Ok(Value::Variable {
                name: name.clone(),
                value: Box::new(value),
            })
        }
        Node::FunctionDeclaration(function) => Ok(Value::Function(function.key())),
        Node::Block(block) => eval_block(block, scope),
    }
}

fn call(callable: &Callable, values: Vec<Value>, position: Position) -> Result<Value, CompileError> {
    match callable {
        Callable::Builtin { key, function } => {
            let ints = values
                .into_iter()
                .map(|value| expect_int(value, position))
                .collect::<Result<Vec<_>, _>>()?;
            function(&ints)
                .map(Value::Int)
                .map_err(|message| CompileError::eval_at(format!("{message} ({key})"), position))
        }
        Callable::User { function, closure } => {
            let mut frame = Scope::child(closure);
            for (param, value) in function.params.iter().zip(values) {
                frame.variables.insert(param.clone(), value);
            }
            eval_block(&function.body, &Rc::new(frame))
        }
    }
}

fn expect_int(value: Value, position: Position) -> Result<i64, CompileError> {
    value
        .as_int()
        .ok_or_else(|| CompileError::eval_at(format!("not an integer: {value}"), position))
}

/// Integer arithmetic; division and remainder truncate toward zero.
pub fn apply(op: BinaryOp, left: i64, right: i64, position: Position) -> Result<i64, CompileError> {
    let overflow = || {
        CompileError::eval_at(
            format!("arithmetic overflow: {left} {} {right}", op.symbol()),
            position,
        )
    };
    match op {
        BinaryOp::Add => left.checked_add(right).ok_or_else(overflow),
        BinaryOp::Sub => left.checked_sub(right).ok_or_else(overflow),
        BinaryOp::Mul => left.checked_mul(right).ok_or_else(overflow),
        BinaryOp::Div => {
            if right == 0 {
                return Err(CompileError::eval_at("division by zero", position));
            }
            left.checked_div(right).ok_or_else(overflow)
        }
        BinaryOp::Rem => {
            if right == 0 {
                return Err(CompileError::eval_at("modulo by zero", position));
            }
            left.checked_rem(right).ok_or_else(overflow)
        }
        BinaryOp::Pow => float_pow(left, right).ok_or_else(overflow),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::error::ErrorKind;

    fn root() -> Rc<Scope> {
        Scope::root(&BTreeMap::new())
    }

    fn var(name: &str) -> Node {
        Node::Variable {
            name: name.to_string(),
            position: Position::default(),
        }
    }

    fn call_node(name: &str, arguments: Vec<Node>) -> Node {
        Node::Call {
            key: CallKey::new(name, arguments.len()),
            arguments,
            position: Position::default(),
        }
    }

    #[test]
    fn integer_division_truncates_toward_zero() {
        let p = Position::default();
        assert_eq!(apply(BinaryOp::Div, 7, 2, p).unwrap(), 3);
        assert_eq!(apply(BinaryOp::Div, -7, 2, p).unwrap(), -3);
        assert_eq!(apply(BinaryOp::Rem, -7, 2, p).unwrap(), -1);
    }

    #[test]
    fn power_truncates() {
        let p = Position::default();
        assert_eq!(apply(BinaryOp::Pow, 2, 10, p).unwrap(), 1024);
        assert_eq!(apply(BinaryOp::Pow, 2, -1, p).unwrap(), 0);
        assert_eq!(apply(BinaryOp::Pow, 5, 0, p).unwrap(), 1);
    }

    #[test]
    fn arithmetic_faults_are_errors() {
        let p = Position::new(3, 1, 4);
        let err = apply(BinaryOp::Div, 1, 0, p).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Eval);
        assert_eq!(err.col, 4);
        assert!(apply(BinaryOp::Rem, 1, 0, p).is_err());
        assert!(apply(BinaryOp::Mul, i64::MAX, 2, p).is_err());
        assert!(apply(BinaryOp::Div, i64::MIN, -1, p).is_err());
        assert!(apply(BinaryOp::Pow, 10, 40, p).is_err());
    }

    #[test]
    fn builtins_are_bound_in_root() {
        let scope = root();
        let result = eval_node(&call_node("min3", vec![Node::Primitive(3), Node::Primitive(1), Node::Primitive(2)]), &scope);
        assert_eq!(result.unwrap(), Value::Int(1));
        let result = eval_node(&call_node("pow", vec![Node::Primitive(3)]), &scope);
        assert_eq!(result.unwrap(), Value::Int(9));
        let result = eval_node(&call_node("pow", vec![Node::Primitive(2), Node::Primitive(3)]), &scope);
        assert_eq!(result.unwrap(), Value::Int(8));
    }

    #[test]
    fn unknown_overload_is_error() {
        let err = eval_node(&call_node("pow2", vec![Node::Primitive(1), Node::Primitive(2)]), &root()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Eval);
        assert!(err.message.contains("pow2 with 2 arguments"));
    }

    #[test]
    fn globals_are_visible() {
        let mut globals = BTreeMap::new();
        globals.insert("magicnumber".to_string(), 56);
        let scope = Scope::root(&globals);
        assert_eq!(eval_node(&var("magicnumber"), &scope).unwrap(), Value::Int(56));
    }

    #[test]
    fn missing_variable_is_error() {
        let err = eval_node(&var("ghost"), &root()).unwrap_err();
        assert_eq!(err.message, "variable not found: ghost");
    }

    #[test]
    fn inner_frames_shadow_outer() {
        let outer = root().with_variable("a", Value::Int(1));
        let inner = outer.with_variable("a", Value::Int(2));
        assert_eq!(inner.variable("a"), Some(&Value::Int(2)));
        assert_eq!(outer.variable("a"), Some(&Value::Int(1)));
    }

    #[test]
    fn declarations_are_sequential() {
        let mut block = Block::new();
        block.push(Node::VariableDeclaration {
            name: "a".to_string(),
            value: Some(Box::new(Node::Primitive(4))),
            position: Position::default(),
        });
        block.push(var("a"));
        assert_eq!(eval_block(&block, &root()).unwrap(), Value::Int(4));

        let mut block = Block::new();
        block.push(var("a"));
        block.push(Node::VariableDeclaration {
            name: "a".to_string(),
            value: Some(Box::new(Node::Primitive(4))),
            position: Position::default(),
        });
        assert!(eval_block(&block, &root()).is_err());
    }

    #[test]
    fn block_bindings_do_not_leak() {
        let mut inner = Block::new();
        inner.push(Node::VariableDeclaration {
            name: "hidden".to_string(),
            value: Some(Box::new(Node::Primitive(1))),
            position: Position::default(),
        });
        let mut outer = Block::new();
        outer.push(Node::Block(inner));
        outer.push(var("hidden"));
        assert!(eval_block(&outer, &root()).is_err());
    }

    #[test]
    fn user_function_binds_params_over_closure() {
        let mut body = Block::new();
        body.push(Node::Binary {
            op: BinaryOp::Sub,
            left: Box::new(var("a")),
            right: Box::new(var("b")),
            position: Position::default(),
        });
        let mut program = Block::new();
        program.push(Node::VariableDeclaration {
            name: "a".to_string(),
            value: Some(Box::new(Node::Primitive(100))),
            position: Position::default(),
        });
        program.push(Node::FunctionDeclaration(Rc::new(Function {
            name: "sub".to_string(),
            params: vec!["a".to_string(), "b".to_string()],
            body,
            position: Position::default(),
        })));
        program.push(call_node("sub", vec![Node::Primitive(5), Node::Primitive(3)]));
        assert_eq!(eval_block(&program, &root()).unwrap(), Value::Int(2));
    }

    #[test]
    fn empty_block_is_unit() {
        assert_eq!(eval_block(&Block::new(), &root()).unwrap(), Value::Unit);
    }

    #[test]
    fn value_display() {
        assert_eq!(Value::Int(-3).to_string(), "-3");
        assert_eq!(Value::Unit.to_string(), "Unit");
        assert_eq!(
            Value::Variable {
                name: "a".to_string(),
                value: Box::new(Value::Int(1))
            }
            .to_string(),
            "val a = 1"
        );
        assert_eq!(Value::Function(CallKey::new("add", 2)).to_string(), "fun add/2");
    }
}
