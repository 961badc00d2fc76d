//! Reduction engine — operator-precedence (shunting-yard) reducer.
//!
//! [`AstOnp`] holds one compilation's state. Resolved operators go onto a
//! single operator stack. Reducing an entry does two things in the same
//! step: it appends the entry's token to the postfix output and it combines
//! nodes on the AST stack. The postfix form and the tree therefore can never
//! drift apart.
//!
//! The bottom of the AST stack is the program's root [`Block`]; every `{`
//! pushes another block that collects statements until its `}`.

use std::rc::Rc;

use super::ast::{BinaryOp, Block, Function, Node};
use super::error::CompileError;
use super::operator::{Bracket, CallKey, Operator, OperatorKind, Registry};
use super::token::{Position, Token, TokenKind};
use crate::report::Report;

/// A concrete token occurrence paired with the operator it resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorStackEntry {
    pub token: Token,
    pub operator: Operator,
}

impl OperatorStackEntry {
    pub fn new(token: Token, operator: Operator) -> Self {
        Self { token, operator }
    }
}

/// State of a single compilation.
pub struct AstOnp<'r> {
    output: Vec<Token>,
    stack: Vec<OperatorStackEntry>,
    nodes: Vec<Node>,
    registry: Registry,
    last_token: Option<Token>,
    report: &'r dyn Report,
}

impl<'r> AstOnp<'r> {
    pub fn new(report: &'r dyn Report) -> Self {
        Self {
            output: Vec::new(),
            stack: Vec::new(),
            nodes: vec![Node::Block(Block::new())],
            registry: Registry::builtin(),
            last_token: None,
            report,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Postfix tokens emitted so far.
    pub fn output(&self) -> &[Token] {
        &self.output
    }

    pub fn into_output(self) -> Vec<Token> {
        self.output
    }

    pub fn stack(&self) -> &[OperatorStackEntry] {
        &self.stack
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn last_token(&self) -> Option<&Token> {
        self.last_token.as_ref()
    }

    /// Offer a completed word to operator resolution. Returns `false` when
    /// the word is not an operator; the caller then emits it as a literal.
    pub fn offer_word(&mut self, token: &Token) -> Result<bool, CompileError> {
        let resolved = self.resolve_word(&token.text);
        self.report.info(&format!(
            "token `{}` at {} handled as {}",
            token.text,
            token.position,
            if resolved.is_some() { "operator" } else { "literal" }
        ));
        match resolved {
            Some(operator) => {
                self.handle_operator(token.clone(), operator)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Handle a single operator character.
    pub fn handle_symbol(&mut self, token: Token) -> Result<(), CompileError> {
        match self.registry.symbol(&token.text).cloned() {
            Some(operator) => self.handle_operator(token, operator),
            None => Err(CompileError::lex(
                format!("lacking handling for token `{}` at {}", token.text, token.position),
                token.position.line,
                token.position.col,
            )),
        }
    }

    /// Emit a literal: integer literals become primitives, anything else a
    /// variable reference.
    pub fn push_literal(&mut self, token: Token) -> Result<(), CompileError> {
        let node = if token.text.chars().all(|c| c.is_ascii_digit()) {
            let value = token.text.parse::<i64>().map_err(|_| {
                CompileError::lex(
                    format!("integer literal out of range: {}", token.text),
                    token.position.line,
                    token.position.col,
                )
            })?;
            Node::Primitive(value)
        } else {
            Node::Variable {
                name: token.text.clone(),
                position: token.position,
            }
        };
        self.nodes.push(node);
        self.output.push(token.clone());
        self.last_token = Some(token);
        Ok(())
    }

    /// Flush everything left at end of input and hand back the root block.
    pub fn finish(&mut self) -> Result<Block, CompileError> {
        while let Some(entry) = self.stack.pop() {
            if entry.operator.is_opening() {
                return Err(mismatched_open_close(&entry.token));
            }
            self.reduce(entry)?;
        }
        let end = self
            .last_token
            .as_ref()
            .map(|t| t.position)
            .unwrap_or_default();
        self.append_statement(end)?;

        if self.nodes.len() == 1 {
            if let Some(Node::Block(root)) = self.nodes.pop() {
                return Ok(root);
            }
        }
        match self.nodes.last() {
            Some(Node::FunctionDeclaration(function)) => Err(CompileError::syntax_at(
                format!("function `{}` declared without a body", function.name),
                function.position,
            )),
            _ => Err(CompileError::syntax_at("incomplete program", end)),
        }
    }

    fn resolve_word(&self, word: &str) -> Option<Operator> {
        self.registry.symbol(word).cloned()
    }

    /// Turn the word just emitted into a pending call when `(` follows it
    /// and a callable of that name is in scope. Names being declared by
    /// `fun`/`val` stay plain names.
    fn promote_to_call(&mut self) -> Option<OperatorStackEntry> {
        let word = self
            .last_token
            .as_ref()
            .filter(|t| t.kind == TokenKind::Literal)?
            .clone();
        let naming_declaration = self.stack.last().is_some_and(|top| {
            matches!(
                top.operator.kind,
                OperatorKind::FunctionDeclaration { .. } | OperatorKind::VariableDeclaration
            )
        });
        let names_variable = matches!(
            self.nodes.last(),
            Some(Node::Variable { name, .. }) if *name == word.text
        );
        if naming_declaration
            || !names_variable
            || self.output.last() != Some(&word)
            || !self.is_callable(&word.text)
        {
            return None;
        }
        self.nodes.pop();
        self.output.pop();
        self.report
            .info(&format!("token `{}` at {} promoted to call", word.text, word.position));
        let call = Operator::call(word.text.as_str(), 0);
        Some(OperatorStackEntry::new(word, call))
    }

    /// Whether `name` is a builtin or declared in any enclosing block.
    fn is_callable(&self, name: &str) -> bool {
        self.registry.has_callable(name)
            || self.nodes.iter().any(|node| match node {
                Node::Block(block) => block.operators.has_callable(name),
                _ => false,
            })
    }

    fn handle_operator(&mut self, token: Token, operator: Operator) -> Result<(), CompileError> {
        let kind = operator.kind;
        match kind {
            OperatorKind::Parenthesis(Bracket::Open) => {
                if let Some(call) = self.promote_to_call() {
                    self.stack.push(call);
                }
                self.stack
                    .push(OperatorStackEntry::new(token.clone(), operator));
            }
            OperatorKind::FunctionCall { .. }
            | OperatorKind::VariableDeclaration
            | OperatorKind::FunctionDeclaration { .. } => {
                self.stack
                    .push(OperatorStackEntry::new(token.clone(), operator));
            }
            OperatorKind::Parenthesis(Bracket::Close) => self.close_parenthesis(&token)?,
            OperatorKind::Math => self.regular(token.clone(), operator)?,
            OperatorKind::Separator => self.separator(token.clone(), operator)?,
            OperatorKind::Assignment => self.assignment(token.clone(), operator)?,
            OperatorKind::EndOfLine => self.end_of_line(&token)?,
            OperatorKind::CodeBlock(Bracket::Open) => {
                self.stack
                    .push(OperatorStackEntry::new(token.clone(), operator));
                self.nodes.push(Node::Block(Block::new()));
            }
            OperatorKind::CodeBlock(Bracket::Close) => self.close_block(&token)?,
        }
        self.last_token = Some(token);
        Ok(())
    }

    /// Binary operator: reduce everything at the same or higher priority,
    /// then push. `<=` keeps equal priorities left-associative.
    fn regular(&mut self, token: Token, operator: Operator) -> Result<(), CompileError> {
        while let Some(top) = self.stack.last() {
            if top.operator.is_reducible() && operator.priority <= top.operator.priority {
                self.reduce_top()?;
            } else {
                break;
            }
        }
        self.stack.push(OperatorStackEntry::new(token, operator));
        Ok(())
    }

    fn close_parenthesis(&mut self, token: &Token) -> Result<(), CompileError> {
        self.reduce_to_open()?;
        match self.stack.last() {
            Some(top) if top.operator.kind == OperatorKind::Parenthesis(Bracket::Open) => {
                self.stack.pop();
            }
            _ => {
                return Err(CompileError::syntax_at(
                    format!("mismatched parentheses at {}", token.position),
                    token.position,
                ))
            }
        }

        let owner_counts = self
            .stack
            .last()
            .is_some_and(|top| top.operator.arguments().is_some());
        if owner_counts {
            if let Some(mut entry) = self.stack.pop() {
                let trailing_argument = !self
                    .last_token
                    .as_ref()
                    .is_some_and(|t| t.is(",") || t.is("("));
                if trailing_argument {
                    entry.operator = entry.operator.with_extra_argument();
                }
                self.reduce(entry)?;
            }
        }
        Ok(())
    }

    fn separator(&mut self, token: Token, operator: Operator) -> Result<(), CompileError> {
        self.reduce_to_open()?;
        let depth = self.stack.len();
        let inside_call = depth >= 2
            && self.stack[depth - 1].operator.kind == OperatorKind::Parenthesis(Bracket::Open)
            && self.stack[depth - 2].operator.arguments().is_some();
        if !inside_call {
            return Err(CompileError::syntax_at(
                format!(
                    "misplaced separator `{}` at {}, should be inside function call parentheses",
                    token.text, token.position
                ),
                token.position,
            ));
        }
        let owner = &mut self.stack[depth - 2];
        owner.operator = owner.operator.with_extra_argument();
        self.stack.push(OperatorStackEntry::new(token, operator));
        Ok(())
    }

    fn assignment(&mut self, token: Token, operator: Operator) -> Result<(), CompileError> {
        let declares = self
            .stack
            .last()
            .is_some_and(|top| top.operator.kind == OperatorKind::VariableDeclaration);
        if !declares {
            return Err(CompileError::syntax_at(
                format!("invalid assignment target at {}", token.position),
                token.position,
            ));
        }
        self.reduce_top()?;
        self.stack.push(OperatorStackEntry::new(token, operator));
        Ok(())
    }

    fn end_of_line(&mut self, token: &Token) -> Result<(), CompileError> {
        while let Some(top) = self.stack.last() {
            if top.operator.kind == OperatorKind::CodeBlock(Bracket::Open) {
                break;
            }
            self.reduce_top()?;
        }
        self.output.push(token.respelled("EOL"));
        self.append_statement(token.position)
    }

    fn close_block(&mut self, token: &Token) -> Result<(), CompileError> {
        self.reduce_to_open()?;
        match self.stack.last() {
            Some(top) if top.operator.kind == OperatorKind::CodeBlock(Bracket::Open) => {
                self.stack.pop();
            }
            _ => {
                return Err(CompileError::syntax_at(
                    format!("mismatched braces at {}", token.position),
                    token.position,
                ))
            }
        }
        // `{ x plus 1 }` without a final `;`
        self.append_statement(token.position)?;

        let body = match self.nodes.pop() {
            Some(Node::Block(body)) => body,
            other => return Err(unexpected(other.as_ref(), "code block", token.position)),
        };
        match self.nodes.pop() {
            Some(Node::FunctionDeclaration(function)) => {
                let mut function = Rc::try_unwrap(function).unwrap_or_else(|rc| (*rc).clone());
                function.body = body;
                self.report.info(&format!(
                    "declared function {} at {}",
                    function.key(),
                    function.position
                ));
                match self.nodes.last_mut() {
                    Some(Node::Block(enclosing)) => {
                        enclosing.push(Node::FunctionDeclaration(Rc::new(function)));
                        Ok(())
                    }
                    other => Err(unexpected(other.map(|n| &*n), "code block", token.position)),
                }
            }
            Some(Node::Block(mut enclosing)) => {
                enclosing.push(Node::Block(body));
                self.nodes.push(Node::Block(enclosing));
                Ok(())
            }
            other => Err(CompileError::syntax_at(
                format!(
                    "code block at {} cannot follow {}",
                    token.position,
                    other.as_ref().map_or("nothing", Node::label)
                ),
                token.position,
            )),
        }
    }

    /// Move a finished statement into the innermost block. Nothing to do
    /// when the top is already a block, or a function declaration still
    /// waiting for its body.
    fn append_statement(&mut self, position: Position) -> Result<(), CompileError> {
        match self.nodes.last() {
            None | Some(Node::Block(_)) | Some(Node::FunctionDeclaration(_)) => return Ok(()),
            Some(_) => {}
        }
        let Some(statement) = self.nodes.pop() else {
            return Ok(());
        };
        match self.nodes.last_mut() {
            Some(Node::Block(block)) => {
                block.push(statement);
                Ok(())
            }
            other => Err(CompileError::syntax_at(
                format!(
                    "malformed statement at {}: {} follows {}",
                    position,
                    statement.label(),
                    other.map_or("nothing", |n| n.label())
                ),
                position,
            )),
        }
    }

    fn reduce_to_open(&mut self) -> Result<(), CompileError> {
        while let Some(top) = self.stack.last() {
            if top.operator.is_opening() {
                break;
            }
            self.reduce_top()?;
        }
        Ok(())
    }

    fn reduce_top(&mut self) -> Result<(), CompileError> {
        match self.stack.pop() {
            Some(entry) => self.reduce(entry),
            None => Ok(()),
        }
    }

    /// Emit one operator to the postfix output and build its AST node.
    fn reduce(&mut self, entry: OperatorStackEntry) -> Result<(), CompileError> {
        let OperatorStackEntry { token, operator } = entry;
        self.report.info(&format!(
            "reducing `{}` at {}",
            token.text.escape_default(),
            token.position
        ));
        match operator.kind {
            // end-of-line is handled on arrival and never stacked
            OperatorKind::Parenthesis(_)
            | OperatorKind::CodeBlock(_)
            | OperatorKind::EndOfLine => {
                return Err(mismatched_open_close(&token));
            }
            OperatorKind::Separator => {}
            OperatorKind::Math => {
                let op = BinaryOp::from_symbol(&operator.symbol).ok_or_else(|| {
                    CompileError::syntax_at(
                        format!("unknown arithmetic operator `{}`", operator.symbol),
                        token.position,
                    )
                })?;
                let right = self.pop_expression(&token)?;
                let left = self.pop_expression(&token)?;
                self.nodes.push(Node::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                    position: token.position,
                });
            }
            OperatorKind::FunctionCall { arguments } => {
                let mut args = Vec::with_capacity(arguments);
                for _ in 0..arguments {
                    args.push(self.pop_expression(&token)?);
                }
                args.reverse();
                self.nodes.push(Node::Call {
                    key: CallKey::new(operator.symbol.as_str(), arguments),
                    arguments: args,
                    position: token.position,
                });
            }
            OperatorKind::VariableDeclaration => {
                let name = self.pop_name(&token, "variable name")?;
                self.nodes.push(Node::VariableDeclaration {
                    name,
                    value: None,
                    position: token.position,
                });
            }
            OperatorKind::Assignment => {
                let value = self.pop_expression(&token)?;
                match self.nodes.pop() {
                    Some(Node::VariableDeclaration {
                        name,
                        value: None,
                        position,
                    }) => self.nodes.push(Node::VariableDeclaration {
                        name,
                        value: Some(Box::new(value)),
                        position,
                    }),
                    other => {
                        return Err(CompileError::syntax_at(
                            format!(
                                "invalid assignment target at {}: expected variable declaration, found {}",
                                token.position,
                                other.as_ref().map_or("nothing", Node::label)
                            ),
                            token.position,
                        ))
                    }
                }
            }
            OperatorKind::FunctionDeclaration { arguments } => {
                let mut params = Vec::with_capacity(arguments);
                for _ in 0..arguments {
                    params.push(self.pop_name(&token, "parameter name")?);
                }
                params.reverse();
                let name = self.pop_name(&token, "function name")?;
                self.nodes.push(Node::FunctionDeclaration(Rc::new(Function {
                    name,
                    params,
                    body: Block::new(),
                    position: token.position,
                })));
            }
        }
        self.output.push(token);
        Ok(())
    }

    fn pop_expression(&mut self, token: &Token) -> Result<Node, CompileError> {
        match self.nodes.pop() {
            Some(node) if node.is_expression() => Ok(node),
            other => Err(CompileError::syntax_at(
                format!(
                    "not enough operands for `{}` at {}: found {}",
                    token.text.escape_default(),
                    token.position,
                    other.as_ref().map_or("nothing", Node::label)
                ),
                token.position,
            )),
        }
    }

    fn pop_name(&mut self, token: &Token, what: &str) -> Result<String, CompileError> {
        match self.nodes.pop() {
            Some(Node::Variable { name, .. }) => Ok(name),
            other => Err(CompileError::syntax_at(
                format!(
                    "invalid {what} for `{}` at {}: expected a name, found {}",
                    token.text,
                    token.position,
                    other.as_ref().map_or("nothing", Node::label)
                ),
                token.position,
            )),
        }
    }
}

fn mismatched_open_close(token: &Token) -> CompileError {
    CompileError::syntax_at(
        format!(
            "mismatched open close operator in expression: operator {} at position {}",
            token.text, token.position
        ),
        token.position,
    )
}

fn unexpected(node: Option<&Node>, expected: &str, position: Position) -> CompileError {
    CompileError::syntax_at(
        format!(
            "expected {expected} at {position}, found {}",
            node.map_or("nothing", Node::label)
        ),
        position,
    )
}
