//! Expression compiler — source text → postfix tokens + AST → value.
//!
//! A single pass over the characters drives the shunting-yard reducer, which
//! produces the postfix ("ONP") rendering and the syntax tree together.
//! Evaluation of the tree is deferred until [`CompileResult::run`].

pub mod ast;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod operator;
pub mod reducer;
pub mod token;

pub use ast::{BinaryOp, Block, Function, Node};
pub use error::{CompileError, ErrorKind};
pub use eval::{Scope, Value};
pub use operator::{CallKey, Operator, OperatorKind, Registry};
pub use token::{Position, Token, TokenKind};

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::config::Config;
use crate::report::Report;
use lexer::Lexer;
use reducer::AstOnp;

/// Value rendered by [`CompileResult::run`] when compiling or evaluating fails.
pub const FAILURE_SENTINEL: &str = "-1";

/// The compiler. Holds the diagnostics sink and evaluation settings; every
/// call to [`Compiler::compile`] starts from fresh state.
pub struct Compiler {
    report: Rc<dyn Report>,
    config: Config,
}

impl Compiler {
    pub fn new(report: Rc<dyn Report>) -> Self {
        Self::with_config(report, Config::default())
    }

    pub fn with_config(report: Rc<dyn Report>, config: Config) -> Self {
        Self { report, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compile `source`. Never fails: errors are reported and folded into
    /// the result.
    pub fn compile(&self, source: &str) -> CompileResult {
        let mut state = AstOnp::new(self.report.as_ref());
        let mut lexer = Lexer::new(state.registry());
        let outcome = lexer
            .read_source(source, &mut state)
            .and_then(|()| state.finish());
        let output = state.into_output();

        let (program, error) = match outcome {
            Ok(program) => (Some(program), None),
            Err(error) => {
                self.report.error(&error);
                self.report.warning(&format!("compilation failed: {error}"));
                (None, Some(error))
            }
        };
        CompileResult {
            output,
            program,
            error,
            report: Rc::clone(&self.report),
            globals: self.config.globals.clone(),
        }
    }
}

/// Outcome of one compilation.
pub struct CompileResult {
    output: Vec<Token>,
    program: Option<Block>,
    error: Option<CompileError>,
    report: Rc<dyn Report>,
    globals: BTreeMap<String, i64>,
}

impl CompileResult {
    /// Postfix tokens joined by single spaces, `EOL` between statements.
    /// On failure, whatever was emitted before the error.
    pub fn intermediate(&self) -> String {
        let texts: Vec<&str> = self.output.iter().map(|t| t.text.as_str()).collect();
        texts.join(" ")
    }

    pub fn tokens(&self) -> &[Token] {
        &self.output
    }

    /// Evaluate the program in a fresh root scope.
    pub fn evaluate(&self) -> Result<Value, CompileError> {
        match (&self.program, &self.error) {
            (Some(program), _) => eval::eval_block(program, &Scope::root(&self.globals)),
            (None, Some(error)) => Err(error.clone()),
            (None, None) => Err(CompileError::eval("nothing to evaluate", 0, 0)),
        }
    }

    /// Evaluate, reporting an evaluation failure. A failed compilation
    /// yields its own error without reporting it again.
    pub fn execute(&self) -> Result<Value, CompileError> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        self.evaluate().map_err(|error| {
            self.report.error(&error);
            self.report.warning(&format!("evaluation failed: {error}"));
            error
        })
    }

    /// Evaluate and render the result; [`FAILURE_SENTINEL`] on failure.
    pub fn run(&self) -> String {
        self.execute()
            .map_or_else(|_| FAILURE_SENTINEL.to_string(), |value| value.to_string())
    }

    pub fn error(&self) -> Option<&CompileError> {
        self.error.as_ref()
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn program(&self) -> Option<&Block> {
        self.program.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{LoggerReport, MemoryLogger};

    fn compiler() -> (Compiler, MemoryLogger) {
        let logger = MemoryLogger::default();
        let report = Rc::new(LoggerReport::new(logger.clone(), false));
        (Compiler::new(report), logger)
    }

    #[test]
    fn compile_and_run() {
        let (compiler, logger) = compiler();
        let result = compiler.compile("(2+3)*5");
        assert!(result.is_ok());
        assert_eq!(result.intermediate(), "2 3 + 5 * EOL");
        assert_eq!(result.run(), "25");
        assert!(logger.messages().is_empty());
    }

    #[test]
    fn run_is_repeatable() {
        let (compiler, _) = compiler();
        let result = compiler.compile("val a = 2\na ^ 3");
        assert_eq!(result.run(), "8");
        assert_eq!(result.run(), "8");
        assert_eq!(result.evaluate().unwrap(), Value::Int(8));
    }

    #[test]
    fn compile_failure_reports_once() {
        let (compiler, logger) = compiler();
        let result = compiler.compile("1 + 2)");
        assert!(!result.is_ok());
        assert_eq!(result.run(), FAILURE_SENTINEL);
        assert!(result.program().is_none());
        let messages = logger.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with("E: [1:6] Syntax: mismatched parentheses"));
        assert!(messages[1].starts_with("W: compilation failed"));
    }

    #[test]
    fn partial_output_survives_failure() {
        let (compiler, _) = compiler();
        let result = compiler.compile("1 + 2)");
        assert_eq!(result.intermediate(), "1 2 +");
    }

    #[test]
    fn evaluation_failure_reports() {
        let (compiler, logger) = compiler();
        let result = compiler.compile("nope + 1");
        assert!(result.is_ok());
        assert_eq!(result.run(), FAILURE_SENTINEL);
        let messages = logger.messages();
        assert!(messages[0].contains("Eval: variable not found: nope"));
        assert!(messages[1].starts_with("W: evaluation failed"));
    }

    #[test]
    fn globals_come_from_config() {
        let logger = MemoryLogger::default();
        let report = Rc::new(LoggerReport::new(logger, false));
        let mut config = Config::default();
        config.globals.insert("answer".to_string(), 42);
        let compiler = Compiler::with_config(report, config);
        assert_eq!(compiler.compile("answer - magicnumber").run(), "-14");
    }

    #[test]
    fn compilations_are_independent() {
        let (compiler, _) = compiler();
        assert!(compiler.compile("fun f(x) { x }").is_ok());
        let result = compiler.compile("f(1)");
        assert_eq!(result.intermediate(), "f 1 EOL");
        assert!(!result.is_ok());
    }
}
