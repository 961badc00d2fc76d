//! Shunt — a shunting-yard expression compiler.
//!
//! Source text is read character by character and reduced with operator
//! precedence into two renderings at once: a postfix token stream and an
//! executable syntax tree. The tree is then evaluated with integer
//! arithmetic, user-declared variables and arity-overloaded functions.

pub mod compiler;
pub mod config;
pub mod pad;
pub mod report;

pub use compiler::{CompileError, CompileResult, Compiler, ErrorKind, Value};
pub use config::Config;

/// Compile `source` with default settings, reporting to stderr.
pub fn compile(source: &str) -> CompileResult {
    Compiler::new(report::console_report()).compile(source)
}
