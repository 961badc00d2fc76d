//! Reporting — diagnostics sinks used by the compiler.
//!
//! The compiler talks to a [`Report`]; the default [`LoggerReport`] prefixes
//! each message with its severity and hands it to a [`Logger`]. Loggers can
//! be stacked: an [`InterceptingLogger`] copies every line to a callback
//! (e.g. a UI pane) before forwarding it.

pub mod log_buffer;

pub use log_buffer::{LogBuffer, LogEntry};

use std::cell::RefCell;
use std::rc::Rc;

use crate::compiler::CompileError;

/// Diagnostics sink consumed by the compiler.
///
/// `error` marks the point where a compile or run aborts; the caller then
/// propagates the same error value and the top level turns it into a
/// failure result.
pub trait Report {
    fn info(&self, message: &str);
    fn warning(&self, message: &str);
    fn error(&self, error: &CompileError);
}

/// A line-oriented log sink.
pub trait Logger {
    fn log(&self, message: &str);
}

/// Writes every line to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, message: &str) {
        eprintln!("{message}");
    }
}

/// Hands each line to `intercept`, then forwards it to the wrapped logger.
pub struct InterceptingLogger<L: Logger> {
    intercept: Box<dyn Fn(&str)>,
    inner: L,
}

impl<L: Logger> InterceptingLogger<L> {
    pub fn new(intercept: impl Fn(&str) + 'static, inner: L) -> Self {
        Self {
            intercept: Box::new(intercept),
            inner,
        }
    }
}

impl<L: Logger> Logger for InterceptingLogger<L> {
    fn log(&self, message: &str) {
        (self.intercept)(message);
        self.inner.log(message);
    }
}

/// Appends every line to a shared [`LogBuffer`].
#[derive(Debug, Clone, Default)]
pub struct MemoryLogger {
    buffer: Rc<RefCell<LogBuffer>>,
}

impl MemoryLogger {
    pub fn new(buffer: Rc<RefCell<LogBuffer>>) -> Self {
        Self { buffer }
    }

    pub fn buffer(&self) -> Rc<RefCell<LogBuffer>> {
        Rc::clone(&self.buffer)
    }

    pub fn messages(&self) -> Vec<String> {
        self.buffer.borrow().messages()
    }
}

impl Logger for MemoryLogger {
    fn log(&self, message: &str) {
        self.buffer.borrow_mut().push(message);
    }
}

/// Default [`Report`]: severity-prefixed lines to a [`Logger`].
/// `info` lines are dropped unless `verbose` is set.
pub struct LoggerReport<L: Logger> {
    logger: L,
    verbose: bool,
}

impl<L: Logger> LoggerReport<L> {
    pub fn new(logger: L, verbose: bool) -> Self {
        Self { logger, verbose }
    }

    pub fn logger(&self) -> &L {
        &self.logger
    }
}

impl<L: Logger> Report for LoggerReport<L> {
    fn info(&self, message: &str) {
        if self.verbose {
            self.logger.log(&format!("I: {message}"));
        }
    }

    fn warning(&self, message: &str) {
        self.logger.log(&format!("W: {message}"));
    }

    fn error(&self, error: &CompileError) {
        self.logger.log(&format!("E: {error}"));
    }
}

/// Console report, info suppressed.
pub fn console_report() -> Rc<dyn Report> {
    Rc::new(LoggerReport::new(ConsoleLogger, false))
}
