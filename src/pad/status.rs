//! Status line — outcome of the last compile.

#[derive(Debug, Clone, PartialEq)]
pub enum CompileStatus {
    Idle,
    Ok,
    Error(String),
}

#[derive(Debug, Clone)]
pub struct StatusInfo {
    pub compile_status: CompileStatus,
    /// Compiles run this session.
    pub compiles: usize,
}

impl StatusInfo {
    pub fn indicator(&self) -> &'static str {
        match self.compile_status {
            CompileStatus::Idle => "--",
            CompileStatus::Ok => "OK",
            CompileStatus::Error(_) => "ERR",
        }
    }

    /// Text shown after the indicator.
    pub fn message(&self) -> String {
        match &self.compile_status {
            CompileStatus::Idle => "Ctrl-R / F5 compile · Esc quit".to_string(),
            CompileStatus::Ok => format!("compiled ({} this session)", self.compiles),
            CompileStatus::Error(message) => message.clone(),
        }
    }
}

impl Default for StatusInfo {
    fn default() -> Self {
        Self {
            compile_status: CompileStatus::Idle,
            compiles: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_by_default() {
        let status = StatusInfo::default();
        assert_eq!(status.indicator(), "--");
        assert!(status.message().contains("compile"));
    }

    #[test]
    fn error_shows_message() {
        let status = StatusInfo {
            compile_status: CompileStatus::Error("[1:6] Syntax: mismatched parentheses".into()),
            compiles: 1,
        };
        assert_eq!(status.indicator(), "ERR");
        assert_eq!(status.message(), "[1:6] Syntax: mismatched parentheses");
    }

    #[test]
    fn ok_counts_compiles() {
        let status = StatusInfo {
            compile_status: CompileStatus::Ok,
            compiles: 3,
        };
        assert_eq!(status.indicator(), "OK");
        assert_eq!(status.message(), "compiled (3 this session)");
    }
}
