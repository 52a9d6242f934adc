//! Execution request and outcome.

use crate::core::error::DomainError;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// A request to run one program. Not tied to any shell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
    pub work_dir: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
}

impl Command {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    /// `sh -c <script>`
    pub fn shell(script: impl Into<String>) -> Self {
        Self::new("sh").arg("-c").arg(script)
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = Some(stdin.into());
        self
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.program.trim().is_empty() {
            return Err(DomainError::InvalidCommand("program is empty".to_string()));
        }
        Ok(())
    }

    /// Human-readable rendering for logs.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Outcome of a sandboxed execution.
///
/// Returned for every expected failure mode (non-zero exit, timeout,
/// process start failure); `error` annotates the latter two.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
    pub error: Option<String>,
}

impl ExecResult {
    /// A result for a process that could not be run or did not finish.
    pub fn failed(error: impl Into<String>, duration: Duration) -> Self {
        Self {
            exit_code: -1,
            duration,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0 && self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_program_is_invalid() {
        assert!(Command::new("").validate().is_err());
        assert!(Command::new("   ").validate().is_err());
        assert!(Command::new("ls").validate().is_ok());
    }

    #[test]
    fn test_shell_builder() {
        let cmd = Command::shell("echo hi").with_env("A", "1");
        assert_eq!(cmd.program, "sh");
        assert_eq!(cmd.args, vec!["-c", "echo hi"]);
        assert_eq!(cmd.env.get("A").map(String::as_str), Some("1"));
        assert_eq!(cmd.display(), "sh -c echo hi");
    }

    #[test]
    fn test_failed_result() {
        let result = ExecResult::failed("timed out", Duration::from_secs(1));
        assert_eq!(result.exit_code, -1);
        assert!(!result.is_success());
        assert_eq!(result.error.as_deref(), Some("timed out"));
    }
}
