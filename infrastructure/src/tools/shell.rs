//! Shell tool: shell
//!
//! Runs `sh -c <command>` through whichever sandbox the caller supplies.
//! A non-zero exit or a timeout is an execution failure: the rendered
//! output (stdout, stderr, exit code) goes back to the model as an error
//! result and the turn continues.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use toolgate_application::{Sandbox, Tool, ToolContext, ToolError, parse_input};
use toolgate_domain::{Command, ExecResult, Policy, ToolDefinition};
use tracing::debug;

/// Tool name constant
pub const SHELL: &str = "shell";

#[derive(Debug, Deserialize)]
struct ShellArgs {
    command: String,
    #[serde(default)]
    work_dir: Option<PathBuf>,
    /// Can only shorten the policy timeout
    #[serde(default)]
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ShellTool;

impl ShellTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            SHELL,
            "Execute a shell command and return its stdout, stderr and exit code.",
        )
        .with_input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "command": {"type": "string", "description": "Command line passed to sh -c"},
                "work_dir": {"type": "string", "description": "Working directory"},
                "timeout_secs": {"type": "integer", "description": "Timeout in seconds (capped by policy)"}
            },
            "required": ["command"]
        }))
    }

    async fn execute(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
        sandbox: &dyn Sandbox,
        policy: &Policy,
    ) -> Result<String, ToolError> {
        let args: ShellArgs = parse_input(input)?;
        if args.command.trim().is_empty() {
            return Err(ToolError::InvalidInput("command is empty".into()));
        }

        let mut command = Command::shell(&args.command);
        if let Some(dir) = args.work_dir {
            command = command.with_work_dir(dir);
        }

        let mut policy = policy.clone();
        if let Some(secs) = args.timeout_secs.filter(|s| *s > 0) {
            let requested = Duration::from_secs(secs);
            if requested < policy.effective_timeout() {
                policy = policy.with_timeout(requested);
            }
        }

        debug!(sandbox = sandbox.name(), command = %args.command, "Running shell command");
        let result = sandbox.exec(&ctx.cancel, &command, &policy).await?;
        if ctx.cancel.is_cancelled() {
            return Err(ToolError::Cancelled);
        }

        let text = render(&result);
        if result.is_success() {
            Ok(text)
        } else {
            Err(ToolError::Execution(text))
        }
    }
}

/// Render an execution outcome as text for the model.
pub fn render(result: &ExecResult) -> String {
    let mut out = String::new();
    out.push_str(&result.stdout);

    if !result.stderr.is_empty() {
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("[stderr]\n");
        out.push_str(&result.stderr);
    }

    let mut trailer = Vec::new();
    if result.exit_code != 0 {
        trailer.push(format!("[exit code: {}]", result.exit_code));
    }
    if let Some(error) = &result.error {
        trailer.push(format!("[error: {}]", error));
    }
    if !trailer.is_empty() {
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&trailer.join("\n"));
    }

    if out.is_empty() {
        out.push_str("(no output)");
    }
    out
}
