//! File operation tools: read_file, write_file
//!
//! Both go through the [`PathGuard`] before touching the filesystem and
//! then operate on the path the guard returned.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use toolgate_application::{Sandbox, Tool, ToolContext, ToolError, parse_input};
use toolgate_domain::{Policy, ToolDefinition, cap_with_marker};
use tracing::debug;

use crate::sandbox::PathGuard;

/// Tool name constants
pub const READ_FILE: &str = "read_file";
pub const WRITE_FILE: &str = "write_file";

/// Maximum file size to read (10 MB)
const MAX_READ_SIZE: u64 = 10 * 1024 * 1024;

#[derive(Debug, Deserialize)]
struct ReadArgs {
    path: PathBuf,
    /// Line to start from (0-indexed)
    #[serde(default)]
    offset: usize,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct WriteArgs {
    path: PathBuf,
    content: String,
    #[serde(default)]
    create_dirs: bool,
    #[serde(default)]
    append: bool,
}

fn io_error(action: &str, path: &std::path::Path, e: std::io::Error) -> ToolError {
    ToolError::Execution(format!("Failed to {} {}: {}", action, path.display(), e))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReadFileTool;

impl ReadFileTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(READ_FILE, "Read the contents of a file at the specified path")
            .with_input_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string", "description": "Path to the file to read"},
                    "offset": {"type": "integer", "description": "Line number to start reading from (0-indexed)"},
                    "limit": {"type": "integer", "description": "Maximum number of lines to read"}
                },
                "required": ["path"]
            }))
    }

    async fn execute(
        &self,
        _ctx: &ToolContext,
        input: serde_json::Value,
        _sandbox: &dyn Sandbox,
        policy: &Policy,
    ) -> Result<String, ToolError> {
        let args: ReadArgs = parse_input(input)?;
        let path = PathGuard::new(policy).check_read(&args.path)?;

        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| io_error("stat", &path, e))?;
        if !metadata.is_file() {
            return Err(ToolError::InvalidInput(format!(
                "'{}' is not a file",
                path.display()
            )));
        }
        if metadata.len() > MAX_READ_SIZE {
            return Err(ToolError::Execution(format!(
                "File too large ({} bytes). Maximum size is {} bytes",
                metadata.len(),
                MAX_READ_SIZE
            )));
        }

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| io_error("read", &path, e))?;
        let content = String::from_utf8_lossy(&bytes);

        let selected = if args.offset > 0 || args.limit.is_some() {
            let lines = content.lines().skip(args.offset);
            match args.limit {
                Some(limit) => lines.take(limit).collect::<Vec<_>>().join("\n"),
                None => lines.collect::<Vec<_>>().join("\n"),
            }
        } else {
            content.into_owned()
        };

        debug!(path = %path.display(), bytes = selected.len(), "Read file");
        Ok(cap_with_marker(&selected, policy.effective_max_output_bytes()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WriteFileTool;

impl WriteFileTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            WRITE_FILE,
            "Write content to a file at the specified path. Creates the file if it doesn't exist, or overwrites if it does.",
        )
        .with_input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Path to the file to write"},
                "content": {"type": "string", "description": "Content to write to the file"},
                "create_dirs": {"type": "boolean", "description": "Create parent directories if they don't exist"},
                "append": {"type": "boolean", "description": "Append instead of overwriting"}
            },
            "required": ["path", "content"]
        }))
    }

    async fn execute(
        &self,
        _ctx: &ToolContext,
        input: serde_json::Value,
        _sandbox: &dyn Sandbox,
        policy: &Policy,
    ) -> Result<String, ToolError> {
        let args: WriteArgs = parse_input(input)?;
        let path = PathGuard::new(policy).check_write(&args.path)?;

        if let Some(parent) = path.parent()
            && !parent.exists()
        {
            if !args.create_dirs {
                return Err(ToolError::Execution(format!(
                    "Parent directory does not exist: {}",
                    parent.display()
                )));
            }
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error("create", parent, e))?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .append(args.append)
            .truncate(!args.append)
            .open(&path)
            .await
            .map_err(|e| io_error("open", &path, e))?;
        file.write_all(args.content.as_bytes())
            .await
            .map_err(|e| io_error("write", &path, e))?;
        file.flush().await.map_err(|e| io_error("write", &path, e))?;

        debug!(path = %path.display(), bytes = args.content.len(), append = args.append, "Wrote file");
        Ok(format!(
            "{} {} bytes to {}",
            if args.append { "Appended" } else { "Wrote" },
            args.content.len(),
            path.display()
        ))
    }
}
