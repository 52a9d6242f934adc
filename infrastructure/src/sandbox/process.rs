//! Direct-process sandbox
//!
//! Runs the program as a child of this process. Confinement is limited to
//! the working-directory check, the deadline and the output cap; network
//! posture is not enforced at this level.

use async_trait::async_trait;
use tokio::process::Command as ProcessCommand;
use tokio_util::sync::CancellationToken;
use toolgate_application::{Sandbox, SandboxError};
use toolgate_domain::{Command, ExecResult, Policy};
use tracing::debug;

use super::path_guard::check_allowed;
use super::runner::{prepare, run};

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessSandbox;

impl ProcessSandbox {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Sandbox for ProcessSandbox {
    fn name(&self) -> &str {
        "process"
    }

    async fn exec(
        &self,
        cancel: &CancellationToken,
        command: &Command,
        policy: &Policy,
    ) -> Result<ExecResult, SandboxError> {
        command.validate().map_err(|_| SandboxError::EmptyProgram)?;
        let work_dir = command
            .work_dir
            .as_deref()
            .map(|dir| check_allowed(dir, &policy.allowed_paths))
            .transpose()?;

        let mut cmd = ProcessCommand::new(&command.program);
        cmd.args(&command.args).envs(&command.env);
        if let Some(dir) = &work_dir {
            cmd.current_dir(dir);
        }
        prepare(&mut cmd, command.stdin.is_some());

        let timeout = policy.effective_timeout();
        debug!(
            sandbox = "process",
            command = %command.display(),
            work_dir = ?work_dir,
            timeout_ms = timeout.as_millis() as u64,
            "Executing command"
        );

        let outcome = run(
            cmd,
            &command.program,
            command.stdin.clone(),
            cancel,
            timeout,
            policy.effective_max_output_bytes(),
        )
        .await;
        Ok(outcome.result)
    }
}
