//! Container-isolated sandbox
//!
//! Wraps each command in `<runtime> run --rm` with a locked-down profile:
//!
//! | Control | Flag |
//! |---------|------|
//! | read-only root filesystem | `--read-only` |
//! | writable scratch space | `--tmpfs /tmp:rw,size=<tmpfs_size>` |
//! | resource ceilings | `--memory`, `--cpus`, `--pids-limit` |
//! | no network (`NetworkAccess::Deny`) | `--network none` |
//! | privileges | `--cap-drop ALL`, `--security-opt no-new-privileges` |
//! | working directory | `-v dir:dir[:ro] -w dir` |
//! | read-only paths | `-v path:path:ro` |
//!
//! The runtime binary is resolved once at construction. Because killing the
//! runtime client does not stop the container, interrupted runs are
//! followed by `<runtime> rm -f <name>`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command as ProcessCommand;
use tokio_util::sync::CancellationToken;
use toolgate_application::{Sandbox, SandboxError};
use toolgate_domain::{Command, ExecResult, NetworkAccess, Policy};
use tracing::{debug, info, warn};

use super::path_guard::{check_allowed, check_writable, resolve_path};
use super::runner::{prepare, run};

/// Probed in order; the first one on `PATH` wins.
pub const RUNTIME_CANDIDATES: [&str; 3] = ["docker", "podman", "nerdctl"];

const REMOVE_TIMEOUT: Duration = Duration::from_secs(10);

static CONTAINER_SEQ: AtomicU64 = AtomicU64::new(0);

/// Container resource profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    pub image: String,
    /// `--memory` value (e.g. "512m")
    pub memory: String,
    /// `--cpus` value (e.g. "1.0")
    pub cpus: String,
    pub pids_limit: u32,
    /// Size of the `/tmp` tmpfs mount
    pub tmpfs_size: String,
    /// Explicit runtime binary; skips probing
    pub runtime: Option<String>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            image: "alpine:3".to_string(),
            memory: "512m".to_string(),
            cpus: "1.0".to_string(),
            pids_limit: 256,
            tmpfs_size: "64m".to_string(),
            runtime: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContainerSandbox {
    runtime: PathBuf,
    name: String,
    config: ContainerConfig,
}

impl ContainerSandbox {
    /// Resolve the runtime and build the sandbox. Fails fast when no
    /// runtime is installed.
    pub fn new(config: ContainerConfig) -> Result<Self, SandboxError> {
        let runtime = match &config.runtime {
            Some(explicit) => which::which(explicit)
                .map_err(|_| SandboxError::RuntimeNotFound(explicit.clone()))?,
            None => detect_runtime()
                .ok_or_else(|| SandboxError::RuntimeNotFound(RUNTIME_CANDIDATES.join(", ")))?,
        };
        info!(runtime = %runtime.display(), image = %config.image, "Container runtime resolved");
        Ok(Self::with_runtime(runtime, config))
    }

    /// Use a known runtime binary without probing.
    pub fn with_runtime(runtime: impl Into<PathBuf>, config: ContainerConfig) -> Self {
        let runtime = runtime.into();
        let binary = runtime
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| runtime.display().to_string());
        Self {
            name: format!("container:{}", binary),
            runtime,
            config,
        }
    }

    pub fn runtime(&self) -> &Path {
        &self.runtime
    }

    /// Arguments for `<runtime> run ...`. `work_dir` and `read_only` must
    /// already be resolved.
    pub fn run_args(
        &self,
        container_name: &str,
        command: &Command,
        policy: &Policy,
        work_dir: Option<(&Path, bool)>,
        read_only: &[PathBuf],
    ) -> Vec<String> {
        let c = &self.config;
        let mut args: Vec<String> = vec![
            "run".into(),
            "--rm".into(),
            "--name".into(),
            container_name.into(),
            "--read-only".into(),
            "--tmpfs".into(),
            format!("/tmp:rw,size={}", c.tmpfs_size),
            "--memory".into(),
            c.memory.clone(),
            "--cpus".into(),
            c.cpus.clone(),
            "--pids-limit".into(),
            c.pids_limit.to_string(),
            "--cap-drop".into(),
            "ALL".into(),
            "--security-opt".into(),
            "no-new-privileges".into(),
        ];
        if command.stdin.is_some() {
            args.push("-i".into());
        }
        // AllowList cannot be expressed per host here; it keeps the default network
        if policy.network_access == NetworkAccess::Deny {
            args.extend(["--network".into(), "none".into()]);
        }
        if let Some((dir, writable)) = work_dir {
            let dir = dir.display();
            let mount = if writable {
                format!("{}:{}", dir, dir)
            } else {
                format!("{}:{}:ro", dir, dir)
            };
            args.extend(["-v".into(), mount, "-w".into(), dir.to_string()]);
        }
        for path in read_only {
            let path = path.display();
            args.extend(["-v".into(), format!("{}:{}:ro", path, path)]);
        }
        for (key, value) in &command.env {
            args.extend(["-e".into(), format!("{}={}", key, value)]);
        }
        args.push(c.image.clone());
        args.push(command.program.clone());
        args.extend(command.args.iter().cloned());
        args
    }

    /// Force-remove a container left behind by an interrupted run.
    async fn remove(&self, container_name: &str) {
        let mut cmd = ProcessCommand::new(&self.runtime);
        cmd.args(["rm", "-f", container_name])
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true);
        match tokio::time::timeout(REMOVE_TIMEOUT, cmd.status()).await {
            Ok(Ok(status)) if status.success() => {
                debug!(container = %container_name, "Removed container")
            }
            Ok(Ok(status)) => {
                warn!(container = %container_name, status = %status, "Container removal failed")
            }
            Ok(Err(e)) => warn!(container = %container_name, error = %e, "Container removal failed"),
            Err(_) => warn!(container = %container_name, "Container removal timed out"),
        }
    }
}

/// First runtime from [`RUNTIME_CANDIDATES`] found on `PATH`.
pub fn detect_runtime() -> Option<PathBuf> {
    RUNTIME_CANDIDATES.iter().find_map(|candidate| {
        let found = which::which(candidate).ok();
        debug!(runtime = candidate, found = found.is_some(), "Probing container runtime");
        found
    })
}

fn container_name() -> String {
    format!(
        "toolgate-{}-{}",
        std::process::id(),
        CONTAINER_SEQ.fetch_add(1, Ordering::Relaxed)
    )
}

#[async_trait]
impl Sandbox for ContainerSandbox {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exec(
        &self,
        cancel: &CancellationToken,
        command: &Command,
        policy: &Policy,
    ) -> Result<ExecResult, SandboxError> {
        command.validate().map_err(|_| SandboxError::EmptyProgram)?;

        let work_dir = match command.work_dir.as_deref() {
            Some(dir) => {
                let dir = resolve_path(&check_allowed(dir, &policy.allowed_paths)?)?;
                let writable = check_writable(&dir, &policy.read_only_paths).is_ok();
                Some((dir, writable))
            }
            None => None,
        };
        let read_only = policy
            .read_only_paths
            .iter()
            .map(|p| resolve_path(p))
            .collect::<Result<Vec<_>, _>>()?;

        let name = container_name();
        let args = self.run_args(
            &name,
            command,
            policy,
            work_dir.as_ref().map(|(d, w)| (d.as_path(), *w)),
            &read_only,
        );

        let timeout = policy.effective_timeout();
        debug!(
            sandbox = %self.name,
            container = %name,
            command = %command.display(),
            network = %policy.network_access,
            timeout_ms = timeout.as_millis() as u64,
            "Executing command in container"
        );

        let mut cmd = ProcessCommand::new(&self.runtime);
        cmd.args(&args);
        prepare(&mut cmd, command.stdin.is_some());

        let outcome = run(
            cmd,
            &command.program,
            command.stdin.clone(),
            cancel,
            timeout,
            policy.effective_max_output_bytes(),
        )
        .await;

        if outcome.interrupted.is_some() {
            self.remove(&name).await;
        }
        Ok(outcome.result)
    }
}
