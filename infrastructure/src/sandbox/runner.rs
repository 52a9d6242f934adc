//! Child process lifecycle shared by both sandboxes
//!
//! ```text
//! spawn ──▶ write stdin (task) ──▶ read stdout/stderr (tasks, capped)
//!   │
//!   ├─ exit ───────────────▶ collect output ─▶ ExecResult { exit_code }
//!   ├─ deadline ─▶ kill group ─▶ collect ───▶ ExecResult { -1, "timed out" }
//!   └─ cancel ───▶ kill group ─▶ collect ───▶ ExecResult { -1, "cancelled" }
//! ```

use std::process::ExitStatus;
use std::time::{Duration, Instant};

use futures::future::join;
use tokio::io::AsyncWriteExt;
use tokio::process::Command as ProcessCommand;
use tokio_util::sync::CancellationToken;
use toolgate_domain::ExecResult;
use tracing::{debug, trace, warn};

use super::output::{CappedOutput, read_capped};

/// How long to keep draining pipes after the child is gone. Grandchildren
/// that escaped the process group can hold pipes open indefinitely.
const OUTPUT_GRACE: Duration = Duration::from_secs(2);

/// Why a run ended before the process exited on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interruption {
    Timeout,
    Cancelled,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub result: ExecResult,
    pub interrupted: Option<Interruption>,
}

enum Ended {
    Exited(std::io::Result<ExitStatus>),
    Interrupted(Interruption),
}

/// Configure stdio and process-group isolation on a command.
pub fn prepare(cmd: &mut ProcessCommand, with_stdin: bool) {
    cmd.stdin(if with_stdin {
        std::process::Stdio::piped()
    } else {
        std::process::Stdio::null()
    })
    .stdout(std::process::Stdio::piped())
    .stderr(std::process::Stdio::piped())
    .kill_on_drop(true);

    // New process group so a timeout can take down the whole tree
    #[cfg(unix)]
    cmd.process_group(0);

    // Linux: the kernel kills the child if we die before reaping it
    #[cfg(target_os = "linux")]
    unsafe {
        cmd.pre_exec(|| {
            libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGKILL);
            Ok(())
        });
    }
}

/// Run a prepared command to completion under a deadline.
pub async fn run(
    mut cmd: ProcessCommand,
    label: &str,
    stdin: Option<String>,
    cancel: &CancellationToken,
    timeout: Duration,
    max_output_bytes: usize,
) -> RunOutcome {
    let start = Instant::now();

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            debug!(command = %label, error = %e, "Failed to start process");
            return RunOutcome {
                result: ExecResult::failed(format!("failed to start '{}': {}", label, e), start.elapsed()),
                interrupted: None,
            };
        }
    };
    let pid = child.id();
    trace!(command = %label, pid = ?pid, "Process started");

    if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
        tokio::spawn(async move {
            // The child may exit without reading; a broken pipe is expected
            if let Err(e) = pipe.write_all(input.as_bytes()).await {
                trace!(error = %e, "stdin write ended early");
            }
        });
    }

    let stop_reading = CancellationToken::new();
    let stdout = spawn_reader(child.stdout.take(), max_output_bytes, stop_reading.clone());
    let stderr = spawn_reader(child.stderr.take(), max_output_bytes, stop_reading.clone());

    let ended = tokio::select! {
        status = child.wait() => Ended::Exited(status),
        _ = tokio::time::sleep(timeout) => Ended::Interrupted(Interruption::Timeout),
        _ = cancel.cancelled() => Ended::Interrupted(Interruption::Cancelled),
    };

    if let Ended::Interrupted(reason) = ended {
        debug!(command = %label, pid = ?pid, reason = ?reason, "Terminating process group");
        terminate(&mut child, pid).await;
    }

    let readers = join(stdout, stderr);
    tokio::pin!(readers);
    let (stdout, stderr) = match tokio::time::timeout(OUTPUT_GRACE, &mut readers).await {
        Ok(outputs) => outputs,
        Err(_) => {
            debug!(command = %label, "Output pipes still open after exit, closing");
            stop_reading.cancel();
            readers.await
        }
    };
    let stdout = stdout.unwrap_or_else(join_failure);
    let stderr = stderr.unwrap_or_else(join_failure);
    let duration = start.elapsed();

    let (exit_code, error, interrupted) = match ended {
        Ended::Exited(Ok(status)) => {
            let (code, error) = classify(status);
            (code, error, None)
        }
        Ended::Exited(Err(e)) => (-1, Some(format!("failed to wait for process: {}", e)), None),
        Ended::Interrupted(Interruption::Timeout) => (
            -1,
            Some(format!("command timed out after {}", format_duration(timeout))),
            Some(Interruption::Timeout),
        ),
        Ended::Interrupted(Interruption::Cancelled) => (
            -1,
            Some("command cancelled".to_string()),
            Some(Interruption::Cancelled),
        ),
    };
    let error = error.or_else(|| {
        stdout
            .error
            .as_ref()
            .or(stderr.error.as_ref())
            .map(|e| format!("failed to read output: {}", e))
    });

    if stdout.truncated || stderr.truncated {
        debug!(
            command = %label,
            stdout_bytes = stdout.total_bytes,
            stderr_bytes = stderr.total_bytes,
            cap = max_output_bytes,
            "Output truncated"
        );
    }

    RunOutcome {
        result: ExecResult {
            stdout: stdout.text,
            stderr: stderr.text,
            exit_code,
            duration,
            error,
        },
        interrupted,
    }
}

fn spawn_reader<R>(
    pipe: Option<R>,
    max_bytes: usize,
    stop: CancellationToken,
) -> tokio::task::JoinHandle<CappedOutput>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        match pipe {
            Some(pipe) => read_capped(pipe, max_bytes, stop).await,
            None => CappedOutput::default(),
        }
    })
}

fn join_failure(e: tokio::task::JoinError) -> CappedOutput {
    CappedOutput {
        error: Some(e.to_string()),
        ..Default::default()
    }
}

/// Kill the child's whole process group, then reap it.
async fn terminate(child: &mut tokio::process::Child, pid: Option<u32>) {
    #[cfg(unix)]
    if let Some(pid) = pid.and_then(|p| i32::try_from(p).ok()) {
        // SAFETY: killpg only sends a signal; the group id is our child's pid
        let rc = unsafe { libc::killpg(pid, libc::SIGKILL) };
        if rc != 0 {
            trace!(pid, error = %std::io::Error::last_os_error(), "killpg failed");
        }
    }
    #[cfg(not(unix))]
    let _ = pid;

    if let Err(e) = child.start_kill() {
        trace!(error = %e, "start_kill failed (process likely gone)");
    }
    if let Err(e) = child.wait().await {
        warn!(error = %e, "Failed to reap terminated process");
    }
}

/// Exit code plus an annotation for abnormal termination.
fn classify(status: ExitStatus) -> (i32, Option<String>) {
    if let Some(code) = status.code() {
        return (code, None);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return (128 + signal, Some(format!("terminated by signal {}", signal)));
        }
    }
    (-1, Some(format!("abnormal exit: {}", status)))
}

fn format_duration(d: Duration) -> String {
    if d.subsec_millis() == 0 {
        format!("{}s", d.as_secs())
    } else {
        format!("{}ms", d.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_spawn_failure_is_result() {
        let mut cmd = ProcessCommand::new("/definitely/not/a/binary");
        prepare(&mut cmd, false);
        let outcome = run(
            cmd,
            "missing",
            None,
            &CancellationToken::new(),
            Duration::from_secs(5),
            1024,
        )
        .await;
        assert_eq!(outcome.result.exit_code, -1);
        assert!(outcome.result.error.unwrap().contains("failed to start"));
        assert!(outcome.interrupted.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_signal_exit_code() {
        let mut cmd = ProcessCommand::new("sh");
        cmd.args(["-c", "kill -TERM $$"]);
        prepare(&mut cmd, false);
        let outcome = run(
            cmd,
            "sh",
            None,
            &CancellationToken::new(),
            Duration::from_secs(5),
            1024,
        )
        .await;
        assert_eq!(outcome.result.exit_code, 128 + libc::SIGTERM);
        assert!(outcome.result.error.is_some());
    }
}
