//! Interactive approval on the terminal

use std::io::{BufRead, Write};

use async_trait::async_trait;
use toolgate_application::{ApprovalDecision, ApprovalPort};
use toolgate_domain::ToolCall;

/// Asks on stderr and reads the answer from stdin.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalApproval;

#[async_trait]
impl ApprovalPort for TerminalApproval {
    async fn request_approval(&self, call: &ToolCall) -> ApprovalDecision {
        let prompt = format!(
            "\nTool call: {} {}\nRun it? [y/N] ",
            call.name,
            serde_json::to_string(&call.input).unwrap_or_default()
        );
        let answer = tokio::task::spawn_blocking(move || {
            let mut stderr = std::io::stderr();
            let _ = stderr.write_all(prompt.as_bytes());
            let _ = stderr.flush();
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line).map(|_| line)
        })
        .await;

        match answer {
            Ok(Ok(line)) if is_yes(&line) => ApprovalDecision::Approve,
            _ => ApprovalDecision::Deny("denied by user".to_string()),
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
