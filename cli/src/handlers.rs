//! Subcommand handlers

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio_util::sync::CancellationToken;
use toolgate_application::{
    AutoApprove, ChatProvider, DispatchToolCallUseCase, PathGuardError, Sandbox, ToolContext,
    ToolRegistry,
};
use toolgate_domain::{ChatEvent, ChatMessage, ChatRequest, Command, ExecResult, Policy};
use toolgate_infrastructure::{
    BuiltinTools, ConfigLoader, FileConfig, InMemoryCredentialStore, InMemoryMemoryStore,
    PathGuard, ProviderKind, SandboxKind, build_provider, build_sandbox,
};
use tracing::{debug, info};

use crate::approval::TerminalApproval;

/// Agent id used for memory when running from the command line
const CLI_AGENT_ID: &str = "cli";

fn sandbox_from(config: &FileConfig, kind: Option<&str>) -> Result<Arc<dyn Sandbox>> {
    let kind = match kind {
        Some(k) => k.parse::<SandboxKind>().map_err(anyhow::Error::msg)?,
        None => config.sandbox.kind,
    };
    let sandbox = build_sandbox(kind, &config.sandbox.container)?;
    info!(sandbox = sandbox.name(), "Sandbox ready");
    Ok(sandbox)
}

fn registry_from(config: &FileConfig) -> ToolRegistry {
    BuiltinTools::new()
        .with_memory_store(Arc::new(InMemoryMemoryStore::new()))
        .with_credential_store(Arc::new(InMemoryCredentialStore::new()))
        .build(&config.tools.enabled)
}

/// Cancelled on Ctrl-C.
fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupted");
            child.cancel();
        }
    });
    token
}

fn exec_json(result: &ExecResult) -> serde_json::Value {
    serde_json::json!({
        "stdout": result.stdout,
        "stderr": result.stderr,
        "exit_code": result.exit_code,
        "duration_ms": result.duration.as_millis() as u64,
        "error": result.error,
    })
}

pub struct ExecArgs {
    pub workdir: Option<PathBuf>,
    pub timeout: Option<u64>,
    pub stdin: Option<String>,
    pub sandbox: Option<String>,
    pub json: bool,
    pub argv: Vec<String>,
}

pub async fn exec(config: &FileConfig, args: ExecArgs) -> Result<ExitCode> {
    let Some((program, rest)) = args.argv.split_first() else {
        bail!("no program given");
    };
    let mut policy = config.to_policy()?;
    if let Some(secs) = args.timeout {
        policy = policy.with_timeout(Duration::from_secs(secs));
    }

    let mut command = Command::new(program).args(rest.iter().cloned());
    if let Some(dir) = args.workdir {
        command = command.with_work_dir(dir);
    }
    if let Some(stdin) = args.stdin {
        command = command.with_stdin(stdin);
    }

    let sandbox = sandbox_from(config, args.sandbox.as_deref())?;
    let result = sandbox
        .exec(&interrupt_token(), &command, &policy)
        .await
        .with_context(|| format!("running {}", command.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&exec_json(&result))?);
    } else {
        print!("{}", result.stdout);
        eprint!("{}", result.stderr);
        if let Some(error) = &result.error {
            eprintln!("toolgate: {}", error);
        }
    }

    // Exit codes outside 0..=255 (-1 for timeouts/start failures) map to 1
    Ok(match u8::try_from(result.exit_code) {
        Ok(code) => ExitCode::from(code),
        Err(_) => ExitCode::FAILURE,
    })
}

pub struct ChatArgs {
    pub prompt: String,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub system: Option<String>,
    pub no_tools: bool,
    pub run_tools: bool,
    pub yes: bool,
}

pub async fn chat(config: &FileConfig, args: ChatArgs) -> Result<ExitCode> {
    let kind = match &args.provider {
        Some(p) => p.parse::<ProviderKind>()?,
        None => config.providers.default,
    };
    let provider: Arc<dyn ChatProvider> = build_provider(kind, config.provider_settings(kind))?;
    let registry = Arc::new(registry_from(config));

    let mut messages = Vec::new();
    if let Some(system) = &args.system {
        messages.push(ChatMessage::system(system));
    }
    messages.push(ChatMessage::user(&args.prompt));
    let mut request = ChatRequest::new(messages);
    if let Some(model) = &args.model {
        request = request.with_model(model);
    }
    if !args.no_tools {
        request = request.with_tools(registry.definitions());
    }

    info!(
        provider = provider.name(),
        model = %request.model_or(provider.default_model()),
        tools = request.tools.len(),
        "Sending chat request"
    );

    let cancel = interrupt_token();
    let mut stream = provider.chat(cancel.clone(), request).await?;
    let mut calls = Vec::new();
    let mut stdout = std::io::stdout();
    let mut failed = false;

    while let Some(event) = stream.recv().await {
        match event {
            ChatEvent::Token(text) => {
                stdout.write_all(text.as_bytes())?;
                stdout.flush()?;
            }
            ChatEvent::ToolCall(call) => {
                eprintln!(
                    "\n[tool call] {} ({}) {}",
                    call.name,
                    call.id,
                    serde_json::to_string(&call.input)?
                );
                calls.push(call);
            }
            ChatEvent::Done(usage) => {
                println!();
                eprintln!(
                    "[usage] input={} output={} total={}",
                    usage.input_tokens,
                    usage.output_tokens,
                    usage.total()
                );
            }
            ChatEvent::Error(e) => {
                println!();
                eprintln!("[error] {}", e);
                failed = true;
            }
        }
    }

    if args.run_tools && !calls.is_empty() {
        let policy = config.to_policy()?;
        let sandbox = sandbox_from(config, None)?;
        let mut dispatcher = DispatchToolCallUseCase::new(registry, sandbox);
        dispatcher = if args.yes {
            dispatcher.with_approval(Arc::new(AutoApprove))
        } else {
            dispatcher.with_approval(Arc::new(TerminalApproval))
        };

        let ctx = ToolContext::new(CLI_AGENT_ID).with_cancel(cancel);
        for call in &calls {
            match dispatcher.execute(&ctx, call, &policy).await {
                Ok(result) => {
                    let label = if result.is_error { "tool error" } else { "tool result" };
                    println!("[{}] {}\n{}", label, call.name, result.content);
                    failed |= result.is_error;
                }
                Err(e) => {
                    eprintln!("[{}] {}: {}", e.code(), call.name, e);
                    failed = true;
                    if e.aborts_turn() {
                        break;
                    }
                }
            }
        }
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

pub fn tools(config: &FileConfig) -> Result<ExitCode> {
    let definitions = registry_from(config).definitions();
    println!("{}", serde_json::to_string_pretty(&definitions)?);
    Ok(ExitCode::SUCCESS)
}

fn guard_check(policy: &Policy, path: &Path, write: bool) -> Result<PathBuf, PathGuardError> {
    let guard = PathGuard::new(policy);
    if write {
        guard.check_write(path)
    } else {
        guard.check_read(path)
    }
}

pub fn check_path(config: &FileConfig, path: &Path, write: bool) -> Result<ExitCode> {
    let policy = config.to_policy()?;
    let checked = guard_check(&policy, path, write);

    let mode = if write { "write" } else { "read" };
    Ok(match checked {
        Ok(resolved) => {
            println!("allowed ({}): {}", mode, resolved.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("denied ({}): {}", mode, e);
            ExitCode::FAILURE
        }
    })
}

/// API keys written inline in a config file are masked before printing.
fn redacted(config: &FileConfig) -> FileConfig {
    let mut config = config.clone();
    for vendor in [
        &mut config.providers.anthropic,
        &mut config.providers.openai,
        &mut config.providers.gemini,
        &mut config.providers.compat,
    ] {
        if vendor.api_key.is_some() {
            vendor.api_key = Some("********".to_string());
        }
    }
    config
}

pub fn show_config(config: &FileConfig, explicit: Option<&Path>) -> Result<ExitCode> {
    println!("Configuration sources (in priority order):");
    println!("  [ENV  ] TOOLGATE_* variables");
    for source in ConfigLoader::sources(explicit) {
        let mark = if source.found { "FOUND" } else { "     " };
        println!("  [{}] {:<8} {}", mark, format!("{}:", source.label), source.path.display());
    }
    println!("  [     ] Default: built-in defaults");
    println!();
    println!("{}", toml::to_string_pretty(&redacted(config))?);
    Ok(ExitCode::SUCCESS)
}
