//! CLI command definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// CLI arguments for toolgate
#[derive(Parser, Debug)]
#[command(name = "toolgate")]
#[command(author, version, about = "Vendor-neutral LLM tool calling with sandboxed execution")]
#[command(long_about = r#"
toolgate talks to Anthropic, OpenAI, Gemini and OpenAI-compatible chat APIs
through one streaming event model, and runs tools inside a policy-bound
sandbox (direct process or container).

Configuration files are loaded from (in priority order):
1. TOOLGATE_* environment variables (e.g. TOOLGATE_POLICY__TIMEOUT_SECS=5)
2. --config <path>       Explicit config file
3. ./toolgate.toml       Project-level config
4. ~/.config/toolgate/config.toml   Global config

Example:
  toolgate exec -- ls -la
  toolgate check-path --write ./notes/todo.txt
  toolgate chat --provider openai "What files are in /tmp?" --run-tools
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a command under the configured sandbox and policy
    Exec {
        /// Working directory (checked against the allowed paths)
        #[arg(short = 'C', long, value_name = "DIR")]
        workdir: Option<PathBuf>,

        /// Timeout in seconds (overrides the policy)
        #[arg(short, long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Text passed on standard input
        #[arg(long, value_name = "TEXT")]
        stdin: Option<String>,

        /// Sandbox to use instead of the configured one (process, container)
        #[arg(long, value_name = "KIND")]
        sandbox: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Program and arguments
        #[arg(required = true, last = true, value_name = "PROGRAM")]
        argv: Vec<String>,
    },

    /// Send one prompt to a provider and stream the answer
    Chat {
        /// The prompt
        prompt: String,

        /// Provider (anthropic, openai, gemini, compat)
        #[arg(short, long)]
        provider: Option<String>,

        /// Model (provider default if unset)
        #[arg(short, long)]
        model: Option<String>,

        /// System prompt
        #[arg(short, long)]
        system: Option<String>,

        /// Advertise no tools to the model
        #[arg(long)]
        no_tools: bool,

        /// Execute the tool calls the model requests (one round)
        #[arg(long)]
        run_tools: bool,

        /// Approve every tool call without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Print the enabled tool definitions as JSON
    Tools,

    /// Check a path against the configured policy
    CheckPath {
        path: PathBuf,

        /// Check for writing (also rejects read-only roots)
        #[arg(short, long)]
        write: bool,
    },

    /// Show configuration sources and the effective configuration
    Config,
}
