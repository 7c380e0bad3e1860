//! lexcheck - run one request against the constraint service
//!
//! Reads a request envelope (JSON) from a file or stdin, executes it and
//! prints the JSON response on stdout. Logs go to stderr.
//!
//! Usage:
//!   lexcheck request.json
//!   cat request.json | lexcheck --offline
//!
//! Environment variables:
//!   LITELLM_URL - completion gateway (default: http://litellm:4000)
//!   LITELLM_API_KEY - bearer token for the gateway
//!   LITELLM_MODEL - model name (default: deepseek-chat)
//!   SOLVER_TIMEOUT_MS - per-solve time limit (default: 10000)
//!   SOLVER_MAX_IN_FLIGHT - concurrent solver threads (default: 8)
//!   RUST_LOG - log filter (default: warn,lexcheck=info)

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lexcheck::ops::{from_json, response_to_json_pretty};
use lexcheck::{Config, ConstraintService, LexError};

#[derive(Parser, Debug)]
#[command(name = "lexcheck")]
#[command(about = "Consistency checking for legal assertions")]
#[command(version)]
struct Args {
    /// Request file; reads stdin when absent or "-"
    input: Option<PathBuf>,

    /// Skip the completion service and extract with cue patterns only
    #[arg(long)]
    offline: bool,

    /// Print the response on one line
    #[arg(long)]
    compact: bool,

    /// Completion gateway base URL
    #[arg(long, env = "LITELLM_URL", default_value = "http://litellm:4000")]
    litellm_url: String,

    /// Bearer token for the completion gateway
    #[arg(long, env = "LITELLM_API_KEY", hide_env_values = true)]
    litellm_api_key: Option<String>,

    /// Completion model
    #[arg(long, env = "LITELLM_MODEL", default_value = "deepseek-chat")]
    model: String,

    /// Completion request timeout in seconds
    #[arg(long, env = "COMPLETION_TIMEOUT_SECS", default_value = "30")]
    completion_timeout_secs: u64,

    /// Solver time limit in milliseconds
    #[arg(long, env = "SOLVER_TIMEOUT_MS", default_value = "10000")]
    solver_timeout_ms: u64,

    /// Largest formula (in clauses) the solver attempts
    #[arg(long, env = "SOLVER_MAX_CLAUSES", default_value = "1000000")]
    solver_max_clauses: usize,

    /// Solver threads allowed at once, including timed-out searches
    #[arg(long, env = "SOLVER_MAX_IN_FLIGHT", default_value = "8")]
    solver_max_in_flight: usize,

    /// Stored quote length in characters
    #[arg(long, env = "MAX_QUOTE_LEN", default_value = "500")]
    max_quote_len: usize,
}

impl Args {
    fn config(&self) -> Config {
        let mut config = Config::default();
        config.completion.base_url = self.litellm_url.trim_end_matches('/').to_string();
        config.completion.api_key = self.litellm_api_key.clone().filter(|k| !k.is_empty());
        config.completion.model.clone_from(&self.model);
        config.completion.timeout = Duration::from_secs(self.completion_timeout_secs);
        config.solver.timeout = Duration::from_millis(self.solver_timeout_ms);
        config.solver.max_clauses = self.solver_max_clauses;
        config.solver.max_in_flight = self.solver_max_in_flight;
        config.extraction.max_quote_len = self.max_quote_len;
        config
    }

    fn read_input(&self) -> Result<String, LexError> {
        let mut buf = String::new();
        match &self.input {
            Some(path) if path.as_os_str() != "-" => {
                buf = std::fs::read_to_string(path)
                    .map_err(|e| LexError::internal(format!("read {}: {e}", path.display())))?;
            }
            _ => {
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .map_err(|e| LexError::internal(format!("read stdin: {e}")))?;
            }
        }
        Ok(buf)
    }
}

async fn run(args: &Args) -> Result<String, LexError> {
    let config = args.config();
    let service = if args.offline {
        ConstraintService::offline(&config)
    } else {
        ConstraintService::new(&config)?
    };

    let request = from_json(&args.read_input()?)?;
    let response = service.execute(request).await?;

    if args.compact {
        serde_json::to_string(&response).map_err(|e| LexError::internal(format!("serialize response: {e}")))
    } else {
        response_to_json_pretty(&response)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,lexcheck=info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    match run(&args).await {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "request failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
