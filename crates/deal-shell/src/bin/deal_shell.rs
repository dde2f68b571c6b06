//! Drive a deal shell from a line-oriented command script.
//!
//! Commands are read from `--script` or standard input, one per line:
//!
//! ```text
//! create <requirement-size> <tenant name...>
//! view [query]
//! comment <deal-id> <text...>
//! ```
//!
//! Every published snapshot is printed to stdout as one JSON line. Logs go to
//! stderr. The backing store is the in-memory reference repository configured
//! through `DEAL_SHELL_*` environment variables.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use deal_shell::config::{self, ShellSettings};
use deal_shell::domain::{
    CommentText, DealFilter, DealId, DealShell, RequirementSize, ShellState, TenantName,
};
use deal_shell::outbound::InMemoryDealRepository;
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// `deal-shell` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "deal-shell",
    about = "Run deal shell commands against the in-memory reference repository",
    version
)]
struct CliArgs {
    /// Read commands from this file instead of standard input.
    #[arg(long = "script", value_name = "path")]
    script: Option<PathBuf>,
    /// Emit logs as JSON.
    #[arg(long = "json-logs")]
    json_logs: bool,
}

/// One parsed script line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Create {
        requirement_size: RequirementSize,
        tenant_name: TenantName,
    },
    View(DealFilter),
    Comment {
        deal_id: DealId,
        text: CommentText,
    },
}

fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (verb, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(verb, rest)| (verb, rest.trim()));
    let command = match verb {
        "create" => {
            let (size, tenant) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| "usage: create <requirement-size> <tenant name>".to_owned())?;
            let raw_size = size
                .parse::<u64>()
                .map_err(|error| format!("invalid requirement size '{size}': {error}"))?;
            Command::Create {
                requirement_size: RequirementSize::new(raw_size).map_err(|e| e.to_string())?,
                tenant_name: TenantName::new(tenant.trim()).map_err(|e| e.to_string())?,
            }
        }
        "view" => Command::View(DealFilter::from_query((!rest.is_empty()).then_some(rest))),
        "comment" => {
            let (id, text) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| "usage: comment <deal-id> <text>".to_owned())?;
            let raw_id = id
                .parse::<u64>()
                .map_err(|error| format!("invalid deal id '{id}': {error}"))?;
            Command::Comment {
                deal_id: DealId::new(raw_id),
                text: CommentText::new(text.trim()).map_err(|e| e.to_string())?,
            }
        }
        other => return Err(format!("unknown command '{other}'")),
    };
    Ok(Some(command))
}

/// Filter applied when `RUST_LOG` is unset or invalid, so skipped script
/// lines still reach stderr.
const DEFAULT_LOG_FILTER: &str = "warn";

fn main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    init_tracing(args.json_logs)?;

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main(args))
}

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn init_tracing(json: bool) -> io::Result<()> {
    let builder = fmt().with_env_filter(log_filter()).with_writer(io::stderr);
    let outcome = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    outcome.map_err(|error| io::Error::other(format!("initialise tracing: {error}")))
}

async fn async_main(args: CliArgs) -> io::Result<()> {
    let settings = ShellSettings::load_from_iter([OsString::from("deal-shell")])
        .map_err(|error| io::Error::other(format!("load settings: {error}")))?;
    let repository = settings
        .build_repository()
        .map_err(|error| io::Error::other(error.to_string()))?;
    info!(
        force_failure = settings.force_failure,
        seeded = repository.snapshot().len(),
        "deal shell ready"
    );

    let shell = DealShell::new(Arc::new(repository));
    shell.subscribe(print_snapshot);

    let script = match &args.script {
        Some(path) => read_script(path)?,
        None => read_stdin()?,
    };
    for (index, line) in script.lines().enumerate() {
        match parse_command(line) {
            Ok(Some(command)) => run(&shell, command).await,
            Ok(None) => {}
            Err(error) => warn!(line = index + 1, %error, "skipping script line"),
        }
    }
    Ok(())
}

async fn run(shell: &DealShell<InMemoryDealRepository>, command: Command) {
    match command {
        Command::Create {
            requirement_size,
            tenant_name,
        } => shell.create_deal(requirement_size, tenant_name).await,
        Command::View(filter) => shell.view_deals(&filter).await,
        Command::Comment { deal_id, text } => shell.add_comment(text, deal_id).await,
    }
}

fn print_snapshot(state: &ShellState) {
    match serde_json::to_string(state) {
        Ok(line) => println!("{line}"),
        Err(error) => warn!(%error, "snapshot could not be serialised"),
    }
}

fn read_stdin() -> io::Result<String> {
    let mut script = String::new();
    for line in io::stdin().lock().lines() {
        script.push_str(&line?);
        script.push('\n');
    }
    Ok(script)
}

fn read_script(path: &Path) -> io::Result<String> {
    config::read_to_string(path)
        .map_err(|error| io::Error::other(format!("read script '{}': {error}", path.display())))
}
