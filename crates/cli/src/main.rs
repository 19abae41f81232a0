use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use slackctl_config::{Address, Manifest, MANIFEST_FILE, TOKEN_ENV};
use slackctl_runner::apply::{self, RunReport};
use slackctl_runner::state::{StateDocument, STATE_FILE};
use slackctl_runner::{Diagnostics, LifecycleRegistry, OpContext};
use tracing::warn;
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(
    name = "slackctl",
    version,
    about = "Declarative management of Slack conversations and user groups"
)]
struct Cli {
    /// Manifest declaring resources and data lookups
    #[arg(long, global = true, default_value = MANIFEST_FILE)]
    manifest: PathBuf,
    /// State file recording managed resources
    #[arg(long, global = true, default_value = STATE_FILE)]
    state: PathBuf,
    /// API token, overrides provider.token from the manifest
    #[arg(long, global = true, env = TOKEN_ENV, hide_env_values = true)]
    token: Option<String>,
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, update and delete resources until the workspace matches the manifest
    Apply,
    /// Delete every resource recorded in the state file
    Destroy,
    /// Adopt an existing conversation or user group
    Import {
        /// Resource address, e.g. slack_conversation.eng
        address: Address,
        /// Remote id of the existing entity
        id: String,
    },
    /// Re-read every managed resource into the state file
    Refresh,
    /// Evaluate all data blocks and print them as JSON
    Data,
}

fn init_tracing(debug: bool) {
    let filter = if debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Ctrl-C cancels the run; the call in flight is abandoned and nothing
/// further is started.
fn cancel_on_interrupt(ctx: &OpContext) {
    let cancel = ctx.token().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping");
            cancel.cancel();
        }
    });
}

fn print_diagnostics(diagnostics: &Diagnostics) {
    for diagnostic in diagnostics.iter() {
        eprintln!("{}", diagnostic);
    }
}

fn finish(diagnostics: &Diagnostics) -> ExitCode {
    print_diagnostics(diagnostics);
    if diagnostics.has_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn summarize(verb: &str, report: &RunReport) {
    println!(
        "{} complete: {} created, {} updated, {} unchanged, {} deleted",
        verb,
        report.created.len(),
        report.updated.len(),
        report.unchanged.len(),
        report.deleted.len()
    );
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let manifest = Manifest::load(&cli.manifest)
        .with_context(|| format!("Failed to load {}", cli.manifest.display()))?;
    let provider = manifest.provider.clone().with_override(cli.token);
    let registry = LifecycleRegistry::configure(&provider)?;

    let ctx = OpContext::new();
    cancel_on_interrupt(&ctx);

    let state_path = cli.state;
    let load_state = || {
        StateDocument::load(&state_path)
            .with_context(|| format!("Failed to load {}", state_path.display()))
    };

    // Whatever succeeded is recorded, even when other resources failed.
    let diagnostics = match cli.command {
        Commands::Apply => {
            let blocks = manifest.resources()?;
            let mut state = load_state()?;
            let report = apply::apply(&registry, &ctx, &blocks, &mut state).await;
            summarize("Apply", &report);
            save_state(&state, &state_path)?;
            report.diagnostics
        }
        Commands::Destroy => {
            let mut state = load_state()?;
            let report = apply::destroy(&registry, &ctx, &mut state).await;
            summarize("Destroy", &report);
            save_state(&state, &state_path)?;
            report.diagnostics
        }
        Commands::Import { address, id } => {
            let mut state = load_state()?;
            match apply::import(&registry, &ctx, &address, &id, &mut state).await {
                Ok(()) => {
                    save_state(&state, &state_path)?;
                    println!("Imported {} ({})", address, id);
                    Diagnostics::new()
                }
                Err(diagnostics) => diagnostics,
            }
        }
        Commands::Refresh => {
            let mut state = load_state()?;
            let report = apply::refresh(&registry, &ctx, &mut state).await;
            summarize("Refresh", &report);
            save_state(&state, &state_path)?;
            report.diagnostics
        }
        Commands::Data => {
            let blocks = manifest.data_sources()?;
            let (values, diagnostics) = apply::read_data(&registry, &ctx, &blocks).await;
            println!("{}", serde_json::to_string_pretty(&values)?);
            diagnostics
        }
    };

    Ok(finish(&diagnostics))
}

fn save_state(state: &StateDocument, path: &Path) -> anyhow::Result<()> {
    state
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))
}
