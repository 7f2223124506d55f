use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use psynka_config::{ConfigLoader, MigrateConfig};
use psynka_migrate::{MigrationRunner, SplitMode};
use tracing_subscriber::EnvFilter;

mod report;

#[derive(Parser)]
#[command(
    name = "psynka-migrate",
    version,
    about = "Apply the Psynka Studio schema migration to a Supabase project"
)]
struct Cli {
    /// Path to a YAML or TOML config file. Without one, settings come
    /// from defaults plus SUPABASE_URL / SUPABASE_SERVICE_ROLE_KEY.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Migration SQL file (overrides the configured path)
    #[arg(long)]
    file: Option<PathBuf>,

    /// Split and list the statements without executing anything
    #[arg(long)]
    dry_run: bool,

    /// Use the quote/comment/dollar-quote-aware statement splitter
    /// instead of the legacy split-on-semicolon behavior
    #[arg(long)]
    lexed_split: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    // A dry run never contacts the backend, so it skips the URL/key
    // validation and works without credentials.
    let mut config: MigrateConfig = match (&cli.config, cli.dry_run) {
        (Some(path), false) => ConfigLoader::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        (Some(path), true) => ConfigLoader::load_unvalidated(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        (None, false) => ConfigLoader::from_env().context("building config from environment")?,
        (None, true) => ConfigLoader::from_env_unvalidated(),
    };
    if let Some(file) = cli.file {
        config.migration.file = file;
    }

    let split_mode = if cli.lexed_split {
        SplitMode::Lexed
    } else {
        SplitMode::Naive
    };
    let runner = MigrationRunner::new(config.clone(), split_mode)?;

    if cli.dry_run {
        let statements = runner.load_statements()?;
        report::print_dry_run(&config, &statements);
        return Ok(ExitCode::SUCCESS);
    }

    report::print_header(&config);
    let summary = runner.run(report::print_progress_glyph).await?;
    println!();
    report::print_summary(&summary);

    // Per-statement failures are reported above but never change the
    // exit code; only fatal errors do.
    Ok(ExitCode::SUCCESS)
}
