//! CLI entrypoint for tfdriver
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod commands;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use commands::{Cli, Command, WorkspaceCommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tfdriver_application::{ProcessRunner, Terraform, TerraformError};
use tfdriver_domain::{CommandOption, environment};
use tfdriver_infrastructure::{
    CliVersionSource, ConfigLoader, TokioProcessRunner, TracingSink, WriterSink, locate_terraform,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Exit status after Ctrl-C, as a shell would report SIGINT.
const EXIT_INTERRUPTED: i32 = 130;
/// Exit status of `fmt --check` when files need changes, matching terraform.
const EXIT_UNFORMATTED: i32 = 3;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Handle --show-config
    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    // Load configuration
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };
    config.validate().context("Invalid configuration")?;

    let Some(command) = cli.command else {
        bail!("No command given. Run `tfdriver --help` for usage.");
    };

    let exec_path = locate_terraform(
        cli.terraform
            .as_deref()
            .or(config.terraform.exec_path.as_deref()),
    )?;
    let working_dir = cli
        .chdir
        .clone()
        .or_else(|| config.terraform.working_dir.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));

    info!(
        "Using {} in {}",
        exec_path.display(),
        working_dir.display()
    );

    // === Dependency Injection ===
    let runner: Arc<dyn ProcessRunner> = Arc::new(TokioProcessRunner::new());
    let versions = Arc::new(CliVersionSource::new(runner.clone()));
    let mut terraform = Terraform::new(working_dir, exec_path, runner, versions)?;

    let mut settings = config.driver_settings(environment::host_vars());
    if let Some(path) = &cli.log_path {
        settings = settings.with_log_path(path.display().to_string());
    }
    terraform.apply_settings(&settings)?;

    if cli.stream {
        terraform.set_stdout(Arc::new(WriterSink::stderr()));
        terraform.set_stderr(Arc::new(WriterSink::stderr()));
    } else {
        terraform.set_stdout(Arc::new(TracingSink::stdout()));
        terraform.set_stderr(Arc::new(TracingSink::stderr()));
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping terraform");
            on_interrupt.cancel();
        }
    });

    match dispatch(&terraform, command, &cancel).await {
        Ok(code) if code != 0 => std::process::exit(code),
        Ok(_) => Ok(()),
        Err(e) if e.is_cancelled() => {
            eprintln!("Cancelled");
            std::process::exit(EXIT_INTERRUPTED);
        }
        Err(e) => Err(e.into()),
    }
}

/// Run one subcommand and print its result. Returns the process exit code.
async fn dispatch(
    terraform: &Terraform,
    command: Command,
    cancel: &CancellationToken,
) -> Result<i32, TerraformError> {
    match command {
        Command::Version => {
            let report = terraform.version_report(cancel).await?;
            print_json(&report);
        }
        Command::Init(args) => terraform.init(args.options(), cancel).await?,
        Command::Plan(args) => terraform.plan(args.options(), cancel).await?,
        Command::Apply(args) => terraform.apply(args.options(), cancel).await?,
        Command::Destroy(args) => terraform.destroy(args.options(), cancel).await?,
        Command::Validate => {
            let report = terraform.validate(cancel).await?;
            print_json(&report);
            if !report.valid {
                return Ok(1);
            }
        }
        Command::Fmt(args) => {
            let report = terraform.fmt(args.options(), cancel).await?;
            print_json(&serde_json::json!({
                "formatted": report.formatted,
                "files": report.files,
            }));
            if !report.formatted {
                return Ok(EXIT_UNFORMATTED);
            }
        }
        Command::Output(args) => {
            let outputs = terraform.output(args.options(), cancel).await?;
            print_json(&outputs);
        }
        Command::Workspace(sub) => match sub {
            WorkspaceCommand::List => {
                let listing = terraform.workspace_list(cancel).await?;
                print_json(&listing);
            }
            WorkspaceCommand::Show => println!("{}", terraform.workspace_show(cancel).await?),
            WorkspaceCommand::New { name } => terraform.workspace_new(&name, [], cancel).await?,
            WorkspaceCommand::Select { name } => {
                terraform.workspace_select(&name, [], cancel).await?
            }
            WorkspaceCommand::Delete { name, force } => {
                let options = [CommandOption::force(force)];
                terraform.workspace_delete(&name, options, cancel).await?
            }
        },
    }
    Ok(0)
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => warn!("Failed to serialize result: {}", e),
    }
}
