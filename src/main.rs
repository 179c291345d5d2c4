use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use sts_installer::cli::commands::{CleanupCommand, InstallCommand};
use sts_installer::cli::output::*;
use sts_installer::cli::{Cli, Command};
use sts_installer::core::config::{ConfigLayer, PipelineConfig, DEFAULT_CONFIG_FILE};
use sts_installer::core::summary::format_duration;
use sts_installer::execution::{preflight, Cleanup, CleanupOutcome, InstallEngine, TerminalPrompter};
use sts_installer::runner::SystemCommandRunner;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.quiet {
        Level::ERROR
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    let root = std::env::current_dir().context("Failed to determine working directory")?;

    let succeeded = match &cli.command {
        Command::Install(cmd) => run_install(cmd, &cli, &root).await?,
        Command::Cleanup(cmd) => run_cleanup(cmd, &cli, &root).await?,
    };

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}

/// Spinners only when something is watching stderr
fn show_progress(cli: &Cli) -> bool {
    !cli.quiet && console::Term::stderr().is_term()
}

/// Environment and config file layers, lowest precedence first
fn load_layers(cli: &Cli, root: &Path) -> Result<ConfigLayer> {
    let env = ConfigLayer::from_env().context("Invalid environment configuration")?;

    let file = match &cli.config {
        Some(path) => ConfigLayer::from_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => {
            let default = root.join(DEFAULT_CONFIG_FILE);
            if default.is_file() {
                info!("Using config file {}", default.display());
                ConfigLayer::from_file(&default)
                    .with_context(|| format!("Failed to load config file {}", default.display()))?
            } else {
                ConfigLayer::default()
            }
        }
    };

    Ok(env.merge(file))
}

fn load_config(cmd: &InstallCommand, cli: &Cli, root: &Path) -> Result<PipelineConfig> {
    load_layers(cli, root)?
        .merge(cmd.to_layer())
        .resolve()
        .context("Invalid configuration")
}

async fn run_install(cmd: &InstallCommand, cli: &Cli, root: &Path) -> Result<bool> {
    preflight::check_prerequisites()?;

    let mut config = load_config(cmd, cli, root)?;
    let version_arch = config.version_arch()?;

    let runner = Arc::new(SystemCommandRunner::new().with_progress(show_progress(cli)));
    let prompter = Arc::new(TerminalPrompter::new());

    config.pull_secret_path =
        preflight::resolve_pull_secret(&config.pull_secret_path, prompter.as_ref(), runner.as_ref())
            .await?;

    match config.credentials_path() {
        Ok(path) => {
            preflight::validate_aws_credentials(runner.as_ref(), &config.aws_profile, &path)
                .await?
        }
        Err(e) => warn!("Skipping AWS credential validation: {}", e),
    }

    info!(
        "Artifacts for {} go to {}",
        version_arch,
        root.join("artifacts").join(version_arch.as_str()).display()
    );

    let mut engine = InstallEngine::new(config, root, runner, prompter);

    let quiet = cli.quiet;
    engine.add_event_handler(move |event| {
        if !quiet || is_quiet_event(&event) {
            println!("{}", format_execution_event(&event));
        }
    });

    let summary = engine.execute().await;
    info!("Run took {}", format_duration(summary.total_duration()));
    println!("{}", summary);
    if cli.verbose {
        println!("{}", format_step_states(engine.states()));
    }

    Ok(!summary.has_failures())
}

async fn run_cleanup(cmd: &CleanupCommand, cli: &Cli, root: &Path) -> Result<bool> {
    let options = cmd.to_options(&load_layers(cli, root)?);

    let runner = Arc::new(SystemCommandRunner::new().with_progress(show_progress(cli)));
    let cleanup = Cleanup::new(options, root, runner, Arc::new(TerminalPrompter::new()));

    match cleanup.run().await {
        Ok(CleanupOutcome::Cancelled) => {
            println!("{} Cleanup cancelled.", INFO);
            Ok(true)
        }
        Ok(CleanupOutcome::Completed { cluster_destroyed }) => {
            if cluster_destroyed {
                println!("{} Cluster destroyed", CHECK);
            }
            println!("{} AWS resources have been deleted", CHECK);
            Ok(true)
        }
        Err(e) => {
            error!("Cleanup failed: {:#}", anyhow::Error::from(e));
            println!(
                "{} {}",
                CROSS,
                style("You may need to delete the AWS resources manually.").red()
            );
            Ok(false)
        }
    }
}
