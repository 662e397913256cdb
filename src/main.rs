//! install-tool - Main entry point
//!
//! Thin CLI over the `install_tools` library: builds the effective
//! configuration and either runs it in the foreground or as a tracked job.

use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use install_tools::cli::{Cli, Commands};
use install_tools::command_executor::SystemRunner;
use install_tools::config_file::InstallConfig;
use install_tools::config_store::ConfigStore;
use install_tools::installer::Installer;
use install_tools::job::{JobStatus, JobTracker};
use install_tools::process_guard;
use install_tools::template::EmbeddedTemplates;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// How often `apply` polls the job tracker
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Log to stderr; `RUST_LOG` overrides the default `info` level
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_tracing();

    // Terminate running tools if we receive SIGINT/SIGTERM
    if let Err(e) = process_guard::init_signal_handlers() {
        warn!("Failed to initialize signal handlers: {}", e);
    }

    let cli = Cli::parse_args();
    debug!("CLI arguments parsed");

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("✗ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let installer = Installer::new(Arc::new(SystemRunner), Arc::new(EmbeddedTemplates))
        .with_verbose(cli.verbose);
    let store = ConfigStore::default();

    match cli.command.clone().unwrap_or(Commands::Run) {
        Commands::Validate { config } => {
            info!("Validating configuration file: {:?}", config);
            let loaded = InstallConfig::load_from_file(&config)?;
            loaded.validate()?;
            println!("✓ Configuration file is valid: {}", config.display());
        }
        Commands::Run => {
            let config = cli.to_config()?;
            if cli.dump_config {
                return dump(&config);
            }
            installer.run(&config)?;
            println!("✓ {} finished for {}", config.action, config.cluster_name);
        }
        Commands::Save => {
            let config = cli.to_config()?;
            if cli.dump_config {
                return dump(&config);
            }
            config.validate()?;
            let path = store.save(&config)?;
            println!("✓ Configuration saved to {}", path.display());
        }
        Commands::Apply => {
            let config = cli.apply_overrides(
                store
                    .load_active()
                    .context("Could not load the active configuration")?,
            );
            if cli.dump_config {
                return dump(&config);
            }
            apply(installer, config)?;
        }
        Commands::Log => {
            print!("{}", store.read_install_log()?);
        }
    }
    Ok(())
}

fn dump(config: &InstallConfig) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

/// Submit the job and report its status until it finishes.
fn apply(installer: Installer, config: InstallConfig) -> anyhow::Result<()> {
    let tracker = JobTracker::new();
    let action = config.action;
    let handle = tracker.submit_job(installer, config)?;

    let mut last_status = JobStatus::Idle;
    let snapshot = loop {
        let snapshot = tracker.query_status();
        if snapshot.status != last_status {
            println!("job {}: {}", snapshot.status, snapshot.message);
            last_status = snapshot.status;
        }
        if snapshot.status.is_terminal() {
            break snapshot;
        }
        thread::sleep(POLL_INTERVAL);
    };
    handle.wait();

    match snapshot.status {
        JobStatus::Completed => {
            println!("✓ {} completed", action);
            Ok(())
        }
        _ => anyhow::bail!(
            "{} failed: {}",
            action,
            snapshot.error.unwrap_or(snapshot.message)
        ),
    }
}
