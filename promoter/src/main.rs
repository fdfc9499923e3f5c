//! Promoter - Entry Point
//!
//! Triggers a graduation on the deployment API and supervises it until it
//! succeeds, fails, times out or can no longer be observed.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use tracing::{error, info};

use promoter::app::{AppOptions, Orchestrator};
use promoter::authn::IdentityResolver;
use promoter::cli::{Cli, Command, RunArgs, TargetArgs};
use promoter::errors::PromoteError;
use promoter::filesys::file::File;
use promoter::logs::{init_logging, LogOptions};
use promoter::models::{RunReport, RunRequest};
use promoter::storage::settings::Settings;
use promoter::utils::version_info;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Print version and exit
    if let Command::Version = cli.command {
        return match serde_json::to_string_pretty(&version_info()) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Failed to render version info: {e}");
                ExitCode::FAILURE
            }
        };
    }

    // Retrieve the settings file
    let settings = match Settings::load(&File::new(&cli.global.config)).await {
        Ok(settings) => settings,
        Err(e) => {
            print_failure(&e);
            return exit_code(&e);
        }
    };

    // Initialize logging
    let log_options = LogOptions {
        log_level: cli
            .global
            .log_level
            .clone()
            .unwrap_or_else(|| settings.log_level.clone()),
        json_format: cli.global.json_logs,
        log_file: cli.global.log_file.clone(),
        ..Default::default()
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };

    let result = match cli.command {
        Command::Run(args) => run(&settings, args).await.map(|report| {
            print_success(&report);
        }),
        Command::Check(target) => check(&settings, target).await,
        Command::Environments => list_environments(&settings),
        Command::Version => Ok(()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_failure(&e);
            exit_code(&e)
        }
    }
}

fn build_orchestrator(settings: &Settings, options: AppOptions) -> Result<Orchestrator, PromoteError> {
    let registry = Arc::new(settings.registry()?);
    let resolver = IdentityResolver::new(settings.credential_provider()?);
    let connector = Arc::new(settings.connector());
    Ok(Orchestrator::new(registry, resolver, connector, options))
}

async fn run(settings: &Settings, args: RunArgs) -> Result<RunReport, PromoteError> {
    let options = AppOptions::from_settings(settings, &args.overrides())?;
    let orchestrator = build_orchestrator(settings, options)?;
    let request = RunRequest::new(
        args.target.source,
        &args.target.destination,
        args.target.connection,
    )?;

    info!(
        "Promoting '{}' to '{}' using connection '{}'",
        request.source(),
        request.destination(),
        request.connection_name()
    );
    orchestrator.run(request, await_shutdown_signal()).await
}

async fn check(settings: &Settings, target: TargetArgs) -> Result<(), PromoteError> {
    let orchestrator = build_orchestrator(settings, AppOptions::default())?;
    let request = RunRequest::new(target.source, &target.destination, target.connection)?;
    let (identity, destination) = orchestrator.preflight(&request).await?;
    println!(
        "{} connection '{}' ({}) is consistent with destination '{}'",
        "ok".green().bold(),
        identity.connection_name(),
        identity.base_url(),
        destination
    );
    Ok(())
}

fn list_environments(settings: &Settings) -> Result<(), PromoteError> {
    let registry = settings.registry()?;
    for spec in registry.iter() {
        println!(
            "{:<8} {:<40} {:<24} {}",
            spec.id().to_string().bold(),
            spec.base_url(),
            spec.connection_pattern(),
            spec.target_suffix()
        );
    }
    Ok(())
}

fn print_success(report: &RunReport) {
    println!(
        "{} '{}' promoted to '{}' (deployment {}, {} polls, {}s)",
        "SUCCEEDED".green().bold(),
        report.source,
        report.destination,
        report.deployment_id,
        report.polls,
        report.elapsed.as_secs()
    );
}

fn print_failure(err: &PromoteError) {
    eprintln!("{} [{}] {}", "FAILED".red().bold(), err.kind(), err);
}

fn exit_code(err: &PromoteError) -> ExitCode {
    ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                _ => {
                    error!("Unable to install signal handlers; cancellation disabled");
                    return futures::future::pending().await;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, stopping supervision...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, stopping supervision...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_err() {
            error!("Unable to listen for Ctrl+C; cancellation disabled");
            return futures::future::pending().await;
        }
        info!("Ctrl+C received, stopping supervision...");
    }
}
