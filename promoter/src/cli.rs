//! Command line interface

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::app::RunOverrides;
use crate::logs::LogLevel;
use crate::storage::settings::DEFAULT_SETTINGS_FILE;

#[derive(Parser, Debug)]
#[command(name = "promote")]
#[command(version)]
#[command(about = "Trigger a graduation and supervise it to completion")]
#[command(
    after_long_help = "Exit codes: 0 succeeded, 2 invalid request or configuration, 3 inconsistent environment, \
4 credential resolution, 5 trigger, 6 deployment failed, 7 timed out, 8 unknown, 130 cancelled."
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Settings file
    #[arg(long, global = true, env = "PROMOTE_CONFIG", default_value = DEFAULT_SETTINGS_FILE)]
    pub config: PathBuf,

    /// Override the configured log level
    #[arg(long, global = true, env = "PROMOTE_LOG_LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Also write JSON logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(
        about = "Validate, trigger and supervise a graduation",
        after_help = "Example:\n    promote run --source billing-api --destination qa --connection svc-qa-billing"
    )]
    Run(RunArgs),

    #[command(
        about = "Resolve and validate the connection without calling the deployment API",
        after_help = "Example:\n    promote check --source billing-api --destination prod --connection svc-prod-billing"
    )]
    Check(TargetArgs),

    #[command(about = "List the configured environments")]
    Environments,

    #[command(about = "Print build information as JSON")]
    Version,
}

#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Deployable unit to promote
    #[arg(long, env = "PROMOTE_SOURCE")]
    pub source: String,

    /// Destination environment (dev, qa, preprod/pp, prod)
    #[arg(long, env = "PROMOTE_DESTINATION")]
    pub destination: String,

    /// Credential connection name
    #[arg(long, env = "PROMOTE_CONNECTION")]
    pub connection: String,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Seconds between status polls
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval: Option<u64>,

    /// Give up after this many seconds
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Consecutive failed status queries before the outcome is unknown
    #[arg(long, value_name = "COUNT")]
    pub max_status_failures: Option<u32>,
}

impl RunArgs {
    pub fn overrides(&self) -> RunOverrides {
        RunOverrides {
            poll_interval_secs: self.poll_interval,
            timeout_secs: self.timeout,
            max_status_failures: self.max_status_failures,
        }
    }
}
