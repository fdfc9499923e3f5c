//! Orchestrator

pub mod options;
pub mod run;

pub use options::{AppOptions, RunOverrides};
pub use run::Orchestrator;
