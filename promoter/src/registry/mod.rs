//! Environment registry

pub mod environment;

pub use environment::{
    normalize_base_url, EnvironmentConfig, EnvironmentId, EnvironmentRegistry, EnvironmentSpec,
};
