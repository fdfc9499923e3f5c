//! Pre-flight checks run before any deployment call

pub mod consistency;

pub use consistency::validate;
