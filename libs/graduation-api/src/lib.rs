//! Wire models for the graduation/promotion REST API

pub mod models;

pub use models::*;
