//! Promoter Library
//!
//! Triggers a graduation on the remote deployment API and supervises it to a
//! terminal state, refusing to start when the connection and destination
//! disagree about which environment is targeted.

pub mod app;
pub mod authn;
pub mod cli;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod models;
pub mod preflight;
pub mod registry;
pub mod report;
pub mod storage;
pub mod utils;
