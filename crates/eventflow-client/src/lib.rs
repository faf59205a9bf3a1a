//! CLI, configuration, commands and output rendering
//!
//! This crate provides the `eventflow` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod render;
pub mod secret;

pub use cli::Cli;
pub use commands::App;
pub use error::{ClientError, ClientResult};
