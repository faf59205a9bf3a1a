//! HTTP implementation of the store traits.

mod client;
mod config;

pub use client::HttpClient;
pub use config::{ApiConfig, DEFAULT_BASE_URL};
