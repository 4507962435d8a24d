//! Command-line client: argument parsing, the HTTP client, and the demo walk.

pub mod cli;
pub mod client;
pub mod demo;

pub use cli::{ApiCall, Cli, Command, Operation};
pub use client::{ApiClient, ApiError};
