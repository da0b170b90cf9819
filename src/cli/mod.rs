//! CLI module
//!
//! Command-line interface for calling the eCom API.
//!
//! # Commands
//!
//! - `get` - Fetch a resource
//! - `post` - Create a resource from a JSON payload
//! - `put` - Update a resource from a JSON payload
//! - `delete` - Delete a resource
//! - `rate-limit` - Call a resource and report the observed rate-limit windows

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::{parse_query_pair, Runner};
