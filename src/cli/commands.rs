//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Lightspeed eCom API client
#[derive(Parser, Debug)]
#[command(name = "ecom")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML or JSON); falls back to LIGHTSPEED_* env vars
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "pretty")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a resource
    Get {
        /// Resource path, e.g. "customers" or "products/12"
        resource: String,

        /// Query parameter as key=value (repeatable)
        #[arg(short, long = "query")]
        query: Vec<String>,
    },

    /// Create a resource
    Post {
        /// Resource path
        resource: String,

        /// JSON payload
        #[arg(long)]
        json: String,
    },

    /// Update a resource
    Put {
        /// Resource path
        resource: String,

        /// JSON payload
        #[arg(long)]
        json: String,
    },

    /// Delete a resource
    Delete {
        /// Resource path
        resource: String,
    },

    /// Call a resource and print the rate-limit state it reported
    RateLimit {
        /// Resource path to probe
        #[arg(default_value = "account")]
        resource: String,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON (one document per line)
    Json,
    /// Indented JSON
    Pretty,
}
