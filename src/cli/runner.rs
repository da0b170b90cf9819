//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::ClientConfig;
use crate::error::{Error, Result, ResultExt};
use crate::http::{ApiResponse, EcomClient, RequestOptions};
use crate::types::Method;
use serde_json::{json, Value};
use tracing::debug;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let client = EcomClient::from_config(self.load_config()?)?;
        debug!("Using endpoint {}", client.endpoint());

        match &self.cli.command {
            Commands::Get { resource, query } => {
                let mut options = RequestOptions::new();
                for pair in query {
                    let (key, value) = parse_query_pair(pair)?;
                    options = options.query(key, value);
                }
                let response = client.get_with_options(resource, options).await?;
                self.output_response(response)
            }
            Commands::Post { resource, json } => {
                let response = client.post(resource, parse_payload(json)?).await?;
                self.output_response(response)
            }
            Commands::Put { resource, json } => {
                let response = client.put(resource, parse_payload(json)?).await?;
                self.output_response(response)
            }
            Commands::Delete { resource } => {
                let response = client.delete(resource).await?;
                self.output_response(response)
            }
            Commands::RateLimit { resource } => {
                let response = client
                    .request(Method::GET, resource, RequestOptions::new())
                    .await?;
                let state = client.rate_limit_state().await;
                self.output_message(&json!({
                    "status": response.status().as_u16(),
                    "remaining": state.remaining,
                    "reset_seconds": state.reset_seconds,
                    "observed_at": state.last_request_time,
                }));
                Ok(())
            }
        }
    }

    /// Load config from file, or from the environment when no file is given
    fn load_config(&self) -> Result<ClientConfig> {
        match &self.cli.config {
            Some(path) => ClientConfig::from_file(path)
                .with_context(|| format!("Loading config {}", path.display())),
            None => ClientConfig::from_env().context("Reading LIGHTSPEED_* environment"),
        }
    }

    /// Print a response body, failing on non-2xx statuses
    fn output_response(&self, response: ApiResponse) -> Result<()> {
        let response = response.error_for_status()?;
        if response.body().is_empty() {
            return Ok(());
        }

        match response.json::<Value>() {
            Ok(body) => self.output_message(&body),
            Err(_) => println!("{}", response.text()),
        }
        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Split a `key=value` query argument
pub fn parse_query_pair(pair: &str) -> Result<(&str, &str)> {
    pair.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| Error::invalid_value("query", format!("expected key=value, got '{pair}'")))
}

fn parse_payload(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).context("Invalid JSON payload")
}
