//! Avro Transform CLI
//!
//! Runs a single transform invocation outside of a host pipeline: reads one
//! payload, writes the CSV rows to stdout. Logs go to stderr.
//!
//! # Example
//!
//! ```bash
//! # Registry-framed payload
//! avro-transform --property schema_url=http://localhost:8081 --input message.bin
//!
//! # Embedded schema, configured columns, properties from a file
//! cat records.avro | avro-transform --config transform.properties
//! ```
//!
//! A properties file holds one `key=value` per line; `#` starts a comment.
//! `--property` values override entries from the file.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Log filter (default: info)

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use streamhouse_transform::{TransformConfig, TransformEngine};
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "avro-transform")]
#[command(about = "Decode Avro records and emit CSV rows", long_about = None)]
struct Cli {
    /// Transform property as key=value (repeatable)
    #[arg(short, long = "property", value_parser = parse_key_val)]
    properties: Vec<(String, String)>,

    /// Properties file with key=value lines
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Payload file (default: stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,
}

fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid property '{}': expected key=value", s))?;
    Ok((key.trim().to_string(), value.trim().to_string()))
}

fn parse_properties_file(contents: &str) -> Result<HashMap<String, String>> {
    let mut properties = HashMap::new();
    for (lineno, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = parse_key_val(line)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("line {}", lineno + 1))?;
        properties.insert(key, value);
    }
    Ok(properties)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut properties = match &cli.config {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            parse_properties_file(&contents)
                .with_context(|| format!("invalid properties file {}", path.display()))?
        }
        None => HashMap::new(),
    };
    properties.extend(cli.properties);

    let config = TransformConfig::from_config_map(&properties).context("invalid configuration")?;
    let engine = TransformEngine::new(config).context("failed to initialize transform")?;

    let payload = match &cli.input {
        Some(path) => tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut buf)
                .await
                .context("failed to read stdin")?;
            buf
        }
    };

    let output = engine
        .transform(&payload)
        .await
        .with_context(|| format!("transform '{}' failed", engine.name()))?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&output)?;
    stdout.flush()?;

    Ok(())
}
