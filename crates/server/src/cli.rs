//! Command line interface.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "packlink", version)]
#[command(about = "Hardlinks already-downloaded episodes into announced season packs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the server (default)
    Start,
    /// Generate an API token
    GenToken,
    /// Send a test request to a running server
    Test {
        #[command(subcommand)]
        request: TestRequest,
    },
    /// Print the version
    Version,
}

#[derive(Subcommand)]
pub enum TestRequest {
    /// Test the pack endpoint for a release name
    Pack {
        name: String,
        #[command(flatten)]
        target: Target,
    },
    /// Test the parse endpoint with a .torrent file named after the release
    Parse {
        file: PathBuf,
        #[command(flatten)]
        target: Target,
    },
}

/// Server to send test requests to.
#[derive(Args)]
pub struct Target {
    /// Client name from the server's configuration
    #[arg(long, default_value = "")]
    pub client: String,
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
    #[arg(long, default_value_t = 42069)]
    pub port: u16,
    /// API token
    #[arg(long, default_value = "")]
    pub api: String,
}

impl Target {
    fn url(&self, endpoint: &str) -> String {
        format!("http://{}:{}/api/{}", self.host, self.port, endpoint)
    }
}

pub fn generate_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

pub async fn run_test(request: TestRequest) -> Result<()> {
    match request {
        TestRequest::Pack { name, target } => {
            let body = json!({ "name": name, "clientname": target.client });
            send(&target, "pack", &body).await
        }
        TestRequest::Parse { file, target } => {
            let body = parse_payload(&file, &target.client).await?;
            send(&target, "parse", &body).await
        }
    }
}

async fn parse_payload(file: &Path, client: &str) -> Result<Value> {
    if file.extension().is_none_or(|ext| ext != "torrent") {
        bail!("{} is not a .torrent file", file.display());
    }

    let name = file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .context("The path of the torrent file can't be empty")?;
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    Ok(json!({
        "name": name,
        "torrent": STANDARD.encode(bytes),
        "clientname": client,
    }))
}

async fn send(target: &Target, endpoint: &str, body: &Value) -> Result<()> {
    let url = target.url(endpoint);
    let response = reqwest::Client::new()
        .post(&url)
        .header("X-API-Token", &target.api)
        .json(body)
        .send()
        .await
        .with_context(|| format!("Failed to send request to {}", url))?;

    let status = response.status().as_u16();
    let text = response.text().await.context("Failed to read response")?;
    println!("Status: {}", status);
    println!("Body: {}", text);
    Ok(())
}
