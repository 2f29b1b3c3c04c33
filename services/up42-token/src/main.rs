//! UP42 token tool
//!
//! Resolves UP42 credentials from the config file or the environment and:
//! - without a URL, prints a bearer token to stdout
//! - with a URL, performs a signed GET and prints the status and body
//!
//! Usage: `up42-token [--config PATH] [URL]`

mod config;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use up42_auth::Client;

use crate::config::Config;

/// Parsed command line: optional `--config PATH` and optional URL.
#[derive(Debug, PartialEq)]
struct Args {
    config: Option<String>,
    url: Option<String>,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut config = None;
    let mut url = None;
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            let path = iter.next().context("--config requires a path")?;
            config = Some(path.clone());
        } else if url.is_none() {
            url = Some(arg.clone());
        } else {
            anyhow::bail!("unexpected argument: {arg}");
        }
    }
    Ok(Args { config, url })
}

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs on stderr so stdout carries only the token or response
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let args = parse_args(&args)?;

    let config_path = Config::resolve_path(args.config.as_deref());
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    let token_settings = config
        .token_settings()
        .context("invalid token settings")?;

    info!(
        token_url = %token_settings.token_url,
        duration_secs = token_settings.duration.as_secs(),
        timeout_secs = token_settings.timeout.as_secs(),
        "configuration loaded"
    );

    let client = Client::create(&config.credential_sources(), token_settings)
        .context("failed to resolve UP42 credentials")?;

    match args.url {
        None => {
            let token = client
                .auth()
                .access_token()
                .await
                .context("failed to obtain access token")?;
            println!("{token}");
        }
        Some(url) => {
            let response = client
                .send(client.request(reqwest::Method::GET, &url))
                .await
                .with_context(|| format!("request to {url} failed"))?;
            let status = response.status();
            let body = response
                .text()
                .await
                .context("failed to read response body")?;
            info!(%url, %status, "request completed");
            println!("{status}");
            println!("{body}");
        }
    }

    Ok(())
}
