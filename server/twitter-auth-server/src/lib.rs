use anyhow::{bail, Result};
use twitter_auth::config::{CLIENT_ID_ENV, CLIENT_SECRET_ENV};
use twitter_auth::{ExchangeConfig, ServerConfig};

mod cli;
pub mod logging;

pub use cli::{Cli, Commands};

/// Applies command line overrides on top of the environment.
pub fn server_config(host: Option<String>, port: Option<u16>) -> Result<ServerConfig> {
    let mut config = ServerConfig::from_env()?;
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    Ok(config)
}

/// Lines printed by `check-config`. Never includes credential values.
pub fn config_report(config: &ExchangeConfig) -> Vec<String> {
    let status = |present: bool| if present { "set" } else { "missing" };
    vec![
        format!("{}: {}", CLIENT_ID_ENV, status(config.credentials.has_client_id())),
        format!(
            "{}: {}",
            CLIENT_SECRET_ENV,
            status(config.credentials.has_client_secret())
        ),
        format!("token endpoint: {}", config.endpoints.token_url),
        format!("user endpoint: {}", config.endpoints.user_url),
    ]
}

pub fn check_config(config: &ExchangeConfig) -> Result<()> {
    for line in config_report(config) {
        println!("{}", line);
    }

    if !config.credentials.is_complete() {
        bail!("provider credentials are incomplete");
    }
    Ok(())
}
