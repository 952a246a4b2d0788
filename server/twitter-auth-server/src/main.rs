use anyhow::Result;
use clap::Parser;
use twitter_auth::{ExchangeConfig, TwitterAuthServer};
use twitter_auth_server::{check_config, logging, server_config, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init_logging(&logging::default_level(cli.verbose));

    let exchange_config = ExchangeConfig::from_env()?;

    match cli.command.unwrap_or_default() {
        Commands::Serve { host, port } => {
            let server_config = server_config(host, port)?;
            tracing::debug!("Using provider endpoints {:?}", exchange_config.endpoints);

            TwitterAuthServer::new(server_config, exchange_config)?
                .run()
                .await?;
        }
        Commands::CheckConfig => check_config(&exchange_config)?,
    }

    Ok(())
}
