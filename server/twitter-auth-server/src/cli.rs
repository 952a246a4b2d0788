use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose output
    #[clap(long, short, help = "Verbose output", global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start the exchange server (default)
    Serve {
        #[clap(long, help = "Host to bind (overrides TWITTER_AUTH_HOST)")]
        host: Option<String>,
        #[clap(long, help = "Port to bind (overrides TWITTER_AUTH_PORT)")]
        port: Option<u16>,
    },

    /// Report which provider settings are present without printing secrets
    CheckConfig,
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Serve {
            host: None,
            port: None,
        }
    }
}
