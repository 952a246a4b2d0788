pub mod config;
pub mod errors;
pub mod oauth_handler;
pub mod provider;

mod server;

pub use config::{ConfigError, ExchangeConfig, ProviderCredentials, ProviderEndpoints, ServerConfig};
pub use errors::{ErrorKind, ExchangeError, ServerError};
pub use oauth_handler::{
    handle_exchange, health_check, method_not_allowed, preflight, routes, ExchangeParams,
    ExchangeRequest, ExchangeState, EXCHANGE_PATH,
};
pub use provider::{TwitterProvider, UserIdentity};
pub use server::{cors_headers, TwitterAuthServer};
