use tracing_subscriber::{fmt::format::FmtSpan, prelude::*, EnvFilter};

/// Environment variable holding the default log filter.
pub const LOG_ENV: &str = "TWITTER_AUTH_LOG";

const QUIET_TARGETS: [&str; 5] = ["hyper=off", "h2=off", "rustls=off", "reqwest=off", "mio=off"];

/// Initialize logging. `RUST_LOG` wins over `level` when set.
pub fn init_logging(level: &str) {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // Filter out noisy transport logs
    for directive in QUIET_TARGETS {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_span_events(FmtSpan::NONE)
        .compact()
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .init();
}

/// Level used when neither `--verbose` nor `RUST_LOG` decide it.
pub fn default_level(verbose: bool) -> String {
    if verbose {
        "debug".to_string()
    } else {
        std::env::var(LOG_ENV).unwrap_or_else(|_| "info".to_string())
    }
}
