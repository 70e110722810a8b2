//! Logging initialization.

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

use crate::settings::LoggingConfig;

/// Initialize logging based on configuration.
///
/// `RUST_LOG` wins over the configured level. Output goes to stderr so command
/// output on stdout stays machine-readable.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))?;

    let subscriber = Registry::default().with(filter);

    match config.format.as_str() {
        "json" => {
            let layer = fmt::layer()
                .json()
                .with_target(config.enable_target)
                .with_writer(std::io::stderr);
            tracing::subscriber::set_global_default(subscriber.with(layer))?;
        }
        _ => {
            let layer = fmt::layer()
                .with_target(config.enable_target)
                .with_writer(std::io::stderr);
            tracing::subscriber::set_global_default(subscriber.with(layer))?;
        }
    }

    tracing::debug!(format = %config.format, level = %config.level, "Console logging initialized");
    Ok(())
}
