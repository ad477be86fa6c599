use std::fs::OpenOptions;
use std::sync::Arc;

use color_eyre::eyre::WrapErr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::AppConfig;

/// Route `tracing` output to the configured log file. The terminal belongs
/// to the UI, so nothing is written to stdout or stderr.
///
/// `RUST_LOG` wins over the defaults (`info`, or `debug` with `--debug`).
pub fn init_logging(config: &AppConfig) -> color_eyre::Result<()> {
    if let Some(parent) = config.log_file.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .wrap_err_with(|| format!("cannot open log file {}", config.log_file.display()))?;

    let default_level = if config.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{default_level},hyper=warn,reqwest=warn")));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(log_file))
                .with_ansi(false),
        )
        .try_init()
        .wrap_err("logging already initialised")?;

    tracing::info!(
        api_base = %config.api_base,
        log_file = %config.log_file.display(),
        "logging initialised"
    );
    Ok(())
}
