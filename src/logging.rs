// Diagnostics go through tracing-subscriber. Stdout is reserved for result rows,
// so the console layer always writes to stderr.

use crate::config::LoggingConfig;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Default filter: `info` for this crate when verbose, `warn` otherwise.
/// `RUST_LOG` replaces it entirely when set.
fn build_env_filter(verbose: bool) -> anyhow::Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let level = if verbose { "info" } else { "warn" };
    let directives = format!("warn,orarun={}", level);
    EnvFilter::try_new(&directives)
        .map_err(|e| anyhow::anyhow!("Invalid tracing filter '{}': {}", directives, e))
}

pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let layer = match config.log_file.as_deref() {
        Some(file_path) => {
            if let Some(parent) = Path::new(file_path).parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            let log_file = OpenOptions::new().create(true).append(true).open(file_path)?;

            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file))
                .with_target(true)
                .with_filter(build_env_filter(config.verbose)?)
                .boxed()
        }
        None => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(build_env_filter(config.verbose)?)
            .boxed(),
    };

    tracing_subscriber::registry().with(layer).try_init()?;

    tracing::debug!(
        "Logging initialized: verbose={}, file={:?}",
        config.verbose,
        config.log_file
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_levels_follow_verbosity() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert!(build_env_filter(true).unwrap().to_string().contains("orarun=info"));
        assert!(build_env_filter(false).unwrap().to_string().contains("orarun=warn"));
    }
}
