//! Logger setup for the binary

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when neither a flag, `RUST_LOG` nor the config sets one
pub const DEFAULT_FILTER: &str = "warn";

/// Pick the log filter: explicit level, then `RUST_LOG`, then the config
/// file, then [`DEFAULT_FILTER`].
pub fn resolve_filter(cli_level: Option<&str>, config_level: Option<&str>) -> String {
    if let Some(level) = cli_level {
        return level.to_string();
    }

    if let Ok(level) = std::env::var("RUST_LOG") {
        if !level.trim().is_empty() {
            return level;
        }
    }

    config_level.unwrap_or(DEFAULT_FILTER).to_string()
}

/// Install a stderr subscriber so diagnostics stay off stdout
pub fn init_logging(filter: &str) -> Result<()> {
    let filter = EnvFilter::try_new(filter)
        .with_context(|| format!("invalid log filter '{}'", filter))?;

    // An already installed global subscriber is kept
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_target(false),
        )
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_level_wins() {
        assert_eq!(resolve_filter(Some("trace"), Some("info")), "trace");
    }
}
