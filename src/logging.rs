//! Logging - one global `tracing` subscriber for applications embedding the wallet.

use tracing_subscriber::{fmt, EnvFilter};

/// Set to `1` or `true` for JSON lines instead of human-readable output.
pub const LOG_JSON_ENV: &str = "HDWALLET_LOG_JSON";

/// Wallet events at info, everything else (reqwest, redis) at warn.
const DEFAULT_DIRECTIVES: &str = "warn,hdwallet=info";

/// Install the global subscriber on stderr, filtered by `RUST_LOG` when set.
///
/// Returns `false` when a subscriber was already installed; the existing one stays in place.
pub fn init_logging() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let installed = if wants_json(std::env::var(LOG_JSON_ENV).ok().as_deref()) {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
    installed.is_ok()
}

fn wants_json(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("1") | Some("true"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_switch() {
        assert!(wants_json(Some("1")));
        assert!(wants_json(Some("true ")));
        assert!(!wants_json(Some("0")));
        assert!(!wants_json(Some("yes")));
        assert!(!wants_json(None));
    }

    #[test]
    fn test_second_init_is_noop() {
        // Only caller in this test binary, so the first call installs.
        assert!(init_logging());
        assert!(!init_logging());
        tracing::info!("still logging after the second init");
    }
}
