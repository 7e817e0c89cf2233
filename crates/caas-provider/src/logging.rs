//! Tracing initialisation.
//!
//! Stdout carries the host plugin handshake, so log output goes to stderr.

use tracing::Subscriber;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info,caas=debug";

fn subscriber(filter: EnvFilter) -> impl Subscriber + Send + Sync {
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
}

/// Install the global tracing subscriber.
///
/// Returns false if a subscriber was already installed.
pub fn init() -> bool {
    subscriber(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use tracing::Level;

    use super::*;

    #[test]
    fn default_filter_enables_debug_for_provider_crates_only() {
        let filter = EnvFilter::try_new(DEFAULT_FILTER).unwrap();

        tracing::subscriber::with_default(subscriber(filter), || {
            assert!(tracing::enabled!(target: "caas_provider::cluster", Level::DEBUG));
            assert!(tracing::enabled!(target: "reqwest::connect", Level::INFO));
            assert!(!tracing::enabled!(target: "reqwest::connect", Level::DEBUG));
        });
    }
}
