//! Tracing setup for hosts embedding the portal core.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Load `.env` and install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` is used (for
/// example `"portal_sync=debug,portal_store=info"`). Returns `false` if a
/// subscriber was already installed.
pub fn init_tracing(default_filter: &str) -> bool {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
