//! Tracing setup and the last-resort error reporter.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Install a fmt subscriber filtered by `RUST_LOG` (default [`DEFAULT_FILTER`]).
///
/// Calling it more than once is harmless; later calls leave the first
/// subscriber in place.
pub fn init() {
    init_with_default(DEFAULT_FILTER);
}

/// Like [`init`], with a custom fallback filter such as
/// `"pantry_fetch=debug,info"`.
pub fn init_with_default(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

/// Log an error nobody handled.
///
/// `origin` names where it surfaced (for example `"client"` or `"app"`).
pub fn report_error(origin: &str, error: &(dyn std::error::Error + 'static)) {
    let mut causes = Vec::new();
    let mut source = error.source();
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }

    tracing::error!(origin, error = %error, causes = ?causes, "Unhandled error");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("outer")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn test_init_twice_is_harmless() {
        init();
        init_with_default("debug");
    }

    #[test]
    fn test_report_error_walks_sources() {
        let error = Outer(std::io::Error::other("inner"));
        report_error("client", &error);
    }
}
