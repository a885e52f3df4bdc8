//! Error telemetry
//!
//! `init_sentry` starts the Sentry client for the configured DSN and `layer`
//! plugs it into the tracing subscriber. Only ERROR-level events are
//! reported; the SDK queues them and posts them from its own transport
//! thread, dropping events when the queue is full.

use sentry::types::{Dsn, ParseDsnError};
use sentry::{ClientInitGuard, ClientOptions};
use sentry_tracing::{EventFilter, SentryLayer};
use thiserror::Error;
use tracing::{Level, Metadata, Subscriber};
use tracing_subscriber::registry::LookupSpan;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid telemetry DSN: {0}")]
    InvalidDsn(#[from] ParseDsnError),
}

/// Client options for a DSN and deployment environment
pub fn client_options(dsn: &str, environment: &str) -> Result<ClientOptions, TelemetryError> {
    let dsn: Dsn = dsn.trim().parse()?;
    Ok(ClientOptions {
        dsn: Some(dsn),
        release: sentry::release_name!(),
        environment: Some(environment.to_string().into()),
        ..Default::default()
    })
}

/// Starts the Sentry client
///
/// ### Returns
///
/// The guard that flushes pending events when dropped; keep it alive until
/// the server exits
///
/// ### Errors
///
/// Returns an error if the DSN cannot be parsed
pub fn init_sentry(dsn: &str, environment: &str) -> Result<ClientInitGuard, TelemetryError> {
    Ok(sentry::init(client_options(dsn, environment)?))
}

fn event_filter(metadata: &Metadata<'_>) -> EventFilter {
    if *metadata.level() == Level::ERROR {
        EventFilter::Event
    } else {
        EventFilter::Ignore
    }
}

/// Tracing layer reporting ERROR events to Sentry
pub fn layer<S>() -> SentryLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    sentry_tracing::layer().event_filter(event_filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_client_options() {
        let options = client_options(" https://abc123@o42.ingest.example.io/7 ", "staging").unwrap();
        let dsn = options.dsn.as_ref().unwrap();
        assert_eq!(dsn.public_key(), "abc123");
        assert_eq!(dsn.host(), "o42.ingest.example.io");
        assert_eq!(options.environment.as_deref(), Some("staging"));
        assert!(options.release.as_deref().unwrap().starts_with("elevra@"));
    }

    #[test]
    fn test_invalid_dsn() {
        assert!(client_options("not a dsn", "production").is_err());
        assert!(client_options("https://o42.ingest.example.io/7", "production").is_err());
    }

    #[test]
    fn test_layer_forwards_only_errors() {
        let events = sentry::test::with_captured_events(|| {
            let subscriber = tracing_subscriber::registry().with(layer());
            tracing::subscriber::with_default(subscriber, || {
                tracing::info!("just saying hello");
                tracing::warn!("getting worried");
                tracing::error!(donation_id = 42, "Payment confirmation failed");
            });
        });

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].level, sentry::Level::Error);
        assert_eq!(events[0].message.as_deref(), Some("Payment confirmation failed"));
    }
}
