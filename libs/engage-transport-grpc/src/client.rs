//! Channel configuration and connection helpers.
//!
//! The platform is reached over a single long-lived HTTP/2 channel shared by
//! unary calls and the notification stream. This module owns:
//! - connect and per-call timeouts
//! - HTTP/2 keep-alive, including pings while no stream is active
//! - TLS for `https://` endpoints (webpki roots)
//! - connect retries with capped linear backoff
//!
//! Retries of individual calls live in [`crate::rpc_retry`].

use std::time::Duration;

use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tracing::Instrument;

use crate::rpc_retry::RetryPolicy;

fn duration_to_u64_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Transport settings for the platform channel.
#[derive(Debug, Clone)]
pub struct GrpcClientConfig {
    /// Timeout for establishing the connection.
    pub connect_timeout: Duration,

    /// Default deadline applied by the channel to every call.
    ///
    /// Unary operations usually override it per request; the notification
    /// stream must not be bounded by it, so `None` disables the channel-wide
    /// deadline.
    pub rpc_timeout: Option<Duration>,

    /// Interval between HTTP/2 keep-alive pings.
    pub keep_alive_interval: Duration,

    /// How long to wait for a keep-alive ack before closing the connection.
    pub keep_alive_timeout: Duration,

    /// Send keep-alive pings even when no call is in flight.
    pub permit_without_stream: bool,

    /// Connect retries performed by [`connect_with_retry`].
    pub retry: RetryPolicy,

    /// Name used in tracing spans and log fields.
    pub service_name: &'static str,
}

impl Default for GrpcClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            rpc_timeout: None,
            keep_alive_interval: Duration::from_secs(30),
            keep_alive_timeout: Duration::from_secs(10),
            permit_without_stream: true,
            retry: RetryPolicy::default(),
            service_name: "engage",
        }
    }
}

impl GrpcClientConfig {
    #[must_use]
    pub fn new(service_name: &'static str) -> Self {
        Self {
            service_name,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_rpc_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_keep_alive(mut self, interval: Duration, timeout: Duration) -> Self {
        self.keep_alive_interval = interval;
        self.keep_alive_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_permit_without_stream(mut self, enabled: bool) -> Self {
        self.permit_without_stream = enabled;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Build a tonic `Endpoint` from the URI and configuration.
///
/// `https://` URIs get a TLS config backed by the webpki root store;
/// plain `http://` is accepted for local and test servers.
///
/// # Errors
/// Returns an error when the URI is malformed or TLS cannot be configured.
pub fn build_endpoint(
    uri: String,
    cfg: &GrpcClientConfig,
) -> Result<Endpoint, tonic::transport::Error> {
    let mut endpoint = Endpoint::from_shared(uri)?
        .connect_timeout(cfg.connect_timeout)
        .tcp_keepalive(Some(cfg.keep_alive_interval))
        .http2_keep_alive_interval(cfg.keep_alive_interval)
        .keep_alive_timeout(cfg.keep_alive_timeout)
        .keep_alive_while_idle(cfg.permit_without_stream);

    if let Some(timeout) = cfg.rpc_timeout {
        endpoint = endpoint.timeout(timeout);
    }

    if endpoint.uri().scheme_str() == Some("https") {
        endpoint = endpoint.tls_config(ClientTlsConfig::new().with_webpki_roots())?;
    }

    Ok(endpoint)
}

/// Open a channel once, without retries.
///
/// # Errors
/// Returns an error when the endpoint is invalid or the connection fails.
pub async fn connect_with_stack<TClient>(
    uri: impl Into<String>,
    cfg: &GrpcClientConfig,
) -> anyhow::Result<TClient>
where
    TClient: From<Channel>,
{
    let uri_string = uri.into();
    let span = tracing::debug_span!(
        "grpc_connect",
        service = cfg.service_name,
        uri = %uri_string
    );

    async move {
        let endpoint = build_endpoint(uri_string, cfg)?;
        let channel = endpoint.connect().await?;

        tracing::info!(
            service = cfg.service_name,
            connect_timeout_ms = duration_to_u64_ms(cfg.connect_timeout),
            keep_alive_interval_ms = duration_to_u64_ms(cfg.keep_alive_interval),
            permit_without_stream = cfg.permit_without_stream,
            "gRPC channel connected"
        );

        Ok(TClient::from(channel))
    }
    .instrument(span)
    .await
}

/// Open a channel, retrying failed attempts according to `cfg.retry`.
///
/// # Errors
/// Returns the last connection error once the retry budget is spent.
pub async fn connect_with_retry<TClient>(
    uri: impl Into<String>,
    cfg: &GrpcClientConfig,
) -> anyhow::Result<TClient>
where
    TClient: From<Channel>,
{
    use anyhow::Context;

    let uri_string = uri.into();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        match connect_with_stack::<TClient>(uri_string.as_str(), cfg).await {
            Ok(client) => {
                if attempt > 1 {
                    tracing::info!(
                        service = cfg.service_name,
                        attempt,
                        "gRPC channel connected after retries"
                    );
                }
                return Ok(client);
            }
            Err(e) if attempt <= cfg.retry.max_retries => {
                let backoff = cfg.retry.backoff(attempt);
                tracing::warn!(
                    service = cfg.service_name,
                    attempt,
                    max_retries = cfg.retry.max_retries,
                    error = %e,
                    backoff_ms = duration_to_u64_ms(backoff),
                    "gRPC connect failed, retrying"
                );
                tokio::time::sleep(backoff).await;
            }
            Err(e) => {
                tracing::error!(
                    service = cfg.service_name,
                    attempt,
                    error = %e,
                    "gRPC connect failed, giving up"
                );
                return Err(e).context(format!(
                    "failed to connect to {} at {uri_string} after {attempt} attempts",
                    cfg.service_name
                ));
            }
        }
    }
}
