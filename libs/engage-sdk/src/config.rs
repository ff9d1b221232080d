//! SDK configuration.
//!
//! Loaded with figment in three layers, later layers winning:
//! 1. built-in defaults (`#[serde(default)]`)
//! 2. an optional YAML file
//! 3. `ENGAGE_*` environment variables, `__` separating nested keys
//!    (`ENGAGE_CONNECTION__CONNECT_TIMEOUT=5s`)
//!
//! Durations use the humantime format (`500ms`, `30s`, `2m`).

use std::path::Path;
use std::time::Duration;

use engage_transport_grpc::CallCredentials;
use engage_transport_grpc::client::GrpcClientConfig;
use engage_transport_grpc::rpc_retry::RetryPolicy;
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::SdkError;

pub const PRODUCTION_ENDPOINT: &str = "https://api.engage.example:443";
pub const SANDBOX_ENDPOINT: &str = "https://api.sandbox.engage.example:443";
pub const ENV_PREFIX: &str = "ENGAGE_";

/// Platform deployment the SDK talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Production,
    Sandbox,
}

impl Environment {
    #[must_use]
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Production => PRODUCTION_ENDPOINT,
            Self::Sandbox => SANDBOX_ENDPOINT,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngageConfig {
    pub org_id: String,
    pub app_id: String,
    #[serde(deserialize_with = "secret::deserialize")]
    pub api_key: SecretString,
    #[serde(deserialize_with = "secret::deserialize_opt")]
    pub auth_token: Option<SecretString>,
    pub environment: Environment,
    /// Overrides the environment's endpoint, e.g. for a local test server.
    pub endpoint: Option<String>,
    pub connection: ConnectionConfig,
    pub notifications: NotificationConfig,
}

impl Default for EngageConfig {
    fn default() -> Self {
        Self {
            org_id: String::new(),
            app_id: String::new(),
            api_key: SecretString::from(String::new()),
            auth_token: None,
            environment: Environment::default(),
            endpoint: None,
            connection: ConnectionConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

impl EngageConfig {
    #[must_use]
    pub fn new(
        org_id: impl Into<String>,
        app_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            org_id: org_id.into(),
            app_id: app_id.into(),
            api_key: SecretString::from(api_key.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(SecretString::from(token.into()));
        self
    }

    #[must_use]
    pub fn with_dispatch_mode(mut self, mode: DispatchMode) -> Self {
        self.notifications.dispatch_mode = mode;
        self
    }

    /// Load from an optional YAML file and `ENGAGE_*` environment variables.
    ///
    /// # Errors
    /// Returns [`SdkError::Config`] when a layer cannot be parsed or the
    /// merged configuration is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, SdkError> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::from_figment(&figment)
    }

    /// Extract and validate from a prepared figment.
    ///
    /// # Errors
    /// Returns [`SdkError::Config`] on extraction or validation failure.
    pub fn from_figment(figment: &Figment) -> Result<Self, SdkError> {
        let config: Self = figment
            .extract()
            .map_err(|e| SdkError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns [`SdkError::Config`] naming the first invalid setting.
    pub fn validate(&self) -> Result<(), SdkError> {
        if self.org_id.trim().is_empty() {
            return Err(SdkError::Config("org_id must not be empty".to_owned()));
        }
        if self.app_id.trim().is_empty() {
            return Err(SdkError::Config("app_id must not be empty".to_owned()));
        }
        if self.api_key.expose_secret().trim().is_empty() {
            return Err(SdkError::Config("api_key must not be empty".to_owned()));
        }
        if self.notifications.lane_capacity == 0 {
            return Err(SdkError::Config(
                "notifications.lane_capacity must be positive".to_owned(),
            ));
        }
        if self.notifications.error_channel_capacity == 0 {
            return Err(SdkError::Config(
                "notifications.error_channel_capacity must be positive".to_owned(),
            ));
        }
        Ok(())
    }

    /// Endpoint URI after applying the override.
    #[must_use]
    pub fn resolved_endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.environment.endpoint())
    }

    #[must_use]
    pub fn credentials(&self) -> CallCredentials {
        let creds = CallCredentials::new(self.api_key.clone());
        match &self.auth_token {
            Some(token) => creds.with_auth_token(token.clone()),
            None => creds,
        }
    }
}

/// Channel and connect-retry settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    #[serde(deserialize_with = "humantime_duration::deserialize")]
    pub connect_timeout: Duration,
    #[serde(deserialize_with = "humantime_duration::deserialize")]
    pub keep_alive_interval: Duration,
    #[serde(deserialize_with = "humantime_duration::deserialize")]
    pub keep_alive_timeout: Duration,
    /// Keep pinging while no notification stream is open.
    pub permit_without_stream: bool,
    pub max_retries: u32,
    #[serde(deserialize_with = "humantime_duration::deserialize")]
    pub base_backoff: Duration,
    #[serde(deserialize_with = "humantime_duration::deserialize")]
    pub max_backoff: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            keep_alive_interval: Duration::from_secs(30),
            keep_alive_timeout: Duration::from_secs(10),
            permit_without_stream: true,
            max_retries: 3,
            base_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl ConnectionConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries)
            .with_base_backoff(self.base_backoff)
            .with_max_backoff(self.max_backoff)
    }

    #[must_use]
    pub fn to_grpc_config(&self) -> GrpcClientConfig {
        GrpcClientConfig::new("engage")
            .with_connect_timeout(self.connect_timeout)
            .with_keep_alive(self.keep_alive_interval, self.keep_alive_timeout)
            .with_permit_without_stream(self.permit_without_stream)
            .with_retry(self.retry_policy())
    }
}

/// How the notification worker hands frames to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Each frame is fully published before the next one is read.
    #[default]
    Sequential,
    /// Each kind gets its own ordered lane; intake keeps reading while a
    /// slow subscriber works through its lane.
    PerKindLanes,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub dispatch_mode: DispatchMode,
    /// Frames buffered per kind in [`DispatchMode::PerKindLanes`].
    pub lane_capacity: usize,
    /// Stream errors buffered for the consumer; overflow is logged and dropped.
    pub error_channel_capacity: usize,
    pub reconnect: ReconnectPolicy,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            dispatch_mode: DispatchMode::default(),
            lane_capacity: 64,
            error_channel_capacity: 16,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

/// Reopen policy for the notification stream.
///
/// The attempt counter resets once a frame is received on a reopened stream.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    /// Consecutive reopen attempts; `None` retries forever, `Some(0)` never.
    pub max_attempts: Option<u32>,
    #[serde(deserialize_with = "humantime_duration::deserialize")]
    pub base_backoff: Duration,
    #[serde(deserialize_with = "humantime_duration::deserialize")]
    pub max_backoff: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: None,
            base_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl ReconnectPolicy {
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            max_attempts: Some(0),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn allows(&self, attempt: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempt <= max)
    }

    /// Delay before reopen attempt number `attempt` (1-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        RetryPolicy::new(0)
            .with_base_backoff(self.base_backoff)
            .with_max_backoff(self.max_backoff)
            .backoff(attempt)
    }
}

mod humantime_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

mod secret {
    use secrecy::SecretString;
    use serde::{Deserialize, Deserializer};

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretString::from)
    }

    pub(super) fn deserialize_opt<'de, D>(
        deserializer: D,
    ) -> Result<Option<SecretString>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<String>::deserialize(deserializer)?
            .filter(|s| !s.is_empty())
            .map(SecretString::from))
    }
}
