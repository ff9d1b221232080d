#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

//! Transport plumbing shared by the Engage SDK crates.
//!
//! - [`client`]: channel construction with TLS, keep-alive and connect retries
//! - [`rpc_retry`]: retry helper for idempotent unary calls
//! - credential metadata helpers (this module)

pub mod client;
pub mod rpc_retry;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tonic::metadata::{MetadataMap, MetadataValue};
use tonic::{Request, Status};

pub const API_KEY_METADATA_KEY: &str = "api-key";
pub const AUTH_TOKEN_METADATA_KEY: &str = "auth-token";

/// Credentials carried as request metadata on every call.
#[derive(Clone, Debug)]
pub struct CallCredentials {
    api_key: SecretString,
    auth_token: Option<SecretString>,
}

impl CallCredentials {
    #[must_use]
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            auth_token: None,
        }
    }

    #[must_use]
    pub fn with_auth_token(mut self, token: SecretString) -> Self {
        self.auth_token = Some(token);
        self
    }

    #[must_use]
    pub fn has_auth_token(&self) -> bool {
        self.auth_token.is_some()
    }
}

/// Write the API key and, when present, the auth token into `meta`.
///
/// # Errors
/// Returns `InvalidArgument` when a credential is not valid ASCII metadata.
pub fn attach_credentials(meta: &mut MetadataMap, creds: &CallCredentials) -> Result<(), Status> {
    let api_key = MetadataValue::try_from(creds.api_key.expose_secret())
        .map_err(|e| Status::invalid_argument(format!("api key metadata: {e}")))?;
    meta.insert(API_KEY_METADATA_KEY, api_key);

    if let Some(token) = &creds.auth_token {
        let token = MetadataValue::try_from(token.expose_secret())
            .map_err(|e| Status::invalid_argument(format!("auth token metadata: {e}")))?;
        meta.insert(AUTH_TOKEN_METADATA_KEY, token);
    }
    Ok(())
}

/// Wrap `message` into a request carrying credentials and a per-call deadline.
///
/// # Errors
/// Propagates [`attach_credentials`] failures.
pub fn authorized_request<T>(
    message: T,
    creds: &CallCredentials,
    timeout: Option<Duration>,
) -> Result<Request<T>, Status> {
    let mut request = Request::new(message);
    attach_credentials(request.metadata_mut(), creds)?;
    if let Some(timeout) = timeout {
        request.set_timeout(timeout);
    }
    Ok(request)
}
