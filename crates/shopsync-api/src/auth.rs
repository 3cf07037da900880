// ── Credential provider ──
//
// Retrieves the persisted bearer token from device storage. Absence is a
// valid state, not an error: every provider returns `Option` and the
// request pipeline degrades to unauthenticated when it gets `None`.

use std::future::Future;

use secrecy::SecretString;
use tracing::{debug, warn};

/// The device-storage key under which the bearer token is persisted.
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// Keyring service name for the storefront app.
pub const KEYRING_SERVICE: &str = "shopsync";

/// Source of the bearer credential attached to outbound requests.
///
/// Implementations must never fail the request flow: storage problems are
/// logged and reported as absence. The token rotates, so the pipeline
/// consults the provider on every request rather than caching the value.
pub trait TokenProvider: Send + Sync {
    fn bearer_token(&self) -> impl Future<Output = Option<SecretString>> + Send;
}

/// Reads the token from the OS keyring (the device's secure storage).
#[derive(Debug, Clone)]
pub struct KeyringTokenProvider {
    service: String,
    key: String,
}

impl Default for KeyringTokenProvider {
    fn default() -> Self {
        Self {
            service: KEYRING_SERVICE.to_owned(),
            key: AUTH_TOKEN_KEY.to_owned(),
        }
    }
}

impl KeyringTokenProvider {
    /// Provider for a non-default service/key pair (tests, multi-tenant builds).
    pub fn new(service: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            key: key.into(),
        }
    }
}

impl TokenProvider for KeyringTokenProvider {
    fn bearer_token(&self) -> impl Future<Output = Option<SecretString>> + Send {
        let service = self.service.clone();
        let key = self.key.clone();

        async move {
            // Keyring access is blocking; keep it off the async workers.
            let lookup = tokio::task::spawn_blocking(move || {
                keyring::Entry::new(&service, &key).and_then(|entry| entry.get_password())
            })
            .await;

            match lookup {
                Ok(Ok(token)) => Some(SecretString::from(token)),
                Ok(Err(keyring::Error::NoEntry)) => {
                    debug!("no stored credential — sending unauthenticated");
                    None
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "credential lookup failed — sending unauthenticated");
                    None
                }
                Err(e) => {
                    warn!(error = %e, "credential lookup task failed — sending unauthenticated");
                    None
                }
            }
        }
    }
}

/// A fixed token. Used by tests and by plaintext/env-var configuration.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider(SecretString);

impl StaticTokenProvider {
    pub fn new(token: SecretString) -> Self {
        Self(token)
    }
}

impl TokenProvider for StaticTokenProvider {
    fn bearer_token(&self) -> impl Future<Output = Option<SecretString>> + Send {
        let token = self.0.clone();
        async move { Some(token) }
    }
}

/// Never supplies a token. All requests go out unauthenticated.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl TokenProvider for Anonymous {
    fn bearer_token(&self) -> impl Future<Output = Option<SecretString>> + Send {
        async { None }
    }
}

/// The resolved credential source for a running app.
///
/// Configuration picks one variant at startup (env var or plaintext →
/// `Static`, device storage → `Keyring`, nothing configured → `Anonymous`).
#[derive(Debug, Clone)]
pub enum TokenSource {
    Keyring(KeyringTokenProvider),
    Static(StaticTokenProvider),
    Anonymous,
}

impl TokenProvider for TokenSource {
    fn bearer_token(&self) -> impl Future<Output = Option<SecretString>> + Send {
        async move {
            match self {
                Self::Keyring(p) => p.bearer_token().await,
                Self::Static(p) => p.bearer_token().await,
                Self::Anonymous => None,
            }
        }
    }
}
