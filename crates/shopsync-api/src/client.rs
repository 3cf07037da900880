// Async HTTP client for the storefront backend.
//
// This is the single interception point for outbound calls: every request
// passes through here, picks up the bearer credential when one is stored,
// and propagates the backend's success/failure outcome unchanged.

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::auth::TokenProvider;
use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{CategoriesResponse, TopSellersQuery, TopSellersResponse};

// ── Error response shape from the backend ────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the storefront backend.
///
/// Generic over the credential source so the pipeline can be exercised
/// with a fixed token in tests and the keyring on device. The token is
/// looked up per request — it rotates underneath a running app.
pub struct ApiClient<P: TokenProvider> {
    http: reqwest::Client,
    base_url: Url,
    tokens: P,
}

impl<P: TokenProvider> ApiClient<P> {
    /// Build from a base URL, transport config, and credential provider.
    pub fn new(base_url: &str, transport: &TransportConfig, tokens: P) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let base_url = normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            tokens,
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages transport settings).
    pub fn with_client(http: reqwest::Client, base_url: &str, tokens: P) -> Result<Self, Error> {
        let base_url = normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            tokens,
        })
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path (e.g. `"v1/categories"`) onto the base URL.
    fn url(&self, path: &str) -> Url {
        // base_url always ends with `/`, so joining relative paths works.
        self.base_url
            .join(path)
            .expect("path should be valid relative URL")
    }

    // ── Request pipeline ─────────────────────────────────────────────

    /// Issue a GET through the credential pipeline.
    ///
    /// Attaches `Authorization: Bearer <token>` when a credential is
    /// stored; sends unauthenticated otherwise. Transport and backend
    /// failures pass through to the caller unchanged.
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path);
        debug!("GET {url} params={params:?}");

        let mut request = self.http.get(url);
        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(token) = self.tokens.bearer_token().await {
            match HeaderValue::from_str(&format!("Bearer {}", token.expose_secret())) {
                Ok(mut value) => {
                    // Keep the credential out of header debug output.
                    value.set_sensitive(true);
                    request = request.header(AUTHORIZATION, value);
                }
                Err(e) => {
                    warn!(error = %e, "stored credential is not header-safe — sending unauthenticated");
                }
            }
        }

        let resp = request.send().await?;
        handle_response(resp).await
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Fetch the full category collection.
    pub async fn list_categories(&self) -> Result<CategoriesResponse, Error> {
        self.get("v1/categories", &[]).await
    }

    /// Fetch the top-selling products for the given query.
    pub async fn top_sellers(&self, query: &TopSellersQuery) -> Result<TopSellersResponse, Error> {
        self.get("v1/products/top-sellers", &query.request_params())
            .await
    }
}

// ── Response handling ────────────────────────────────────────────────

/// Ensure the base URL ends with a trailing slash so relative joins work.
fn normalize_base_url(raw: &str) -> Result<Url, Error> {
    let mut url = Url::parse(raw)?;
    let path = url.path().trim_end_matches('/').to_owned();
    url.set_path(&format!("{path}/"));
    Ok(url)
}

async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    if status.is_success() {
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            let preview = &body[..body.len().min(200)];
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    } else {
        Err(parse_error(status, resp).await)
    }
}

async fn parse_error(status: StatusCode, resp: reqwest::Response) -> Error {
    if status == StatusCode::UNAUTHORIZED {
        return Error::Unauthorized;
    }

    let raw = resp.text().await.unwrap_or_default();

    if let Ok(err) = serde_json::from_str::<ErrorResponse>(&raw) {
        Error::Api {
            status: status.as_u16(),
            message: err.message.unwrap_or_else(|| status.to_string()),
            code: err.code,
        }
    } else {
        Error::Api {
            status: status.as_u16(),
            message: if raw.is_empty() {
                status.to_string()
            } else {
                raw
            },
            code: None,
        }
    }
}
