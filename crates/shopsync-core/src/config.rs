use shopsync_api::TransportConfig;

use crate::query::QueryConfig;

/// Everything the storefront runtime needs to start.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend base URL, e.g. `https://api.example.com/store`.
    pub base_url: String,
    pub transport: TransportConfig,
    /// Cache tuning for the top-sellers query family.
    pub top_sellers: QueryConfig,
}

impl StorefrontConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            transport: TransportConfig::default(),
            top_sellers: QueryConfig::default(),
        }
    }
}
