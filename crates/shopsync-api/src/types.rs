// Wire types for the storefront backend (JSON, camelCase).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Catalog entities ─────────────────────────────────────────────────

/// A product category as returned by `GET v1/categories`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Number of active products in the category, when the backend sends it.
    #[serde(default)]
    pub product_count: Option<u32>,
}

/// A storefront product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    /// Price in the smallest currency unit.
    pub price_cents: u64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub units_sold: Option<u64>,
}

// ── Response envelopes ───────────────────────────────────────────────

/// Response shape of `GET v1/categories`.
///
/// Both fields default when the backend omits them — the category store
/// treats a missing list as empty rather than a decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoriesResponse {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub count: u64,
}

/// Response shape of `GET v1/products/top-sellers`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopSellersResponse {
    #[serde(default)]
    pub products: Vec<Product>,
}

// ── Query parameters ─────────────────────────────────────────────────

/// Aggregation window for the top-sellers ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SalesPeriod {
    Day,
    #[default]
    Week,
    Month,
}

impl SalesPeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

/// Parameters of a top-sellers query. One distinct value of this struct
/// corresponds to one cache key in the declarative query cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopSellersQuery {
    pub period: SalesPeriod,
    pub limit: u32,
    /// Restrict the ranking to one category (by slug).
    pub category: Option<String>,
}

impl Default for TopSellersQuery {
    fn default() -> Self {
        Self {
            period: SalesPeriod::default(),
            limit: 10,
            category: None,
        }
    }
}

impl TopSellersQuery {
    /// The query string pairs sent to the backend, in a stable order.
    pub fn request_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("limit", self.limit.to_string()),
            ("period", self.period.as_str().to_owned()),
        ];
        if let Some(ref category) = self.category {
            params.push(("category", category.clone()));
        }
        params
    }
}
