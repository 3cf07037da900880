// ── Storefront facade ──
//
// One handle that owns the API client, the category store, and the
// top-sellers query cache. UI layers hold clones of this and talk to
// nothing else.

use std::sync::Arc;

use shopsync_api::{ApiClient, Category, Error, TokenProvider, TopSellersQuery, TopSellersResponse};

use crate::config::StorefrontConfig;
use crate::query::{QueryCache, QueryState, QuerySubscription};
use crate::sources::{CategorySource, TopSellersSource};
use crate::store::{CollectionState, CollectionStore};
use crate::stream::StateStream;

/// The storefront sync runtime.
///
/// Cheaply cloneable; every clone shares the same caches. Dropping the
/// last clone does not cancel in-flight work — call
/// [`shutdown()`](Self::shutdown) for that.
pub struct Storefront<P: TokenProvider + 'static> {
    client: Arc<ApiClient<P>>,
    categories: Arc<CollectionStore<CategorySource<P>>>,
    top_sellers: QueryCache<TopSellersSource<P>>,
}

impl<P: TokenProvider + 'static> Clone for Storefront<P> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            categories: Arc::clone(&self.categories),
            top_sellers: self.top_sellers.clone(),
        }
    }
}

impl<P: TokenProvider + 'static> Storefront<P> {
    pub fn new(config: &StorefrontConfig, tokens: P) -> Result<Self, Error> {
        let client = Arc::new(ApiClient::new(
            &config.base_url,
            &config.transport,
            tokens,
        )?);
        Ok(Self {
            categories: Arc::new(CollectionStore::new(CategorySource::new(Arc::clone(
                &client,
            )))),
            top_sellers: QueryCache::new(
                TopSellersSource::new(Arc::clone(&client)),
                config.top_sellers,
            ),
            client,
        })
    }

    /// Direct access to the API client, for calls outside the caches.
    pub fn client(&self) -> &Arc<ApiClient<P>> {
        &self.client
    }

    // ── Categories (hand-rolled store) ───────────────────────────────

    /// Refresh the category collection from the backend.
    pub async fn refresh_categories(&self) {
        self.categories.fetch().await;
    }

    /// Snapshot of the current category state.
    pub fn categories(&self) -> CollectionState<Category> {
        self.categories.state()
    }

    pub fn subscribe_categories(&self) -> StateStream<CollectionState<Category>> {
        self.categories.subscribe()
    }

    pub fn clear_category_error(&self) {
        self.categories.clear_error();
    }

    /// Overwrite the cached categories without a network call.
    pub fn set_categories(&self, categories: Vec<Category>) {
        self.categories.set_items(categories);
    }

    // ── Top sellers (keyed query cache) ──────────────────────────────

    /// The top-sellers state for this query, fetching as needed.
    pub async fn top_sellers(&self, query: &TopSellersQuery) -> QueryState<TopSellersResponse> {
        self.top_sellers.resource(query).await
    }

    /// Force a revalidation of this query, joining any fetch in flight.
    pub async fn refresh_top_sellers(
        &self,
        query: &TopSellersQuery,
    ) -> QueryState<TopSellersResponse> {
        self.top_sellers.refresh(query).await
    }

    pub fn subscribe_top_sellers(
        &self,
        query: &TopSellersQuery,
    ) -> QuerySubscription<TopSellersResponse> {
        self.top_sellers.subscribe(query)
    }

    /// Stop background refreshes and cache maintenance.
    pub fn shutdown(&self) {
        self.top_sellers.shutdown();
    }
}
