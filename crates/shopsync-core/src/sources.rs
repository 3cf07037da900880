// ── Backend-backed sources ──
//
// Adapters that plug the API client into the collection store and the
// query cache. Each source owns a shared client handle so the stores can
// be spawned onto background tasks.

use std::future::Future;
use std::sync::Arc;

use shopsync_api::{
    ApiClient, Category, Error, TokenProvider, TopSellersQuery, TopSellersResponse,
};

use crate::query::{QueryParams, QuerySource};
use crate::store::{CollectionPage, CollectionSource};

/// Category collection, loaded from `GET v1/categories`.
pub struct CategorySource<P: TokenProvider + 'static> {
    client: Arc<ApiClient<P>>,
}

impl<P: TokenProvider + 'static> CategorySource<P> {
    pub fn new(client: Arc<ApiClient<P>>) -> Self {
        Self { client }
    }
}

impl<P: TokenProvider + 'static> CollectionSource for CategorySource<P> {
    type Item = Category;

    fn load(&self) -> impl Future<Output = Result<CollectionPage<Category>, Error>> + Send {
        let client = Arc::clone(&self.client);
        async move {
            let resp = client.list_categories().await?;
            Ok(CollectionPage {
                items: resp.categories,
                count: resp.count,
            })
        }
    }
}

impl QueryParams for TopSellersQuery {
    const FAMILY: &'static str = "top-sellers";

    fn cache_params(&self) -> Vec<(String, String)> {
        self.request_params()
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v))
            .collect()
    }
}

/// Top-selling products, loaded from `GET v1/products/top-sellers`.
pub struct TopSellersSource<P: TokenProvider + 'static> {
    client: Arc<ApiClient<P>>,
}

impl<P: TokenProvider + 'static> TopSellersSource<P> {
    pub fn new(client: Arc<ApiClient<P>>) -> Self {
        Self { client }
    }
}

impl<P: TokenProvider + 'static> QuerySource for TopSellersSource<P> {
    type Params = TopSellersQuery;
    type Output = TopSellersResponse;

    fn fetch(
        &self,
        params: &TopSellersQuery,
    ) -> impl Future<Output = Result<TopSellersResponse, Error>> + Send {
        let client = Arc::clone(&self.client);
        let query = params.clone();
        async move { client.top_sellers(&query).await }
    }
}
