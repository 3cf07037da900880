//! Client-side remote-data layer for the storefront app.
//!
//! Two caching disciplines live here, side by side:
//!
//! - [`store`] — a hand-rolled single-collection cache with explicit
//!   loading/error/data fields, refreshed imperatively.
//! - [`query`] — a declarative keyed cache where each parameter set gets
//!   its own entry with freshness tracking, request coalescing, and
//!   garbage collection.
//!
//! [`Storefront`] ties both to the API client behind one cloneable
//! handle.

pub mod config;
pub mod query;
pub mod sources;
pub mod store;
pub mod storefront;
mod stream;

pub use config::StorefrontConfig;
pub use query::{
    QueryCache, QueryConfig, QueryKey, QueryParams, QuerySource, QueryState, QuerySubscription,
    RefreshMode,
};
pub use sources::{CategorySource, TopSellersSource};
pub use store::{CollectionPage, CollectionSource, CollectionState, CollectionStore};
pub use storefront::Storefront;
pub use stream::StateStream;
