// ── Declarative keyed query cache ──

mod cache;
mod key;

pub use cache::{
    QueryCache, QueryConfig, QuerySource, QueryState, QuerySubscription, RefreshMode,
};
pub use key::{QueryKey, QueryParams};
