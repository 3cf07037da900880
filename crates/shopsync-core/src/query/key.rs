// ── Query keys ──
//
// A cache key is (collection family, normalized parameters). Parameters
// are normalized by sorting the key/value pairs, so two queries that
// differ only in parameter order share one cache entry.

use std::fmt;

/// Key of one query cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    family: &'static str,
    params: Vec<(String, String)>,
}

impl QueryKey {
    pub fn new(family: &'static str, mut params: Vec<(String, String)>) -> Self {
        params.sort();
        Self { family, params }
    }

    pub fn family(&self) -> &'static str {
        self.family
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.family)?;
        for (i, (k, v)) in self.params.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{k}={v}")?;
        }
        Ok(())
    }
}

/// Parameter set that maps onto a query cache key.
///
/// `Clone + 'static` because coalesced fetches are driven by spawned
/// tasks that own their parameters.
pub trait QueryParams: Clone + Send + Sync + 'static {
    /// Stable name of the key family (e.g. `"top-sellers"`).
    const FAMILY: &'static str;

    /// The parameter pairs that distinguish cache entries.
    fn cache_params(&self) -> Vec<(String, String)>;

    fn cache_key(&self) -> QueryKey {
        QueryKey::new(Self::FAMILY, self.cache_params())
    }
}
