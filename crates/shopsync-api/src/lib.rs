//! Async HTTP client and credential pipeline for the shopsync storefront
//! backend.
//!
//! This crate owns everything that leaves the device:
//!
//! - **[`TokenProvider`]** — retrieves the persisted bearer token from
//!   device storage. Absence is a valid state; storage failures are
//!   logged and treated as absence so the request flow is never blocked.
//! - **[`ApiClient`]** — the single interception point for outbound
//!   calls. Attaches the credential when present, sends unauthenticated
//!   otherwise, and forwards the transport's outcome unchanged.
//! - **Wire types** ([`types`]) — JSON shapes for the category and
//!   top-sellers resources.
//!
//! The caches in `shopsync-core` sit on top of this crate and convert
//! [`Error`] values into observable cache state.

pub mod auth;
pub mod client;
pub mod error;
pub mod transport;
pub mod types;

// ── Primary re-exports ──────────────────────────────────────────────
pub use auth::{
    AUTH_TOKEN_KEY, Anonymous, KEYRING_SERVICE, KeyringTokenProvider, StaticTokenProvider,
    TokenProvider, TokenSource,
};
pub use client::ApiClient;
pub use error::{Error, FALLBACK_ERROR_MESSAGE};
pub use transport::TransportConfig;
pub use types::{
    CategoriesResponse, Category, Product, SalesPeriod, TopSellersQuery, TopSellersResponse,
};
