// ── Hand-rolled resource cache ──

mod collection;

pub use collection::{CollectionPage, CollectionSource, CollectionState, CollectionStore};
