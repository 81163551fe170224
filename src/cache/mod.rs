// Cache module for API response caching.
// Read-through cache keyed by opaque string, with an optional filesystem store.

pub mod layer;
pub mod paths;
pub mod store;

pub use layer::ApiDataCache;
pub use store::{CachedData, read_entry, write_entry};
