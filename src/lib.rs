// Authenticated GitHub API client with a persistent read-through response cache.
// Given an issue number or user login, returns the corresponding JSON resource,
// fetching from the network only when it is not already cached.

pub mod cache;
pub mod error;
pub mod github;

pub use cache::ApiDataCache;
pub use error::{OctocacheError, Result};
pub use github::{GithubClient, GithubConfig};
