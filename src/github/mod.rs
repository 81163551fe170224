// GitHub API module.
// Provides an authenticated, cache-backed client for issue and user lookups.

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::{GithubClient, GithubConfig};
pub use types::*;
