// GitHub API HTTP client.
// Handles authentication, URL construction, and delegation to the response cache.

use std::path::PathBuf;

use reqwest::{
    Client,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::cache::{ApiDataCache, paths};
use crate::error::{OctocacheError, Result};

const GITHUB_API_BASE: &str = "https://api.github.com";

/// Configuration for a [`GithubClient`].
///
/// The auth token is injected here rather than read from the environment by
/// the client itself; [`GithubConfig::from_env`] is the composition-root
/// helper that performs the environment read once.
#[derive(Debug, Clone)]
pub struct GithubConfig {
    /// Repository identifier in `owner/name` form.
    pub repo: String,
    /// Base path the cache directory is resolved against.
    pub root_path: PathBuf,
    /// Cache subdirectory under `root_path`. `None` disables persistence;
    /// responses are then cached in memory for the process lifetime only.
    pub cache_dir: Option<String>,
    /// GitHub API token. Must be non-empty.
    pub auth: String,
}

impl GithubConfig {
    /// Build a config with the token taken from `GITHUB_AUTH`.
    pub fn from_env(
        repo: impl Into<String>,
        root_path: impl Into<PathBuf>,
        cache_dir: Option<String>,
    ) -> Result<Self> {
        Ok(Self {
            repo: repo.into(),
            root_path: root_path.into(),
            cache_dir,
            auth: auth_from_env()?,
        })
    }
}

/// Read the API token from the `GITHUB_AUTH` environment variable.
pub fn auth_from_env() -> Result<String> {
    match std::env::var("GITHUB_AUTH") {
        Ok(token) if !token.is_empty() => Ok(token),
        _ => Err(OctocacheError::MissingAuth),
    }
}

/// Authenticated GitHub API client backed by a read-through response cache.
///
/// Immutable after construction. Each lookup consults the cache first and
/// only fetches over the network for keys never seen before.
#[derive(Debug)]
pub struct GithubClient {
    repo: String,
    cache: ApiDataCache,
    http: Client,
    auth: String,
    api_base: String,
}

impl GithubClient {
    /// Create a client from the given configuration.
    ///
    /// Fails with [`OctocacheError::MissingAuth`] when the token is empty;
    /// the client cannot operate without credentials.
    pub fn new(config: GithubConfig) -> Result<Self> {
        if config.auth.is_empty() {
            return Err(OctocacheError::MissingAuth);
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("token {}", config.auth))
                .map_err(|e| OctocacheError::Other(e.to_string()))?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("octocache"));

        let http = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(OctocacheError::Api)?;

        let dir = config
            .cache_dir
            .as_deref()
            .map(|sub| paths::storage_root(&config.root_path, sub));

        Ok(Self {
            repo: config.repo,
            cache: ApiDataCache::new(dir),
            http,
            auth: config.auth,
            api_base: GITHUB_API_BASE.to_string(),
        })
    }

    /// Override the API base URL (GitHub Enterprise hosts, tests).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// The configured repository identifier.
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// The configured auth token.
    pub fn auth(&self) -> &str {
        &self.auth
    }

    /// The underlying response cache.
    pub fn cache(&self) -> &ApiDataCache {
        &self.cache
    }

    /// Resolve a key through the cache and deserialize into the endpoint type.
    pub(crate) async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self.cache.get_or_request(key, || self.fetch(key)).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Fetch a key from the API.
    ///
    /// The body is parsed as JSON regardless of HTTP status: GitHub error
    /// responses are JSON objects, and the typed endpoint boundary rejects
    /// shapes that do not match.
    async fn fetch(&self, key: &str) -> Result<Value> {
        let url = format!("{}/{}", self.api_base, key);
        debug!(%url, "fetching");

        let response = self.http.get(&url).send().await.map_err(OctocacheError::Api)?;
        let value = response.json().await.map_err(OctocacheError::Api)?;
        Ok(value)
    }
}
