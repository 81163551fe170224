// GitHub API endpoint functions.
// Typed lookups over the cache-backed client.

use crate::error::Result;

use super::client::GithubClient;
use super::types::{GithubIssue, GithubUser};

impl GithubClient {
    /// Get issue data for an issue number in the configured repository.
    ///
    /// The identifier is not validated; a malformed one produces an upstream
    /// error body, rejected when it fails to match the issue shape.
    pub async fn get_issue_data(&self, issue: &str) -> Result<GithubIssue> {
        self.get(&format!("repos/{}/issues/{}", self.repo(), issue))
            .await
    }

    /// Get user data for a login.
    pub async fn get_user_data(&self, login: &str) -> Result<GithubUser> {
        self.get(&format!("users/{}", login)).await
    }
}
