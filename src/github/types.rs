// GitHub API response types.
// Each endpoint deserializes into its own schema-validated struct, so a
// non-matching body (including a JSON error object from the API) surfaces
// as a parse error at the boundary instead of propagating malformed data.

use serde::{Deserialize, Serialize};

/// Issue resource, reduced to the fields the changelog pipeline consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GithubIssue {
    pub labels: Vec<Label>,
}

/// Label attached to an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
}

/// User resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GithubUser {
    pub name: String,
    pub html_url: String,
}
