// Cache path utilities.
// Maps opaque request keys like "repos/org/repo/issues/42" onto the
// filesystem hierarchy under the cache storage root.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

/// Namespace directory appended to the caller-supplied cache location.
pub const CACHE_NAMESPACE: &str = "github";

/// Default base cache directory (~/.cache/octocache on Linux/macOS).
///
/// For host tools composing a [`GithubConfig`](crate::GithubConfig): a
/// ready-made `root_path` when the tool has no project-local cache location
/// of its own. Nothing in this crate calls it.
pub fn default_cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "octocache").map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Storage root for a configured cache: `root_path / cache_dir / "github"`.
pub fn storage_root(root_path: &Path, cache_dir: &str) -> PathBuf {
    root_path.join(cache_dir).join(CACHE_NAMESPACE)
}

/// Path of the entry file for a key. Keys are split on `/`; each segment
/// becomes a directory component, the last one a `.json` file.
pub fn entry_path(root: &Path, key: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    let mut segments = key.split('/').filter(|s| !s.is_empty()).peekable();
    while let Some(segment) = segments.next() {
        if segments.peek().is_some() {
            path.push(sanitize_name(segment));
        } else {
            path.push(format!("{}.json", sanitize_name(segment)));
        }
    }
    path
}

/// Sanitize a key segment for use in filesystem paths.
/// Replaces problematic characters with underscores.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}
