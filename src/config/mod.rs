//! Configuration management.
//!
//! Settings are resolved once at the program boundary and passed down
//! explicitly. Each one follows the same priority:
//! 1. Command-line flag
//! 2. Environment variable (`NT_REPO`, `NT_AUTHOR`, `NT_REMOTE`, `NT_ANCHOR`)
//! 3. A default derived from the repository
//!
//! Clap already folds the environment into the flags for the binary; the
//! functions here apply the environment themselves so library callers get
//! the same behaviour.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::git::{Backend, GitCli};

/// Remote used when none is configured.
pub const DEFAULT_REMOTE: &str = "origin";

pub const ENV_REPO: &str = "NT_REPO";
pub const ENV_AUTHOR: &str = "NT_AUTHOR";
pub const ENV_REMOTE: &str = "NT_REMOTE";
pub const ENV_ANCHOR: &str = "NT_ANCHOR";

/// Resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Repository work tree.
    pub repo: PathBuf,
    /// Author override; the backend identity is used when unset.
    pub author: Option<String>,
    pub remote: String,
    /// Pinned anchor revision, if any.
    pub anchor: Option<String>,
}

impl Config {
    /// Resolve every setting from flags, then environment, then defaults.
    #[must_use]
    pub fn resolve(
        repo: Option<&Path>,
        author: Option<&str>,
        remote: Option<&str>,
        anchor: Option<&str>,
    ) -> Self {
        let config = Self {
            repo: discover_repo(repo),
            author: non_empty(author).or_else(|| env_value(ENV_AUTHOR)),
            remote: resolve_remote(remote),
            anchor: non_empty(anchor).or_else(|| env_value(ENV_ANCHOR)),
        };
        debug!(?config, "resolved configuration");
        config
    }

    /// Open the git backend for the configured repository.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the path is not inside a git repository.
    pub fn open_backend(&self) -> Result<GitCli> {
        GitCli::open(self.repo.clone())
    }

    /// Author for new records.
    ///
    /// # Errors
    ///
    /// See [`resolve_author`].
    pub fn author(&self, backend: &dyn Backend) -> Result<String> {
        resolve_author(self.author.as_deref(), backend)
    }
}

/// Repository work tree to operate on.
///
/// Priority: explicit path, `NT_REPO`, the git top level of the current
/// directory, the current directory.
#[must_use]
pub fn discover_repo(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Some(path) = env_value(ENV_REPO) {
        return PathBuf::from(path);
    }
    git_toplevel()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the git repository root directory.
fn git_toplevel() -> Option<PathBuf> {
    std::process::Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| PathBuf::from(String::from_utf8_lossy(&o.stdout).trim().to_string()))
}

/// Resolve the author identity.
///
/// Priority:
/// 1. `explicit`
/// 2. `NT_AUTHOR` environment variable
/// 3. The backend's configured identity
///
/// The result is trimmed.
///
/// # Errors
///
/// Returns `Error::Config` if no identity is available from any source.
pub fn resolve_author(explicit: Option<&str>, backend: &dyn Backend) -> Result<String> {
    let env = env_value(ENV_AUTHOR);
    pick_author(explicit, env.as_deref(), || backend.identity())
}

fn pick_author(
    explicit: Option<&str>,
    env: Option<&str>,
    identity: impl FnOnce() -> Result<Option<String>>,
) -> Result<String> {
    if let Some(author) = non_empty(explicit).or_else(|| non_empty(env)) {
        return Ok(author);
    }
    non_empty(identity()?.as_deref()).ok_or_else(|| {
        Error::Config(
            "no author identity: set git user.name/user.email, NT_AUTHOR or --author".to_string(),
        )
    })
}

/// Remote name: explicit, then `NT_REMOTE`, then [`DEFAULT_REMOTE`].
#[must_use]
pub fn resolve_remote(explicit: Option<&str>) -> String {
    non_empty(explicit)
        .or_else(|| env_value(ENV_REMOTE))
        .unwrap_or_else(|| DEFAULT_REMOTE.to_string())
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|v| non_empty(Some(&v)))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
