//! Anchor commit resolution.
//!
//! Every category note hangs off one commit: the root of the history
//! reachable from `HEAD`. As long as history below the root is never
//! rewritten, new commits, merges and rebases on top leave it in place, so
//! the notes can be found without tracking any per-branch state.
//!
//! Histories with several roots (e.g. after merging unrelated histories)
//! have no unique anchor. Rather than guessing, resolution fails and the
//! caller must pin the anchor explicitly.

use tracing::debug;

use crate::error::{Error, Result};
use crate::git::Backend;

/// Resolve the anchor commit.
///
/// With `pinned`, that revision is resolved and used as-is. Otherwise the
/// single root commit reachable from `HEAD` is the anchor.
///
/// # Errors
///
/// - `Error::NoCommits` if the repository has no commits
/// - `Error::AmbiguousAnchor` if there is more than one root
/// - `Error::InvalidArgument` if `pinned` does not name a commit
/// - `Error::Backend` if history cannot be read
pub fn resolve_anchor(backend: &dyn Backend, pinned: Option<&str>) -> Result<String> {
    if let Some(rev) = pinned {
        return backend
            .resolve_commit(rev)?
            .ok_or_else(|| Error::InvalidArgument(format!("anchor '{rev}' is not a commit")));
    }

    let mut roots = backend.root_commits()?;
    match roots.len() {
        0 => Err(Error::NoCommits),
        1 => {
            let anchor = roots.remove(0);
            debug!(anchor, "resolved anchor");
            Ok(anchor)
        }
        _ => Err(Error::AmbiguousAnchor { roots }),
    }
}
