//! Moving notes refs between repositories.
//!
//! Push sends the whole `refs/notes/nt/*` namespace. Pull force-fetches one
//! category ref straight into the local path, replacing whatever was there;
//! reconciling with the pre-pull state is up to the caller (see
//! [`super::pull_and_merge`]). Neither direction merges on its own.

use tracing::info;

use crate::error::{Error, Result};
use crate::git::Backend;
use crate::model::Kind;

/// Refspec used by [`push`].
pub const PUSH_REFSPEC: &str = "refs/notes/nt/*:refs/notes/nt/*";

/// Prefix of the refs [`fetch_category`] stages remote notes under.
pub const STAGING_PREFIX: &str = "refs/notes/nt-remote/";

/// Push every category ref to `remote`.
///
/// # Errors
///
/// Returns `Error::Backend` if the push fails or is rejected.
pub fn push(backend: &dyn Backend, remote: &str) -> Result<()> {
    backend.push(remote, PUSH_REFSPEC)?;
    info!(remote, refspec = PUSH_REFSPEC, "pushed notes");
    Ok(())
}

/// Fetch the issues ref from `remote` over the local issues ref.
///
/// # Errors
///
/// Returns `Error::Backend` if the fetch fails.
pub fn pull(backend: &dyn Backend, remote: &str) -> Result<()> {
    pull_category(backend, remote, Kind::Issue)
}

/// Fetch one category ref from `remote` over the local one.
///
/// # Errors
///
/// Returns `Error::Backend` if the fetch fails, including when the remote
/// has no such ref.
pub fn pull_category(backend: &dyn Backend, remote: &str, kind: Kind) -> Result<()> {
    let refspec = pull_refspec(kind);
    backend.fetch(remote, &refspec)?;
    info!(remote, %refspec, "pulled notes");
    Ok(())
}

/// `+<ref>:<ref>` for a category.
#[must_use]
pub fn pull_refspec(kind: Kind) -> String {
    format!("+{0}:{0}", kind.refpath())
}

/// Where [`fetch_category`] leaves the remote's copy of a category.
#[must_use]
pub fn staging_ref(remote: &str, kind: Kind) -> String {
    format!("{STAGING_PREFIX}{remote}/{}", kind.category())
}

/// Fetch one category from `remote` into its staging ref, leaving local
/// data alone. Returns the staging ref.
///
/// # Errors
///
/// Returns `Error::InvalidArgument` for a remote name that cannot be part
/// of a ref, or `Error::Backend` if the fetch fails.
pub fn fetch_category(backend: &dyn Backend, remote: &str, kind: Kind) -> Result<String> {
    if remote.is_empty() || remote.contains(['/', ':', ' ', '*', '~', '^', '?', '[', '\\']) {
        return Err(Error::InvalidArgument(format!(
            "remote name '{remote}' cannot be used for staging"
        )));
    }
    let staging = staging_ref(remote, kind);
    backend.fetch(remote, &format!("+{}:{staging}", kind.refpath()))?;
    info!(remote, staging, "fetched notes for merging");
    Ok(staging)
}

/// Whether `err` says the remote simply has no such ref.
#[must_use]
pub fn is_missing_remote_ref(err: &Error) -> bool {
    matches!(err, Error::Backend { message, .. } if message.contains("couldn't find remote ref"))
}
