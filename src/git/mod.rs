//! Version-control backend.
//!
//! Everything the tracker needs from git goes through [`Backend`]:
//! - root commits of the current history (anchor resolution)
//! - note read, compare-and-swap write and iteration per notes ref
//! - the configured user identity
//! - push / fetch by refspec
//!
//! [`GitCli`] drives the `git` executable. [`MemoryBackend`] keeps
//! everything in process and is what the unit tests run against.

pub(crate) mod cli;
mod memory;

pub use cli::GitCli;
pub use memory::MemoryBackend;

use crate::error::Result;

/// Content of a note together with the id of the object storing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteBlob {
    /// Object id of the note blob. Changes whenever the content changes.
    pub oid: String,
    pub content: String,
}

/// One entry of a notes ref: which object is annotated by which blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteEntry {
    pub blob: String,
    pub target: String,
}

/// Result of a compare-and-swap note write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The note was replaced; `oid` identifies the new blob.
    Written { oid: String },
    /// The note attached to the target was not the expected one.
    Conflict { current: Option<String> },
}

/// Operations the store, anchor resolver and synchronizer need from git.
pub trait Backend {
    /// Parentless commits reachable from `HEAD`. Empty when there are no commits.
    ///
    /// # Errors
    ///
    /// Returns `Error::Backend` if history cannot be read.
    fn root_commits(&self) -> Result<Vec<String>>;

    /// Resolve a revision to a full commit id, `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `Error::Backend` if the lookup itself fails.
    fn resolve_commit(&self, rev: &str) -> Result<Option<String>>;

    /// Note attached to `target` under `notes_ref`, if any.
    ///
    /// # Errors
    ///
    /// Returns `Error::Backend` if the note exists but cannot be read.
    fn read_note(&self, notes_ref: &str, target: &str) -> Result<Option<NoteBlob>>;

    /// Replace the note on `target`, provided the note currently attached is
    /// the blob `expected` (`None`: no note may be attached yet).
    ///
    /// # Errors
    ///
    /// Returns `Error::Backend` on any git failure other than a lost race,
    /// which is reported as `WriteOutcome::Conflict`.
    fn write_note(
        &self,
        notes_ref: &str,
        target: &str,
        content: &str,
        expected: Option<&str>,
    ) -> Result<WriteOutcome>;

    /// Every note under `notes_ref`. Empty if the ref does not exist.
    ///
    /// # Errors
    ///
    /// Returns `Error::Backend` if the ref cannot be listed.
    fn list_notes(&self, notes_ref: &str) -> Result<Vec<NoteEntry>>;

    /// Configured user identity (`Name <email>`), if any.
    ///
    /// # Errors
    ///
    /// Returns `Error::Backend` if configuration cannot be read.
    fn identity(&self) -> Result<Option<String>>;

    /// Push `refspec` to `remote`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Backend` if the transport fails or the push is rejected.
    fn push(&self, remote: &str, refspec: &str) -> Result<()>;

    /// Fetch `refspec` from `remote`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Backend` if the transport fails or the fetch is rejected.
    fn fetch(&self, remote: &str, refspec: &str) -> Result<()>;
}

/// Split `[+]src:dst` into its parts.
pub(crate) fn parse_refspec(refspec: &str) -> (bool, &str, &str) {
    let (force, rest) = match refspec.strip_prefix('+') {
        Some(rest) => (true, rest),
        None => (false, refspec),
    };
    match rest.split_once(':') {
        Some((src, dst)) => (force, src, dst),
        None => (force, rest, rest),
    }
}

/// Map `name` through a refspec side pair, honouring one trailing `*`.
pub(crate) fn map_ref(name: &str, src: &str, dst: &str) -> Option<String> {
    match (src.strip_suffix('*'), dst.strip_suffix('*')) {
        (Some(src_prefix), Some(dst_prefix)) => name
            .strip_prefix(src_prefix)
            .map(|rest| format!("{dst_prefix}{rest}")),
        _ => (name == src).then(|| dst.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_refspec() {
        assert_eq!(
            parse_refspec("+refs/notes/nt/issues:refs/notes/nt/issues"),
            (true, "refs/notes/nt/issues", "refs/notes/nt/issues")
        );
        assert_eq!(parse_refspec("refs/a"), (false, "refs/a", "refs/a"));
    }

    #[test]
    fn test_map_ref_wildcard() {
        assert_eq!(
            map_ref("refs/notes/nt/issues", "refs/notes/nt/*", "refs/notes/nt-remote/o/*"),
            Some("refs/notes/nt-remote/o/issues".to_string())
        );
        assert_eq!(map_ref("refs/heads/main", "refs/notes/nt/*", "refs/notes/nt/*"), None);
        assert_eq!(
            map_ref("refs/notes/nt/issues", "refs/notes/nt/issues", "refs/x"),
            Some("refs/x".to_string())
        );
    }
}
