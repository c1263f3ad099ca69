//! Replica synchronization over git notes refs.
//!
//! - **Merge**: reconcile two copies of a category note ([`merge`])
//! - **Remote**: push / pull / staging fetch of notes refs ([`remote`])
//! - **Status**: per-category summary of what is stored ([`status`])
//!
//! # Pull flow
//!
//! A pull replaces the local ref with the remote one, so local edits have
//! to be merged back afterwards:
//! 1. Snapshot the local note
//! 2. Force-fetch the remote ref over the local one
//! 3. Write the snapshot back and merge the fetched note into it as the
//!    remote side
//!
//! A failed merge therefore leaves the pre-pull data in place.
//! Alternatively [`merge_remote`] fetches into a staging ref and merges from
//! there, never replacing local data before the merge succeeds.

pub mod merge;
pub mod remote;
pub mod status;

pub use merge::{merge, merge_values, MergeStats};
pub use remote::{fetch_category, pull, pull_category, push, staging_ref};
pub use status::{get_sync_status, print_status, SyncStatus};

use tracing::{error, warn};

use crate::error::Result;
use crate::model::Kind;
use crate::storage::Store;

/// Pull one category from `remote` and merge local changes back in.
///
/// Returns `None` when the remote has no note ref for that category.
///
/// # Errors
///
/// Returns an error if the fetch or the merge fails. The local ref then
/// holds the pre-pull note again.
pub fn pull_and_merge(store: &Store<'_>, remote: &str, kind: Kind) -> Result<Option<MergeStats>> {
    let snapshot = store.read_note(kind)?;
    // validate before anything is replaced
    let pre_pull = snapshot.decode()?;

    match pull_category(store.backend(), remote, kind) {
        Ok(()) => {}
        Err(e) if remote::is_missing_remote_ref(&e) => {
            warn!(remote, category = %kind, "remote has no notes for this category");
            return Ok(None);
        }
        Err(e) => return Err(e),
    }

    let mut fetched = store.read_note(kind)?;
    if fetched.oid() != snapshot.oid() {
        store
            .write_blob(kind, &pre_pull, fetched.oid())
            .inspect_err(|e| {
                error!(
                    category = %kind,
                    snapshot = snapshot.oid().unwrap_or("none"),
                    "restoring pre-pull note failed: {e}"
                );
            })?;
    }

    let mut local = store.read_note(kind)?;
    merge(store, &mut local, &mut fetched).map(Some)
}

/// Fetch one category into its staging ref and merge it into local.
///
/// Returns `None` when the remote has no note ref for that category.
///
/// # Errors
///
/// Returns an error if the fetch or the merge fails.
pub fn merge_remote(store: &Store<'_>, remote: &str, kind: Kind) -> Result<Option<MergeStats>> {
    let staging = match fetch_category(store.backend(), remote, kind) {
        Ok(staging) => staging,
        Err(e) if remote::is_missing_remote_ref(&e) => {
            warn!(remote, category = %kind, "remote has no notes for this category");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };
    merge_staged(store, &staging, kind).map(Some)
}

/// Merge an already fetched staging ref into local.
///
/// # Errors
///
/// Returns an error if either note cannot be read or the merge fails.
pub fn merge_staged(store: &Store<'_>, staging: &str, kind: Kind) -> Result<MergeStats> {
    let mut local = store.read_note(kind)?;
    let mut theirs = store.read_note_at(staging, kind)?;
    merge(store, &mut local, &mut theirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::cli::testing::{git, init_repo};
    use crate::git::{GitCli, MemoryBackend};
    use crate::error::Error;
    use crate::model::{Entry, Issue, Record};
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    const ANCHOR: &str = "c0";

    fn replicas() -> (MemoryBackend, MemoryBackend) {
        let local = MemoryBackend::with_root(ANCHOR);
        let origin = MemoryBackend::with_root(ANCHOR);
        local.add_remote("origin", &origin);
        origin.add_remote("origin", &local);
        (local, origin)
    }

    fn titles(store: &Store<'_>) -> Vec<String> {
        let mut titles: Vec<_> = store
            .list(Kind::Issue)
            .unwrap()
            .iter()
            .map(|r| r.headline().to_string())
            .collect();
        titles.sort();
        titles
    }

    #[test]
    fn test_pull_and_merge_keeps_local_only_records() {
        let (local, origin) = replicas();
        let ours = Store::with_anchor(&local, ANCHOR);
        let theirs = Store::with_anchor(&origin, ANCHOR);

        theirs.add(&Issue::new("B", "from origin", "").into_record()).unwrap();
        ours.add(&Issue::new("A", "from local", "").into_record()).unwrap();

        let stats = pull_and_merge(&ours, "origin", Kind::Issue).unwrap().unwrap();
        assert_eq!(stats.added, 1);
        assert_eq!(titles(&ours), vec!["from local", "from origin"]);
    }

    #[test]
    fn test_pull_and_merge_newer_remote_edit_wins() {
        let (local, origin) = replicas();
        let ours = Store::with_anchor(&local, ANCHOR);
        let theirs = Store::with_anchor(&origin, ANCHOR);

        let issue = Issue::new("A", "draft", "");
        ours.add(&issue.clone().into_record()).unwrap();
        push(&local, "origin").unwrap();

        let mut edited = issue;
        edited.title = "final".into();
        edited.updated_at += Duration::seconds(30);
        theirs.update(&edited.into_record()).unwrap();

        pull_and_merge(&ours, "origin", Kind::Issue).unwrap();
        assert_eq!(titles(&ours), vec!["final"]);
    }

    #[test]
    fn test_pull_and_merge_keeps_remote_deletion() {
        let (local, origin) = replicas();
        let ours = Store::with_anchor(&local, ANCHOR);
        let theirs = Store::with_anchor(&origin, ANCHOR);

        let issue = Issue::new("A", "shared", "");
        ours.add(&issue.clone().into_record()).unwrap();
        push(&local, "origin").unwrap();
        assert!(theirs.remove(&issue.clone().into_record()).unwrap());

        // local edit after the remote delete
        let mut edited = issue;
        edited.title = "edited".into();
        edited.updated_at = Utc::now() + Duration::seconds(60);
        ours.update(&edited.into_record()).unwrap();

        let stats = pull_and_merge(&ours, "origin", Kind::Issue).unwrap().unwrap();
        assert_eq!(stats.tombstoned, 1);
        assert!(ours.list(Kind::Issue).unwrap().is_empty());
        let all = ours.list_all(Kind::Issue).unwrap();
        assert!(matches!(&all[0], Record::Issue(i) if i.deleted_at.is_some() && i.title == "edited"));
    }

    #[test]
    fn test_failed_pull_merge_restores_local_note() {
        let (local, origin) = replicas();
        let ours = Store::with_anchor(&local, ANCHOR);
        ours.add(&Issue::new("A", "local only", "").into_record()).unwrap();
        origin.force_note(Kind::Issue.refpath(), ANCHOR, "{ broken");

        let err = pull_and_merge(&ours, "origin", Kind::Issue).unwrap_err();
        assert!(matches!(err, Error::Decode { category: Kind::Issue, .. }));
        assert_eq!(titles(&ours), vec!["local only"]);
    }

    #[test]
    fn test_missing_remote_category_is_skipped() {
        let (local, _origin) = replicas();
        let store = Store::with_anchor(&local, ANCHOR);
        assert!(pull_and_merge(&store, "origin", Kind::Project).unwrap().is_none());
        assert!(merge_remote(&store, "origin", Kind::Project).unwrap().is_none());
    }

    #[test]
    fn test_delete_propagates_through_staging_merge() {
        let (local, origin) = replicas();
        let ours = Store::with_anchor(&local, ANCHOR);
        let theirs = Store::with_anchor(&origin, ANCHOR);

        let issue = Issue::new("A", "shared", "").into_record();
        ours.add(&issue).unwrap();
        push(&local, "origin").unwrap();
        theirs.remove(&issue).unwrap();

        let stats = merge_remote(&ours, "origin", Kind::Issue).unwrap().unwrap();
        assert_eq!(stats.tombstoned, 1);
        assert!(ours.list(Kind::Issue).unwrap().is_empty());
        let all = ours.list_all(Kind::Issue).unwrap();
        assert!(matches!(&all[0], Record::Issue(i) if i.deleted_at.is_some()));
    }

    #[test]
    fn test_round_trip_between_real_clones() {
        let upstream = TempDir::new().unwrap();
        init_repo(upstream.path());
        let clone_dir = TempDir::new().unwrap();
        git(
            clone_dir.path(),
            &["clone", "-q", &upstream.path().display().to_string(), "."],
        );
        git(clone_dir.path(), &["config", "user.name", "Clone User"]);
        git(clone_dir.path(), &["config", "user.email", "clone@example.com"]);

        let up = GitCli::open(upstream.path()).unwrap();
        let down = GitCli::open(clone_dir.path()).unwrap();
        let up_store = Store::open(&up, None).unwrap();
        let down_store = Store::open(&down, None).unwrap();
        assert_eq!(up_store.anchor(), down_store.anchor());

        down_store
            .add(&Issue::new("Clone User", "from clone", "").into_record())
            .unwrap();
        push(&down, "origin").unwrap();
        up_store
            .add(&Issue::new("Test User", "from upstream", "").into_record())
            .unwrap();

        pull_and_merge(&down_store, "origin", Kind::Issue).unwrap();
        assert_eq!(titles(&down_store), vec!["from clone", "from upstream"]);
    }
}
