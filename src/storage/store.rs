//! Document store over the three category notes.
//!
//! Every mutation is a whole-note read-modify-write: read the category note
//! attached to the anchor, decode it, change one record, encode the full
//! mapping and write it back. The write is a compare-and-swap against the
//! blob that was read, so two processes racing on one category cannot
//! silently drop each other's change; the loser gets `Error::Conflict` and
//! nothing is written.
//!
//! Deletion is a tombstone (`deleted_at`), never removal of the key, so a
//! delete survives merging with a replica that still has the record.

use chrono::Utc;
use tracing::{debug, info};

use super::anchor::resolve_anchor;
use super::note::Note;
use crate::error::{Error, Result};
use crate::git::{Backend, WriteOutcome};
use crate::model::{decode_blob, encode_blob, Blob, Kind, Record};

/// Record storage anchored at one commit.
pub struct Store<'a> {
    backend: &'a dyn Backend,
    anchor: String,
}

impl<'a> Store<'a> {
    /// Open the store, resolving the anchor (or using `pinned_anchor`).
    ///
    /// # Errors
    ///
    /// Returns an error if the anchor cannot be resolved.
    pub fn open(backend: &'a dyn Backend, pinned_anchor: Option<&str>) -> Result<Self> {
        let anchor = resolve_anchor(backend, pinned_anchor)?;
        Ok(Self { backend, anchor })
    }

    /// Open the store at a known anchor without resolving it.
    #[must_use]
    pub fn with_anchor(backend: &'a dyn Backend, anchor: impl Into<String>) -> Self {
        Self {
            backend,
            anchor: anchor.into(),
        }
    }

    #[must_use]
    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    #[must_use]
    pub fn backend(&self) -> &'a dyn Backend {
        self.backend
    }

    /// Read the note for `kind` from its category ref.
    ///
    /// # Errors
    ///
    /// Returns `Error::Backend` if the note cannot be read.
    pub fn read_note(&self, kind: Kind) -> Result<Note> {
        self.read_note_at(kind.refpath(), kind)
    }

    /// Read a `kind` note from an arbitrary notes ref (e.g. a fetched copy).
    ///
    /// # Errors
    ///
    /// Returns `Error::Backend` if the note cannot be read.
    pub fn read_note_at(&self, notes_ref: &str, kind: Kind) -> Result<Note> {
        let blob = self.backend.read_note(notes_ref, &self.anchor)?;
        Ok(Note::new(kind, notes_ref, &self.anchor, blob))
    }

    /// Replace the whole `kind` mapping, provided the note still is `expected`.
    ///
    /// This is the single write path shared by record mutations and merges.
    /// The encoded note is decoded again before writing, so a mapping that
    /// could not be read back never reaches the backend.
    ///
    /// # Errors
    ///
    /// Returns `Error::Decode` if the mapping is not a valid `kind` note, or
    /// `Error::Conflict` if the note changed since `expected` was read.
    pub fn write_blob(&self, kind: Kind, blob: &Blob, expected: Option<&str>) -> Result<String> {
        let content = encode_blob(blob)?;
        decode_blob(&content, kind)?;
        match self
            .backend
            .write_note(kind.refpath(), &self.anchor, &content, expected)?
        {
            WriteOutcome::Written { oid } => {
                debug!(category = %kind, oid, records = blob.len(), "wrote note");
                Ok(oid)
            }
            WriteOutcome::Conflict { current } => {
                debug!(category = %kind, ?expected, ?current, "note moved under us");
                Err(Error::Conflict { category: kind })
            }
        }
    }

    /// Insert or replace `record` in its category.
    ///
    /// A missing note is an empty category. Adding an unchanged record again
    /// leaves the note byte-for-byte identical.
    ///
    /// # Errors
    ///
    /// Returns `Error::Decode` if the existing note is malformed or `record`
    /// does not belong to its category ref, `Error::Conflict` if the note
    /// changed during the call, or `Error::Backend`.
    pub fn add(&self, record: &Record) -> Result<()> {
        let kind = record.kind();
        let note = self.read_note(kind)?;
        let mut blob = note.decode()?;
        blob.insert(record.id().to_string(), record.clone());
        self.write_blob(kind, &blob, note.oid())?;
        info!(category = %kind, id = record.id(), "stored record");
        Ok(())
    }

    /// Same as [`Store::add`]; the id decides between insert and replace.
    ///
    /// # Errors
    ///
    /// See [`Store::add`].
    pub fn update(&self, record: &Record) -> Result<()> {
        self.add(record)
    }

    /// Tombstone `record` in its category.
    ///
    /// # Errors
    ///
    /// See [`Store::remove_by_id`].
    pub fn remove(&self, record: &Record) -> Result<bool> {
        self.remove_by_id(record.kind(), record.id())
    }

    /// Tombstone the record `id` of `kind`.
    ///
    /// Returns whether anything changed. An unknown or already deleted id is
    /// a silent no-op.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoteNotFound` if the category has no note at all,
    /// plus the errors of [`Store::add`].
    pub fn remove_by_id(&self, kind: Kind, id: &str) -> Result<bool> {
        let note = self.read_note(kind)?;
        if !note.exists() {
            return Err(Error::NoteNotFound {
                category: kind,
                anchor: self.anchor.clone(),
            });
        }
        let mut blob = note.decode()?;
        let Some(record) = blob.get_mut(id).filter(|r| !r.is_deleted()) else {
            debug!(category = %kind, id, "nothing to delete");
            return Ok(false);
        };
        let now = Utc::now();
        record.mark_deleted(now);
        record.touch(now);
        self.write_blob(kind, &blob, note.oid())?;
        info!(category = %kind, id, "deleted record");
        Ok(true)
    }

    /// Every record of `kind`, tombstones included.
    ///
    /// # Errors
    ///
    /// Returns `Error::Decode` or `Error::Backend`.
    pub fn list_all(&self, kind: Kind) -> Result<Vec<Record>> {
        Ok(self.read_note(kind)?.decode()?.into_values().collect())
    }

    /// Live (not deleted) records of `kind`, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns `Error::Decode` or `Error::Backend`.
    pub fn list(&self, kind: Kind) -> Result<Vec<Record>> {
        let mut records = self.list_all(kind)?;
        records.retain(|r| !r.is_deleted());
        Ok(records)
    }

    /// Live records of `kind` whose `parent_id` is `parent_id`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Decode` or `Error::Backend`.
    pub fn list_by_parent(&self, kind: Kind, parent_id: &str) -> Result<Vec<Record>> {
        let mut records = self.list(kind)?;
        records.retain(|r| r.parent_id() == Some(parent_id));
        Ok(records)
    }

    /// Look up one record (tombstoned or not) by full id.
    ///
    /// # Errors
    ///
    /// Returns `Error::Decode` or `Error::Backend`.
    pub fn get(&self, kind: Kind, id: &str) -> Result<Option<Record>> {
        Ok(self.read_note(kind)?.decode()?.remove(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MemoryBackend;
    use crate::model::{Comment, Entry, Issue, Project};
    use chrono::Duration;

    const ANCHOR: &str = "c0";

    fn issue(id: &str, title: &str) -> Issue {
        let mut issue = Issue::new("Test User", title, "");
        issue.id = id.to_string();
        issue
    }

    fn raw_note(backend: &MemoryBackend, kind: Kind) -> String {
        backend
            .read_note(kind.refpath(), ANCHOR)
            .unwrap()
            .unwrap()
            .content
    }

    #[test]
    fn test_add_to_empty_category() {
        let backend = MemoryBackend::with_root(ANCHOR);
        let store = Store::open(&backend, None).unwrap();
        assert_eq!(store.anchor(), ANCHOR);
        assert!(store.list(Kind::Issue).unwrap().is_empty());

        store.add(&issue("a", "first").into_record()).unwrap();
        let records = store.list(Kind::Issue).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id(), "a");
    }

    #[test]
    fn test_add_is_idempotent() {
        let backend = MemoryBackend::with_root(ANCHOR);
        let store = Store::open(&backend, None).unwrap();
        let record = issue("a", "first").into_record();

        store.add(&record).unwrap();
        let once = raw_note(&backend, Kind::Issue);
        store.add(&record).unwrap();
        assert_eq!(raw_note(&backend, Kind::Issue), once);
    }

    #[test]
    fn test_update_replaces_by_id() {
        let backend = MemoryBackend::with_root(ANCHOR);
        let store = Store::open(&backend, None).unwrap();

        let original = issue("a", "old");
        store.add(&original.clone().into_record()).unwrap();

        let mut newer = original;
        newer.title = "new".to_string();
        newer.updated_at += Duration::seconds(5);
        store.update(&newer.into_record()).unwrap();

        let records = store.list(Kind::Issue).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].headline(), "new");
    }

    #[test]
    fn test_categories_are_separate_notes() {
        let backend = MemoryBackend::with_root(ANCHOR);
        let store = Store::open(&backend, None).unwrap();
        let project = Project::new("Test User", "P", "");
        let comment = Comment::new("Test User", "hi", Kind::Project, &project.id);

        store.add(&project.clone().into_record()).unwrap();
        store.add(&comment.into_record()).unwrap();

        assert_eq!(store.list(Kind::Project).unwrap().len(), 1);
        assert_eq!(store.list(Kind::Comment).unwrap().len(), 1);
        assert!(store.list(Kind::Issue).unwrap().is_empty());
        assert_eq!(backend.list_notes(Kind::Project.refpath()).unwrap().len(), 1);
    }

    #[test]
    fn test_remove_without_note_fails() {
        let backend = MemoryBackend::with_root(ANCHOR);
        let store = Store::open(&backend, None).unwrap();
        let err = store.remove_by_id(Kind::Issue, "a").unwrap_err();
        assert!(matches!(
            err,
            Error::NoteNotFound {
                category: Kind::Issue,
                ..
            }
        ));
    }

    #[test]
    fn test_remove_tombstones_and_hides() {
        let backend = MemoryBackend::with_root(ANCHOR);
        let store = Store::open(&backend, None).unwrap();
        let record = issue("a", "doomed").into_record();
        store.add(&record).unwrap();

        assert!(store.remove(&record).unwrap());
        assert!(store.list(Kind::Issue).unwrap().is_empty());

        let all = store.list_all(Kind::Issue).unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].is_deleted());
        assert!(all[0].updated_at() >= record.updated_at());

        // second delete and unknown ids are no-ops
        let before = raw_note(&backend, Kind::Issue);
        assert!(!store.remove(&record).unwrap());
        assert!(!store.remove_by_id(Kind::Issue, "zzz").unwrap());
        assert_eq!(raw_note(&backend, Kind::Issue), before);
    }

    #[test]
    fn test_list_by_parent() {
        let backend = MemoryBackend::with_root(ANCHOR);
        let store = Store::open(&backend, None).unwrap();
        let mine = Issue::new("Test User", "mine", "").with_parent(Kind::Project, "p1");
        let theirs = Issue::new("Test User", "theirs", "").with_parent(Kind::Project, "p2");
        let orphan = Issue::new("Test User", "orphan", "");
        for i in [mine.clone(), theirs, orphan] {
            store.add(&i.into_record()).unwrap();
        }

        let found = store.list_by_parent(Kind::Issue, "p1").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), mine.id);
    }

    #[test]
    fn test_malformed_note_is_fatal_and_untouched() {
        let backend = MemoryBackend::with_root(ANCHOR);
        backend.force_note(Kind::Issue.refpath(), ANCHOR, "{not json");
        let store = Store::open(&backend, None).unwrap();

        let err = store.add(&issue("a", "x").into_record()).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
        assert_eq!(raw_note(&backend, Kind::Issue), "{not json");
    }

    #[test]
    fn test_record_for_another_ref_is_rejected() {
        let backend = MemoryBackend::with_root(ANCHOR);
        let store = Store::open(&backend, None).unwrap();
        store.add(&issue("a", "good").into_record()).unwrap();
        let before = raw_note(&backend, Kind::Issue);

        let mut stray = issue("b", "misfiled");
        stray.refpath = Kind::Project.refpath().to_string();
        let err = store.add(&stray.into_record()).unwrap_err();
        assert!(matches!(err, Error::Decode { category: Kind::Issue, .. }));

        assert_eq!(raw_note(&backend, Kind::Issue), before);
        assert_eq!(store.list(Kind::Issue).unwrap().len(), 1);
    }

    #[test]
    fn test_concurrent_writer_causes_conflict() {
        let backend = MemoryBackend::with_root(ANCHOR);
        let store = Store::open(&backend, None).unwrap();
        store.add(&issue("a", "one").into_record()).unwrap();

        let note = store.read_note(Kind::Issue).unwrap();
        let mut blob = note.decode().unwrap();

        // another process sneaks a write in between our read and write
        let other = Store::with_anchor(&backend, ANCHOR);
        other.add(&issue("b", "two").into_record()).unwrap();

        blob.insert("c".into(), issue("c", "three").into_record());
        let err = store.write_blob(Kind::Issue, &blob, note.oid()).unwrap_err();
        assert!(matches!(err, Error::Conflict { category: Kind::Issue }));

        let ids: Vec<_> = store
            .list(Kind::Issue)
            .unwrap()
            .iter()
            .map(|r| r.id().to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_get_by_id() {
        let backend = MemoryBackend::with_root(ANCHOR);
        let store = Store::open(&backend, None).unwrap();
        store.add(&issue("a", "x").into_record()).unwrap();
        assert!(store.get(Kind::Issue, "a").unwrap().is_some());
        assert!(store.get(Kind::Issue, "b").unwrap().is_none());
    }
}
