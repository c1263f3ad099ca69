//! Handle on one category note as read at a point in time.

use crate::error::{Error, Result};
use crate::git::NoteBlob;
use crate::model::{decode_blob, Blob, Kind};

/// Whether a [`Note`] still reflects what it was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteState {
    Live,
    /// Consumed by a merge; must be read again before further use.
    Stale,
}

/// A category note read from a notes ref, or a snapshot of one.
///
/// A missing note is represented as a live handle with no blob, which
/// decodes to an empty mapping.
#[derive(Debug, Clone)]
pub struct Note {
    kind: Kind,
    notes_ref: String,
    anchor: String,
    blob: Option<NoteBlob>,
    state: NoteState,
}

impl Note {
    pub(crate) fn new(kind: Kind, notes_ref: &str, anchor: &str, blob: Option<NoteBlob>) -> Self {
        Self {
            kind,
            notes_ref: notes_ref.to_string(),
            anchor: anchor.to_string(),
            blob,
            state: NoteState::Live,
        }
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Ref this note was read from.
    #[must_use]
    pub fn notes_ref(&self) -> &str {
        &self.notes_ref
    }

    #[must_use]
    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    /// Blob id at read time, `None` if there was no note.
    #[must_use]
    pub fn oid(&self) -> Option<&str> {
        self.blob.as_ref().map(|b| b.oid.as_str())
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.blob.is_some()
    }

    #[must_use]
    pub fn state(&self) -> NoteState {
        self.state
    }

    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.state == NoteState::Stale
    }

    /// Raw JSON content; empty when there was no note.
    ///
    /// # Errors
    ///
    /// Returns `Error::StaleNote` once the handle has been consumed by a merge.
    pub fn content(&self) -> Result<&str> {
        if self.is_stale() {
            return Err(Error::StaleNote {
                category: self.kind,
            });
        }
        Ok(self.blob.as_ref().map_or("", |b| b.content.as_str()))
    }

    /// Decoded mapping of records.
    ///
    /// # Errors
    ///
    /// Returns `Error::StaleNote` for a consumed handle or `Error::Decode`
    /// for malformed content.
    pub fn decode(&self) -> Result<Blob> {
        decode_blob(self.content()?, self.kind)
    }

    pub(crate) fn mark_stale(&mut self) {
        self.state = NoteState::Stale;
    }
}
