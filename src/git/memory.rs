//! In-process backend.
//!
//! Holds root commits, notes refs and identity in memory. Clones share
//! state, and other instances can be registered as named remotes, so two
//! replicas plus push/fetch can be simulated without touching disk. Blob
//! ids are SHA-256 content hashes. Pushes and fetches always overwrite the
//! destination ref.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use sha2::{Digest, Sha256};

use super::{map_ref, parse_refspec, Backend, NoteBlob, NoteEntry, WriteOutcome};
use crate::error::{Error, Result};

/// target commit -> note content
type NotesTree = BTreeMap<String, String>;

#[derive(Debug, Default)]
struct State {
    roots: Vec<String>,
    commits: Vec<String>,
    refs: BTreeMap<String, NotesTree>,
    identity: Option<String>,
    remotes: BTreeMap<String, MemoryBackend>,
}

/// Shared-state in-memory repository.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Rc<RefCell<State>>,
}

fn blob_id(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}

impl MemoryBackend {
    /// Empty repository: no commits, no identity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository with a single root commit and an identity.
    #[must_use]
    pub fn with_root(root: &str) -> Self {
        let backend = Self::new();
        backend.add_root(root);
        backend.set_identity(Some("Test User <test@example.com>"));
        backend
    }

    /// Add a parentless commit reachable from `HEAD`.
    pub fn add_root(&self, commit: &str) {
        let mut state = self.state.borrow_mut();
        state.roots.push(commit.to_string());
        state.commits.push(commit.to_string());
    }

    /// Add a non-root commit.
    pub fn add_commit(&self, commit: &str) {
        self.state.borrow_mut().commits.push(commit.to_string());
    }

    pub fn set_identity(&self, identity: Option<&str>) {
        self.state.borrow_mut().identity = identity.map(str::to_string);
    }

    /// Register `other` under `name` for push and fetch.
    pub fn add_remote(&self, name: &str, other: &MemoryBackend) {
        self.state
            .borrow_mut()
            .remotes
            .insert(name.to_string(), other.clone());
    }

    /// Overwrite a note without any checks, as a concurrent writer would.
    pub fn force_note(&self, notes_ref: &str, target: &str, content: &str) {
        self.state
            .borrow_mut()
            .refs
            .entry(notes_ref.to_string())
            .or_default()
            .insert(target.to_string(), content.to_string());
    }

    fn remote(&self, name: &str) -> Result<MemoryBackend> {
        self.state
            .borrow()
            .remotes
            .get(name)
            .cloned()
            .ok_or_else(|| Error::backend("remote", format!("no such remote '{name}'")))
    }

    /// Copy every ref of `from` matching `refspec` into `to`.
    fn transfer(from: &MemoryBackend, to: &MemoryBackend, refspec: &str) -> Result<()> {
        let (_force, src, dst) = parse_refspec(refspec);
        let copies: Vec<(String, NotesTree)> = from
            .state
            .borrow()
            .refs
            .iter()
            .filter_map(|(name, tree)| map_ref(name, src, dst).map(|d| (d, tree.clone())))
            .collect();
        if copies.is_empty() && !src.ends_with('*') {
            return Err(Error::backend(
                "fetch",
                format!("couldn't find remote ref {src}"),
            ));
        }
        let mut state = to.state.borrow_mut();
        for (name, tree) in copies {
            state.refs.insert(name, tree);
        }
        Ok(())
    }
}

impl Backend for MemoryBackend {
    fn root_commits(&self) -> Result<Vec<String>> {
        Ok(self.state.borrow().roots.clone())
    }

    fn resolve_commit(&self, rev: &str) -> Result<Option<String>> {
        Ok(self
            .state
            .borrow()
            .commits
            .iter()
            .find(|c| c.as_str() == rev || (rev.len() >= 4 && c.starts_with(rev)))
            .cloned())
    }

    fn read_note(&self, notes_ref: &str, target: &str) -> Result<Option<NoteBlob>> {
        Ok(self
            .state
            .borrow()
            .refs
            .get(notes_ref)
            .and_then(|tree| tree.get(target))
            .map(|content| NoteBlob {
                oid: blob_id(content),
                content: content.clone(),
            }))
    }

    fn write_note(
        &self,
        notes_ref: &str,
        target: &str,
        content: &str,
        expected: Option<&str>,
    ) -> Result<WriteOutcome> {
        let current = self.read_note(notes_ref, target)?.map(|n| n.oid);
        if current.as_deref() != expected {
            return Ok(WriteOutcome::Conflict { current });
        }
        self.force_note(notes_ref, target, content);
        Ok(WriteOutcome::Written {
            oid: blob_id(content),
        })
    }

    fn list_notes(&self, notes_ref: &str) -> Result<Vec<NoteEntry>> {
        Ok(self
            .state
            .borrow()
            .refs
            .get(notes_ref)
            .map(|tree| {
                tree.iter()
                    .map(|(target, content)| NoteEntry {
                        blob: blob_id(content),
                        target: target.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn identity(&self) -> Result<Option<String>> {
        Ok(self.state.borrow().identity.clone())
    }

    fn push(&self, remote: &str, refspec: &str) -> Result<()> {
        let remote = self.remote(remote)?;
        Self::transfer(self, &remote, refspec)
    }

    fn fetch(&self, remote: &str, refspec: &str) -> Result<()> {
        let remote = self.remote(remote)?;
        Self::transfer(&remote, self, refspec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REF: &str = "refs/notes/nt/issues";

    #[test]
    fn test_compare_and_swap() {
        let backend = MemoryBackend::with_root("c0");
        let WriteOutcome::Written { oid } = backend.write_note(REF, "c0", "one", None).unwrap()
        else {
            panic!("first write should succeed");
        };
        assert!(matches!(
            backend.write_note(REF, "c0", "two", None).unwrap(),
            WriteOutcome::Conflict { .. }
        ));
        assert!(matches!(
            backend.write_note(REF, "c0", "two", Some(&oid)).unwrap(),
            WriteOutcome::Written { .. }
        ));
    }

    #[test]
    fn test_push_and_fetch_between_replicas() {
        let a = MemoryBackend::with_root("c0");
        let b = MemoryBackend::with_root("c0");
        a.add_remote("origin", &b);

        a.force_note(REF, "c0", "from a");
        a.push("origin", "refs/notes/nt/*:refs/notes/nt/*").unwrap();
        assert_eq!(b.read_note(REF, "c0").unwrap().unwrap().content, "from a");

        b.force_note(REF, "c0", "from b");
        a.fetch("origin", &format!("+{REF}:{REF}")).unwrap();
        assert_eq!(a.read_note(REF, "c0").unwrap().unwrap().content, "from b");
    }

    #[test]
    fn test_fetch_missing_ref_fails() {
        let a = MemoryBackend::with_root("c0");
        let b = MemoryBackend::with_root("c0");
        a.add_remote("origin", &b);
        assert!(a.fetch("origin", &format!("+{REF}:{REF}")).is_err());
        assert!(a.push("nowhere", REF).is_err());
    }
}
