//! Sync status display.
//!
//! Walks every note on each category ref, so notes left on commits other
//! than the anchor (e.g. from before a history rewrite) show up too.

use colored::Colorize;
use serde::Serialize;

use super::remote::staging_ref;
use crate::error::Result;
use crate::model::Kind;
use crate::storage::Store;

/// State of one category.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryStatus {
    pub category: Kind,
    pub notes_ref: String,
    /// Blob id of the note on the anchor, if any.
    pub oid: Option<String>,
    pub records: usize,
    pub tombstones: usize,
    /// Commits other than the anchor carrying a note on this ref.
    pub stray_targets: Vec<String>,
    /// Blob id of the staged remote copy, if one was fetched.
    pub staged: Option<String>,
}

/// State of all categories for one anchor.
#[derive(Debug, Clone, Serialize)]
pub struct SyncStatus {
    pub anchor: String,
    pub remote: String,
    pub categories: Vec<CategoryStatus>,
}

/// Collect the sync status of every category.
///
/// # Errors
///
/// Returns an error if a ref cannot be listed or a note fails to decode.
pub fn get_sync_status(store: &Store<'_>, remote: &str) -> Result<SyncStatus> {
    let backend = store.backend();
    let mut categories = Vec::with_capacity(Kind::ALL.len());

    for kind in Kind::ALL {
        let entries = backend.list_notes(kind.refpath())?;
        let mut status = CategoryStatus {
            category: kind,
            notes_ref: kind.refpath().to_string(),
            oid: None,
            records: 0,
            tombstones: 0,
            stray_targets: Vec::new(),
            staged: backend
                .read_note(&staging_ref(remote, kind), store.anchor())?
                .map(|b| b.oid),
        };

        for entry in entries {
            if entry.target == store.anchor() {
                status.oid = Some(entry.blob);
            } else {
                status.stray_targets.push(entry.target);
            }
        }

        if status.oid.is_some() {
            let blob = store.read_note(kind)?.decode()?;
            status.tombstones = blob.values().filter(|r| r.is_deleted()).count();
            status.records = blob.len() - status.tombstones;
        }
        categories.push(status);
    }

    Ok(SyncStatus {
        anchor: store.anchor().to_string(),
        remote: remote.to_string(),
        categories,
    })
}

/// Print sync status in a human-readable format.
pub fn print_status(status: &SyncStatus) {
    println!("{}", "Notes Status".bold().underline());
    println!();
    println!("  Anchor: {}", status.anchor.cyan());
    println!();

    for cat in &status.categories {
        let name = format!("{:<9}", cat.category.category());
        match &cat.oid {
            Some(oid) => {
                let short = &oid[..oid.len().min(12)];
                print!("  {} {} {} records", name.bold(), short.dimmed(), cat.records);
                if cat.tombstones > 0 {
                    print!(", {} deleted", cat.tombstones.to_string().yellow());
                }
                println!();
            }
            None => println!("  {} {}", name.bold(), "no note".dimmed()),
        }

        if let Some(staged) = &cat.staged {
            if cat.oid.as_deref() == Some(staged.as_str()) {
                println!("            {} in sync with {}", "✓".green(), status.remote);
            } else {
                println!(
                    "            {} staged copy from {} differs, run `nt sync merge`",
                    "!".yellow(),
                    status.remote
                );
            }
        }
        for target in &cat.stray_targets {
            println!(
                "            {} note on non-anchor commit {}",
                "?".red(),
                &target[..target.len().min(12)]
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MemoryBackend;
    use crate::model::{Entry, Issue};

    #[test]
    fn test_status_counts_and_strays() {
        let backend = MemoryBackend::with_root("c0");
        backend.add_commit("c1");
        let store = Store::with_anchor(&backend, "c0");

        let keep = Issue::new("Test User", "keep", "").into_record();
        let gone = Issue::new("Test User", "gone", "").into_record();
        store.add(&keep).unwrap();
        store.add(&gone).unwrap();
        store.remove(&gone).unwrap();
        backend.force_note(Kind::Issue.refpath(), "c1", "{}");

        let status = get_sync_status(&store, "origin").unwrap();
        assert_eq!(status.anchor, "c0");
        let issues = &status.categories[1];
        assert_eq!(issues.category, Kind::Issue);
        assert_eq!(issues.records, 1);
        assert_eq!(issues.tombstones, 1);
        assert!(issues.oid.is_some());
        assert_eq!(issues.stray_targets, vec!["c1"]);
        assert!(issues.staged.is_none());
        assert!(status.categories[0].oid.is_none());
    }
}
