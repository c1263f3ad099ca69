//! Reconciling two replicas of one category note.
//!
//! For every key of the remote mapping:
//!
//! 1. Unknown locally: the remote record is taken as-is.
//! 2. Remote value is not a JSON object: skipped, local is kept.
//! 3. Remote carries `deleted_at`: the marker is copied onto the local
//!    record, whose other fields stay untouched. If local is already
//!    tombstoned at or before that time it keeps its own marker, so both
//!    replicas settle on the earliest deletion. A marker that does not
//!    parse leaves the key alone.
//! 4. Otherwise the side with the strictly later `updated_at` wins the
//!    whole record. A timestamp that does not parse means that key is left
//!    alone.
//!
//! Keys missing from the remote are never removed locally; absence only
//! means the remote has not seen them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{decode_blob, parse_timestamp, Kind};
use crate::storage::{Note, Store};

/// Per-key outcome counts of one merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    /// Keys only the remote had.
    pub added: usize,
    /// Keys where the remote record was newer and replaced local.
    pub replaced: usize,
    /// Keys where the remote tombstone was copied onto local.
    pub tombstoned: usize,
    /// Keys left as they were.
    pub unchanged: usize,
    /// Remote entries skipped because they were not records.
    pub malformed: usize,
    /// Keys skipped because a timestamp could not be parsed.
    pub distrusted: usize,
    /// Whether a new note was written.
    pub written: bool,
}

impl MergeStats {
    #[must_use]
    pub fn total(&self) -> usize {
        self.added
            + self.replaced
            + self.tombstoned
            + self.unchanged
            + self.malformed
            + self.distrusted
    }

    /// Number of keys whose local value changed.
    #[must_use]
    pub fn changed(&self) -> usize {
        self.added + self.replaced + self.tombstoned
    }
}

/// Merge `remote` into `local` and write the result to the local notes path.
///
/// Both handles are marked stale afterwards, whether or not a write was
/// needed, and must be read again before further use.
///
/// # Errors
///
/// - `Error::InvalidArgument` if the handles disagree on category or anchor,
///   or `local` was not read from the category's own ref
/// - `Error::StaleNote` if either handle was already consumed
/// - `Error::Decode` if either side is malformed JSON, or the merged
///   mapping is not a valid category (nothing is written)
/// - `Error::Conflict` if the local note changed since it was read
pub fn merge(store: &Store<'_>, local: &mut Note, remote: &mut Note) -> Result<MergeStats> {
    let kind = local.kind();
    if remote.kind() != kind {
        return Err(Error::InvalidArgument(format!(
            "cannot merge {} into {kind}",
            remote.kind()
        )));
    }
    if local.notes_ref() != kind.refpath() {
        return Err(Error::InvalidArgument(format!(
            "merge target must be {}, not {}",
            kind.refpath(),
            local.notes_ref()
        )));
    }
    if local.anchor() != store.anchor() || remote.anchor() != store.anchor() {
        return Err(Error::InvalidArgument(
            "notes were read at a different anchor".to_string(),
        ));
    }

    let local_blob = local.decode()?;
    let mut merged = parse_map(local.content()?, kind)?;
    let theirs = parse_map(remote.content()?, kind)?;

    let mut stats = MergeStats::default();
    merge_values(&mut merged, &theirs, &mut stats);

    let merged_blob = decode_blob(&Value::Object(merged).to_string(), kind)?;
    if merged_blob == local_blob {
        debug!(category = %kind, "merge changed nothing");
    } else {
        store.write_blob(kind, &merged_blob, local.oid())?;
        stats.written = true;
    }

    local.mark_stale();
    remote.mark_stale();
    info!(
        category = %kind,
        added = stats.added,
        replaced = stats.replaced,
        tombstoned = stats.tombstoned,
        written = stats.written,
        "merged notes"
    );
    Ok(stats)
}

/// Apply the per-key rules to raw JSON mappings.
pub fn merge_values(
    local: &mut Map<String, Value>,
    remote: &Map<String, Value>,
    stats: &mut MergeStats,
) {
    for (key, theirs) in remote {
        let Some(ours) = local.get_mut(key) else {
            local.insert(key.clone(), theirs.clone());
            stats.added += 1;
            continue;
        };
        let Some(their_record) = theirs.as_object() else {
            warn!(key, "skipping remote entry that is not a record");
            stats.malformed += 1;
            continue;
        };
        if *ours == *theirs {
            stats.unchanged += 1;
            continue;
        }
        let Some(our_record) = ours.as_object_mut() else {
            // local side is validated before merging; nothing sensible to do
            stats.malformed += 1;
            continue;
        };

        if let Some(deleted_at) = their_record.get("deleted_at").filter(|v| !v.is_null()) {
            let Some(Ok(theirs_at)) = deleted_at.as_str().map(parse_timestamp) else {
                warn!(key, "remote deleted_at unparseable, keeping local record");
                stats.distrusted += 1;
                continue;
            };
            if keeps_own_tombstone(our_record, theirs_at) {
                stats.unchanged += 1;
            } else {
                our_record.insert("deleted_at".to_string(), deleted_at.clone());
                stats.tombstoned += 1;
            }
            continue;
        }

        match (updated_at(our_record), updated_at(their_record)) {
            (Some(Ok(ours_at)), Some(Ok(theirs_at))) => {
                if theirs_at > ours_at {
                    *ours = theirs.clone();
                    stats.replaced += 1;
                } else {
                    stats.unchanged += 1;
                }
            }
            _ => {
                warn!(key, "updated_at missing or unparseable, keeping local record");
                stats.distrusted += 1;
            }
        }
    }
}

fn updated_at(record: &Map<String, Value>) -> Option<Result<DateTime<Utc>>> {
    record
        .get("updated_at")
        .and_then(Value::as_str)
        .map(parse_timestamp)
}

/// Local already carries a tombstone no later than the remote one.
fn keeps_own_tombstone(ours: &Map<String, Value>, theirs: DateTime<Utc>) -> bool {
    ours.get("deleted_at")
        .and_then(Value::as_str)
        .and_then(|own| parse_timestamp(own).ok())
        .is_some_and(|own| own <= theirs)
}

fn parse_map(content: &str, kind: Kind) -> Result<Map<String, Value>> {
    if content.trim().is_empty() {
        return Ok(Map::new());
    }
    serde_json::from_str(content).map_err(|e| Error::Decode {
        category: kind,
        message: e.to_string(),
    })
}
