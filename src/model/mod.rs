//! Data models and the note payload codec.
//!
//! Three record kinds live in three category notes:
//! - [`Project`] in `refs/notes/nt/projects`
//! - [`Issue`] in `refs/notes/nt/issues`
//! - [`Comment`] in `refs/notes/nt/comments`
//!
//! A category note is a JSON object mapping record id to record. Reads and
//! writes always handle the whole mapping ([`Blob`]).

pub mod comment;
pub mod issue;
pub mod project;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use comment::Comment;
pub use issue::Issue;
pub use project::Project;

/// Common prefix of every category ref.
pub const NOTES_NAMESPACE: &str = "refs/notes/nt/";

/// Record kind, which doubles as the category a record is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Project,
    Issue,
    Comment,
}

impl Kind {
    /// All kinds, in dependency order (parents before children).
    pub const ALL: [Kind; 3] = [Kind::Project, Kind::Issue, Kind::Comment];

    /// Plural category name, also the last segment of the ref path.
    #[must_use]
    pub const fn category(self) -> &'static str {
        match self {
            Self::Project => "projects",
            Self::Issue => "issues",
            Self::Comment => "comments",
        }
    }

    #[must_use]
    pub const fn singular(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Issue => "issue",
            Self::Comment => "comment",
        }
    }

    /// Fully qualified notes ref holding this category.
    #[must_use]
    pub const fn refpath(self) -> &'static str {
        match self {
            Self::Project => "refs/notes/nt/projects",
            Self::Issue => "refs/notes/nt/issues",
            Self::Comment => "refs/notes/nt/comments",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.category())
    }
}

impl FromStr for Kind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "project" | "projects" => Ok(Self::Project),
            "issue" | "issues" => Ok(Self::Issue),
            "comment" | "comments" => Ok(Self::Comment),
            other => Err(Error::InvalidArgument(format!(
                "unknown record type '{other}' (expected project, issue or comment)"
            ))),
        }
    }
}

/// Shared behaviour of every concrete record kind.
pub trait Entry: Serialize + for<'de> Deserialize<'de> + Clone {
    const KIND: Kind;

    fn id(&self) -> &str;
    fn refpath(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;
    fn updated_at(&self) -> DateTime<Utc>;
    fn deleted_at(&self) -> Option<DateTime<Utc>>;

    /// Set `updated_at`.
    fn touch(&mut self, at: DateTime<Utc>);

    /// Set the tombstone marker.
    fn mark_deleted(&mut self, at: DateTime<Utc>);

    /// Weak reference to the owning record, if any.
    fn parent_id(&self) -> Option<&str> {
        None
    }

    fn into_record(self) -> Record;
}

/// A record of any kind.
///
/// Serializes as the bare inner record. Deserialization needs the kind, so it
/// goes through [`decode`] / [`decode_blob`] instead of `Deserialize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Project(Project),
    Issue(Issue),
    Comment(Comment),
}

macro_rules! each_record {
    ($record:expr, $inner:ident => $body:expr) => {
        match $record {
            Record::Project($inner) => $body,
            Record::Issue($inner) => $body,
            Record::Comment($inner) => $body,
        }
    };
}

impl Record {
    #[must_use]
    pub const fn kind(&self) -> Kind {
        match self {
            Self::Project(_) => Kind::Project,
            Self::Issue(_) => Kind::Issue,
            Self::Comment(_) => Kind::Comment,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        each_record!(self, r => r.id())
    }

    #[must_use]
    pub fn refpath(&self) -> &str {
        each_record!(self, r => r.refpath())
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        each_record!(self, r => r.created_at())
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        each_record!(self, r => r.updated_at())
    }

    #[must_use]
    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        each_record!(self, r => r.deleted_at())
    }

    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at().is_some()
    }

    #[must_use]
    pub fn parent_id(&self) -> Option<&str> {
        each_record!(self, r => r.parent_id())
    }

    /// Closed flag of projects and issues; comments are never closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        match self {
            Self::Project(p) => p.is_closed(),
            Self::Issue(i) => i.is_closed(),
            Self::Comment(_) => false,
        }
    }

    pub fn touch(&mut self, at: DateTime<Utc>) {
        each_record!(self, r => r.touch(at));
    }

    pub fn mark_deleted(&mut self, at: DateTime<Utc>) {
        each_record!(self, r => r.mark_deleted(at));
    }

    /// Headline for listings: the title, or the comment body.
    #[must_use]
    pub fn headline(&self) -> &str {
        match self {
            Self::Project(p) => &p.title,
            Self::Issue(i) => &i.title,
            Self::Comment(c) => &c.content,
        }
    }

    #[must_use]
    pub fn author(&self) -> &str {
        each_record!(self, r => &r.author)
    }
}

/// Decoded contents of one category note, keyed by record id.
pub type Blob = BTreeMap<String, Record>;

/// Encode a single record as canonical JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode(record: &Record) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(record)?)
}

/// Decode a single record of the given kind.
///
/// # Errors
///
/// Returns `Error::Decode` if the JSON is malformed, a required field is
/// missing or mistyped (timestamps included), or the record claims a
/// different category than `kind`.
pub fn decode(bytes: &[u8], kind: Kind) -> Result<Record> {
    let value: serde_json::Value = serde_json::from_slice(bytes).map_err(|e| Error::Decode {
        category: kind,
        message: e.to_string(),
    })?;
    decode_value(value, kind)
}

fn decode_value(value: serde_json::Value, kind: Kind) -> Result<Record> {
    let to_decode_err = |e: serde_json::Error| Error::Decode {
        category: kind,
        message: e.to_string(),
    };
    let record = match kind {
        Kind::Project => Record::Project(serde_json::from_value(value).map_err(to_decode_err)?),
        Kind::Issue => Record::Issue(serde_json::from_value(value).map_err(to_decode_err)?),
        Kind::Comment => Record::Comment(serde_json::from_value(value).map_err(to_decode_err)?),
    };
    if record.refpath() != kind.refpath() {
        return Err(Error::Decode {
            category: kind,
            message: format!(
                "record {} belongs to {}, not {}",
                record.id(),
                record.refpath(),
                kind.refpath()
            ),
        });
    }
    Ok(record)
}

/// Encode a whole category mapping.
///
/// Keys are emitted in sorted order, so equal mappings produce identical bytes.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_blob(blob: &Blob) -> Result<String> {
    Ok(serde_json::to_string(blob)?)
}

/// Decode a whole category mapping.
///
/// Blank content decodes to an empty mapping.
///
/// # Errors
///
/// Returns `Error::Decode` if the top level is not an object, any record
/// fails to decode, or a key does not match its record's id.
pub fn decode_blob(content: &str, kind: Kind) -> Result<Blob> {
    if content.trim().is_empty() {
        return Ok(Blob::new());
    }
    let raw: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(content).map_err(|e| Error::Decode {
            category: kind,
            message: e.to_string(),
        })?;

    let mut blob = Blob::new();
    for (key, value) in raw {
        let record = decode_value(value, kind)?;
        if record.id() != key {
            return Err(Error::Decode {
                category: kind,
                message: format!("key {key} holds record {}", record.id()),
            });
        }
        blob.insert(key, record);
    }
    Ok(blob)
}

/// Parse an RFC 3339 timestamp into UTC.
///
/// # Errors
///
/// Returns `Error::Timestamp` for anything that is not RFC 3339.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Timestamp {
            value: value.to_string(),
            message: e.to_string(),
        })
}

/// Fresh globally unique record id.
#[must_use]
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Serde adapter for the textual `"true"` / `"false"` closed flag.
///
/// `None` is the third state: never set. An empty string also reads as unset.
pub(crate) mod closed_flag {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(value: &Option<bool>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(true) => s.serialize_str("true"),
            Some(false) => s.serialize_str("false"),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some("true") => Ok(Some(true)),
            Some("false") => Ok(Some(false)),
            Some(other) => Err(D::Error::custom(format!(
                "closed must be \"true\" or \"false\", got {other:?}"
            ))),
        }
    }
}
