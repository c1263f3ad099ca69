//! Issue model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{closed_flag, new_id, Entry, Kind, Record};

/// An issue, optionally filed under a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,

    pub author: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none", with = "closed_flag")]
    pub closed: Option<bool>,

    /// Kind of the owning record (a project). Relation only, never ownership.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_type: Option<Kind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,

    pub refpath: String,
}

impl Issue {
    /// Create a new open issue with no parent.
    pub fn new(
        author: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            author: author.into(),
            title: title.into(),
            description: description.into(),
            closed: Some(false),
            parent_type: None,
            parent_id: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            refpath: Kind::Issue.refpath().to_string(),
        }
    }

    /// Attach the issue to a parent record.
    #[must_use]
    pub fn with_parent(mut self, kind: Kind, id: impl Into<String>) -> Self {
        self.parent_type = Some(kind);
        self.parent_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed == Some(true)
    }
}

impl Entry for Issue {
    const KIND: Kind = Kind::Issue;

    fn id(&self) -> &str {
        &self.id
    }

    fn refpath(&self) -> &str {
        &self.refpath
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }

    fn mark_deleted(&mut self, at: DateTime<Utc>) {
        self.deleted_at = Some(at);
    }

    fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    fn into_record(self) -> Record {
        Record::Issue(self)
    }
}
