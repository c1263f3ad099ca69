//! Project model.
//!
//! Projects are the top-level grouping. Issues point at them through a weak
//! `parent_id`; deleting a project leaves its issues alone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{closed_flag, new_id, Entry, Kind, Record};

/// A project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier (UUID v4), never changes.
    pub id: String,

    /// Identity of the creator, `Name <email>`.
    pub author: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    /// `"true"` / `"false"` on the wire; absent when never set.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "closed_flag")]
    pub closed: Option<bool>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Tombstone. Set instead of removing the key so deletions merge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,

    /// Category ref this record is stored under.
    pub refpath: String,
}

impl Project {
    /// Create a new open project.
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
            created_at: now,
            updated_at: now,
            deleted_at: None,
            refpath: Kind::Project.refpath().to_string(),
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed == Some(true)
    }
}

impl Entry for Project {
    const KIND: Kind = Kind::Project;

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

    fn into_record(self) -> Record {
        Record::Project(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_project() {
        let project = Project::new("Ada <ada@example.com>", "Compiler", "");

        assert_eq!(project.id.len(), 36);
        assert_eq!(project.refpath, "refs/notes/nt/projects");
        assert_eq!(project.closed, Some(false));
        assert_eq!(project.created_at, project.updated_at);
        assert!(!project.is_closed());
    }
}
