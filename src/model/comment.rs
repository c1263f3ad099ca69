//! Comment model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{new_id, Entry, Kind, Record};

/// A comment on a project or an issue.
///
/// Comments carry a single `content` field instead of title and description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,

    pub author: String,

    pub content: String,

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

impl Comment {
    pub fn new(
        author: impl Into<String>,
        content: impl Into<String>,
        parent_type: Kind,
        parent_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            author: author.into(),
            content: content.into(),
            parent_type: Some(parent_type),
            parent_id: Some(parent_id.into()),
            created_at: now,
            updated_at: now,
            deleted_at: None,
            refpath: Kind::Comment.refpath().to_string(),
        }
    }
}

impl Entry for Comment {
    const KIND: Kind = Kind::Comment;

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
        Record::Comment(self)
    }
}
