//! Error types for the notes tracker.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=backend, 3=not_found, 4=validation, etc.)
//! - Retryability flags for scripted callers
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers
//!
//! Core operations never terminate the process. They return these errors
//! and only `main` turns them into an exit code.

use thiserror::Error;

use crate::model::Kind;

/// Result type alias for notes tracker operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Backend (exit 2)
    BackendError,
    NoCommits,
    AmbiguousAnchor,

    // Not Found (exit 3)
    NoteNotFound,
    RecordNotFound,
    AmbiguousId,

    // Validation (exit 4)
    InvalidArgument,
    InvalidTimestamp,

    // Sync (exit 6)
    Conflict,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,
    DecodeError,

    // Internal (exit 1)
    StaleNote,
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::BackendError => "BACKEND_ERROR",
            Self::NoCommits => "NO_COMMITS",
            Self::AmbiguousAnchor => "AMBIGUOUS_ANCHOR",
            Self::NoteNotFound => "NOTE_NOT_FOUND",
            Self::RecordNotFound => "RECORD_NOT_FOUND",
            Self::AmbiguousId => "AMBIGUOUS_ID",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::InvalidTimestamp => "INVALID_TIMESTAMP",
            Self::Conflict => "CONFLICT",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::DecodeError => "DECODE_ERROR",
            Self::StaleNote => "STALE_NOTE",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::StaleNote | Self::InternalError => 1,
            Self::BackendError | Self::NoCommits | Self::AmbiguousAnchor => 2,
            Self::NoteNotFound | Self::RecordNotFound | Self::AmbiguousId => 3,
            Self::InvalidArgument | Self::InvalidTimestamp => 4,
            Self::Conflict => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError | Self::DecodeError => 8,
        }
    }

    /// Whether the same call may succeed if repeated (possibly with corrected input).
    ///
    /// Nothing in the core retries on its own; this is advice for the caller.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Conflict | Self::AmbiguousId | Self::InvalidArgument | Self::InvalidTimestamp
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in notes tracker operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("git {command} failed: {message}")]
    Backend { command: String, message: String },

    #[error("Repository has no commits to attach notes to")]
    NoCommits,

    #[error("History has {} root commits; cannot pick an anchor", roots.len())]
    AmbiguousAnchor { roots: Vec<String> },

    #[error("No {category} note attached to anchor {anchor}")]
    NoteNotFound { category: Kind, anchor: String },

    #[error("Record not found: {id}")]
    RecordNotFound { id: String },

    #[error("Ambiguous id '{prefix}' matches {}", matches.join(", "))]
    AmbiguousId { prefix: String, matches: Vec<String> },

    #[error("Malformed {category} note: {message}")]
    Decode { category: Kind, message: String },

    #[error("Invalid timestamp '{value}': {message}")]
    Timestamp { value: String, message: String },

    #[error("The {category} note changed since it was read")]
    Conflict { category: Kind },

    #[error("The {category} note handle is stale; read it again")]
    StaleNote { category: Kind },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a backend error from a git subcommand and its stderr.
    pub(crate) fn backend(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            command: command.into(),
            message: message.into().trim().to_string(),
        }
    }

    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Backend { .. } => ErrorCode::BackendError,
            Self::NoCommits => ErrorCode::NoCommits,
            Self::AmbiguousAnchor { .. } => ErrorCode::AmbiguousAnchor,
            Self::NoteNotFound { .. } => ErrorCode::NoteNotFound,
            Self::RecordNotFound { .. } => ErrorCode::RecordNotFound,
            Self::AmbiguousId { .. } => ErrorCode::AmbiguousId,
            Self::Decode { .. } => ErrorCode::DecodeError,
            Self::Timestamp { .. } => ErrorCode::InvalidTimestamp,
            Self::Conflict { .. } => ErrorCode::Conflict,
            Self::StaleNote { .. } => ErrorCode::StaleNote,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NoCommits => {
                Some("Create an initial commit first: git commit --allow-empty -m init".to_string())
            }

            Self::AmbiguousAnchor { roots } => Some(format!(
                "Pin the anchor explicitly with --anchor or NT_ANCHOR. Root commits:\n    {}",
                roots.join("\n    ")
            )),

            Self::NoteNotFound { category, .. } => Some(format!(
                "Nothing has been stored for {category} yet. Create one with `nt {} create`.",
                category.singular()
            )),

            Self::RecordNotFound { id } => Some(format!(
                "No record with ID or short code '{id}'. Use `nt issue list` to see available issues."
            )),

            Self::AmbiguousId { .. } => {
                Some("Use more characters of the ID, or the 6-character short code.".to_string())
            }

            Self::Conflict { .. } => Some(
                "Another process wrote the same note. Re-run the command to apply it on top."
                    .to_string(),
            ),

            Self::Config(msg) if msg.contains("author") => Some(
                "Set an identity: git config user.name \"Your Name\", or export NT_AUTHOR"
                    .to_string(),
            ),

            Self::Backend { .. }
            | Self::Decode { .. }
            | Self::Timestamp { .. }
            | Self::StaleNote { .. }
            | Self::Io(_)
            | Self::Json(_)
            | Self::InvalidArgument(_)
            | Self::Config(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_by_category() {
        assert_eq!(Error::NoCommits.exit_code(), 2);
        assert_eq!(
            Error::NoteNotFound {
                category: Kind::Issue,
                anchor: "abc".into()
            }
            .exit_code(),
            3
        );
        assert_eq!(Error::Conflict { category: Kind::Issue }.exit_code(), 6);
    }

    #[test]
    fn test_structured_json_carries_hint() {
        let err = Error::Conflict {
            category: Kind::Comment,
        };
        let json = err.to_structured_json();
        assert_eq!(json["error"]["code"], "CONFLICT");
        assert_eq!(json["error"]["retryable"], true);
        assert!(json["error"]["hint"].is_string());
    }

    #[test]
    fn test_backend_error_trims_stderr() {
        let err = Error::backend("notes", "fatal: bad object\n");
        assert_eq!(err.to_string(), "git notes failed: fatal: bad object");
    }
}
