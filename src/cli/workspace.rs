//! Per-invocation state shared by the commands.
//!
//! Resolves configuration, opens the repository once and hands out the
//! store. Also owns the short codes: they are assigned per invocation with
//! a fresh cache, over every record of a category in `(created_at, id)`
//! order, so an unchanged category always shows the same codes.

use serde::Serialize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::git::{Backend, GitCli};
use crate::model::{Kind, Record};
use crate::shortid;
use crate::storage::Store;

/// Opened repository plus resolved settings.
pub struct Workspace {
    config: Config,
    backend: GitCli,
}

impl Workspace {
    /// Open the repository named by `config`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if it is not a git repository.
    pub fn open(config: Config) -> Result<Self> {
        let backend = config.open_backend()?;
        Ok(Self { config, backend })
    }

    /// Store at the configured (or resolved) anchor.
    ///
    /// # Errors
    ///
    /// Returns an error if the anchor cannot be resolved.
    pub fn store(&self) -> Result<Store<'_>> {
        Store::open(&self.backend, self.config.anchor.as_deref())
    }

    /// # Errors
    ///
    /// Returns `Error::Config` if no author identity is configured.
    pub fn author(&self) -> Result<String> {
        self.config.author(&self.backend)
    }

    #[must_use]
    pub fn remote(&self) -> &str {
        &self.config.remote
    }

    #[must_use]
    pub fn backend(&self) -> &dyn Backend {
        &self.backend
    }
}

/// A record together with its short code.
#[derive(Debug, Clone, Serialize)]
pub struct Listed {
    pub short_id: String,
    #[serde(flatten)]
    pub record: Record,
}

/// Attach short codes to `records`, returned in `(created_at, id)` order.
#[must_use]
pub fn with_codes(mut records: Vec<Record>) -> Vec<Listed> {
    records.sort_by(|a, b| {
        a.created_at()
            .cmp(&b.created_at())
            .then_with(|| a.id().cmp(b.id()))
    });
    let codes: Vec<String> = shortid::assign_all(records.iter().map(Record::id))
        .into_iter()
        .map(|(code, _)| code)
        .collect();
    records
        .into_iter()
        .zip(codes)
        .map(|(record, short_id)| Listed { short_id, record })
        .collect()
}

/// Every record of `kind` (tombstones included) with its short code.
///
/// # Errors
///
/// Returns an error if the category note cannot be read or decoded.
pub fn listing(store: &Store<'_>, kind: Kind) -> Result<Vec<Listed>> {
    Ok(with_codes(store.list_all(kind)?))
}

/// Find the live record `reference` points at.
///
/// `reference` may be a full id, a short code (any case) or a unique prefix
/// of an id.
///
/// # Errors
///
/// Returns `Error::RecordNotFound` if nothing matches and
/// `Error::AmbiguousId` if a prefix matches several records.
pub fn find(listed: &[Listed], reference: &str) -> Result<Listed> {
    let reference = reference.trim();
    let live = || listed.iter().filter(|l| !l.record.is_deleted());

    if let Some(hit) = live().find(|l| l.record.id() == reference) {
        return Ok(hit.clone());
    }
    let upper = reference.to_uppercase();
    if shortid::is_short_code(&upper) {
        if let Some(hit) = live().find(|l| l.short_id == upper) {
            return Ok(hit.clone());
        }
    }

    let matches: Vec<&Listed> = if reference.is_empty() {
        Vec::new()
    } else {
        live().filter(|l| l.record.id().starts_with(reference)).collect()
    };
    match matches.as_slice() {
        [] => Err(Error::RecordNotFound {
            id: reference.to_string(),
        }),
        [only] => Ok((*only).clone()),
        many => Err(Error::AmbiguousId {
            prefix: reference.to_string(),
            matches: many.iter().map(|l| l.record.id().to_string()).collect(),
        }),
    }
}

/// Look up a live record of `kind` by reference.
///
/// # Errors
///
/// See [`find`].
pub fn resolve(store: &Store<'_>, kind: Kind, reference: &str) -> Result<Listed> {
    find(&listing(store, kind)?, reference)
}
