//! Operations shared by projects and issues.

use chrono::Utc;
use serde::Serialize;

use super::{print_detail, print_json, print_rows};
use crate::cli::workspace::{listing, resolve, Listed, Workspace};
use crate::cli::{ListArgs, UpdateArgs};
use crate::error::{Error, Result};
use crate::model::{Kind, Record};

#[derive(Serialize)]
struct ListOutput<'a> {
    category: Kind,
    count: usize,
    records: &'a [Listed],
}

#[derive(Serialize)]
struct ChangeOutput<'a> {
    success: bool,
    action: &'a str,
    #[serde(flatten)]
    record: &'a Listed,
}

#[derive(Serialize)]
struct DeleteOutput<'a> {
    success: bool,
    id: &'a str,
    short_id: &'a str,
    deleted: bool,
}

/// Apply list filters in place.
pub(super) fn filter(listed: &mut Vec<Listed>, args: &ListArgs) {
    listed.retain(|l| {
        (args.deleted || !l.record.is_deleted()) && (args.all || !l.record.is_closed())
    });
}

/// Print a listing of `kind`, optionally narrowed by `keep`.
pub(super) fn list(
    ws: &Workspace,
    kind: Kind,
    args: &ListArgs,
    keep: impl Fn(&Listed) -> bool,
    json: bool,
) -> Result<()> {
    let store = ws.store()?;
    let mut listed = listing(&store, kind)?;
    filter(&mut listed, args);
    listed.retain(|l| keep(l));

    if json {
        return print_json(&ListOutput {
            category: kind,
            count: listed.len(),
            records: &listed,
        });
    }
    print_rows(&listed, &format!("No {kind} found."));
    Ok(())
}

/// Report a created or changed record.
pub(super) fn report(action: &str, listed: &Listed, json: bool) -> Result<()> {
    if json {
        return print_json(&ChangeOutput {
            success: true,
            action,
            record: listed,
        });
    }
    println!(
        "{action} {} {}: {}",
        listed.record.kind().singular(),
        listed.short_id,
        listed.record.headline()
    );
    Ok(())
}

/// Store a brand-new record and report it under its short code.
pub(super) fn create(ws: &Workspace, record: Record, json: bool) -> Result<()> {
    let store = ws.store()?;
    store.add(&record)?;
    let created = resolve(&store, record.kind(), record.id())?;
    report("Created", &created, json)
}

pub(super) fn show(ws: &Workspace, kind: Kind, reference: &str, json: bool) -> Result<Listed> {
    let store = ws.store()?;
    let listed = resolve(&store, kind, reference)?;
    if !json {
        print_detail(&listed);
    }
    Ok(listed)
}

pub(super) fn update(ws: &Workspace, kind: Kind, args: &UpdateArgs, json: bool) -> Result<()> {
    if args.title.is_none() && args.description.is_none() {
        return Err(Error::InvalidArgument(
            "nothing to update: pass --title and/or --description".to_string(),
        ));
    }
    if args.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(Error::InvalidArgument("title cannot be empty".to_string()));
    }
    modify(ws, kind, &args.id, "Updated", json, |record| match record {
        Record::Project(p) => {
            if let Some(title) = &args.title {
                p.title.clone_from(title);
            }
            if let Some(description) = &args.description {
                p.description.clone_from(description);
            }
        }
        Record::Issue(i) => {
            if let Some(title) = &args.title {
                i.title.clone_from(title);
            }
            if let Some(description) = &args.description {
                i.description.clone_from(description);
            }
        }
        Record::Comment(_) => {}
    })
}

pub(super) fn set_closed(
    ws: &Workspace,
    kind: Kind,
    reference: &str,
    closed: bool,
    json: bool,
) -> Result<()> {
    let action = if closed { "Closed" } else { "Reopened" };
    modify(ws, kind, reference, action, json, |record| match record {
        Record::Project(p) => p.closed = Some(closed),
        Record::Issue(i) => i.closed = Some(closed),
        Record::Comment(_) => {}
    })
}

/// Resolve, change, touch and store one record.
fn modify(
    ws: &Workspace,
    kind: Kind,
    reference: &str,
    action: &str,
    json: bool,
    change: impl FnOnce(&mut Record),
) -> Result<()> {
    let store = ws.store()?;
    let mut listed = resolve(&store, kind, reference)?;
    change(&mut listed.record);
    listed.record.touch(Utc::now());
    store.update(&listed.record)?;
    report(action, &listed, json)
}

pub(super) fn delete(ws: &Workspace, kind: Kind, reference: &str, json: bool) -> Result<()> {
    let store = ws.store()?;
    let listed = resolve(&store, kind, reference)?;
    let deleted = store.remove(&listed.record)?;

    if json {
        return print_json(&DeleteOutput {
            success: true,
            id: listed.record.id(),
            short_id: &listed.short_id,
            deleted,
        });
    }
    println!(
        "Deleted {} {}: {}",
        kind.singular(),
        listed.short_id,
        listed.record.headline()
    );
    Ok(())
}
