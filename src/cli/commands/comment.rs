//! Comment commands.

use serde::Serialize;

use super::{print_json, print_rows, tracked};
use crate::cli::workspace::{listing, resolve, Listed, Workspace};
use crate::cli::{CommentCommands, CommentTarget};
use crate::error::{Error, Result};
use crate::model::{Comment, Entry, Kind};

#[derive(Serialize)]
struct CommentListOutput<'a> {
    parent_type: Kind,
    parent_id: &'a str,
    count: usize,
    comments: &'a [Listed],
}

/// Execute a comment command.
///
/// # Errors
///
/// Returns an error if the target or comment cannot be resolved, or the
/// write fails.
pub fn execute(command: &CommentCommands, ws: &Workspace, json: bool) -> Result<()> {
    match command {
        CommentCommands::Add {
            target,
            content,
            on,
        } => add(ws, target, content, *on, json),
        CommentCommands::List { target, on } => list(ws, target, *on, json),
        CommentCommands::Delete { id } => tracked::delete(ws, Kind::Comment, id, json),
    }
}

fn add(ws: &Workspace, target: &str, content: &str, on: CommentTarget, json: bool) -> Result<()> {
    if content.trim().is_empty() {
        return Err(Error::InvalidArgument("comment cannot be empty".to_string()));
    }
    let store = ws.store()?;
    let parent = resolve(&store, on.into(), target)?;
    let comment = Comment::new(ws.author()?, content, on.into(), parent.record.id());
    tracked::create(ws, comment.into_record(), json)
}

fn list(ws: &Workspace, target: &str, on: CommentTarget, json: bool) -> Result<()> {
    let store = ws.store()?;
    let parent = resolve(&store, on.into(), target)?;
    let mut comments = listing(&store, Kind::Comment)?;
    comments.retain(|l| {
        !l.record.is_deleted() && l.record.parent_id() == Some(parent.record.id())
    });

    if json {
        return print_json(&CommentListOutput {
            parent_type: on.into(),
            parent_id: parent.record.id(),
            count: comments.len(),
            comments: &comments,
        });
    }
    print_rows(&comments, "No comments.");
    Ok(())
}
