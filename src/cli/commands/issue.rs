//! Issue management commands.
//!
//! - `nt issue create <title> [--project <id>]` - File a new issue
//! - `nt issue list [--project <id>]` - List open issues
//! - `nt issue show <id>` - Show an issue and its comments
//! - `nt issue update <id>` - Change title or description
//! - `nt issue close|reopen <id>` - Toggle the closed flag
//! - `nt issue delete <id>` - Tombstone an issue

use serde::Serialize;

use super::{print_json, print_rows, tracked};
use crate::cli::workspace::{listing, resolve, Listed, Workspace};
use crate::cli::{IssueCommands, IssueCreateArgs, IssueListArgs};
use crate::error::Result;
use crate::model::{Entry, Issue, Kind};

#[derive(Serialize)]
struct IssueDetail<'a> {
    #[serde(flatten)]
    issue: &'a Listed,
    comments: Vec<Listed>,
}

/// Execute an issue command.
///
/// # Errors
///
/// Returns an error if the repository, anchor or record cannot be resolved,
/// or the write fails.
pub fn execute(command: &IssueCommands, ws: &Workspace, json: bool) -> Result<()> {
    match command {
        IssueCommands::Create(args) => create(ws, args, json),
        IssueCommands::List(args) => list(ws, args, json),
        IssueCommands::Show { id } => show(ws, id, json),
        IssueCommands::Update(args) => tracked::update(ws, Kind::Issue, args, json),
        IssueCommands::Close { id } => tracked::set_closed(ws, Kind::Issue, id, true, json),
        IssueCommands::Reopen { id } => tracked::set_closed(ws, Kind::Issue, id, false, json),
        IssueCommands::Delete { id } => tracked::delete(ws, Kind::Issue, id, json),
    }
}

fn create(ws: &Workspace, args: &IssueCreateArgs, json: bool) -> Result<()> {
    let mut issue = Issue::new(ws.author()?, &args.fields.title, &args.fields.description);
    if let Some(project) = &args.project {
        let store = ws.store()?;
        let project = resolve(&store, Kind::Project, project)?;
        issue = issue.with_parent(Kind::Project, project.record.id());
    }
    tracked::create(ws, issue.into_record(), json)
}

fn list(ws: &Workspace, args: &IssueListArgs, json: bool) -> Result<()> {
    let parent = match &args.project {
        Some(reference) => {
            let store = ws.store()?;
            Some(resolve(&store, Kind::Project, reference)?.record.id().to_string())
        }
        None => None,
    };
    tracked::list(
        ws,
        Kind::Issue,
        &args.filter,
        |l| parent.is_none() || l.record.parent_id() == parent.as_deref(),
        json,
    )
}

fn show(ws: &Workspace, reference: &str, json: bool) -> Result<()> {
    let issue = tracked::show(ws, Kind::Issue, reference, json)?;
    let store = ws.store()?;
    let mut comments = listing(&store, Kind::Comment)?;
    comments.retain(|l| {
        !l.record.is_deleted() && l.record.parent_id() == Some(issue.record.id())
    });

    if json {
        return print_json(&IssueDetail {
            issue: &issue,
            comments,
        });
    }
    println!();
    println!("Comments ({}):", comments.len());
    print_rows(&comments, "  none");
    Ok(())
}
