//! Project management commands.
//!
//! - `nt project create <title>` - Create a new project
//! - `nt project list` - List open projects
//! - `nt project show <id>` - Show a project and its issues
//! - `nt project update <id>` - Change title or description
//! - `nt project close|reopen <id>` - Toggle the closed flag
//! - `nt project delete <id>` - Tombstone a project

use serde::Serialize;

use super::{print_json, print_rows, tracked};
use crate::cli::workspace::{listing, Listed, Workspace};
use crate::cli::{ListArgs, ProjectCommands};
use crate::error::Result;
use crate::model::{Entry, Kind, Project};

#[derive(Serialize)]
struct ProjectDetail<'a> {
    #[serde(flatten)]
    project: &'a Listed,
    issues: Vec<Listed>,
}

/// Execute a project command.
///
/// # Errors
///
/// Returns an error if the repository, anchor or record cannot be resolved,
/// or the write fails.
pub fn execute(command: &ProjectCommands, ws: &Workspace, json: bool) -> Result<()> {
    match command {
        ProjectCommands::Create(args) => {
            let project = Project::new(ws.author()?, &args.title, &args.description);
            tracked::create(ws, project.into_record(), json)
        }
        ProjectCommands::List(args) => tracked::list(ws, Kind::Project, args, |_| true, json),
        ProjectCommands::Show { id } => show(ws, id, json),
        ProjectCommands::Update(args) => tracked::update(ws, Kind::Project, args, json),
        ProjectCommands::Close { id } => tracked::set_closed(ws, Kind::Project, id, true, json),
        ProjectCommands::Reopen { id } => tracked::set_closed(ws, Kind::Project, id, false, json),
        ProjectCommands::Delete { id } => tracked::delete(ws, Kind::Project, id, json),
    }
}

fn show(ws: &Workspace, reference: &str, json: bool) -> Result<()> {
    let project = tracked::show(ws, Kind::Project, reference, json)?;

    let store = ws.store()?;
    let mut issues = listing(&store, Kind::Issue)?;
    tracked::filter(
        &mut issues,
        &ListArgs {
            all: true,
            deleted: false,
        },
    );
    issues.retain(|l| l.record.parent_id() == Some(project.record.id()));

    if json {
        return print_json(&ProjectDetail {
            project: &project,
            issues,
        });
    }
    println!();
    println!("Issues ({}):", issues.len());
    print_rows(&issues, "  none");
    Ok(())
}
