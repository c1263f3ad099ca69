//! Sync command implementations.
//!
//! Push sends every category. Pull force-fetches one category, puts the
//! local note back and merges the fetched copy into it. Merge fetches into a staging
//! ref first, so local data is only replaced by a successful merge.

use serde::Serialize;

use crate::cli::workspace::Workspace;
use crate::cli::{CategoryArg, SyncCommands};
use crate::error::Result;
use crate::model::Kind;
use crate::storage::Store;
use crate::sync::{self, MergeStats};

use super::print_json;

#[derive(Serialize)]
struct CategoryResult {
    category: Kind,
    /// `None` when the remote had nothing for this category.
    stats: Option<MergeStats>,
}

#[derive(Serialize)]
struct SyncOutput<'a> {
    success: bool,
    action: &'a str,
    remote: &'a str,
    results: Vec<CategoryResult>,
}

/// Execute sync commands.
///
/// # Errors
///
/// Returns an error if the transport or a merge fails.
pub fn execute(command: &SyncCommands, ws: &Workspace, json: bool) -> Result<()> {
    match command {
        SyncCommands::Push => push(ws, json),
        SyncCommands::Pull { category, all } => {
            let kinds = categories(*category, *all);
            run_per_category(ws, "pull", kinds, json, sync::pull_and_merge)
        }
        SyncCommands::Merge { category, all } => {
            let kinds = categories(*category, *all);
            run_per_category(ws, "merge", kinds, json, sync::merge_remote)
        }
        SyncCommands::Status => status(ws, json),
    }
}

fn categories(category: CategoryArg, all: bool) -> Vec<Kind> {
    if all {
        Kind::ALL.to_vec()
    } else {
        vec![category.into()]
    }
}

fn push(ws: &Workspace, json: bool) -> Result<()> {
    sync::push(ws.backend(), ws.remote())?;
    if json {
        return print_json(&SyncOutput {
            success: true,
            action: "push",
            remote: ws.remote(),
            results: Vec::new(),
        });
    }
    println!("Pushed notes to {}", ws.remote());
    Ok(())
}

fn run_per_category(
    ws: &Workspace,
    action: &str,
    kinds: Vec<Kind>,
    json: bool,
    step: fn(&Store<'_>, &str, Kind) -> Result<Option<MergeStats>>,
) -> Result<()> {
    let store = ws.store()?;
    let mut results = Vec::with_capacity(kinds.len());
    for kind in kinds {
        let stats = step(&store, ws.remote(), kind)?;
        results.push(CategoryResult {
            category: kind,
            stats,
        });
    }

    if json {
        return print_json(&SyncOutput {
            success: true,
            action,
            remote: ws.remote(),
            results,
        });
    }

    for result in &results {
        match &result.stats {
            None => println!("{:<9} nothing on {}", result.category, ws.remote()),
            Some(stats) if stats.changed() == 0 => {
                println!("{:<9} up to date", result.category);
            }
            Some(stats) => {
                print!(
                    "{:<9} {} added, {} replaced, {} deleted",
                    result.category, stats.added, stats.replaced, stats.tombstoned
                );
                if stats.malformed + stats.distrusted > 0 {
                    print!(", {} skipped", stats.malformed + stats.distrusted);
                }
                println!();
            }
        }
    }
    Ok(())
}

fn status(ws: &Workspace, json: bool) -> Result<()> {
    let store = ws.store()?;
    let status = sync::get_sync_status(&store, ws.remote())?;
    if json {
        return print_json(&status);
    }
    sync::print_status(&status);
    Ok(())
}
