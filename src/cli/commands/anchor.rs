//! Anchor command implementation.

use serde::Serialize;

use super::print_json;
use crate::cli::workspace::Workspace;
use crate::error::Result;

#[derive(Serialize)]
struct AnchorOutput<'a> {
    anchor: &'a str,
    pinned: bool,
}

/// Print the commit the notes are attached to.
///
/// # Errors
///
/// Returns an error if the anchor cannot be resolved (no commits, several
/// roots without a pinned anchor, or an unknown pinned revision).
pub fn execute(ws: &Workspace, pinned: bool, json: bool) -> Result<()> {
    let store = ws.store()?;
    if json {
        return print_json(&AnchorOutput {
            anchor: store.anchor(),
            pinned,
        });
    }
    println!("{}", store.anchor());
    Ok(())
}
