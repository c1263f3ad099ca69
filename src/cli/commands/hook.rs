//! Git hook entry points.
//!
//! Install as `.git/hooks/commit-msg`:
//!
//! ```sh
//! #!/bin/sh
//! exec nt hook commit-msg "$1"
//! ```

use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, warn};

use super::print_json;
use crate::cli::workspace::{find, listing, Workspace};
use crate::cli::HookCommands;
use crate::error::Result;
use crate::model::{Kind, Record};
use crate::shortid::closing_codes;

#[derive(Serialize, Default)]
struct HookOutput {
    closed: Vec<String>,
    already_closed: Vec<String>,
    unknown: Vec<String>,
}

/// Execute a hook command.
///
/// # Errors
///
/// Returns an error if the message file cannot be read or a write fails.
/// Unknown codes are reported, not treated as errors, so a typo never
/// blocks a commit.
pub fn execute(command: &HookCommands, ws: &Workspace, json: bool) -> Result<()> {
    match command {
        HookCommands::CommitMsg { file } => commit_msg(ws, file, json),
    }
}

fn commit_msg(ws: &Workspace, file: &Path, json: bool) -> Result<()> {
    let message = fs::read_to_string(file)?;
    let codes = closing_codes(&strip_comments(&message));
    let mut output = HookOutput::default();

    if !codes.is_empty() {
        let store = ws.store()?;
        let issues = listing(&store, Kind::Issue)?;
        for code in codes {
            let Ok(mut hit) = find(&issues, &code) else {
                warn!(code, "no issue with this short code");
                output.unknown.push(code);
                continue;
            };
            let Record::Issue(issue) = &mut hit.record else {
                continue;
            };
            if issue.is_closed() {
                debug!(code, "issue already closed");
                output.already_closed.push(code);
                continue;
            }
            issue.closed = Some(true);
            hit.record.touch(Utc::now());
            store.update(&hit.record)?;
            output.closed.push(code);
        }
    }

    if json {
        return print_json(&output);
    }
    for code in &output.closed {
        println!("Closed issue {code}");
    }
    Ok(())
}

/// Drop the `#` comment lines git puts into the message template.
fn strip_comments(message: &str) -> String {
    message
        .lines()
        .filter(|line| !line.starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_comments_keeps_hash_references() {
        let message = "Fix crash\n\nFixes #ABC123\n# Please enter the commit message\n#\tmodified: x";
        let stripped = strip_comments(message);
        assert_eq!(stripped, "Fix crash\n\nFixes #ABC123");
        assert_eq!(closing_codes(&stripped), vec!["ABC123"]);
    }
}
