//! Command implementations.

pub mod anchor;
pub mod comment;
pub mod completions;
pub mod hook;
pub mod issue;
pub mod project;
pub mod sync;
pub mod tracked;
pub mod version;

use colored::{ColoredString, Colorize};
use serde::Serialize;

use crate::cli::workspace::Listed;
use crate::error::Result;
use crate::model::Record;

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn state_label(record: &Record) -> ColoredString {
    if record.is_deleted() {
        "deleted".red()
    } else if record.is_closed() {
        "closed".dimmed()
    } else if matches!(record, Record::Comment(_)) {
        "".normal()
    } else {
        "open".green()
    }
}

/// One line per record: code, state, headline, author.
fn print_row(listed: &Listed) {
    let record = &listed.record;
    let headline = record.headline().lines().next().unwrap_or_default();
    println!(
        "{}  {:<7}  {}  {}",
        listed.short_id.cyan(),
        state_label(record),
        headline,
        format!("({})", record.author()).dimmed()
    );
}

fn print_rows(listed: &[Listed], empty: &str) {
    if listed.is_empty() {
        println!("{}", empty.dimmed());
    }
    for l in listed {
        print_row(l);
    }
}

/// Full view of a project or issue.
fn print_detail(listed: &Listed) {
    let record = &listed.record;
    println!(
        "{} {}  [{}]",
        listed.short_id.cyan().bold(),
        record.headline().bold(),
        state_label(record)
    );
    println!("  ID:      {}", record.id());
    println!("  Author:  {}", record.author());
    println!("  Created: {}", record.created_at().to_rfc3339());
    println!("  Updated: {}", record.updated_at().to_rfc3339());
    if let Some(deleted) = record.deleted_at() {
        println!("  Deleted: {}", deleted.to_rfc3339());
    }
    if let Some(parent) = record.parent_id() {
        println!("  Parent:  {parent}");
    }
    let description = match record {
        Record::Project(p) => p.description.as_str(),
        Record::Issue(i) => i.description.as_str(),
        Record::Comment(_) => "",
    };
    if !description.is_empty() {
        println!();
        for line in description.lines() {
            println!("  {line}");
        }
    }
}
