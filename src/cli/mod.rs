//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::model::Kind;

pub mod commands;
pub mod workspace;

/// Issue tracker stored in git notes
#[derive(Parser, Debug)]
#[command(name = "nt", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Repository to operate on (default: enclosing git work tree)
    #[arg(long, global = true, env = "NT_REPO")]
    pub repo: Option<PathBuf>,

    /// Author for new records (default: git user.name <user.email>)
    #[arg(long, global = true, env = "NT_AUTHOR")]
    pub author: Option<String>,

    /// Remote to sync with
    #[arg(long, global = true, env = "NT_REMOTE")]
    pub remote: Option<String>,

    /// Commit the notes hang off (default: the root commit)
    #[arg(long, global = true, env = "NT_ANCHOR")]
    pub anchor: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print version information
    Version,

    /// Project management
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Issue management
    Issue {
        #[command(subcommand)]
        command: IssueCommands,
    },

    /// Comments on projects and issues
    Comment {
        #[command(subcommand)]
        command: CommentCommands,
    },

    /// Exchange notes with a remote
    Sync {
        #[command(subcommand)]
        command: SyncCommands,
    },

    /// Show the commit the notes are attached to
    Anchor,

    /// Git hook entry points
    Hook {
        #[command(subcommand)]
        command: HookCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ============================================================================
// Project Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Create a new project
    Create(CreateArgs),

    /// List projects
    List(ListArgs),

    /// Show project details and its issues
    Show {
        /// Project ID, ID prefix or short code
        id: String,
    },

    /// Update a project
    Update(UpdateArgs),

    /// Close a project
    Close {
        /// Project ID, ID prefix or short code
        id: String,
    },

    /// Reopen a closed project
    Reopen {
        /// Project ID, ID prefix or short code
        id: String,
    },

    /// Delete a project
    Delete {
        /// Project ID, ID prefix or short code
        id: String,
    },
}

// ============================================================================
// Issue Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum IssueCommands {
    /// Create a new issue
    Create(IssueCreateArgs),

    /// List issues
    List(IssueListArgs),

    /// Show issue details and comments
    Show {
        /// Issue ID, ID prefix or short code
        id: String,
    },

    /// Update an issue
    Update(UpdateArgs),

    /// Close an issue
    Close {
        /// Issue ID, ID prefix or short code
        id: String,
    },

    /// Reopen a closed issue
    Reopen {
        /// Issue ID, ID prefix or short code
        id: String,
    },

    /// Delete an issue
    Delete {
        /// Issue ID, ID prefix or short code
        id: String,
    },
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Title
    pub title: String,

    /// Description
    #[arg(short, long, default_value = "")]
    pub description: String,
}

#[derive(Args, Debug)]
pub struct IssueCreateArgs {
    #[command(flatten)]
    pub fields: CreateArgs,

    /// Project to file the issue under (ID, prefix or short code)
    #[arg(short, long)]
    pub project: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Include closed records
    #[arg(short, long)]
    pub all: bool,

    /// Include deleted records
    #[arg(long)]
    pub deleted: bool,
}

#[derive(Args, Debug)]
pub struct IssueListArgs {
    #[command(flatten)]
    pub filter: ListArgs,

    /// Only issues filed under this project
    #[arg(short, long)]
    pub project: Option<String>,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// ID, ID prefix or short code
    pub id: String,

    /// New title
    #[arg(short, long)]
    pub title: Option<String>,

    /// New description
    #[arg(short, long)]
    pub description: Option<String>,
}

// ============================================================================
// Comment Commands
// ============================================================================

/// Record kinds a comment can be attached to.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CommentTarget {
    #[default]
    Issue,
    Project,
}

impl From<CommentTarget> for Kind {
    fn from(target: CommentTarget) -> Self {
        match target {
            CommentTarget::Issue => Self::Issue,
            CommentTarget::Project => Self::Project,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum CommentCommands {
    /// Comment on an issue or project
    Add {
        /// Issue or project ID, prefix or short code
        target: String,

        /// Comment text
        content: String,

        /// Kind of record being commented on
        #[arg(long, value_enum, default_value_t)]
        on: CommentTarget,
    },

    /// List comments on an issue or project
    List {
        /// Issue or project ID, prefix or short code
        target: String,

        #[arg(long, value_enum, default_value_t)]
        on: CommentTarget,
    },

    /// Delete a comment
    Delete {
        /// Comment ID, prefix or short code
        id: String,
    },
}

// ============================================================================
// Sync Commands
// ============================================================================

/// Category selector for sync commands.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CategoryArg {
    Projects,
    #[default]
    Issues,
    Comments,
}

impl From<CategoryArg> for Kind {
    fn from(category: CategoryArg) -> Self {
        match category {
            CategoryArg::Projects => Self::Project,
            CategoryArg::Issues => Self::Issue,
            CategoryArg::Comments => Self::Comment,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum SyncCommands {
    /// Push all notes to the remote
    Push,

    /// Pull notes from the remote and merge local changes back in
    Pull {
        /// Category to pull
        #[arg(long, value_enum, default_value_t)]
        category: CategoryArg,

        /// Pull every category
        #[arg(long, conflicts_with = "category")]
        all: bool,
    },

    /// Fetch the remote's notes and merge them into local ones
    Merge {
        /// Category to merge
        #[arg(long, value_enum, default_value_t)]
        category: CategoryArg,

        /// Merge every category
        #[arg(long, conflicts_with = "category")]
        all: bool,
    },

    /// Show stored notes per category
    Status,
}

// ============================================================================
// Hook Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum HookCommands {
    /// Close issues referenced by "fixes ABC123" style keywords
    CommitMsg {
        /// Commit message file, as passed by git
        file: PathBuf,
    },
}
