//! Notes tracker - projects, issues and comments stored in git notes
//!
//! Records live as JSON in three notes attached to the repository's root
//! commit, so they travel with the repository, survive branch switches and
//! can be exchanged between clones by pushing and fetching notes refs.
//!
//! # Architecture
//!
//! - [`model`] - Record types and the note payload codec
//! - [`shortid`] - Six-character human-facing codes
//! - [`git`] - Version-control backend (`git` executable or in-memory)
//! - [`storage`] - Anchor resolution and the document store
//! - [`sync`] - Merging replicas and moving notes refs between remotes
//! - [`config`] - Repository, author, remote and anchor resolution
//! - [`cli`] - Command-line interface using clap
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod model;
pub mod shortid;
pub mod storage;
pub mod sync;

pub use error::{Error, Result};
