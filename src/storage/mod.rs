//! Git notes storage layer.
//!
//! All records live in three notes (one per category) attached to a single
//! anchor commit:
//!
//! - [`anchor`] - Locating the anchor commit
//! - [`note`] - Handle on one category note as read at a point in time
//! - [`store`] - Record CRUD with compare-and-swap writes

pub mod anchor;
pub mod note;
pub mod store;

pub use anchor::resolve_anchor;
pub use note::{Note, NoteState};
pub use store::Store;
