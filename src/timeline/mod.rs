//! Timeline editing.
//!
//! [`TimelineStore`] is the single owner of editable state. It validates
//! every block through the placement rules, keeps the clipboard, and wraps
//! mutations in snapshot-based undo/redo.

mod clipboard;
mod edit;
mod history;
mod store;

pub use clipboard::Clipboard;
pub use edit::{Adjust, BlockEdit};
pub use history::History;
pub use store::{BatchReport, TimelineStore};

pub use crate::placement::Rejection;
