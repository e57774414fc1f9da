//! Storage helpers for stateguard
//!
//! Atomic JSON files and whole-directory copies. Nothing here knows about
//! backups or migrations; those modules build on these primitives.

pub mod file_io;
pub mod tree;

pub use file_io::{read_json_required, write_json_atomic};
pub use tree::{copy_tree, list_files, remove_tree};
