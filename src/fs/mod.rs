//! filesystem primitives used by the executor

pub mod copy;
pub mod remove;
pub mod write;

pub use copy::{copy_dir_recursive, copy_file};
pub use remove::{remove_dir_all_if_exists, remove_file_if_exists};
pub use write::{atomic_write, create_directory, fsync_dir};
