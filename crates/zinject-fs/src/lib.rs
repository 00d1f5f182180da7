//! Staging workspaces and atomic filesystem primitives.
//!
//! Everything that lands in the implementation store goes through a
//! [`Workspace`]: content is assembled in a private directory and published
//! with one `rename`, so readers never observe a partially written tree.

mod error;
pub mod primitives;
mod workspace;

pub use error::{Error, Result};
pub use primitives::{
    AtomicWriteOptions, ReplaceDirOptions, atomic_write, remove_dir_all_force, rename_dir,
};
pub use workspace::Workspace;
