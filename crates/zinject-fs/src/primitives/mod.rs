pub mod atomic_write;
pub mod remove;
pub mod replace_dir;

pub use atomic_write::{AtomicWriteOptions, atomic_write};
pub use remove::remove_dir_all_force;
pub use replace_dir::{ReplaceDirOptions, rename_dir};
