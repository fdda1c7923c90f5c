//! Storage backends for the Penance penalty document.
//!
//! # Modules
//!
//! - [`file`] -- YAML file on disk, written atomically
//! - [`memory`] -- In-process document for sandboxes and tests

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;
