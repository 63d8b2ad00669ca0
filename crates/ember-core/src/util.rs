//! Common utility functions.

pub mod data;
pub mod fs;

// Re-export commonly used items
pub use data::{
    flatten, flatten_with_branches, insert_path, load_document, load_document_file, load_yaml,
};
pub use fs::{expand_path, slurp};
