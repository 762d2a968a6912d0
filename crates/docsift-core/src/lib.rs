//! Core types, collaborator traits and configuration for docsift.

pub mod config;
pub mod error;
pub mod text;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::*;
pub use traits::{BlobStore, DocumentRepository};
pub use types::*;
