//! Document repository
//!
//! The scanner never owns documents. It asks a [`DocumentSource`] for the
//! ids in scope and for the rendered text of each one.

mod cache;
mod source;

pub use cache::CachedSource;
pub use source::DirectorySource;

use crate::Result;

/// One document as handed to the scanner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub body: String,
}

impl Document {
    pub fn new(id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            body: body.into(),
        }
    }
}

/// Supplies documents by identifier
pub trait DocumentSource: Send + Sync {
    /// Every document currently in scope, whatever its publish state
    fn list_ids(&self) -> Result<Vec<String>>;

    /// Full rendered text of one document
    fn render(&self, id: &str) -> Result<Document>;
}
