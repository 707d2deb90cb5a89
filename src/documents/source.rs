use crate::documents::{Document, DocumentSource};
use crate::{Result, SnapshotError};
use std::path::{Component, Path, PathBuf};

/// Serves every regular file below a directory as a document
///
/// The id of a document is its path relative to the root, with `/`
/// separators.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collect(&self, dir: &Path, ids: &mut Vec<String>) -> Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let file_type = entry.file_type()?;

            if file_type.is_dir() {
                self.collect(&path, ids)?;
            } else if file_type.is_file() {
                if let Ok(relative) = path.strip_prefix(&self.root) {
                    let id = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy().into_owned())
                        .collect::<Vec<_>>()
                        .join("/");
                    ids.push(id);
                }
            }
        }
        Ok(())
    }

    fn resolve(&self, id: &str) -> Result<PathBuf> {
        let relative = Path::new(id);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));

        if id.is_empty() || escapes {
            return Err(SnapshotError::Document {
                id: id.to_string(),
                message: "id must be a relative path inside the document root".to_string(),
            });
        }

        Ok(self.root.join(relative))
    }
}

impl DocumentSource for DirectorySource {
    fn list_ids(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        self.collect(&self.root, &mut ids)?;
        ids.sort();
        Ok(ids)
    }

    fn render(&self, id: &str) -> Result<Document> {
        let path = self.resolve(id)?;
        let bytes = std::fs::read(&path).map_err(|e| SnapshotError::Document {
            id: id.to_string(),
            message: e.to_string(),
        })?;
        Ok(Document::new(id, String::from_utf8_lossy(&bytes)))
    }
}
