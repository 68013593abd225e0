//! Source documents.
//!
//! A [`DocumentSource`] turns a source-file reference into the raw document
//! tree of that file. [`DirectorySource`] reads `.docx` packages from a
//! local directory.

use std::fs::File;
use std::path::{Component, Path, PathBuf};

use docunit_ooxml::{DocxPackage, RawDocument};

use crate::error::SourceError;

/// Loads raw document trees by source-file reference.
pub trait DocumentSource: Send + Sync {
    /// Load and parse the package behind `source_file`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the file does not exist or is not a readable package.
    fn load(&self, source_file: &str) -> Result<RawDocument, SourceError>;
}

/// Reads source files from a directory.
///
/// Source-file references are relative paths inside the directory; absolute
/// paths and `..` components are rejected.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, source_file: &str) -> Result<PathBuf, SourceError> {
        let relative = Path::new(source_file);
        let is_plain = !source_file.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !is_plain {
            return Err(SourceError::InvalidName(source_file.to_owned()));
        }
        Ok(self.root.join(relative))
    }
}

impl DocumentSource for DirectorySource {
    fn load(&self, source_file: &str) -> Result<RawDocument, SourceError> {
        let path = self.resolve(source_file)?;
        let file = File::open(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SourceError::NotFound(source_file.to_owned()),
            _ => SourceError::Io {
                path: path.clone(),
                source: e,
            },
        })?;

        let document = DocxPackage::open(file)?.read()?;
        tracing::debug!(
            path = %path.display(),
            blocks = document.body.len(),
            images = document.images.len(),
            "Loaded source document"
        );
        Ok(document)
    }
}
