//! Load documents from a directory
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use chunkwise_core::{Document, FileType};

/// Reads every file below a path into a [`Document`], optionally filtered by extension
///
/// Respects `.gitignore` and hidden files the way [`ignore::Walk`] does.
///
/// # Example
///
/// ```no_run
/// # use chunkwise_indexing::loaders::FileLoader;
/// let documents = FileLoader::new("./docs").with_extensions(&["md", "txt"]).load().unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct FileLoader {
    pub(crate) path: PathBuf,
    pub(crate) extensions: Option<Vec<String>>,
}

impl FileLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            extensions: None,
        }
    }

    /// Only load files with these extensions, given without the leading dot
    #[must_use]
    pub fn with_extensions(mut self, extensions: &[impl AsRef<str>]) -> Self {
        self.extensions = Some(
            self.extensions
                .unwrap_or_default()
                .into_iter()
                .chain(extensions.iter().map(|ext| ext.as_ref().to_string()))
                .collect(),
        );
        self
    }

    /// Reads all matching files
    ///
    /// Files are read in the order they are walked. The file type is inferred from the extension,
    /// defaulting to plain text.
    ///
    /// # Errors
    ///
    /// Errors if a matching file cannot be read as utf-8
    pub fn load(&self) -> Result<Vec<Document>> {
        ignore::Walk::new(&self.path)
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .filter(|entry| self.file_has_extension(entry.path()))
            .map(|entry| {
                tracing::debug!("Reading file: {:?}", entry);
                let path = entry.into_path();
                let content = fs_err::read_to_string(&path).context("Failed to read file")?;

                Document::builder()
                    .file_type(FileType::from_path(&path).unwrap_or_default())
                    .file_name(
                        path.file_name()
                            .map(|name| name.to_string_lossy().to_string())
                            .unwrap_or_default(),
                    )
                    .path(path)
                    .content(content)
                    .build()
            })
            .collect()
    }

    // Without configured extensions every file matches, files without an extension never do
    fn file_has_extension(&self, path: &Path) -> bool {
        self.extensions.as_ref().is_none_or(|exts| {
            let Some(ext) = path.extension() else {
                return false;
            };
            exts.iter().any(|e| e == ext.to_string_lossy().as_ref())
        })
    }
}
