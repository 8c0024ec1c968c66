//! Documents are the input of an ingestion.
//!
//! A document is never mutated by the pipeline. Its identity is optional and assigned lazily when
//! the node for it is assembled.
use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of file a document was read from
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FileType {
    #[default]
    Txt,
    #[serde(rename = "md")]
    #[strum(to_string = "md", serialize = "markdown")]
    Md,
}

impl FileType {
    /// Infers the file type from the extension of a path
    ///
    /// Returns `None` for unknown or missing extensions.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let extension = path.as_ref().extension()?.to_string_lossy().to_lowercase();
        extension.parse().ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Builder)]
#[builder(setter(into, strip_option), build_fn(error = "anyhow::Error"))]
pub struct Document {
    #[builder(default)]
    pub id: Option<Uuid>,
    #[builder(default)]
    pub file_type: FileType,
    #[builder(default)]
    pub file_name: String,
    #[builder(default)]
    pub path: PathBuf,
    pub content: String,
}

impl Document {
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::default()
    }

    /// Creates a document with only content, all other fields default
    pub fn new(content: impl Into<String>) -> Self {
        Document {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Name used to refer to the document in logs and errors
    pub fn display_name(&self) -> String {
        if !self.file_name.is_empty() {
            return self.file_name.clone();
        }
        if !self.path.as_os_str().is_empty() {
            return self.path.display().to_string();
        }
        self.id.map(|id| id.to_string()).unwrap_or_default()
    }
}

impl From<&str> for Document {
    fn from(value: &str) -> Self {
        Document::new(value)
    }
}

impl From<String> for Document {
    fn from(value: String) -> Self {
        Document::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("notes.md", Some(FileType::Md); "markdown")]
    #[test_case("notes.MARKDOWN", Some(FileType::Md); "markdown long uppercase")]
    #[test_case("notes.txt", Some(FileType::Txt); "text")]
    #[test_case("notes.rs", None; "unknown")]
    #[test_case("notes", None; "no extension")]
    fn test_file_type_from_path(path: &str, expected: Option<FileType>) {
        assert_eq!(FileType::from_path(path), expected);
    }

    #[test]
    fn test_file_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&FileType::Md).unwrap(), "\"md\"");
        assert_eq!(serde_json::to_string(&FileType::Txt).unwrap(), "\"txt\"");
        assert_eq!(FileType::Md.to_string(), "md");
    }

    #[test]
    fn test_builder_defaults() {
        let document = Document::builder()
            .content("hello")
            .file_name("hello.txt")
            .build()
            .unwrap();

        assert_eq!(document.id, None);
        assert_eq!(document.file_type, FileType::Txt);
        assert_eq!(document.display_name(), "hello.txt");
    }

    #[test]
    fn test_builder_requires_content() {
        assert!(Document::builder().file_name("empty").build().is_err());
    }
}
