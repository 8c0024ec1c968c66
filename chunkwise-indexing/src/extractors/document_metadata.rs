//! Record where a document came from
use anyhow::Result;
use async_trait::async_trait;
use chunkwise_core::{Document, IngestionContext, MetadataExtractor, ingestion::Metadata};

/// Metadata extractor that adds the file name, path and file type of the document
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentMetadata;

#[async_trait]
impl MetadataExtractor for DocumentMetadata {
    async fn extract_metadata(
        &self,
        _text: &str,
        document: &Document,
        _context: &IngestionContext,
    ) -> Result<Metadata> {
        Ok(Metadata::from([
            ("filename", document.file_name.clone()),
            ("path", document.path.display().to_string()),
            ("filetype", document.file_type.to_string()),
        ]))
    }
}
