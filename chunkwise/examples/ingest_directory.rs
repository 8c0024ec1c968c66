/**
* Ingests the markdown and text files of a directory into an in-memory store, embedding with a
* local Ollama server, then runs a query against the result.
*
* Run with `cargo run --example ingest_directory --features ollama -- <path>`
*/
use std::time::Duration;

use chunkwise::{
    DisposableStore,
    ingestion::{
        IntoIngestion, Transformations,
        extractors::{DocumentMetadata, Title},
        loaders::FileLoader,
        persist::MemoryStore,
        processors::{CleanupWhitespace, MergeShortChunks},
        splitters::ChunkText,
    },
    integrations::ollama::Ollama,
    storage::{AsRetriever, Query, RetrieverConfig, SearchParams},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let path = std::env::args().nth(1).unwrap_or_else(|| ".".to_string());
    let documents = FileLoader::new(&path)
        .with_extensions(&["md", "txt"])
        .load()?;
    tracing::info!(path = %path, documents = documents.len(), "Loaded documents");

    let mut ollama = Ollama::default();
    ollama
        .with_default_embed_model("nomic-embed-text")
        .with_default_prompt_model("llama3.2:latest");

    let transformations = Transformations::new()
        .with_pre_processor(CleanupWhitespace::new())
        .with_splitter(ChunkText::from_chunk_range(10..1024))
        .with_post_processor(MergeShortChunks::new(100))
        .with_extractor(Title::new(ollama.clone()))
        .with_metadata_extractor(DocumentMetadata);

    let store = DisposableStore::acquire(MemoryStore::default()).await?;

    let result = store
        .as_ingestion_pipeline(transformations, ollama.clone())
        .with_concurrency(4)
        .with_document_timeout(Duration::from_secs(120))
        .from(&documents)
        .await;

    for failure in &result.failures {
        tracing::error!(%failure, "Document failed");
    }
    tracing::info!(stored = store.len().await, success = result.success, "Ingestion done");

    let retriever = store.as_retriever(
        RetrieverConfig::new(ollama).with_search_params(SearchParams::with_limit(3)),
    );
    let results = retriever
        .query(vec!["What is this project about?".to_string()])
        .await?;

    for chunk in results.into_iter().flatten() {
        println!("{:.3} {}", chunk.score, chunk.text);
    }

    store.dispose().await
}
