use anyhow::{Context as _, Result, ensure};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use chunkwise_core::{EmbeddingModel, Embeddings};

use super::Ollama;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Embeddings,
}

#[async_trait]
impl EmbeddingModel for Ollama {
    #[tracing::instrument(skip_all, name = "ollama.embed", err)]
    async fn embed(&self, input: Vec<String>) -> Result<Embeddings> {
        let model = self.embed_model.as_deref().context("Model not set")?;

        if input.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(num_chunks = input.len(), model, "[Embed] Request to ollama");
        let response: EmbedResponse = self
            .post(
                "embed",
                &EmbedRequest {
                    model,
                    input: &input,
                },
            )
            .await?;

        let num_embeddings = response.embeddings.len();
        tracing::debug!(num_embeddings, "[Embed] Response ollama");

        ensure!(
            num_embeddings == input.len(),
            "Ollama returned {num_embeddings} embeddings for {} inputs",
            input.len()
        );

        Ok(response.embeddings)
    }
}
