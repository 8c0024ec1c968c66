use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use chunkwise_core::{SimplePrompt, prompt::Prompt, util::debug_long_utf8};

use super::Ollama;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[async_trait]
impl SimplePrompt for Ollama {
    #[tracing::instrument(skip_all, name = "ollama.prompt", err)]
    async fn prompt(&self, prompt: Prompt) -> Result<String> {
        let model = self.prompt_model.as_deref().context("Model not set")?;
        let prompt = prompt.render()?;

        tracing::debug!(
            model,
            prompt = %debug_long_utf8(&prompt, 100),
            "[SimplePrompt] Request to ollama"
        );
        let response: GenerateResponse = self
            .post(
                "generate",
                &GenerateRequest {
                    model,
                    prompt: &prompt,
                    stream: false,
                },
            )
            .await?;
        tracing::debug!(
            response = %debug_long_utf8(&response.response, 100),
            "[SimplePrompt] Response ollama"
        );

        Ok(response.response)
    }
}
