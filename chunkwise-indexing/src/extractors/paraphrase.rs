//! Rephrase a chunk
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chunkwise_core::{Extractor, IngestionContext, SimplePrompt, template::Template};
use derive_builder::Builder;

use super::{best_effort, single_chunk};

/// `Paraphrase` asks a model to rephrase every chunk in simple language and adds the result as a
/// chunk.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into, strip_option))]
pub struct Paraphrase {
    #[builder(setter(custom))]
    client: Arc<dyn SimplePrompt>,
    #[builder(default = "default_prompt()")]
    prompt_template: Template,
    #[builder(default)]
    strict: bool,
}

impl Paraphrase {
    pub fn builder() -> ParaphraseBuilder {
        ParaphraseBuilder::default()
    }

    pub fn from_client(client: impl SimplePrompt + 'static) -> ParaphraseBuilder {
        ParaphraseBuilder::default().client(client).to_owned()
    }

    pub fn new(client: impl SimplePrompt + 'static) -> Self {
        Self {
            client: Arc::new(client),
            prompt_template: default_prompt(),
            strict: false,
        }
    }

    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    async fn rephrase(&self, chunk: &str) -> Result<Vec<String>> {
        let prompt = self.prompt_template.to_prompt().with_text(chunk);
        let response = self.client.prompt(prompt).await?;

        Ok(single_chunk(
            &response.split_whitespace().collect::<Vec<_>>().join(" "),
        ))
    }
}

fn default_prompt() -> Template {
    include_str!("prompts/paraphrase.prompt.md").into()
}

impl ParaphraseBuilder {
    pub fn client(&mut self, client: impl SimplePrompt + 'static) -> &mut Self {
        self.client = Some(Arc::new(client));
        self
    }
}

#[async_trait]
impl Extractor for Paraphrase {
    #[tracing::instrument(skip_all, name = "extractors.paraphrase")]
    async fn extract(&self, chunk: &str, _context: &IngestionContext) -> Result<Vec<String>> {
        if chunk.trim().is_empty() {
            return Ok(Vec::new());
        }

        best_effort(self.rephrase(chunk).await, self.strict, "paraphrase")
    }
}
