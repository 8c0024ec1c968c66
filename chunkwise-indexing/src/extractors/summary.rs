//! Summarize a chunk
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chunkwise_core::{Extractor, IngestionContext, SimplePrompt, template::Template};
use derive_builder::Builder;

use super::{best_effort, single_chunk};

/// `Summary` asks a model for a short summary of every chunk and adds it as a chunk.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into, strip_option))]
pub struct Summary {
    #[builder(setter(custom))]
    client: Arc<dyn SimplePrompt>,
    #[builder(default = "default_prompt()")]
    prompt_template: Template,
    /// Fail the document instead of skipping when the client fails
    #[builder(default)]
    strict: bool,
}

impl Summary {
    pub fn builder() -> SummaryBuilder {
        SummaryBuilder::default()
    }

    pub fn from_client(client: impl SimplePrompt + 'static) -> SummaryBuilder {
        SummaryBuilder::default().client(client).to_owned()
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

    async fn summarize(&self, chunk: &str) -> Result<Vec<String>> {
        let prompt = self.prompt_template.to_prompt().with_text(chunk);
        let response = self.client.prompt(prompt).await?;

        Ok(single_chunk(&response))
    }
}

fn default_prompt() -> Template {
    include_str!("prompts/summary.prompt.md").into()
}

impl SummaryBuilder {
    pub fn client(&mut self, client: impl SimplePrompt + 'static) -> &mut Self {
        self.client = Some(Arc::new(client));
        self
    }
}

#[async_trait]
impl Extractor for Summary {
    #[tracing::instrument(skip_all, name = "extractors.summary")]
    async fn extract(&self, chunk: &str, _context: &IngestionContext) -> Result<Vec<String>> {
        if chunk.trim().is_empty() {
            return Ok(Vec::new());
        }

        best_effort(self.summarize(chunk).await, self.strict, "summary")
    }
}
