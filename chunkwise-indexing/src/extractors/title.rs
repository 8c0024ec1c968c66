//! Generate a title for a chunk
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chunkwise_core::{Extractor, IngestionContext, SimplePrompt, template::Template};
use derive_builder::Builder;

use super::{best_effort, single_chunk};

/// `Title` asks a model for a title of every chunk and adds it as a chunk.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into, strip_option))]
pub struct Title {
    #[builder(setter(custom))]
    client: Arc<dyn SimplePrompt>,
    #[builder(default = "default_prompt()")]
    prompt_template: Template,
    /// Fail the document instead of skipping when the client fails
    #[builder(default)]
    strict: bool,
}

impl Title {
    pub fn builder() -> TitleBuilder {
        TitleBuilder::default()
    }

    pub fn from_client(client: impl SimplePrompt + 'static) -> TitleBuilder {
        TitleBuilder::default().client(client).to_owned()
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

    async fn entitle(&self, chunk: &str) -> Result<Vec<String>> {
        let prompt = self.prompt_template.to_prompt().with_text(chunk);
        let response = self.client.prompt(prompt).await?;

        Ok(single_chunk(response.trim().trim_matches('"')))
    }
}

fn default_prompt() -> Template {
    include_str!("prompts/title.prompt.md").into()
}

impl TitleBuilder {
    pub fn client(&mut self, client: impl SimplePrompt + 'static) -> &mut Self {
        self.client = Some(Arc::new(client));
        self
    }
}

#[async_trait]
impl Extractor for Title {
    #[tracing::instrument(skip_all, name = "extractors.title")]
    async fn extract(&self, chunk: &str, _context: &IngestionContext) -> Result<Vec<String>> {
        if chunk.trim().is_empty() {
            return Ok(Vec::new());
        }

        best_effort(self.entitle(chunk).await, self.strict, "title")
    }
}
