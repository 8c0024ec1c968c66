//! Extract keywords from a chunk
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chunkwise_core::{Extractor, IngestionContext, SimplePrompt, template::Template};
use derive_builder::Builder;
use itertools::Itertools as _;

use super::best_effort;

/// `Keywords` asks a model for the most important keywords of every chunk.
///
/// The keywords are added as a single, comma separated chunk. At most `count` keywords are kept,
/// duplicates are dropped.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into, strip_option))]
pub struct Keywords {
    #[builder(setter(custom))]
    client: Arc<dyn SimplePrompt>,
    #[builder(default = "default_prompt()")]
    prompt_template: Template,
    #[builder(default = "5")]
    count: usize,
    #[builder(default)]
    strict: bool,
}

impl Keywords {
    pub fn builder() -> KeywordsBuilder {
        KeywordsBuilder::default()
    }

    pub fn from_client(client: impl SimplePrompt + 'static) -> KeywordsBuilder {
        KeywordsBuilder::default().client(client).to_owned()
    }

    pub fn new(client: impl SimplePrompt + 'static) -> Self {
        Self {
            client: Arc::new(client),
            prompt_template: default_prompt(),
            count: 5,
            strict: false,
        }
    }

    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    async fn keywords(&self, chunk: &str) -> Result<Vec<String>> {
        let prompt = self
            .prompt_template
            .to_prompt()
            .with_text(chunk)
            .with_context_value("count", self.count);

        let response = self.client.prompt(prompt).await?;

        let keywords = response
            .split([',', '\n'])
            .map(|keyword| keyword.trim().trim_matches('"').trim())
            .filter(|keyword| !keyword.is_empty())
            .unique_by(|keyword| keyword.to_lowercase())
            .take(self.count)
            .join(", ");

        if keywords.is_empty() {
            Ok(Vec::new())
        } else {
            Ok(vec![keywords])
        }
    }
}

fn default_prompt() -> Template {
    include_str!("prompts/keywords.prompt.md").into()
}

impl KeywordsBuilder {
    pub fn client(&mut self, client: impl SimplePrompt + 'static) -> &mut Self {
        self.client = Some(Arc::new(client));
        self
    }
}

#[async_trait]
impl Extractor for Keywords {
    #[tracing::instrument(skip_all, name = "extractors.keywords")]
    async fn extract(&self, chunk: &str, _context: &IngestionContext) -> Result<Vec<String>> {
        if chunk.trim().is_empty() {
            return Ok(Vec::new());
        }

        best_effort(self.keywords(chunk).await, self.strict, "keywords")
    }
}
