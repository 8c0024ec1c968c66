//! Embeddings and prompting through the Ollama HTTP API
//!
//! [`Ollama`] talks to a running Ollama server. It implements [`chunkwise_core::EmbeddingModel`]
//! over `/api/embed` and [`chunkwise_core::SimplePrompt`] over `/api/generate`.
//!
//! The server address defaults to the `OLLAMA_HOST` environment variable, falling back to
//! `http://localhost:11434`.
use anyhow::{Context as _, Result};
use derive_builder::Builder;
use serde::{Serialize, de::DeserializeOwned};

mod embed;
mod simple_prompt;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_PROMPT_MODEL: &str = "llama3.2";

/// Client for an Ollama server
///
/// An embedding model has to be configured before embedding, either through the builder or
/// [`Ollama::with_default_embed_model`].
#[derive(Debug, Clone, Builder)]
#[builder(setter(into, strip_option))]
pub struct Ollama {
    /// Address of the server, without a trailing path
    #[builder(default = "default_base_url()")]
    base_url: String,
    /// Model used for embeddings, for example `nomic-embed-text`
    #[builder(default)]
    embed_model: Option<String>,
    /// Model used for prompts
    #[builder(default = "Some(DEFAULT_PROMPT_MODEL.to_string())")]
    prompt_model: Option<String>,
    #[builder(default)]
    client: reqwest::Client,
}

impl Default for Ollama {
    fn default() -> Self {
        Ollama {
            base_url: default_base_url(),
            embed_model: None,
            prompt_model: Some(DEFAULT_PROMPT_MODEL.to_string()),
            client: reqwest::Client::default(),
        }
    }
}

fn default_base_url() -> String {
    std::env::var("OLLAMA_HOST").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
}

impl Ollama {
    pub fn builder() -> OllamaBuilder {
        OllamaBuilder::default()
    }

    pub fn with_default_embed_model(&mut self, model: impl Into<String>) -> &mut Self {
        self.embed_model = Some(model.into());
        self
    }

    pub fn with_default_prompt_model(&mut self, model: impl Into<String>) -> &mut Self {
        self.prompt_model = Some(model.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{path}", self.base_url.trim_end_matches('/'))
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = self.endpoint(path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama responded with {status}: {body}");
        }

        response
            .json()
            .await
            .with_context(|| format!("Unexpected response from {url}"))
    }
}
