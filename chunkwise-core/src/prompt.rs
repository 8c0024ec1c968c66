//! Prompts templating
//!
//! Prompts use [tera] under the hood. Conceptually, a [Prompt] is something you send to i.e.
//! [`SimplePrompt`][crate::SimplePrompt]. A prompt can have added context for substitution and
//! other templating features.
//!
//! Model backed extractors come with default prompts, and they can be replaced as needed.
//!
//! # Example
//!
//! ```
//! # use chunkwise_core::template::Template;
//! let template = Template::from("hello {{world}}");
//! let prompt = template.to_prompt().with_context_value("world", "chunkwise");
//!
//! assert_eq!(prompt.render().unwrap(), "hello chunkwise");
//! ```
use anyhow::Result;

use crate::template::Template;

/// A Prompt can be used with large language models to prompt.
#[derive(Clone, Debug)]
pub struct Prompt {
    template: Template,
    context: Option<tera::Context>,
}

impl Prompt {
    /// Adds the text of a chunk to the context of the Prompt as `text`
    #[must_use]
    pub fn with_text(self, text: &str) -> Self {
        self.with_context_value("text", text)
    }

    /// Adds a key-value pair to the context of the Prompt
    #[must_use]
    pub fn with_context_value(mut self, key: &str, value: impl Into<tera::Value>) -> Self {
        let context = self.context.get_or_insert_with(tera::Context::default);
        context.insert(key, &value.into());
        self
    }

    /// Renders a prompt
    ///
    /// If no context is provided, the prompt will be rendered as is.
    ///
    /// # Errors
    ///
    /// See `Template::render`
    pub fn render(&self) -> Result<String> {
        match &self.context {
            Some(context) => self.template.render(context),
            None => Ok(self.template.as_str().to_string()),
        }
    }
}

impl From<&'static str> for Prompt {
    fn from(prompt: &'static str) -> Self {
        Prompt {
            template: Template::Static(prompt),
            context: None,
        }
    }
}

impl From<String> for Prompt {
    fn from(prompt: String) -> Self {
        Prompt {
            template: Template::String(prompt),
            context: None,
        }
    }
}

impl From<&Template> for Prompt {
    fn from(template: &Template) -> Self {
        Prompt {
            template: template.clone(),
            context: None,
        }
    }
}
