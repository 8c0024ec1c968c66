use anyhow::{Context as _, Result};
use tera::Tera;

use crate::prompt::Prompt;

/// A `Template` defines a template for a prompt
///
/// Templates are rendered with [tera], so jinja style syntax is available.
#[derive(Clone, Debug, PartialEq)]
pub enum Template {
    String(String),
    Static(&'static str),
}

impl Template {
    pub fn from_string(template: impl Into<String>) -> Template {
        Template::String(template.into())
    }

    /// Renders the template with a `tera::Context`
    ///
    /// # Errors
    ///
    /// - The template has syntax errors
    /// - Context is missing that is required by the template
    pub fn render(&self, context: &tera::Context) -> Result<String> {
        Tera::one_off(self.as_str(), context, false).context("Failed to render template")
    }

    /// Builds a Prompt from a template with an empty context
    pub fn to_prompt(&self) -> Prompt {
        self.into()
    }

    pub fn as_str(&self) -> &str {
        match self {
            Template::String(template) => template.as_str(),
            Template::Static(template) => template,
        }
    }
}

impl From<&'static str> for Template {
    fn from(template: &'static str) -> Self {
        Template::Static(template)
    }
}

impl From<String> for Template {
    fn from(template: String) -> Self {
        Template::String(template)
    }
}
