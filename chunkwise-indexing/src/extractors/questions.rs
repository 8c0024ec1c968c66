//! Generate questions a chunk answers
use std::sync::Arc;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use chunkwise_core::{Extractor, IngestionContext, SimplePrompt, template::Template};
use derive_builder::Builder;
use serde::Deserialize;

use super::best_effort;

/// `Questions` asks a model for questions that a chunk answers. Every question becomes a chunk.
///
/// The model is asked to respond with `{"questions": [...]}`. A response that does not parse is
/// skipped, or fails the document when `strict` is set.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into, strip_option))]
pub struct Questions {
    #[builder(setter(custom))]
    client: Arc<dyn SimplePrompt>,
    #[builder(default = "default_prompt()")]
    prompt_template: Template,
    /// Number of questions to ask for
    #[builder(default = "5")]
    count: usize,
    #[builder(default)]
    strict: bool,
}

#[derive(Deserialize)]
struct QuestionsResponse {
    questions: Vec<String>,
}

impl Questions {
    pub fn builder() -> QuestionsBuilder {
        QuestionsBuilder::default()
    }

    pub fn from_client(client: impl SimplePrompt + 'static) -> QuestionsBuilder {
        QuestionsBuilder::default().client(client).to_owned()
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

    async fn questions(&self, chunk: &str) -> Result<Vec<String>> {
        let prompt = self
            .prompt_template
            .to_prompt()
            .with_text(chunk)
            .with_context_value("count", self.count);

        let response = self.client.prompt(prompt).await?;

        parse_questions(&response)
    }
}

/// Parses the questions from a response, ignoring a surrounding markdown code fence
fn parse_questions(response: &str) -> Result<Vec<String>> {
    let json = response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let parsed: QuestionsResponse = serde_json::from_str(json)
        .with_context(|| format!("Malformed questions response: {json}"))?;

    Ok(parsed
        .questions
        .into_iter()
        .map(|question| question.trim().to_string())
        .filter(|question| !question.is_empty())
        .collect())
}

fn default_prompt() -> Template {
    include_str!("prompts/questions.prompt.md").into()
}

impl QuestionsBuilder {
    pub fn client(&mut self, client: impl SimplePrompt + 'static) -> &mut Self {
        self.client = Some(Arc::new(client));
        self
    }
}

#[async_trait]
impl Extractor for Questions {
    #[tracing::instrument(skip_all, name = "extractors.questions")]
    async fn extract(&self, chunk: &str, _context: &IngestionContext) -> Result<Vec<String>> {
        if chunk.trim().is_empty() {
            return Ok(Vec::new());
        }

        best_effort(self.questions(chunk).await, self.strict, "questions")
    }
}

#[cfg(test)]
mod tests {
    use chunkwise_core::MockSimplePrompt;
    use indoc::indoc;
    use test_case::test_case;

    use super::*;

    #[test]
    fn test_template() {
        let prompt = default_prompt()
            .to_prompt()
            .with_text("test")
            .with_context_value("count", 5);

        insta::assert_snapshot!(prompt.render().unwrap(), @r#"
        # Task

        Write exactly 5 questions a user could ask that the text below answers.

        # Requirements

        - Keep the questions short and in simple, everyday language
        - Focus on what is important in the text
        - Only use information from the text
        - Respond with JSON only, an object with a single `questions` key holding an array of strings

        # Example response

        {"questions": ["What is the capital of Assyria?", "How fast does an unladen swallow fly?"]}

        # Text

        ```
        test
        ```
        "#);
    }

    #[test_case(r#"{"questions": ["One?", "Two?"]}"#; "plain json")]
    #[test_case(indoc! {r#"
        ```json
        {"questions": ["One?", " ", "Two? "]}
        ```
    "#}; "fenced json")]
    fn test_parse_questions(response: &str) {
        assert_eq!(parse_questions(response).unwrap(), vec!["One?", "Two?"]);
    }

    #[tokio::test]
    async fn test_questions_become_chunks() {
        let mut client = MockSimplePrompt::new();
        client
            .expect_prompt()
            .withf(|prompt| prompt.render().unwrap().contains("exactly 2 questions"))
            .returning(|_| Ok(r#"{"questions": ["Why?", "How?"]}"#.to_string()));

        let questions = Questions::from_client(client).count(2_usize).build().unwrap();

        let chunks = questions
            .extract("Some text", &IngestionContext::new())
            .await
            .unwrap();

        assert_eq!(chunks, vec!["Why?", "How?"]);
    }

    #[test_log::test(tokio::test)]
    async fn test_malformed_response_is_skipped() {
        let mut client = MockSimplePrompt::new();
        client
            .expect_prompt()
            .returning(|_| Ok("Here are your questions: why?".to_string()));

        let chunks = Questions::new(client)
            .extract("Some text", &IngestionContext::new())
            .await
            .unwrap();

        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_response_fails_when_strict() {
        let mut client = MockSimplePrompt::new();
        client
            .expect_prompt()
            .returning(|_| Ok("not json".to_string()));

        let err = Questions::new(client)
            .with_strict(true)
            .extract("Some text", &IngestionContext::new())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Malformed questions response"));
    }
}
