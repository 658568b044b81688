//! Correction Engine
//!
//! One correction call: render the direction's prompt, append a
//! direction-specific instruction sized to the gap to the band midpoint,
//! call the model, strip code fences, and recount. Every outcome carries
//! the request debug record so failed attempts are still explainable.

use std::time::Duration;
use tracing::{debug, info};

use crate::ai::prompt::{ModelConfig, Placeholder, PromptVars, render};
use crate::ai::provider::{CompletionClient, CompletionContent, CompletionRequest, TokenUsage};
use crate::ai::timeout::with_timeout;
use crate::ai::validation::strip_code_fences;
use crate::content::count_words;
use crate::types::{
    CorrectionRequestDebug, CorrectionResponseDebug, Direction, ForgeError, Result,
};

/// Prompts and model settings for one correction direction
#[derive(Debug, Clone)]
pub struct CorrectionPrompts {
    pub system_slug: String,
    pub system_text: String,
    pub user_slug: String,
    pub user_text: String,
    pub config: ModelConfig,
}

/// Successful correction
#[derive(Debug, Clone)]
pub struct Correction {
    pub content: String,
    pub word_count: u32,
    pub request: CorrectionRequestDebug,
    pub response: CorrectionResponseDebug,
}

/// Failed correction; `request` is absent when the prompt could not be built
#[derive(Debug)]
pub struct CorrectionFailure {
    pub request: Option<CorrectionRequestDebug>,
    pub error: ForgeError,
}

impl CorrectionFailure {
    fn before_request(error: ForgeError) -> Self {
        Self {
            request: None,
            error,
        }
    }
}

/// Word target of a correction: the midpoint of the band
pub fn target_words(min_words: u32, max_words: u32) -> u32 {
    (min_words + max_words) / 2
}

/// Instruction appended to the rendered correction prompt
pub fn direction_instruction(direction: Direction, word_delta: u32) -> String {
    match direction {
        Direction::Expand => format!(
            "Deepen the existing sections by roughly {} words in total. Do not add new top-level sections.",
            word_delta
        ),
        Direction::Shorten => format!(
            "Remove roughly {} words of redundancy. Keep the section structure and all key facts.",
            word_delta
        ),
    }
}

pub struct CorrectionEngine<'a> {
    client: &'a dyn CompletionClient,
    timeout: Duration,
}

impl<'a> CorrectionEngine<'a> {
    pub fn new(client: &'a dyn CompletionClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Ask the model to move `content` toward the band.
    ///
    /// `vars` carries the run-wide placeholders (title, editorial voice);
    /// correction-specific ones are added here.
    #[allow(clippy::too_many_arguments)]
    pub async fn correct(
        &self,
        content: &str,
        current_words: u32,
        min_words: u32,
        max_words: u32,
        direction: Direction,
        prompts: &CorrectionPrompts,
        vars: &PromptVars,
    ) -> std::result::Result<Correction, CorrectionFailure> {
        let target = target_words(min_words, max_words);
        let delta = target.abs_diff(current_words);

        let vars = vars
            .clone()
            .set(Placeholder::PostContent, content)
            .set(Placeholder::CurrentWords, current_words)
            .set(Placeholder::MinWords, min_words)
            .set(Placeholder::MaxWords, max_words)
            .set(Placeholder::TargetWords, target)
            .set(Placeholder::WordDelta, delta);

        let system_prompt =
            render(&prompts.system_text, &vars).map_err(CorrectionFailure::before_request)?;
        let user_prompt = render(&prompts.user_text, &vars)
            .map(|text| {
                format!(
                    "{}\n\n{}",
                    text.trim_end(),
                    direction_instruction(direction, delta)
                )
            })
            .map_err(CorrectionFailure::before_request)?;

        let request = CompletionRequest {
            model: prompts.config.model.clone(),
            system_prompt,
            user_prompt,
            max_tokens: prompts.config.max_tokens,
            temperature: prompts.config.temperature,
            response_format: prompts.config.response_format,
        };

        let request_debug = CorrectionRequestDebug {
            model: request.model.clone(),
            temperature: request.display_temperature(),
            max_tokens: request.max_tokens,
            response_format: request.response_format.to_string(),
            system_prompt_slug: prompts.system_slug.clone(),
            user_prompt_slug: prompts.user_slug.clone(),
            current_words,
            target_words: target,
            min_words,
            max_words,
        };

        info!(
            "Correction ({}): {} words, target {} ({}-{})",
            direction, current_words, target, min_words, max_words
        );

        match self.call(&request).await {
            Ok((content, completion_status, model_used, usage)) => {
                let word_count = count_words(&content);
                debug!("Correction returned {} words", word_count);

                Ok(Correction {
                    content,
                    word_count,
                    request: request_debug,
                    response: CorrectionResponseDebug {
                        status: completion_status,
                        model: model_used,
                        new_word_count: word_count,
                        usage,
                    },
                })
            }
            Err(error) => Err(CorrectionFailure {
                request: Some(request_debug),
                error,
            }),
        }
    }

    async fn call(
        &self,
        request: &CompletionRequest,
    ) -> Result<(String, u16, String, TokenUsage)> {
        let completion =
            with_timeout(self.timeout, self.client.complete(request), "correction").await?;

        let raw = match &completion.content {
            CompletionContent::Text(text) => text.clone(),
            CompletionContent::Json(value) => value
                .get("content_html")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or_else(|| {
                    ForgeError::Parse("Correction JSON has no \"content_html\"".to_string())
                })?,
        };

        let content = strip_code_fences(&raw);
        if content.is_empty() {
            return Err(ForgeError::Parse("Correction returned empty content".to_string()));
        }

        Ok((
            content,
            completion.status,
            completion.model_used,
            completion.usage,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::{Completion, ResponseFormat};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Replies once with a fixed completion and keeps the request it saw
    struct OneShotClient {
        reply: Mutex<Option<Result<Completion>>>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl OneShotClient {
        fn new(reply: Result<Completion>) -> Self {
            Self {
                reply: Mutex::new(Some(reply)),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionClient for OneShotClient {
        async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
            self.seen.lock().unwrap().push(request.clone());
            self.reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(ForgeError::Transport("no reply left".to_string())))
        }

        fn name(&self) -> &str {
            "one-shot"
        }
    }

    fn completion(content: CompletionContent) -> Result<Completion> {
        Ok(Completion {
            status: 200,
            raw_body: String::new(),
            content,
            usage: TokenUsage::new(50, 20),
            model_used: "gpt-5-2025".to_string(),
        })
    }

    fn prompts(model: &str) -> CorrectionPrompts {
        CorrectionPrompts {
            system_slug: "system-correction".to_string(),
            system_text: "You edit posts about {post_title}.".to_string(),
            user_slug: "correction-expand".to_string(),
            user_text: "Rewrite to {target_words} words:\n{post_content}".to_string(),
            config: ModelConfig {
                model: model.to_string(),
                temperature: 0.4,
                max_tokens: 2000,
                response_format: ResponseFormat::JsonObject,
            },
        }
    }

    async fn run(
        client: &OneShotClient,
        prompts: &CorrectionPrompts,
    ) -> std::result::Result<Correction, CorrectionFailure> {
        let vars = PromptVars::new().set(Placeholder::PostTitle, "Heat pumps");
        CorrectionEngine::new(client, Duration::from_secs(5))
            .correct("<p>one two</p>", 2, 3, 5, Direction::Expand, prompts, &vars)
            .await
    }

    #[tokio::test]
    async fn test_json_reply_uses_content_html() {
        let client = OneShotClient::new(completion(CompletionContent::Json(
            json!({"content_html": "<p>a b c</p>", "tags": ["x"]}),
        )));
        let correction = run(&client, &prompts("gpt-5")).await.unwrap();

        assert_eq!(correction.content, "<p>a b c</p>");
        assert_eq!(correction.word_count, 3);
        assert_eq!(correction.response.new_word_count, 3);
        assert_eq!(correction.response.status, 200);
        assert_eq!(correction.request.temperature, "1 (default)");
        assert_eq!(correction.request.target_words, 4);
        assert_eq!(correction.request.response_format, "json_object");

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen[0].system_prompt, "You edit posts about Heat pumps.");
        assert!(seen[0].user_prompt.starts_with("Rewrite to 4 words:\n<p>one two</p>"));
        assert!(seen[0].user_prompt.contains("roughly 2 words"));
    }

    #[tokio::test]
    async fn test_text_reply_is_unfenced() {
        let client = OneShotClient::new(completion(CompletionContent::Text(
            "```html\n<p>a b c d</p>\n```".to_string(),
        )));
        let correction = run(&client, &prompts("gpt-4o")).await.unwrap();

        assert_eq!(correction.content, "<p>a b c d</p>");
        assert_eq!(correction.word_count, 4);
        assert_eq!(correction.request.temperature, "0.4");
    }

    #[tokio::test]
    async fn test_json_reply_without_content_html_fails() {
        let client = OneShotClient::new(completion(CompletionContent::Json(
            json!({"content": "<p>a b c</p>"}),
        )));
        let failure = run(&client, &prompts("gpt-5")).await.unwrap_err();

        match &failure.error {
            ForgeError::Parse(msg) => assert!(msg.contains("content_html")),
            other => panic!("expected parse error, got {:?}", other),
        }
        let request = failure.request.expect("request debug kept on failure");
        assert_eq!(request.user_prompt_slug, "correction-expand");
        assert_eq!(request.current_words, 2);
    }

    #[tokio::test]
    async fn test_empty_reply_fails() {
        for reply in ["", "   \n ", "```html\n```"] {
            let client = OneShotClient::new(completion(CompletionContent::Text(reply.to_string())));
            let failure = run(&client, &prompts("gpt-5")).await.unwrap_err();

            match &failure.error {
                ForgeError::Parse(msg) => assert!(msg.contains("empty content"), "{:?}", reply),
                other => panic!("expected parse error for {:?}, got {:?}", reply, other),
            }
            assert!(failure.request.is_some());
        }
    }

    #[tokio::test]
    async fn test_provider_error_passes_through() {
        let client = OneShotClient::new(Err(ForgeError::api(429, "rate limited")));
        let failure = run(&client, &prompts("gpt-5")).await.unwrap_err();

        assert!(matches!(failure.error, ForgeError::Api { status: 429, .. }));
        assert!(failure.request.is_some());
    }

    #[tokio::test]
    async fn test_unknown_placeholder_fails_before_call() {
        let mut broken = prompts("gpt-5");
        broken.user_text = "Rewrite {post_body}".to_string();
        let client = OneShotClient::new(completion(CompletionContent::Text("<p>x</p>".into())));
        let failure = run(&client, &broken).await.unwrap_err();

        assert!(matches!(failure.error, ForgeError::Template(_)));
        assert!(failure.request.is_none());
        assert!(client.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_target_words_is_midpoint() {
        assert_eq!(target_words(300, 500), 400);
        assert_eq!(target_words(800, 1200), 1000);
        assert_eq!(target_words(1500, 2000), 1750);
    }

    #[test]
    fn test_direction_instruction() {
        let expand = direction_instruction(Direction::Expand, 200);
        assert!(expand.contains("roughly 200 words"));
        assert!(expand.contains("Do not add new top-level sections"));

        let shorten = direction_instruction(Direction::Shorten, 150);
        assert!(shorten.contains("roughly 150 words"));
        assert!(shorten.contains("key facts"));
    }
}
