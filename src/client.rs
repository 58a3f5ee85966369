//! The completion client: credential resolution, message assembly, and the
//! single HTTP round trip to the OpenAI chat-completions endpoint.
//!
//! ## Request Layout
//!
//! Each call sends (in order):
//! 1. **System message** — the fixed conversion instruction from
//!    [`crate::prompts::SYSTEM_PROMPT`]
//! 2. **Format-continuity message** *(maintain-format only)* — the previous
//!    page's Markdown as context so the model keeps numbering, style, and
//!    running text consistent
//! 3. **User message** — the page PNG as a base64 data URI, with no text part
//!
//! ## Concurrency
//!
//! A [`CompletionClient`] holds only read-only state (credential, base URL,
//! connection pool), so one instance can serve concurrent `completion` calls
//! without locking. Each call is a single attempt: no retry, no timeout
//! beyond the transport defaults. Callers sequencing pages for
//! maintain-format mode own the ordering; the client keeps no session state
//! between calls.

use crate::encode::encode_image_to_base64;
use crate::error::CompletionError;
use crate::message::ChatMessage;
use crate::params::LlmParams;
use crate::prompts::{maintain_format_context, SYSTEM_PROMPT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Model used when the caller does not name one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Environment variable consulted when no explicit API key is supplied.
pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Result of one successful completion call.
///
/// Token counts come straight from the provider's `usage` block and exist
/// for accounting only; they play no role in control flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResponse {
    /// The Markdown the model produced for the page.
    pub content: String,
    /// Prompt tokens billed for the request.
    pub input_tokens: u32,
    /// Completion tokens billed for the request.
    pub output_tokens: u32,
}

// ── Wire types ───────────────────────────────────────────────────────────

/// Outgoing request body: `messages` and `model` only.
///
/// The validated sampling parameters are deliberately absent — see
/// `completion` below.
#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ChatMessage],
    model: &'a str,
}

/// Incoming response body. Every field is optional so that a parse failure
/// is reported as the specific missing field rather than a serde error for
/// the whole document.
#[derive(Deserialize)]
struct ChatResponseBody {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
}

// ── Client ───────────────────────────────────────────────────────────────

/// Async client for one OpenAI-compatible chat-completions endpoint.
///
/// Constructed once, then [`completion`](Self::completion) may be called any
/// number of times (concurrently if desired).
///
/// # Example
/// ```rust,no_run
/// use page2md::CompletionClient;
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), page2md::CompletionError> {
/// let client = CompletionClient::new(None)?; // key from OPENAI_API_KEY
/// let page = client
///     .completion(Path::new("page-1.png"), false, "", None, None)
///     .await?;
/// println!("{}", page.content);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CompletionClient {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl CompletionClient {
    /// Create a client, resolving the credential immediately.
    ///
    /// An explicit non-empty `api_key` wins; otherwise the
    /// [`API_KEY_ENV_VAR`] environment variable is consulted.
    ///
    /// # Errors
    /// [`CompletionError::MissingApiKey`] when neither source yields a
    /// non-empty key. No network call is attempted in that case.
    pub fn new(api_key: Option<String>) -> Result<Self, CompletionError> {
        let api_key = resolve_api_key(api_key, std::env::var(API_KEY_ENV_VAR).ok())?;
        Ok(Self {
            api_key,
            base_url: OPENAI_BASE_URL.to_string(),
            http: reqwest::Client::new(),
        })
    }

    /// Point the client at a different chat-completions base URL.
    ///
    /// Used for OpenAI-compatible relays and for tests against a local mock
    /// server. A trailing slash is stripped.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Convert one page image to Markdown.
    ///
    /// # Arguments
    /// * `image_path` — rendered page image (PNG) on disk
    /// * `maintain_format` — pass the prior page's Markdown as context
    /// * `prior_page` — previous page's Markdown; only used when
    ///   `maintain_format` is true and the string is non-empty
    /// * `model` — model identifier, defaults to [`DEFAULT_MODEL`]
    /// * `llm_params` — sampling-parameter overrides, validated against
    ///   [`crate::params::ALLOWED_PARAM_KEYS`]
    ///
    /// The validated parameter set is *not* forwarded in the request body;
    /// only `messages` and `model` go on the wire. Validation still runs so
    /// that a typo in an override name fails loudly instead of silently
    /// doing nothing.
    ///
    /// # Errors
    /// Validation and image-read failures propagate unwrapped
    /// ([`CompletionError::InvalidParams`], [`CompletionError::ImageRead`]);
    /// any failure from the HTTP phase is wrapped in
    /// [`CompletionError::RequestFailed`] with the cause as `source`.
    pub async fn completion(
        &self,
        image_path: &Path,
        maintain_format: bool,
        prior_page: &str,
        model: Option<&str>,
        llm_params: Option<&BTreeMap<String, f64>>,
    ) -> Result<CompletionResponse, CompletionError> {
        let no_overrides = BTreeMap::new();
        let params = LlmParams::validate(llm_params.unwrap_or(&no_overrides))?;
        debug!(?params, "validated sampling params (not sent on the wire)");

        let messages = self
            .prepare_messages(image_path, maintain_format, prior_page)
            .await?;

        self.request_completion(&messages, model.unwrap_or(DEFAULT_MODEL))
            .await
            .map_err(|e| CompletionError::RequestFailed(Box::new(e)))
    }

    /// Build the ordered message list for one page.
    ///
    /// Suspends once, to read and base64-encode the page image.
    pub async fn prepare_messages(
        &self,
        image_path: &Path,
        maintain_format: bool,
        prior_page: &str,
    ) -> Result<Vec<ChatMessage>, CompletionError> {
        let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT)];

        // Prior-page context helps the model keep the same format across pages.
        if maintain_format && !prior_page.is_empty() {
            messages.push(ChatMessage::system(maintain_format_context(prior_page)));
        }

        let base64_image = encode_image_to_base64(image_path).await?;
        messages.push(ChatMessage::user_image(&base64_image));

        Ok(messages)
    }

    /// Issue the single POST to `{base_url}/chat/completions` and map the
    /// response.
    ///
    /// # Errors
    /// * [`CompletionError::Transport`] — the request never completed
    /// * [`CompletionError::ApiStatus`] — non-200 status, body attached
    /// * [`CompletionError::MalformedResponse`] — 200 but a required field
    ///   (`choices[0].message.content`, `usage.prompt_tokens`,
    ///   `usage.completion_tokens`) is absent
    pub async fn request_completion(
        &self,
        messages: &[ChatMessage],
        model: &str,
    ) -> Result<CompletionResponse, CompletionError> {
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(&ChatRequest { messages, model })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status != reqwest::StatusCode::OK {
            return Err(CompletionError::ApiStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed = parse_completion_body(&body)?;
        debug!(
            "completion ok: {} input tokens, {} output tokens",
            parsed.input_tokens, parsed.output_tokens
        );
        Ok(parsed)
    }
}

/// Extract content and token counts from a 200 response body.
///
/// Each expected field is checked individually so the error names exactly
/// what the provider failed to send.
fn parse_completion_body(body: &str) -> Result<CompletionResponse, CompletionError> {
    let parsed: ChatResponseBody =
        serde_json::from_str(body).map_err(|e| CompletionError::MalformedResponse {
            detail: format!("response body is not valid JSON: {e}"),
        })?;

    let missing = |field: &str| CompletionError::MalformedResponse {
        detail: format!("missing field '{field}'"),
    };

    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .ok_or_else(|| missing("choices[0].message.content"))?;

    let usage = parsed.usage.ok_or_else(|| missing("usage"))?;
    let input_tokens = usage
        .prompt_tokens
        .ok_or_else(|| missing("usage.prompt_tokens"))?;
    let output_tokens = usage
        .completion_tokens
        .ok_or_else(|| missing("usage.completion_tokens"))?;

    Ok(CompletionResponse {
        content,
        input_tokens,
        output_tokens,
    })
}

/// Resolve the API key from the explicit argument or the environment value.
///
/// Blank strings count as absent in both positions, so `Some("")` falls
/// through to the environment rather than producing an unusable client.
fn resolve_api_key(
    explicit: Option<String>,
    env_value: Option<String>,
) -> Result<String, CompletionError> {
    explicit
        .filter(|k| !k.trim().is_empty())
        .or(env_value.filter(|k| !k.trim().is_empty()))
        .ok_or(CompletionError::MissingApiKey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{ContentPart, MessageContent, Role};
    use std::io::Write as _;

    // ── Credential resolution ────────────────────────────────────────────

    #[test]
    fn explicit_key_wins_over_env() {
        let key = resolve_api_key(Some("mykey".into()), Some("envkey".into())).unwrap();
        assert_eq!(key, "mykey");
    }

    #[test]
    fn env_key_used_when_no_explicit() {
        let key = resolve_api_key(None, Some("envkey".into())).unwrap();
        assert_eq!(key, "envkey");
    }

    #[test]
    fn blank_explicit_falls_through_to_env() {
        let key = resolve_api_key(Some("  ".into()), Some("envkey".into())).unwrap();
        assert_eq!(key, "envkey");
    }

    #[test]
    fn no_key_anywhere_is_missing_api_key() {
        let err = resolve_api_key(None, None).unwrap_err();
        assert!(matches!(err, CompletionError::MissingApiKey));
    }

    #[test]
    fn blank_env_value_is_missing_api_key() {
        let err = resolve_api_key(None, Some(String::new())).unwrap_err();
        assert!(matches!(err, CompletionError::MissingApiKey));
    }

    // ── Message preparation ──────────────────────────────────────────────

    fn test_client() -> CompletionClient {
        CompletionClient::new(Some("test-key".into())).unwrap()
    }

    fn fake_page_image() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"\x89PNG not really a png").unwrap();
        file
    }

    #[tokio::test]
    async fn maintain_format_inserts_context_message() {
        let image = fake_page_image();
        let messages = test_client()
            .prepare_messages(image.path(), true, "Hello")
            .await
            .unwrap();

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0], ChatMessage::system(SYSTEM_PROMPT));
        match &messages[1].content {
            MessageContent::Text(text) => assert!(text.contains("Hello"), "got: {text}"),
            other => panic!("expected text content, got {other:?}"),
        }
        assert_eq!(messages[2].role, Role::User);
    }

    #[tokio::test]
    async fn without_maintain_format_only_two_messages() {
        let image = fake_page_image();
        let messages = test_client()
            .prepare_messages(image.path(), false, "")
            .await
            .unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
    }

    #[tokio::test]
    async fn maintain_format_with_empty_prior_page_adds_nothing() {
        let image = fake_page_image();
        let messages = test_client()
            .prepare_messages(image.path(), true, "")
            .await
            .unwrap();
        assert_eq!(messages.len(), 2);
    }

    #[tokio::test]
    async fn user_message_is_png_data_uri() {
        let image = fake_page_image();
        let messages = test_client()
            .prepare_messages(image.path(), false, "")
            .await
            .unwrap();

        let MessageContent::Parts(parts) = &messages[1].content else {
            panic!("user message must be multi-part");
        };
        assert_eq!(parts.len(), 1);
        let ContentPart::ImageUrl { image_url } = &parts[0];
        assert!(
            image_url.url.starts_with("data:image/png;base64,"),
            "got: {}",
            &image_url.url[..40.min(image_url.url.len())]
        );
    }

    #[tokio::test]
    async fn unreadable_image_propagates_unwrapped() {
        let err = test_client()
            .prepare_messages(Path::new("/nonexistent/page.png"), false, "")
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::ImageRead { .. }));
    }

    // ── Wire shapes ──────────────────────────────────────────────────────

    #[test]
    fn request_body_has_exactly_messages_and_model() {
        let messages = vec![ChatMessage::system("hi")];
        let value = serde_json::to_value(ChatRequest {
            messages: &messages,
            model: DEFAULT_MODEL,
        })
        .unwrap();

        let obj = value.as_object().unwrap();
        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["messages", "model"]);
        assert_eq!(obj["model"], "gpt-4o-mini");
    }

    #[test]
    fn parse_happy_path() {
        let body = r##"{"choices":[{"message":{"content":"# Title"}}],"usage":{"prompt_tokens":10,"completion_tokens":5}}"##;
        let parsed = parse_completion_body(body).unwrap();
        assert_eq!(parsed.content, "# Title");
        assert_eq!(parsed.input_tokens, 10);
        assert_eq!(parsed.output_tokens, 5);
    }

    #[test]
    fn parse_missing_choices_names_the_field() {
        let err = parse_completion_body(r#"{"usage":{"prompt_tokens":1,"completion_tokens":1}}"#)
            .unwrap_err();
        match err {
            CompletionError::MalformedResponse { detail } => {
                assert!(detail.contains("choices[0].message.content"), "got: {detail}")
            }
            other => panic!("expected MalformedResponse, got {other:?}"),
        }
    }

    #[test]
    fn parse_missing_usage_names_the_field() {
        let err = parse_completion_body(r#"{"choices":[{"message":{"content":"x"}}]}"#)
            .unwrap_err();
        match err {
            CompletionError::MalformedResponse { detail } => {
                assert!(detail.contains("usage"), "got: {detail}")
            }
            other => panic!("expected MalformedResponse, got {other:?}"),
        }
    }

    #[test]
    fn parse_non_json_body() {
        let err = parse_completion_body("<html>gateway error</html>").unwrap_err();
        assert!(matches!(err, CompletionError::MalformedResponse { .. }));
    }
}
