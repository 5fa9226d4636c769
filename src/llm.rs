//! Generation service: the external LLM every record comes from.
//!
//! [`GenerationService`] is the seam the rest of the crate talks to;
//! [`ChatCompletionsClient`] is the production implementation over an
//! OpenAI-compatible chat-completions endpoint.

use crate::config::Config;
use crate::records::ChatRole;
use crate::retry::{is_retryable_error, with_retry_if, RetryConfig};
use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;
use tracing::debug;

/// Temperature for structured (JSON) text calls.
pub const JSON_TEMPERATURE: f32 = 0.4;
/// Temperature for image analysis.
pub const VISION_TEMPERATURE: f32 = 0.2;
/// Temperature for free-form chat replies.
pub const CHAT_TEMPERATURE: f32 = 0.7;
/// Token cap for chat replies.
pub const CHAT_MAX_TOKENS: u32 = 1024;

/// A call that must come back as a single JSON object.
#[derive(Debug, Clone)]
pub struct StructuredRequest {
    /// Short name used in logs and retry messages
    pub name: &'static str,
    pub system: String,
    pub user: String,
    /// Base64 JPEG; when set the vision model is used
    pub image_base64: Option<String>,
    pub temperature: f32,
}

impl StructuredRequest {
    pub fn text(name: &'static str, system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            name,
            system: system.into(),
            user: user.into(),
            image_base64: None,
            temperature: JSON_TEMPERATURE,
        }
    }

    pub fn vision(
        name: &'static str,
        system: impl Into<String>,
        user: impl Into<String>,
        image_base64: impl Into<String>,
    ) -> Self {
        Self {
            name,
            system: system.into(),
            user: user.into(),
            image_base64: Some(image_base64.into()),
            temperature: VISION_TEMPERATURE,
        }
    }

    pub fn is_vision(&self) -> bool {
        self.image_base64.is_some()
    }
}

/// One entry of the plain chat history sent as conversational context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Run a structured call and return the parsed JSON object.
    async fn generate(&self, request: StructuredRequest) -> Result<Value>;

    /// Stateless chat: the whole history is sent with every message.
    async fn reply(&self, system: &str, history: &[ChatTurn], message: &str) -> Result<String>;
}

// ==================== Wire Format ====================

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: Content,
}

impl WireMessage {
    fn text(role: &'static str, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Content::Text(content.into()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Content {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

fn wire_role(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "user",
        ChatRole::Assistant => "assistant",
    }
}

// ==================== Client ====================

pub struct ChatCompletionsClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    text_model: String,
    vision_model: String,
    max_tokens: u32,
    retry: RetryConfig,
}

impl ChatCompletionsClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            api_url: config.llm_api_url.clone(),
            api_key: config.llm_api_key.clone(),
            text_model: config.llm_text_model.clone(),
            vision_model: config.llm_vision_model.clone(),
            max_tokens: config.llm_max_tokens,
            retry: RetryConfig::generation(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn structured_body(&self, request: &StructuredRequest) -> CompletionRequest<'_> {
        let (model, messages) = match &request.image_base64 {
            // Vision models take the instructions inline with the image
            Some(image) => (
                self.vision_model.as_str(),
                vec![WireMessage {
                    role: "user",
                    content: Content::Parts(vec![
                        ContentPart::ImageUrl {
                            image_url: ImageUrl {
                                url: format!("data:image/jpeg;base64,{}", image),
                            },
                        },
                        ContentPart::Text {
                            text: format!("{}\n\n{}", request.system, request.user),
                        },
                    ]),
                }],
            ),
            None => (
                self.text_model.as_str(),
                vec![
                    WireMessage::text("system", request.system.clone()),
                    WireMessage::text("user", request.user.clone()),
                ],
            ),
        };

        CompletionRequest {
            model,
            messages,
            temperature: request.temperature,
            max_tokens: self.max_tokens,
            response_format: Some(ResponseFormat {
                kind: "json_object",
            }),
        }
    }

    fn chat_body(&self, system: &str, history: &[ChatTurn], message: &str) -> CompletionRequest<'_> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(WireMessage::text("system", system));
        messages.extend(
            history
                .iter()
                .map(|turn| WireMessage::text(wire_role(turn.role), turn.text.clone())),
        );
        messages.push(WireMessage::text("user", message));

        CompletionRequest {
            model: &self.text_model,
            messages,
            temperature: CHAT_TEMPERATURE,
            max_tokens: CHAT_MAX_TOKENS,
            response_format: None,
        }
    }

    /// POST a request and return the first choice's text content.
    async fn complete(&self, name: &str, body: &CompletionRequest<'_>) -> Result<String> {
        with_retry_if(
            &self.retry,
            name,
            || async {
                let response = self
                    .http
                    .post(&self.api_url)
                    .header("Authorization", format!("Bearer {}", self.api_key))
                    .header("Content-Type", "application/json")
                    .json(body)
                    .send()
                    .await
                    .context("Failed to send request to generation service")?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
                    anyhow::bail!("Generation service error ({}): {}", status, body);
                }

                let completion: CompletionResponse = response
                    .json()
                    .await
                    .context("Failed to parse generation service response")?;

                Ok(completion
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
                    .unwrap_or_default()
                    .trim()
                    .to_string())
            },
            is_retryable_error,
        )
        .await
    }
}

#[async_trait]
impl GenerationService for ChatCompletionsClient {
    async fn generate(&self, request: StructuredRequest) -> Result<Value> {
        let body = self.structured_body(&request);
        debug!(
            "{}: calling {} (vision: {})",
            request.name,
            body.model,
            request.is_vision()
        );
        let text = self.complete(request.name, &body).await?;
        parse_json_object(&text).with_context(|| format!("{}: invalid JSON output", request.name))
    }

    async fn reply(&self, system: &str, history: &[ChatTurn], message: &str) -> Result<String> {
        let body = self.chat_body(system, history, message);
        self.complete("chat reply", &body).await
    }
}

static FENCE_REGEX: OnceLock<Regex> = OnceLock::new();

/// Remove a surrounding markdown code fence, if any.
pub fn strip_code_fences(text: &str) -> &str {
    let regex = FENCE_REGEX.get_or_init(|| {
        Regex::new(r"(?s)^\s*```[A-Za-z]*\s*\n?(.*?)\s*```\s*$").expect("fence pattern is valid")
    });

    match regex.captures(text).and_then(|cap| cap.get(1)) {
        Some(inner) => inner.as_str(),
        None => text.trim(),
    }
}

fn parse_json_object(text: &str) -> Result<Value> {
    let value: Value =
        serde_json::from_str(strip_code_fences(text)).context("Response is not valid JSON")?;
    anyhow::ensure!(value.is_object(), "Response is not a JSON object");
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::{
        matchers::{body_partial_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    // ==================== Helper Functions ====================

    fn create_test_config(api_url: String) -> Config {
        Config {
            llm_api_key: "test-llm-key".to_string(),
            llm_api_url: api_url,
            llm_text_model: "text-model".to_string(),
            llm_vision_model: "vision-model".to_string(),
            llm_max_tokens: 4096,
            weather_api_url: "http://localhost/unused".to_string(),
            port: 8080,
            api_key: None,
        }
    }

    async fn create_client(server: &MockServer) -> ChatCompletionsClient {
        let config = create_test_config(format!("{}/v1/chat/completions", server.uri()));
        ChatCompletionsClient::new(reqwest::Client::new(), &config)
            .with_retry(RetryConfig::new(2, Duration::from_millis(1)))
    }

    fn completion_response(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "model": "text-model",
            "choices": [
                {
                    "index": 0,
                    "message": {"role": "assistant", "content": content},
                    "finish_reason": "stop"
                }
            ]
        })
    }

    // ==================== Code Fence Tests ====================

    #[test]
    fn test_strip_code_fences_json() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn test_strip_code_fences_bare() {
        assert_eq!(strip_code_fences("```\n{\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn test_strip_code_fences_no_fence() {
        assert_eq!(strip_code_fences("  {\"a\":1}\n"), "{\"a\":1}");
    }

    #[test]
    fn test_parse_json_object_rejects_array() {
        assert!(parse_json_object("[1,2]").is_err());
        assert!(parse_json_object("not json").is_err());
    }

    // ==================== Wire Format Tests ====================

    #[test]
    fn test_vision_body_uses_image_parts() {
        let config = create_test_config("http://localhost".to_string());
        let client = ChatCompletionsClient::new(reqwest::Client::new(), &config);
        let request = StructuredRequest::vision("pest", "Be an agronomist.", "Analyze.", "AAAA");
        let json = serde_json::to_value(client.structured_body(&request)).unwrap();

        assert_eq!(json["model"], "vision-model");
        assert_eq!(json["response_format"]["type"], "json_object");
        let parts = &json["messages"][0]["content"];
        assert_eq!(parts[0]["type"], "image_url");
        assert_eq!(parts[0]["image_url"]["url"], "data:image/jpeg;base64,AAAA");
        assert_eq!(parts[1]["type"], "text");
        assert!(parts[1]["text"].as_str().unwrap().starts_with("Be an agronomist."));
    }

    #[test]
    fn test_chat_body_maps_history_roles() {
        let config = create_test_config("http://localhost".to_string());
        let client = ChatCompletionsClient::new(reqwest::Client::new(), &config);
        let history = vec![
            ChatTurn {
                role: ChatRole::User,
                text: "hi".to_string(),
            },
            ChatTurn {
                role: ChatRole::Assistant,
                text: "hello".to_string(),
            },
        ];
        let json = serde_json::to_value(client.chat_body("sys", &history, "next")).unwrap();

        let roles: Vec<_> = json["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["role"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert_eq!(json["max_tokens"], CHAT_MAX_TOKENS);
        assert!(json.get("response_format").is_none());
    }

    // ==================== HTTP Tests ====================

    #[tokio::test]
    async fn test_generate_success_strips_fences() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-llm-key"))
            .and(body_partial_json(serde_json::json!({"model": "text-model"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion_response("```json\n{\"trends\": []}\n```")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = create_client(&server).await;
        let value = client
            .generate(StructuredRequest::text("trends", "sys", "user"))
            .await
            .unwrap();
        assert_eq!(value, serde_json::json!({"trends": []}));
    }

    #[tokio::test]
    async fn test_generate_client_error_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
            .expect(1)
            .mount(&server)
            .await;

        let client = create_client(&server).await;
        let err = client
            .generate(StructuredRequest::text("forecast", "sys", "user"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("400"));
    }

    #[tokio::test]
    async fn test_generate_server_error_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let client = create_client(&server).await;
        assert!(client
            .generate(StructuredRequest::text("forecast", "sys", "user"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_generate_invalid_json_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(completion_response("not json at all")),
            )
            .mount(&server)
            .await;

        let client = create_client(&server).await;
        let err = client
            .generate(StructuredRequest::text("seeds", "sys", "user"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("seeds"));
    }

    #[tokio::test]
    async fn test_reply_returns_trimmed_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(completion_response("  - Sow early\n")),
            )
            .mount(&server)
            .await;

        let client = create_client(&server).await;
        let text = client.reply("sys", &[], "When to sow?").await.unwrap();
        assert_eq!(text, "- Sow early");
    }

    #[tokio::test]
    async fn test_reply_empty_choices_is_empty_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;

        let client = create_client(&server).await;
        assert_eq!(client.reply("sys", &[], "hi").await.unwrap(), "");
    }
}
