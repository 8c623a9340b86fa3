use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ClassificationError;
use crate::config::{Credentials, DEFAULT_COMPLETION_URL, DEFAULT_MODEL};

/// Text-completion backend used by the retry controller.
pub trait LlmClient: Send + Sync {
    /// Send one prompt and return the model's raw reply text.
    fn generate(&self, prompt: &str) -> Result<String, ClassificationError>;
}

/// Connection and sampling settings for the foundation-models API.
#[derive(Debug, Clone)]
pub struct YandexGptConfig {
    pub endpoint: String,
    pub credentials: Credentials,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl YandexGptConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            endpoint: DEFAULT_COMPLETION_URL.to_string(),
            credentials,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.3,
            max_tokens: 4000,
            timeout_secs: 60,
        }
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    /// `gpt://{folder}/{model}`
    pub fn model_uri(&self) -> String {
        format!("gpt://{}/{}", self.credentials.folder_id, self.model)
    }
}

/// Blocking HTTP client for the foundation-models completion endpoint.
pub struct YandexGptClient {
    config: YandexGptConfig,
    client: reqwest::blocking::Client,
}

impl YandexGptClient {
    pub fn new(config: YandexGptConfig) -> Result<Self, ClassificationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClassificationError::HttpClient(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn request_body<'a>(&self, model_uri: &'a str, prompt: &'a str) -> CompletionRequest<'a> {
        CompletionRequest {
            model_uri,
            completion_options: CompletionOptions {
                stream: false,
                temperature: self.config.temperature,
                max_tokens: self.config.max_tokens,
            },
            messages: vec![CompletionMessage {
                role: "user",
                text: prompt,
            }],
        }
    }
}

/// Request body for `/foundationModels/v1/completion`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionRequest<'a> {
    model_uri: &'a str,
    completion_options: CompletionOptions,
    messages: Vec<CompletionMessage<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionOptions {
    stream: bool,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct CompletionMessage<'a> {
    role: &'a str,
    text: &'a str,
}

/// Response body from `/foundationModels/v1/completion`
#[derive(Deserialize)]
struct CompletionResponse {
    result: CompletionResult,
}

#[derive(Deserialize)]
struct CompletionResult {
    alternatives: Vec<CompletionAlternative>,
}

#[derive(Deserialize)]
struct CompletionAlternative {
    message: AlternativeMessage,
}

#[derive(Deserialize)]
struct AlternativeMessage {
    text: String,
}

/// First alternative's text, or a shape error.
fn extract_reply_text(body: &str) -> Result<String, ClassificationError> {
    let parsed: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| ClassificationError::ResponseShape(e.to_string()))?;

    parsed
        .result
        .alternatives
        .into_iter()
        .next()
        .map(|alt| alt.message.text)
        .ok_or_else(|| ClassificationError::ResponseShape("no alternatives in result".into()))
}

impl LlmClient for YandexGptClient {
    fn generate(&self, prompt: &str) -> Result<String, ClassificationError> {
        let model_uri = self.config.model_uri();
        let body = self.request_body(&model_uri, prompt);

        let response = self
            .client
            .post(&self.config.endpoint)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Api-Key {}", self.config.credentials.api_key),
            )
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    ClassificationError::Connection(self.config.endpoint.clone())
                } else if e.is_timeout() {
                    ClassificationError::HttpClient(format!(
                        "Request timed out after {}s",
                        self.config.timeout_secs
                    ))
                } else {
                    ClassificationError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "Completion API responded");
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ClassificationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let raw = response
            .text()
            .map_err(|e| ClassificationError::HttpClient(e.to_string()))?;
        let text = extract_reply_text(&raw)?;
        tracing::debug!(chars = text.chars().count(), "Completion reply received");
        Ok(text)
    }
}

/// Mock LLM client for testing: returns a configurable response.
pub struct MockLlmClient {
    response: String,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
        }
    }
}

impl LlmClient for MockLlmClient {
    fn generate(&self, _prompt: &str) -> Result<String, ClassificationError> {
        Ok(self.response.clone())
    }
}

/// Mock LLM client that answers from a queue and records every prompt.
///
/// Once the queue is drained it keeps failing with a connection error.
pub struct ScriptedLlmClient {
    replies: Mutex<VecDeque<Result<String, ClassificationError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlmClient {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply.
    pub fn reply(self, text: &str) -> Self {
        self.push(Ok(text.to_string()))
    }

    /// Queue a transport failure.
    pub fn fail(self, error: ClassificationError) -> Self {
        self.push(Err(error))
    }

    fn push(self, reply: Result<String, ClassificationError>) -> Self {
        if let Ok(mut q) = self.replies.lock() {
            q.push_back(reply);
        }
        self
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or_default()
    }
}

impl Default for ScriptedLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmClient for ScriptedLlmClient {
    fn generate(&self, prompt: &str) -> Result<String, ClassificationError> {
        if let Ok(mut p) = self.prompts.lock() {
            p.push(prompt.to_string());
        }
        self.replies
            .lock()
            .ok()
            .and_then(|mut q| q.pop_front())
            .unwrap_or_else(|| Err(ClassificationError::Connection("script exhausted".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            api_key: "key".into(),
            folder_id: "b1gfolder".into(),
        }
    }

    #[test]
    fn mock_client_returns_configured_response() {
        let client = MockLlmClient::new("test response");
        assert_eq!(client.generate("prompt").unwrap(), "test response");
    }

    #[test]
    fn scripted_client_replays_in_order() {
        let client = ScriptedLlmClient::new()
            .reply("first")
            .fail(ClassificationError::Api {
                status: 429,
                body: "rate limited".into(),
            })
            .reply("third");
        assert_eq!(client.generate("a").unwrap(), "first");
        assert!(matches!(
            client.generate("b"),
            Err(ClassificationError::Api { status: 429, .. })
        ));
        assert_eq!(client.generate("c").unwrap(), "third");
        assert!(matches!(
            client.generate("d"),
            Err(ClassificationError::Connection(_))
        ));
        assert_eq!(client.prompts(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn model_uri_uses_folder() {
        let config = YandexGptConfig::new(credentials());
        assert_eq!(config.model_uri(), "gpt://b1gfolder/yandexgpt-lite/rc");
        assert_eq!(config.endpoint, DEFAULT_COMPLETION_URL);
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn request_body_matches_api_schema() {
        let client = YandexGptClient::new(YandexGptConfig::new(credentials())).unwrap();
        let uri = client.config.model_uri();
        let body = serde_json::to_value(client.request_body(&uri, "hello")).unwrap();
        assert_eq!(body["modelUri"], "gpt://b1gfolder/yandexgpt-lite/rc");
        assert_eq!(body["completionOptions"]["stream"], false);
        assert_eq!(body["completionOptions"]["maxTokens"], 4000);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["text"], "hello");
    }

    #[test]
    fn extract_reply_text_reads_first_alternative() {
        let body = r#"{"result":{"alternatives":[{"message":{"role":"assistant","text":"[{}]"},"status":"ALTERNATIVE_STATUS_FINAL"}],"modelVersion":"x"}}"#;
        assert_eq!(extract_reply_text(body).unwrap(), "[{}]");
    }

    #[test]
    fn extract_reply_text_rejects_empty_alternatives() {
        let body = r#"{"result":{"alternatives":[]}}"#;
        assert!(matches!(
            extract_reply_text(body),
            Err(ClassificationError::ResponseShape(_))
        ));
    }

    #[test]
    fn extract_reply_text_rejects_foreign_shape() {
        assert!(matches!(
            extract_reply_text(r#"{"error":"bad"}"#),
            Err(ClassificationError::ResponseShape(_))
        ));
    }

    #[test]
    fn unreachable_endpoint_is_an_error() {
        let config = YandexGptConfig::new(credentials()).with_endpoint("http://127.0.0.1:9/completion");
        let client = YandexGptClient::new(config).unwrap();
        assert!(client.generate("prompt").is_err());
    }
}
