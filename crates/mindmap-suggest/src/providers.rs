//! Text Generation Providers
//!
//! One request, one response: no retries, no timeout unless configured.

use crate::SuggestError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

// ============================================================================
// Provider Interface
// ============================================================================

/// Anything that turns a prompt into text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, SuggestError>;
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for Box<T> {
    async fn generate(&self, prompt: &str) -> Result<String, SuggestError> {
        (**self).generate(prompt).await
    }
}

// ============================================================================
// Configuration
// ============================================================================

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const MODEL_ENV: &str = "GEMINI_MODEL";
pub const BASE_URL_ENV: &str = "GEMINI_BASE_URL";

/// Generation endpoint configuration, loaded from environment or built directly
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: Option<u64>,
}

impl GenerationConfig {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: None,
        }
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let key = std::env::var(API_KEY_ENV).unwrap_or_default();
        Self::from_parts(
            &key,
            std::env::var(MODEL_ENV).ok(),
            std::env::var(BASE_URL_ENV).ok(),
        )
    }

    fn from_parts(
        api_key: &str,
        model: Option<String>,
        base_url: Option<String>,
    ) -> Result<Self, ConfigError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        let mut config = Self::new(api_key);
        if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
            config.model = model.trim().to_string();
        }
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            let url = url.trim().trim_end_matches('/');
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!("base url must be http(s): {url}")));
            }
            config.base_url = url.to_string();
        }
        Ok(config)
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Full `generateContent` URL, without the key.
    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No generation service configured. Set GEMINI_API_KEY")]
    MissingApiKey,
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// Gemini Provider
// ============================================================================

#[cfg(feature = "gemini")]
pub use gemini::GeminiClient;

#[cfg(feature = "gemini")]
mod gemini {
    use super::*;
    use crate::protocol::{response_text, GenerateRequest};
    use reqwest::Client;
    use std::time::Duration;

    pub struct GeminiClient {
        client: Client,
        config: GenerationConfig,
    }

    impl GeminiClient {
        pub fn new(config: GenerationConfig) -> Result<Self, SuggestError> {
            let mut builder = Client::builder();
            if let Some(secs) = config.timeout_secs {
                builder = builder.timeout(Duration::from_secs(secs));
            }
            let client = builder
                .build()
                .map_err(|e| SuggestError::Network(format!("failed to build http client: {e}")))?;
            Ok(Self { client, config })
        }

        pub fn from_env() -> Result<Self, SuggestError> {
            Self::new(GenerationConfig::from_env()?)
        }

        pub fn config(&self) -> &GenerationConfig {
            &self.config
        }
    }

    #[async_trait]
    impl TextGenerator for GeminiClient {
        async fn generate(&self, prompt: &str) -> Result<String, SuggestError> {
            let url = self.config.endpoint();
            tracing::debug!(%url, prompt_chars = prompt.len(), "sending generation request");

            let response = self
                .client
                .post(&url)
                .query(&[("key", self.config.api_key.as_str())])
                .header("Content-Type", "application/json")
                .json(&GenerateRequest::from_prompt(prompt))
                .send()
                .await
                .map_err(|e| SuggestError::Network(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(SuggestError::Api {
                    status: status.as_u16(),
                    body,
                });
            }

            let data: serde_json::Value = response
                .json()
                .await
                .map_err(|e| SuggestError::MalformedResponse(e.to_string()))?;

            let text = response_text(&data);
            if text.is_empty() {
                tracing::warn!("generation response carried no candidate text");
            }
            Ok(text)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;
        use tokio::task::JoinHandle;

        fn client_for(base_url: String) -> GeminiClient {
            let mut config = GenerationConfig::new("test-key").with_model("test-model");
            config.base_url = base_url;
            GeminiClient {
                client: Client::builder().no_proxy().build().unwrap(),
                config,
            }
        }

        /// Answer one request with `status` and `body`; yields the raw request.
        async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let base_url = format!("http://{}", listener.local_addr().unwrap());
            let handle = tokio::spawn(async move {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut request = Vec::new();
                let mut buf = [0u8; 4096];
                loop {
                    let n = socket.read(&mut buf).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..n]);
                    let text = String::from_utf8_lossy(&request);
                    if let Some(end) = text.find("\r\n\r\n") {
                        let length = text[..end]
                            .lines()
                            .find_map(|l| {
                                let (name, value) = l.split_once(':')?;
                                name.eq_ignore_ascii_case("content-length")
                                    .then(|| value.trim().parse::<usize>().ok())?
                            })
                            .unwrap_or(0);
                        if request.len() >= end + 4 + length {
                            break;
                        }
                    }
                }
                let reply = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(reply.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
                String::from_utf8_lossy(&request).into_owned()
            });
            (base_url, handle)
        }

        #[tokio::test]
        async fn test_generate_extracts_candidate_text() {
            let (base_url, server) = serve_once(
                "200 OK",
                r#"{"candidates":[{"content":{"parts":[{"text":"**Phở** **Chè**"}]}}]}"#,
            )
            .await;
            let text = client_for(base_url).generate("Suggest food").await.unwrap();
            assert_eq!(text, "**Phở** **Chè**");

            let request = server.await.unwrap();
            assert!(request.starts_with("POST /models/test-model:generateContent?key=test-key "), "{request}");
            assert!(request.contains(r#"{"contents":[{"parts":[{"text":"Suggest food"}]}]}"#), "{request}");
        }

        #[tokio::test]
        async fn test_generate_without_candidates_is_empty_text() {
            let (base_url, server) = serve_once("200 OK", r#"{"candidates":[]}"#).await;
            assert_eq!(client_for(base_url).generate("p").await.unwrap(), "");
            server.await.unwrap();
        }

        #[tokio::test]
        async fn test_generate_maps_error_status() {
            let (base_url, server) =
                serve_once("500 Internal Server Error", r#"{"error":"overloaded"}"#).await;
            let err = client_for(base_url).generate("p").await.unwrap_err();
            match err {
                SuggestError::Api { status, body } => {
                    assert_eq!(status, 500);
                    assert!(body.contains("overloaded"));
                }
                other => panic!("expected api error, got {other:?}"),
            }
            server.await.unwrap();
        }

        #[tokio::test]
        async fn test_generate_maps_undecodable_body() {
            let (base_url, server) = serve_once("200 OK", "<html>not json</html>").await;
            let err = client_for(base_url).generate("p").await.unwrap_err();
            assert!(matches!(err, SuggestError::MalformedResponse(_)), "{err:?}");
            server.await.unwrap();
        }

        #[tokio::test]
        async fn test_generate_maps_connection_failure() {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let base_url = format!("http://{}", listener.local_addr().unwrap());
            drop(listener);

            let err = client_for(base_url).generate("p").await.unwrap_err();
            assert!(matches!(err, SuggestError::Network(_)), "{err:?}");
        }
    }
}

// ============================================================================
// Mock Provider
// ============================================================================

/// Replays scripted results in order; once exhausted, returns empty text.
#[derive(Default)]
pub struct MockGenerator {
    script: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().map(Ok).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn always(response: &str) -> Self {
        Self::new(vec![response.to_string()])
    }

    /// Queue a network failure after the already scripted responses.
    pub fn then_fail(self, reason: &str) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Err(reason.to_string()));
        }
        self
    }

    /// Every prompt received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, SuggestError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(reason)) => Err(SuggestError::Network(reason)),
            None => Ok(String::new()),
        }
    }
}
