//! OpenAI chat-completions client. Single request/response, no streaming.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::{
    config::DEFAULT_NARRATION_BASE_URL,
    error::{NarrationError, truncate_body},
};

use super::{Narrator, compose_user_message};

#[derive(Debug, Clone)]
pub struct OpenAiNarrator {
    api_key: String,
    model: String,
    base_url: String,
    http: Client,
}

impl OpenAiNarrator {
    pub fn new(api_key: String, model: String) -> Result<Self, NarrationError> {
        let http = Client::builder().timeout(Duration::from_secs(120)).build()?;

        Ok(Self {
            api_key,
            model,
            base_url: DEFAULT_NARRATION_BASE_URL.to_string(),
            http,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[async_trait]
impl Narrator for OpenAiNarrator {
    async fn generate(&self, system: &str, fragments: &[&str]) -> Result<String, NarrationError> {
        let user = compose_user_message(fragments);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
        };

        let started = Instant::now();
        let res = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| truncate_body(&body));
            return Err(NarrationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body)?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(NarrationError::EmptyResponse)?;

        debug!(
            model = %self.model,
            chars = text.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "narration generated"
        );

        Ok(text)
    }
}
