//! Chat-completion transport and the single-call primitive

use anyhow::Result;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::error::CouncilError;
use crate::llm::result::{CallFailure, ModelId, ModelResult, Outcome};

const TOO_MANY_REQUESTS: u16 = 429;

/// Raw status and body of one provider round trip
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// Sends one chat-completion request; `Err` means no HTTP reply was received
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, model: &str, prompt: &str) -> Result<HttpReply>;
}

/// OpenRouter-style chat-completion endpoint
pub struct OpenRouterTransport {
    client: Client,
    config: ProviderConfig,
    api_key: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

impl OpenRouterTransport {
    pub fn new(config: ProviderConfig, api_key: String) -> Result<Self, CouncilError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            config,
            api_key,
        })
    }
}

#[async_trait::async_trait]
impl ChatTransport for OpenRouterTransport {
    async fn send(&self, model: &str, prompt: &str) -> Result<HttpReply> {
        let request = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .header("HTTP-Referer", &self.config.referer)
            .header("X-Title", &self.config.title)
            .json(&request)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpReply { status, body })
    }
}

/// Issues single model calls with the rate-limit retry policy applied
#[derive(Clone)]
pub struct ModelClient {
    transport: Arc<dyn ChatTransport>,
    rate_limit_backoff: Duration,
}

impl ModelClient {
    pub fn new(transport: Arc<dyn ChatTransport>, rate_limit_backoff: Duration) -> Self {
        Self {
            transport,
            rate_limit_backoff,
        }
    }

    /// Ask one model; every path yields a `ModelResult`
    pub async fn fetch(&self, model: &ModelId, prompt: &str) -> ModelResult {
        let started = Instant::now();

        let mut reply = self.transport.send(model.as_str(), prompt).await;
        if matches!(&reply, Ok(r) if r.status == TOO_MANY_REQUESTS) {
            warn!(
                model = %model,
                backoff_ms = self.rate_limit_backoff.as_millis() as u64,
                "rate limited, retrying once"
            );
            tokio::time::sleep(self.rate_limit_backoff).await;
            reply = self.transport.send(model.as_str(), prompt).await;
        }

        let outcome = match reply {
            Ok(reply) => parse_reply(reply),
            Err(err) => Outcome::Failure(CallFailure::Transport(format!("{err:#}"))),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match outcome {
            Outcome::Success(text) => {
                debug!(model = %model, chars = text.len(), elapsed_ms, "model answered");
                ModelResult::success(model.clone(), text)
            }
            Outcome::Failure(failure) => {
                warn!(model = %model, error = %failure, elapsed_ms, "model call failed");
                ModelResult::failure(model.clone(), failure)
            }
        }
    }
}

/// Turn a provider reply into an outcome
fn parse_reply(reply: HttpReply) -> Outcome {
    if !(200..300).contains(&reply.status) {
        return Outcome::Failure(CallFailure::Status(reply.status));
    }

    let response: ChatResponse = match serde_json::from_str(&reply.body) {
        Ok(response) => response,
        Err(err) => return Outcome::Failure(CallFailure::Transport(err.to_string())),
    };

    match response.choices.into_iter().next() {
        Some(ChatChoice {
            message: ChatMessageResponse {
                content: Some(content),
            },
        }) => Outcome::Success(content),
        Some(_) => Outcome::Failure(CallFailure::Transport(
            "completion choice has no message content".to_string(),
        )),
        None => Outcome::Failure(CallFailure::Transport(
            "response contained no completion choices".to_string(),
        )),
    }
}
