use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::consts::{DEFAULT_MODEL, DEFAULT_TIMEOUT};

use super::{ChatProvider, ChatRequest, Message};

const API_URL: &str = "https://duckduckgo.com/duckchat/v1";
const VQD_HEADER: &str = "x-vqd-4";
const VQD_ACCEPT_HEADER: &str = "x-vqd-accept";
const USER_AGENT: &str = concat!("ddg-task/", env!("CARGO_PKG_VERSION"));
const CONVERSATION_LIMIT: &str = "ERR_CONVERSATION_LIMIT";

/// Model aliases accepted by `chat`, mapped to the ids the API expects.
const MODELS: &[(&str, &str)] = &[
    ("gpt-4o-mini", "gpt-4o-mini"),
    ("llama-3.3-70b", "meta-llama/Llama-3.3-70B-Instruct-Turbo"),
    ("claude-3-haiku", "claude-3-haiku-20240307"),
    ("o3-mini", "o3-mini"),
    ("mixtral-8x7b", "mistralai/Mixtral-8x7B-Instruct-v0.1"),
];

/// Resolve a model alias to the API model id.
pub fn resolve_model(alias: &str) -> Option<&'static str> {
    MODELS
        .iter()
        .find(|(name, _)| *name == alias)
        .map(|(_, id)| *id)
}

/// Errors reported by the chat service inside the response stream.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChatError {
    #[error("conversation limit reached: {0}")]
    ConversationLimit(String),
    #[error("rate limited (429): {0}")]
    RateLimited(String),
    #[error("DuckDuckGo chat error: {0}")]
    Service(String),
}

/// Provider settings. One instance per process.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub model: String,
    pub timeout: Duration,
    pub base_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            base_url: API_URL.to_string(),
        }
    }
}

/// Conversation state carried between calls on the same client.
#[derive(Debug, Default)]
struct ChatSession {
    vqd: Option<String>,
    messages: Vec<Message>,
    tokens: u64,
}

/// The DuckDuckGo AI chat assistant.
pub struct DuckDuckGoChat {
    client: reqwest::Client,
    config: ProviderConfig,
    session: Mutex<ChatSession>,
}

impl DuckDuckGoChat {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        if resolve_model(&config.model).is_none() {
            bail!("unknown chat model: {}", config.model);
        }
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            config,
            session: Mutex::new(ChatSession::default()),
        })
    }

    /// Approximate tokens exchanged so far in this conversation.
    pub async fn estimated_tokens(&self) -> u64 {
        self.session.lock().await.tokens
    }

    async fn fetch_vqd(&self) -> Result<String> {
        let resp = self
            .client
            .get(format!("{}/status", self.config.base_url))
            .header(VQD_ACCEPT_HEADER, "1")
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("DuckDuckGo status error ({}): {}", status, text);
        }

        vqd_from(resp.headers())
            .ok_or_else(|| anyhow::anyhow!("DuckDuckGo chat did not return a session token"))
    }
}

#[async_trait]
impl ChatProvider for DuckDuckGoChat {
    async fn chat(&self, request: &ChatRequest) -> Result<String> {
        let alias = request.model.as_deref().unwrap_or(&self.config.model);
        let model = resolve_model(alias)
            .ok_or_else(|| anyhow::anyhow!("unknown chat model: {}", alias))?;

        let mut session = self.session.lock().await;

        let vqd = match session.vqd.clone() {
            Some(vqd) => vqd,
            None => {
                let vqd = self.fetch_vqd().await?;
                session.vqd = Some(vqd.clone());
                vqd
            }
        };

        let mut messages = session.messages.clone();
        messages.push(Message::user(&request.keywords));

        let body = ApiRequest {
            model,
            messages: &messages,
        };

        let mut req = self
            .client
            .post(format!("{}/chat", self.config.base_url))
            .header(VQD_HEADER, &vqd)
            .json(&body);
        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let next_vqd = vqd_from(resp.headers());
        let text = resp.text().await?;

        if !status.is_success() {
            if let Some(err) = error_from_body(&text) {
                return Err(err.into());
            }
            bail!("DuckDuckGo chat error ({}): {}", status, text);
        }
        let reply = parse_chat_stream(&text)?;

        if next_vqd.is_some() {
            session.vqd = next_vqd;
        }
        session.tokens += estimate_tokens(&request.keywords) + reply.chunks as u64;
        session.messages = messages;
        session.messages.push(Message::assistant(&reply.text));
        debug!(
            model,
            tokens = session.tokens,
            turns = session.messages.len() / 2,
            "chat reply received"
        );

        Ok(reply.text)
    }
}

fn vqd_from(headers: &reqwest::header::HeaderMap) -> Option<String> {
    headers
        .get(VQD_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Rough token estimate for a user message: a quarter of its length, at least one.
fn estimate_tokens(text: &str) -> u64 {
    let len = text.chars().count() as u64;
    if len >= 4 { len / 4 } else { 1 }
}

/// The assembled assistant reply and how many chunks it came in.
#[derive(Debug, PartialEq)]
pub struct StreamReply {
    pub text: String,
    pub chunks: usize,
}

/// Payloads of the `data:` lines in a server-sent-event body.
fn data_lines(body: &str) -> impl Iterator<Item = &str> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim)
        .filter(|data| !data.is_empty())
}

fn classify(chunk: &StreamChunk) -> Option<ChatError> {
    if chunk.action.as_deref() != Some("error") {
        return None;
    }
    let kind = chunk.error_type.clone().unwrap_or_default();
    Some(match chunk.status {
        Some(429) if kind == CONVERSATION_LIMIT => ChatError::ConversationLimit(kind),
        Some(429) => ChatError::RateLimited(kind),
        _ => ChatError::Service(kind),
    })
}

/// Find a service error in a failed response, whether it came as
/// `data:` chunks or as a bare JSON body.
fn error_from_body(body: &str) -> Option<ChatError> {
    data_lines(body)
        .chain(std::iter::once(body.trim()))
        .filter_map(|data| serde_json::from_str::<StreamChunk>(data).ok())
        .find_map(|chunk| classify(&chunk))
}

/// Assemble a reply from a server-sent-event body of `data: {json}` lines.
///
/// Bracketed markers such as `[DONE]` are skipped, as are lines without a
/// `data:` prefix. An error chunk fails the whole reply.
pub fn parse_chat_stream(body: &str) -> Result<StreamReply> {
    let mut text = String::new();
    let mut chunks = 0;

    for data in data_lines(body) {
        if data.starts_with('[') {
            continue;
        }

        let chunk: StreamChunk = serde_json::from_str(data)
            .with_context(|| format!("failed to parse chat stream chunk: {}", data))?;

        if let Some(err) = classify(&chunk) {
            return Err(err.into());
        }

        if let Some(message) = chunk.message.filter(|m| !m.is_empty()) {
            text.push_str(&message);
            chunks += 1;
        }
    }

    Ok(StreamReply { text, chunks })
}

// --- API types ---

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
}

#[derive(Deserialize)]
struct StreamChunk {
    message: Option<String>,
    action: Option<String>,
    status: Option<u16>,
    #[serde(rename = "type")]
    error_type: Option<String>,
}
