//! Single request/response chat completions and title suggestions.
//!
//! [`CompletionBackend`] is the seam between the app and the hosted API; the
//! HTTP implementation is [`CompletionClient`]. [`CompletionService`] runs
//! requests on the runtime and reports outcomes over a channel, tagged with
//! the request id so the event loop can drop results nobody waits for.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::{ChatMessage, ChatRequest, ChatResponse};
use crate::core::conversation::ConversationId;
use crate::core::message::Message;
use crate::utils::auth::add_auth_headers;
use crate::utils::url::construct_api_url;

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const FALLBACK_TITLE: &str = "Chat";

const TITLE_INSTRUCTIONS: &str = "Based on the following chat, suggest an accurate title \
with no more than 5 words, written in the language of the chat. Answer with the title only: \
no quotes, no punctuation around it and no other words.";

const TITLE_QUOTES: &[char] = &['"', '\'', '`', '“', '”', '‘', '’', '«', '»'];

#[derive(Debug)]
pub enum CompletionError {
    /// The request never produced an HTTP response.
    Network(reqwest::Error),
    /// The API rejected the credentials (401/403).
    Auth { message: String },
    /// Any other non-success status.
    Api { status: u16, message: String },
    /// The body was not a chat completion.
    MalformedResponse(String),
    /// The request was abandoned before it finished.
    Cancelled,
}

impl fmt::Display for CompletionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionError::Network(err) => write!(f, "Network error: {err}"),
            CompletionError::Auth { message } => write!(f, "Authentication failed: {message}"),
            CompletionError::Api { status, message } => write!(f, "HTTP {status}: {message}"),
            CompletionError::MalformedResponse(detail) => {
                write!(f, "Unexpected response from API: {detail}")
            }
            CompletionError::Cancelled => write!(f, "Request cancelled"),
        }
    }
}

impl StdError for CompletionError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            CompletionError::Network(err) => Some(err),
            _ => None,
        }
    }
}

#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Send the ordered history and return the single best assistant reply.
    async fn complete(
        &self,
        messages: &[Message],
        model: &str,
    ) -> Result<Message, CompletionError>;
}

#[derive(Clone)]
pub struct CompletionClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl CompletionClient {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl CompletionBackend for CompletionClient {
    async fn complete(
        &self,
        messages: &[Message],
        model: &str,
    ) -> Result<Message, CompletionError> {
        let request = ChatRequest {
            model: model.to_string(),
            messages: messages.iter().map(ChatMessage::from).collect(),
            stream: false,
        };

        let url = construct_api_url(&self.base_url, "chat/completions");
        debug!(%url, model, messages = request.messages.len(), "Sending completion request");

        let http_request = self
            .client
            .post(url)
            .header("Content-Type", "application/json");
        let response = add_auth_headers(http_request, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(CompletionError::Network)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            let message = format_api_error(&error_text);
            return Err(match status.as_u16() {
                401 | 403 => CompletionError::Auth { message },
                code => CompletionError::Api {
                    status: code,
                    message,
                },
            });
        }

        let body = response.text().await.map_err(CompletionError::Network)?;
        parse_completion(&body)
    }
}

/// Extract the first choice of a completion body.
pub fn parse_completion(body: &str) -> Result<Message, CompletionError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|err| CompletionError::MalformedResponse(err.to_string()))?;
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| CompletionError::MalformedResponse("no choices returned".to_string()))?;
    Ok(Message::assistant(choice.message.content.unwrap_or_default()))
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .or_else(|| value.get("error").and_then(|v| v.as_str()))
        .or_else(|| value.get("message").and_then(|v| v.as_str()))?;
    let collapsed = summary.split_whitespace().collect::<Vec<_>>().join(" ");
    Some(collapsed)
}

/// One-line summary of an API error body for the status line and logs.
pub fn format_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();
    if trimmed.is_empty() {
        return "<empty response>".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(summary) = extract_error_summary(&json_value).filter(|s| !s.is_empty()) {
            return summary;
        }
        return json_value.to_string();
    }

    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn title_prompt(first_user: &str, first_assistant: &str) -> String {
    format!("{TITLE_INSTRUCTIONS}\n\nUser: {first_user}\n\nAssistant: {first_assistant}")
}

/// Trim a suggested title down to its first line without surrounding quotes.
pub fn clean_title(raw: &str) -> String {
    let first_line = raw.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    let cleaned = first_line.trim_matches(TITLE_QUOTES).trim();
    if cleaned.is_empty() {
        FALLBACK_TITLE.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Ask for a short title for the first exchange; never fails.
pub async fn suggest_title(
    backend: &dyn CompletionBackend,
    first_user: &str,
    first_assistant: &str,
    model: &str,
) -> String {
    let prompt = [Message::user(title_prompt(first_user, first_assistant))];
    match backend.complete(&prompt, model).await {
        Ok(reply) => clean_title(&reply.content),
        Err(err) => {
            warn!(error = %err, "Title suggestion failed; using fallback");
            FALLBACK_TITLE.to_string()
        }
    }
}

#[derive(Debug)]
pub enum CompletionEvent {
    Reply {
        request_id: u64,
        reply: Message,
    },
    Failed {
        request_id: u64,
        error: CompletionError,
    },
    Title {
        conversation_id: ConversationId,
        title: String,
    },
}

#[derive(Debug)]
pub struct ExchangeParams {
    pub request_id: u64,
    pub model: String,
    pub history: Vec<Message>,
    pub cancel_token: CancellationToken,
}

#[derive(Debug)]
pub struct TitleParams {
    pub conversation_id: ConversationId,
    pub first_user: String,
    pub first_assistant: String,
}

#[derive(Clone)]
pub struct CompletionService {
    backend: Arc<dyn CompletionBackend>,
    title_model: String,
    tx: mpsc::UnboundedSender<CompletionEvent>,
}

impl CompletionService {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        title_model: impl Into<String>,
    ) -> (Self, mpsc::UnboundedReceiver<CompletionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                backend,
                title_model: title_model.into(),
                tx,
            },
            rx,
        )
    }

    pub fn spawn_exchange(&self, params: ExchangeParams) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let ExchangeParams {
                request_id,
                model,
                history,
                cancel_token,
            } = params;

            let outcome = tokio::select! {
                result = backend.complete(&history, &model) => result,
                _ = cancel_token.cancelled() => Err(CompletionError::Cancelled),
            };

            let event = match outcome {
                Ok(reply) => CompletionEvent::Reply { request_id, reply },
                Err(error) => CompletionEvent::Failed { request_id, error },
            };
            let _ = tx.send(event);
        });
    }

    pub fn spawn_title(&self, params: TitleParams) {
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        let model = self.title_model.clone();
        tokio::spawn(async move {
            let title = suggest_title(
                backend.as_ref(),
                &params.first_user,
                &params.first_assistant,
                &model,
            )
            .await;
            let _ = tx.send(CompletionEvent::Title {
                conversation_id: params.conversation_id,
                title,
            });
        });
    }
}
