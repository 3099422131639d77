//! Wire payloads for the OpenAI-compatible chat completion endpoint.

use serde::{Deserialize, Serialize};

use crate::core::message::Message;

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponseChoice {
    pub message: ChatResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatResponseChoice>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_only_wire_roles() {
        let history = [Message::user("hi"), Message::assistant("hello")];
        let request = ChatRequest {
            model: "llama3-8b-8192".to_string(),
            messages: history.iter().map(ChatMessage::from).collect(),
            stream: false,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][1]["role"], "assistant");
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn response_tolerates_null_content() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":null},"finish_reason":"stop"}]}"#;
        let response: ChatResponse = serde_json::from_str(raw).unwrap();
        assert!(response.choices[0].message.content.is_none());
    }
}
