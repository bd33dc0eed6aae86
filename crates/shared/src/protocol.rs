use serde::{Deserialize, Serialize};

/// Body of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub query: String,
}

/// Success body of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
}

/// Raw signal emitted by a platform recognition engine.
///
/// Engines may emit any number of `Interim` signals, then at most one of
/// `Result` or `Error`, then `End`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum PlatformSignal {
    Interim(String),
    Result(String),
    Error(String),
    End,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_serializes_query_field() {
        let body = serde_json::to_value(ChatRequest {
            query: "menu de hoy".to_string(),
        })
        .expect("serialize");
        assert_eq!(body, serde_json::json!({ "query": "menu de hoy" }));
    }

    #[test]
    fn chat_reply_ignores_extra_fields() {
        let reply: ChatReply =
            serde_json::from_str(r#"{"response":"hola","model":"x"}"#).expect("parse");
        assert_eq!(reply.response, "hola");
    }

    #[test]
    fn chat_reply_requires_string_response() {
        assert!(serde_json::from_str::<ChatReply>(r#"{"response":42}"#).is_err());
        assert!(serde_json::from_str::<ChatReply>(r#"{"answer":"hola"}"#).is_err());
    }
}
