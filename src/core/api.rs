use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::core::error::{ApiResult, FailureReason};
use crate::core::session::{Message, Session};

pub const STATUS_SUCCESS: &str = "success";

/// Body for endpoints that take no arguments; serializes as `{}`.
#[derive(Debug, Default, Serialize)]
pub struct EmptyRequest {}

#[derive(Debug, Serialize)]
pub struct SessionIdRequest<'a> {
    pub session_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub messages: &'a [Message],
    pub stream: bool,
    pub session_id: Option<&'a str>,
}

/// A decoded response with its in-band `status` and `message` pulled out.
///
/// The body stays untyped until [`ApiEnvelope::into_body`] has checked the
/// status, so an error reply such as `{"status":"error","message":"..."}`
/// is reported as [`FailureReason::Server`] whatever endpoint it came from.
#[derive(Debug, Clone)]
pub struct ApiEnvelope {
    pub status: Option<String>,
    pub message: Option<String>,
    body: Value,
}

impl ApiEnvelope {
    pub fn new(body: Value) -> Self {
        let text_field = |name: &str| body.get(name).and_then(Value::as_str).map(str::to_string);
        Self {
            status: text_field("status"),
            message: text_field("message"),
            body,
        }
    }

    /// Fail on a present non-`"success"` status, otherwise decode the body as `T`.
    pub fn into_body<T: DeserializeOwned>(self, fallback: &str) -> ApiResult<T> {
        if let Some(status) = self.status.as_deref().filter(|s| *s != STATUS_SUCCESS) {
            let reason = self
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("{} (status: {})", fallback, status));
            return Err(FailureReason::Server(reason));
        }

        serde_json::from_value(self.body)
            .map_err(|e| FailureReason::Decode(format!("{}: unexpected response body: {}", fallback, e)))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub current_session_id: Option<String>,
}

impl SessionList {
    /// The server's "current session" hint, ignoring empty ids.
    pub fn current(&self) -> Option<&str> {
        self.current_session_id
            .as_deref()
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionMessages {
    #[serde(default, deserialize_with = "null_as_default")]
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedSession {
    pub session_id: String,
}

/// Endpoints whose body carries nothing beyond `status`/`message`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Acknowledgement {}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub tools: Vec<Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::Role;
    use serde_json::json;

    #[test]
    fn test_chat_request_shape() {
        let history = vec![Message::user("hi"), Message::assistant("hello")];
        let request = ChatRequest {
            messages: &history,
            stream: false,
            session_id: None,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "messages": [
                    {"role": "user", "content": "hi"},
                    {"role": "assistant", "content": "hello"}
                ],
                "stream": false,
                "session_id": null
            })
        );
        assert_eq!(serde_json::to_string(&EmptyRequest::default()).unwrap(), "{}");
    }

    #[test]
    fn test_envelope_without_status_is_success() {
        let envelope = ApiEnvelope::new(json!({
            "sessions": [{"id": "a", "title": "A", "time": "t"}],
            "current_session_id": ""
        }));
        let list: SessionList = envelope.into_body("list").unwrap();
        assert_eq!(list.sessions.len(), 1);
        assert_eq!(list.current(), None);
    }

    #[test]
    fn test_envelope_error_status_uses_server_message() {
        let envelope = ApiEnvelope::new(json!({
            "status": "error",
            "message": "no such session"
        }));
        assert_eq!(
            envelope.into_body::<SessionMessages>("load").unwrap_err(),
            FailureReason::Server("no such session".to_string())
        );

        let silent = ApiEnvelope::new(json!({"status": "error"}));
        assert_eq!(
            silent.into_body::<Acknowledgement>("delete failed").unwrap_err(),
            FailureReason::Server("delete failed (status: error)".to_string())
        );
    }

    #[test]
    fn test_null_lists_decode_as_empty() {
        let envelope = ApiEnvelope::new(json!({"status": "success", "messages": null}));
        let body: SessionMessages = envelope.into_body("load").unwrap();
        assert!(body.messages.is_empty());
    }

    #[test]
    fn test_chat_reply_decodes_optional_fields() {
        let envelope = ApiEnvelope::new(json!({
            "response": "sunny",
            "tool_calls": null,
            "session_id": "s1"
        }));
        let reply: ChatReply = envelope.into_body("chat").unwrap();
        assert_eq!(reply.response, "sunny");
        assert_eq!(reply.session_id.as_deref(), Some("s1"));
        assert!(reply.tool_calls.is_none());

        let messages = ApiEnvelope::new(json!({
            "status": "success",
            "session_id": "s1",
            "messages": [{"role": "user", "content": "q"}, {"role": "assistant", "content": "a"}]
        }));
        let body: SessionMessages = messages.into_body("load").unwrap();
        assert_eq!(body.messages[1].role, Role::Assistant);
    }

    #[test]
    fn test_error_reply_without_body_fields_is_a_server_failure() {
        let error = json!({"status": "error", "message": "disk full"});
        assert_eq!(
            ApiEnvelope::new(error.clone())
                .into_body::<CreatedSession>("create")
                .unwrap_err(),
            FailureReason::Server("disk full".to_string())
        );
        assert_eq!(
            ApiEnvelope::new(error)
                .into_body::<ChatReply>("chat")
                .unwrap_err(),
            FailureReason::Server("disk full".to_string())
        );
    }

    #[test]
    fn test_success_reply_missing_fields_is_a_decode_failure() {
        let envelope = ApiEnvelope::new(json!({"status": "success"}));
        assert!(matches!(
            envelope.into_body::<CreatedSession>("create"),
            Err(FailureReason::Decode(_))
        ));
    }
}
