use serde::{Deserialize, Serialize};

/// Titles derived from the first user message keep this many characters.
pub const TITLE_MAX_CHARS: usize = 30;

const TITLE_ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub time: String,
}

impl Session {
    /// A session the client has just asked the backend to create. The backend
    /// only hands back an id, so title and timestamp are filled in locally.
    pub fn new_local(id: String, placeholder_title: &str) -> Self {
        Session {
            id,
            title: placeholder_title.to_string(),
            time: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    pub fn display_title<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.title.is_empty() {
            fallback
        } else {
            &self.title
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    User,
    Assistant,
    /// Any role the backend stores that this client does not produce itself
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Other(role) => role,
        }
    }
}

impl From<String> for Role {
    fn from(role: String) -> Self {
        match role.as_str() {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            _ => Role::Other(role),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(role) => role,
            known => known.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Message {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Session title for a conversation opened with `text`: the first
/// [`TITLE_MAX_CHARS`] characters, with an ellipsis when anything was cut.
pub fn title_from(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{}{}", head, TITLE_ELLIPSIS)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_truncates_long_text() {
        let title = title_from("Hello there, how is the weather today in Paris?");
        assert_eq!(title, "Hello there, how is the weathe...");
    }

    #[test]
    fn test_title_keeps_short_text() {
        assert_eq!(title_from("Hi"), "Hi");
        let exactly = "a".repeat(TITLE_MAX_CHARS);
        assert_eq!(title_from(&exactly), exactly);
    }

    #[test]
    fn test_title_counts_characters_not_bytes() {
        let text = "你".repeat(31);
        let title = title_from(&text);
        assert_eq!(title, format!("{}...", "你".repeat(30)));
    }

    #[test]
    fn test_role_round_trips_unknown_values() {
        let msg: Message = serde_json::from_str(r#"{"role":"system","content":"x"}"#).unwrap();
        assert_eq!(msg.role, Role::Other("system".to_string()));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "system");

        let user = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(user, serde_json::json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn test_session_ignores_extra_fields() {
        let session: Session =
            serde_json::from_str(r#"{"id":"1_ab","title":"t","time":"now","path":"/tmp/x.json"}"#)
                .unwrap();
        assert_eq!(session.id, "1_ab");

        let bare: Session = serde_json::from_str(r#"{"id":"2"}"#).unwrap();
        assert_eq!(bare.title, "");
        assert_eq!(bare.display_title("new session"), "new session");
    }
}
