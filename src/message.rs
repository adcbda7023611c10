use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, EnumString};

/// Role of a message sender. Closed set; anything else coming from the
/// backend is rejected by [`sanitize_history`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// A single entry in the conversation, exactly as it travels over the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// Keep only entries with a known role and string content, preserving order.
///
/// Extra fields on an entry are ignored and stripped.
pub fn sanitize_history(entries: Vec<Value>) -> Vec<Message> {
    entries.into_iter().filter_map(sanitize_entry).collect()
}

fn sanitize_entry(entry: Value) -> Option<Message> {
    let role = entry.get("role")?.as_str()?.parse::<Role>().ok()?;
    let content = entry.get("content")?.as_str()?;
    Some(Message::new(role, content))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let actual = serde_json::to_value(Message::assistant("hi")).unwrap();
        let expected = json!({"role": "assistant", "content": "hi"});
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_sanitize_drops_invalid_role_and_non_text_content() {
        let entries = vec![
            json!({"role": "system", "content": ""}),
            json!({"role": "user", "content": "hello"}),
            json!({"role": "admin", "content": "sudo"}),
            json!({"role": "assistant", "content": 42}),
            json!({"role": "assistant", "content": "hi there"}),
        ];

        let actual = sanitize_history(entries);
        let expected = vec![
            Message::system(""),
            Message::user("hello"),
            Message::assistant("hi there"),
        ];
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_sanitize_drops_malformed_entries() {
        let entries = vec![
            json!("just a string"),
            json!({"content": "no role"}),
            json!({"role": "user"}),
            json!({"role": "User", "content": "wrong case"}),
            json!({"role": "user", "content": "ok", "extra": true}),
        ];

        let actual = sanitize_history(entries);
        assert_eq!(actual, vec![Message::user("ok")]);
    }
}
