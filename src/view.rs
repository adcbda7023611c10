//! Pure projection of controller state into something a UI can draw.

use crate::controller::{ConversationController, Notice};
use crate::message::{Message, Role};

/// Horizontal placement of a bubble
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Leading,
    Centered,
    Trailing,
}

impl From<Role> for Alignment {
    fn from(role: Role) -> Self {
        match role {
            Role::User => Alignment::Trailing,
            Role::Assistant => Alignment::Leading,
            Role::System => Alignment::Centered,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    pub role: Role,
    pub alignment: Alignment,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationView {
    pub bubbles: Vec<Bubble>,
    /// Typing placeholder text, present only while a turn is in flight
    pub typing: Option<String>,
    pub metric_lines: Vec<String>,
    pub evaluation: Option<String>,
    /// Whether the send affordance should accept input
    pub input_enabled: bool,
}

impl From<&Message> for Bubble {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            alignment: message.role.into(),
            text: message.content.clone(),
        }
    }
}

impl From<&Notice> for Bubble {
    fn from(notice: &Notice) -> Self {
        Self {
            role: Role::System,
            alignment: Alignment::Centered,
            text: notice.text.clone(),
        }
    }
}

/// Interleave history with local notices. A notice is drawn before the
/// history entry at its anchor; anchors past the end (history may shrink on
/// a full replace) land after the last entry.
fn merge_bubbles(history: &[Message], notices: &[Notice]) -> Vec<Bubble> {
    let mut notices: Vec<&Notice> = notices.iter().collect();
    notices.sort_by_key(|notice| notice.anchor);
    let mut notices = notices.into_iter().peekable();

    let mut bubbles = Vec::with_capacity(history.len() + notices.len());
    for (index, message) in history.iter().enumerate() {
        while let Some(notice) = notices.next_if(|notice| notice.anchor <= index) {
            bubbles.push(notice.into());
        }
        // the seed system message carries no text
        if message.role == Role::System && message.content.is_empty() {
            continue;
        }
        bubbles.push(message.into());
    }
    bubbles.extend(notices.map(Bubble::from));
    bubbles
}

pub fn render_state(controller: &ConversationController, assistant_name: &str) -> ConversationView {
    let bubbles = merge_bubbles(controller.history(), controller.notices());

    let loading = controller.is_loading();

    ConversationView {
        bubbles,
        typing: loading.then(|| format!("{assistant_name} is typing...")),
        metric_lines: controller.metrics().iter().map(|metric| metric.summary()).collect(),
        evaluation: controller.evaluation().map(str::to_string),
        input_enabled: !loading,
    }
}
