use crate::config::UiConfig;
use crate::controller::{ConversationController, TurnOutcome};
use crate::events::AppEvent;
use crate::ui::conversation::{
    get_help_text, ComposerResult, ConversationComposer, ConversationHistory, ScoresPanel,
    SlashCommand,
};
use crate::view::render_state;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    widgets::Widget,
};
use tokio::sync::mpsc;

/// Actions that can be requested by the conversation manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationAction {
    None,
    Exit,
}

/// Glues the controller to the composer and widgets, and runs the network
/// half of each turn on its own task.
pub struct ConversationManager {
    controller: ConversationController,
    composer: ConversationComposer,
    events: mpsc::UnboundedSender<AppEvent>,
    assistant_name: String,
    show_scores: bool,
    tick: usize,
}

impl ConversationManager {
    pub fn new(
        controller: ConversationController,
        ui: &UiConfig,
        events: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            controller,
            composer: ConversationComposer::new("Type your message..."),
            events,
            assistant_name: ui.assistant_name.clone(),
            show_scores: ui.show_metrics,
            tick: 0,
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: crossterm::event::KeyEvent) -> ConversationAction {
        match self.composer.handle_key(key) {
            ComposerResult::Submitted(input) => {
                self.send(input);
                ConversationAction::None
            }
            ComposerResult::Command(command) => self.handle_slash_command(command),
            ComposerResult::None => ConversationAction::None,
        }
    }

    pub fn paste(&mut self, text: &str) {
        self.composer.paste(text);
    }

    /// Start a turn and hand its network half to a background task
    fn send(&mut self, input: String) {
        let Some(turn) = self.controller.begin_turn(&input) else {
            return;
        };
        self.composer.set_enabled(false);

        let turn_id = turn.id();
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = match tokio::spawn(turn.run()).await {
                Ok(outcome) => outcome,
                Err(error) => {
                    tracing::error!(%turn_id, %error, "turn task failed");
                    TurnOutcome::aborted(turn_id, error.to_string())
                }
            };
            if events.send(AppEvent::TurnSettled(outcome)).is_err() {
                tracing::debug!(%turn_id, "event loop gone before turn settled");
            }
        });
    }

    /// Apply a finished turn and re-enable input
    pub fn settle(&mut self, outcome: TurnOutcome) {
        self.controller.finish_turn(outcome);
        if !self.controller.is_loading() {
            self.composer.clear();
            self.composer.set_enabled(true);
        }
    }

    pub fn on_tick(&mut self) {
        if self.controller.is_loading() {
            self.tick = self.tick.wrapping_add(1);
        }
    }

    pub fn controller(&self) -> &ConversationController {
        &self.controller
    }

    fn handle_slash_command(&mut self, command: SlashCommand) -> ConversationAction {
        if self.controller.is_loading() && !command.available_while_loading() {
            self.controller
                .push_notice(format!("/{} is not available while waiting for a reply", command.command()));
            return ConversationAction::None;
        }

        match command {
            SlashCommand::Bye => ConversationAction::Exit,
            SlashCommand::Help => {
                self.controller.push_notice(get_help_text());
                ConversationAction::None
            }
            SlashCommand::Clear => {
                self.controller.reset();
                ConversationAction::None
            }
        }
    }

    /// Render the conversation UI components
    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let view = render_state(&self.controller, &self.assistant_name);

        let columns = if self.show_scores {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Min(30), Constraint::Length(36)])
                .split(area)
        } else {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Min(30)])
                .split(area)
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),    // History
                Constraint::Length(1), // Command hint
                Constraint::Length(3), // Composer
            ])
            .split(columns[0]);

        let title = format!("Chat with {}", self.assistant_name);
        ConversationHistory::new(&view, title, self.tick).render(chunks[0], buf);
        self.composer.render(chunks[2], buf);

        if self.show_scores {
            ScoresPanel::new(&view).render(columns[1], buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use mockito::Matcher;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::client::RagClient;
    use crate::config::Config;
    use crate::message::Message;

    fn fixture(url: &str) -> (ConversationManager, mpsc::UnboundedReceiver<AppEvent>) {
        let mut config = Config::default();
        config.base_url = url.to_string();
        let controller = ConversationController::new(
            RagClient::new(&config).unwrap(),
            config.controller_settings(),
        );
        let (tx, rx) = mpsc::unbounded_channel();
        (ConversationManager::new(controller, &config.ui, tx), rx)
    }

    fn type_line(manager: &mut ConversationManager, text: &str) -> ConversationAction {
        for c in text.chars() {
            manager.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
        manager.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))
    }

    #[tokio::test]
    async fn test_turn_round_trip_through_event_channel() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/rag_chat")
            .with_status(200)
            .with_body(
                json!({
                    "answer": "hi there",
                    "history": [
                        {"role": "user", "content": "hello"},
                        {"role": "assistant", "content": "hi there"}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;
        let (mut manager, mut rx) = fixture(&server.url());

        type_line(&mut manager, "hello");
        assert!(manager.controller().is_loading());
        assert!(!manager.composer.is_enabled());

        let Some(AppEvent::TurnSettled(outcome)) = rx.recv().await else {
            panic!("expected a settled turn");
        };
        manager.settle(outcome);

        assert!(!manager.controller().is_loading());
        assert!(manager.composer.is_enabled());
        assert_eq!(manager.composer.content(), "");
        assert_eq!(manager.controller().history().last(), Some(&Message::assistant("hi there")));
    }

    #[tokio::test]
    async fn test_bye_exits_and_help_adds_notice() {
        let (mut manager, _rx) = fixture("http://127.0.0.1:1");

        assert_eq!(type_line(&mut manager, "/help"), ConversationAction::None);
        let notice = manager.controller().notices().last().unwrap();
        assert!(notice.text.starts_with("Available commands"));
        assert_eq!(manager.controller().history(), &[Message::system("")]);

        assert_eq!(type_line(&mut manager, "/bye"), ConversationAction::Exit);
    }

    #[tokio::test]
    async fn test_help_text_is_not_sent_with_next_turn() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rag_chat")
            .match_body(Matcher::Json(json!({
                "message": "hello",
                "history": [
                    {"role": "system", "content": ""},
                    {"role": "user", "content": "hello"}
                ]
            })))
            .with_status(200)
            .with_body(json!({"answer": "hi", "history": []}).to_string())
            .create_async()
            .await;
        let (mut manager, mut rx) = fixture(&server.url());

        type_line(&mut manager, "/help");
        type_line(&mut manager, "hello");
        let Some(AppEvent::TurnSettled(outcome)) = rx.recv().await else {
            panic!("expected a settled turn");
        };
        manager.settle(outcome);

        mock.assert_async().await;
        let view = render_state(manager.controller(), "RAG");
        assert!(view.bubbles[0].text.starts_with("Available commands"));
    }

    #[tokio::test]
    async fn test_unreachable_backend_reenables_input() {
        let (mut manager, mut rx) = fixture("http://127.0.0.1:1");

        type_line(&mut manager, "hello");
        assert!(!manager.composer.is_enabled());

        let Some(AppEvent::TurnSettled(outcome)) = rx.recv().await else {
            panic!("expected a settled turn");
        };
        manager.settle(outcome);

        assert!(manager.composer.is_enabled());
        assert_eq!(manager.composer.content(), "");
        assert_eq!(manager.controller().draft(), "");
        assert_eq!(
            manager.controller().history().last(),
            Some(&Message::system("Error: Could not connect to the chat service."))
        );
    }

    #[tokio::test]
    async fn test_render_does_not_panic_on_small_area() {
        let (manager, _rx) = fixture("http://127.0.0.1:1");
        let area = Rect::new(0, 0, 20, 6);
        let mut buf = Buffer::empty(area);
        manager.render(area, &mut buf);
    }
}
