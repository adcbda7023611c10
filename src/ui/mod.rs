//! Interactive terminal chat

pub mod conversation;
pub mod tui;

use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use crate::client::RagClient;
use crate::config::Config;
use crate::controller::ConversationController;
use crate::events::{AppEvent, TuiEvent};
use conversation::{ConversationAction, ConversationManager};

const TICK_RATE: Duration = Duration::from_millis(300);

/// Run the chat UI until the user quits
pub async fn run(config: Config) -> Result<()> {
    let client = RagClient::new(&config).context("Failed to create HTTP client")?;
    let controller = ConversationController::new(client, config.controller_settings());

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut manager = ConversationManager::new(controller, &config.ui, tx.clone());

    tui::install_panic_hook();
    let mut terminal = tui::init().context("Failed to initialize terminal")?;
    tui::spawn_event_pump(tx, TICK_RATE);

    tracing::info!(base_url = %config.base_url, policy = config.reconcile_policy.as_ref(), "chat session started");

    let result = event_loop(&mut terminal, &mut manager, &mut rx).await;

    tui::restore().context("Failed to restore terminal")?;
    tracing::info!("chat session ended");
    result
}

async fn event_loop(
    terminal: &mut tui::Tui,
    manager: &mut ConversationManager,
    rx: &mut mpsc::UnboundedReceiver<AppEvent>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| manager.render(frame.size(), frame.buffer_mut()))?;

        let Some(event) = rx.recv().await else {
            return Ok(());
        };

        match event {
            AppEvent::Tui(TuiEvent::Key(key)) => {
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('d'))
                {
                    return Ok(());
                }
                if manager.handle_key(key) == ConversationAction::Exit {
                    return Ok(());
                }
            }
            AppEvent::Tui(TuiEvent::Paste(text)) => manager.paste(&text),
            AppEvent::Tui(TuiEvent::Resize(..)) => {}
            AppEvent::Tui(TuiEvent::Tick) => manager.on_tick(),
            AppEvent::TurnSettled(outcome) => manager.settle(outcome),
        }
    }
}
