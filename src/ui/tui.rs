use std::io::{self, Stderr};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

use crate::events::{AppEvent, TuiEvent};

pub type Tui = Terminal<CrosstermBackend<Stderr>>;

/// Pumps terminal input and animation ticks into the app event channel
pub fn spawn_event_pump(tx: mpsc::UnboundedSender<AppEvent>, tick_rate: Duration) {
    let tx_events = tx.clone();
    tokio::spawn(async move {
        let mut reader = event::EventStream::new();
        while let Some(evt) = reader.next().await {
            let tui_event = match evt {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => Some(TuiEvent::Key(key)),
                Ok(Event::Paste(text)) => Some(TuiEvent::Paste(text)),
                Ok(Event::Resize(w, h)) => Some(TuiEvent::Resize(w, h)),
                Ok(_) => None,
                Err(error) => {
                    tracing::warn!(%error, "failed to read terminal event");
                    None
                }
            };

            if let Some(event) = tui_event {
                if tx_events.send(event.into()).is_err() {
                    break;
                }
            }
        }
    });

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick_rate);
        loop {
            interval.tick().await;
            if tx.send(TuiEvent::Tick.into()).is_err() {
                break;
            }
        }
    });
}

pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    execute!(io::stderr(), EnterAlternateScreen, EnableBracketedPaste)?;

    let backend = CrosstermBackend::new(io::stderr());
    let terminal = Terminal::new(backend)?;

    Ok(terminal)
}

pub fn restore() -> Result<()> {
    execute!(io::stderr(), DisableBracketedPaste, LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

/// Install panic hook to restore terminal on panic
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore();
        original_hook(panic_info);
    }));
}
