use crate::controller::TurnOutcome;

/// Internal application events for coordinating between components
#[derive(Debug)]
pub enum AppEvent {
    /// Terminal input or timer
    Tui(TuiEvent),

    /// The network half of a turn finished (or its task died)
    TurnSettled(TurnOutcome),
}

/// TUI-specific events (keyboard, resize, animation ticks)
#[derive(Debug, Clone)]
pub enum TuiEvent {
    /// Key press event
    Key(crossterm::event::KeyEvent),

    /// Paste event
    Paste(String),

    /// Terminal resize
    Resize(u16, u16),

    /// Animation tick for the typing indicator
    Tick,
}

impl From<TuiEvent> for AppEvent {
    fn from(event: TuiEvent) -> Self {
        AppEvent::Tui(event)
    }
}
