use crossterm::event::{Event, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};

/// Terminal input delivered to the model through
/// [`terminal_events`](crate::subscription::terminal_events).
///
/// Only the events a full-screen device list reacts to are surfaced. Focus
/// changes, bracketed paste, key releases and bare pointer motion are dropped
/// at the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
    /// A key press or auto-repeat.
    Key(KeyEvent),
    /// A mouse click, drag or wheel event.
    Mouse(MouseEvent),
    /// Terminal resized to (columns, rows).
    Resize(u16, u16),
}

impl TerminalEvent {
    /// Convert a crossterm event, discarding the kinds the UI ignores.
    pub fn from_crossterm(event: Event) -> Option<Self> {
        match event {
            // Terminals with the kitty protocol report releases too; acting on
            // them would fire every binding twice.
            Event::Key(key) if key.kind == KeyEventKind::Release => None,
            Event::Key(key) => Some(TerminalEvent::Key(key)),
            // Mouse capture reports every pointer move; only buttons, drags
            // and the wheel reach the model.
            Event::Mouse(mouse) if mouse.kind == MouseEventKind::Moved => None,
            Event::Mouse(mouse) => Some(TerminalEvent::Mouse(mouse)),
            Event::Resize(cols, rows) => Some(TerminalEvent::Resize(cols, rows)),
            _ => None,
        }
    }
}
