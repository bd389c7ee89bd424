//! Key bindings, shared by input dispatch and the on-screen legend.

use crate::msg::Action;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// A single key press with optional modifier keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCombination {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyCombination {
    /// A key combination with no modifier keys.
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    /// A key combination with the Ctrl modifier.
    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    /// Plain keys must not fire while Ctrl or Alt is held, so `r` and
    /// `Ctrl+r` stay distinct. Shift is ignored because terminals disagree
    /// on whether they report it for printable characters.
    fn matches(&self, event: &KeyEvent) -> bool {
        if self.code != event.code {
            return false;
        }
        if self.modifiers.is_empty() {
            !event
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        } else {
            event.modifiers.contains(self.modifiers)
        }
    }

    /// Legend label, e.g. `↑`, `Enter`, `Ctrl+r`.
    pub fn label(&self) -> String {
        let key = match self.code {
            KeyCode::Up => "↑".to_string(),
            KeyCode::Down => "↓".to_string(),
            KeyCode::Enter => "Enter".to_string(),
            KeyCode::Esc => "Esc".to_string(),
            KeyCode::Char(' ') => "Space".to_string(),
            KeyCode::Char(c) => c.to_string(),
            other => format!("{other:?}"),
        };
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            format!("Ctrl+{key}")
        } else {
            key
        }
    }
}

/// One or more key combinations bound to an [`Action`].
#[derive(Debug, Clone)]
pub struct Binding {
    pub action: Action,
    pub keys: Vec<KeyCombination>,
    pub description: String,
    /// Hidden bindings still match but are left out of the legend.
    pub hidden: bool,
}

impl Binding {
    pub fn new(action: Action, keys: Vec<KeyCombination>, description: impl Into<String>) -> Self {
        Self {
            action,
            keys,
            description: description.into(),
            hidden: false,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.keys.iter().any(|k| k.matches(event))
    }

    /// All key labels joined with `/`.
    pub fn keys_label(&self) -> String {
        self.keys
            .iter()
            .map(KeyCombination::label)
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// The binding table, grouped into legend rows.
///
/// Lookup walks every row in order, so the first matching binding wins.
#[derive(Debug, Clone)]
pub struct KeyMap {
    rows: Vec<Vec<Binding>>,
}

impl KeyMap {
    pub fn new(rows: Vec<Vec<Binding>>) -> Self {
        Self { rows }
    }

    /// Resolve a key press to an action.
    pub fn action_for(&self, event: &KeyEvent) -> Option<Action> {
        self.rows
            .iter()
            .flatten()
            .find(|binding| binding.matches(event))
            .map(|binding| binding.action)
    }

    /// Visible bindings, one inner vector per legend row.
    pub fn legend_rows(&self) -> Vec<Vec<&Binding>> {
        self.rows
            .iter()
            .map(|row| row.iter().filter(|b| !b.hidden).collect::<Vec<_>>())
            .filter(|row| !row.is_empty())
            .collect()
    }
}

impl Default for KeyMap {
    fn default() -> Self {
        use KeyCode::Char;
        let key = KeyCombination::new;
        let ctrl = KeyCombination::ctrl;

        Self::new(vec![
            vec![
                Binding::new(Action::Up, vec![key(KeyCode::Up), key(Char('k'))], "Up"),
                Binding::new(Action::Down, vec![key(KeyCode::Down), key(Char('j'))], "Down"),
                Binding::new(
                    Action::Activate,
                    vec![key(KeyCode::Enter), key(Char(' '))],
                    "Connect/Disconnect",
                ),
                Binding::new(Action::Scan, vec![key(Char('s'))], "Scan"),
                Binding::new(Action::Refresh, vec![key(Char('r'))], "Refresh"),
            ],
            vec![
                Binding::new(Action::Pair, vec![key(Char('p'))], "Pair"),
                Binding::new(Action::Disconnect, vec![key(Char('d'))], "Disconnect"),
                Binding::new(Action::Forget, vec![key(Char('x'))], "Forget"),
                Binding::new(Action::TogglePower, vec![key(Char('e'))], "Enable/Disable Bluetooth"),
                Binding::new(Action::FullRefresh, vec![ctrl(Char('r'))], "Full Refresh"),
                Binding::new(Action::Quit, vec![key(Char('q'))], "Quit"),
                Binding::new(Action::Quit, vec![ctrl(Char('c'))], "Quit").hidden(),
            ],
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn arrows_and_vim_keys_navigate() {
        let map = KeyMap::default();
        for code in [KeyCode::Up, KeyCode::Char('k')] {
            assert_eq!(map.action_for(&press(code, KeyModifiers::NONE)), Some(Action::Up));
        }
        for code in [KeyCode::Down, KeyCode::Char('j')] {
            assert_eq!(map.action_for(&press(code, KeyModifiers::NONE)), Some(Action::Down));
        }
    }

    #[test]
    fn ctrl_r_is_not_plain_r() {
        let map = KeyMap::default();
        assert_eq!(
            map.action_for(&press(KeyCode::Char('r'), KeyModifiers::NONE)),
            Some(Action::Refresh)
        );
        assert_eq!(
            map.action_for(&press(KeyCode::Char('r'), KeyModifiers::CONTROL)),
            Some(Action::FullRefresh)
        );
    }

    #[test]
    fn shift_does_not_block_plain_keys() {
        let map = KeyMap::default();
        assert_eq!(
            map.action_for(&press(KeyCode::Char('s'), KeyModifiers::SHIFT)),
            Some(Action::Scan)
        );
    }

    #[test]
    fn quit_keys() {
        let map = KeyMap::default();
        assert_eq!(
            map.action_for(&press(KeyCode::Char('q'), KeyModifiers::NONE)),
            Some(Action::Quit)
        );
        assert_eq!(
            map.action_for(&press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Action::Quit)
        );
        assert_eq!(map.action_for(&press(KeyCode::Char('c'), KeyModifiers::NONE)), None);
    }

    #[test]
    fn unbound_keys_resolve_to_nothing() {
        let map = KeyMap::default();
        assert_eq!(map.action_for(&press(KeyCode::Char('z'), KeyModifiers::NONE)), None);
        assert_eq!(map.action_for(&press(KeyCode::F(5), KeyModifiers::NONE)), None);
    }

    #[test]
    fn legend_skips_hidden_bindings() {
        let map = KeyMap::default();
        let rows = map.legend_rows();
        assert_eq!(rows.len(), 2);
        let quits: Vec<_> = rows[1].iter().filter(|b| b.action == Action::Quit).collect();
        assert_eq!(quits.len(), 1);
        assert_eq!(quits[0].keys_label(), "q");
    }

    #[test]
    fn labels() {
        let activate = Binding::new(
            Action::Activate,
            vec![KeyCombination::new(KeyCode::Enter), KeyCombination::new(KeyCode::Char(' '))],
            "Connect/Disconnect",
        );
        assert_eq!(activate.keys_label(), "Enter/Space");
        assert_eq!(KeyCombination::ctrl(KeyCode::Char('r')).label(), "Ctrl+r");
        assert_eq!(KeyCombination::new(KeyCode::Up).label(), "↑");
    }
}
