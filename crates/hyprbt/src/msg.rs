use crossterm::event::{KeyEvent, MouseEvent};
use hyprbt_ctl::{AdapterError, Device};

/// Everything that can reach [`App::update`](crate::app::App).
///
/// Input variants carry raw terminal events; the model maps them to
/// [`Action`]s itself, so hit-testing and key bindings live next to the state
/// they depend on. Result variants are produced by background tasks in
/// [`ops`](crate::ops), exactly one per task.
#[derive(Debug)]
pub enum Msg {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),

    /// A full listing finished.
    DevicesLoaded(Vec<Device>),
    /// A discovery window closed. Always ends with a fresh listing.
    ScanFinished(Result<Vec<Device>, AdapterError>),
    /// A connect or disconnect succeeded.
    DeviceStatus { address: String, connected: bool },
    /// Result of a power query or a power change.
    ///
    /// On failure `enabled` is the best guess of the current state: `false`
    /// for a failed query, the unchanged state for a failed toggle.
    PowerStatus {
        enabled: bool,
        error: Option<AdapterError>,
    },
    /// A multi-step chain (pair, pair+connect, forget) finished with its
    /// concluding refresh.
    ChainFinished {
        failure: Option<AdapterError>,
        devices: Result<Vec<Device>, AdapterError>,
    },
    /// A single operation failed.
    Failed(AdapterError),
}

/// User intents, after key bindings and mouse hit-testing are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Up,
    Down,
    /// Select the device at a list index.
    Select(usize),
    /// Connect, disconnect or pair the current device depending on its state.
    Activate,
    Disconnect,
    Pair,
    Forget,
    Scan,
    Refresh,
    FullRefresh,
    TogglePower,
    Quit,
}
