use crate::keymap::KeyMap;
use crate::msg::{Action, Msg};
use crate::ops::{Operation, Tasks, DEFAULT_SETTLE_DELAY};
use crate::view::Theme;
use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use hyprbt_core::{terminal_events, Command, Model, Subscription, TerminalEvent};
use hyprbt_ctl::{AdapterError, Bluetoothctl, Device};
use ratatui::Frame;
use std::time::Duration;
use tracing::{debug, warn};

/// Startup data for [`App`].
#[derive(Debug, Clone)]
pub struct Flags {
    pub ctl: Bluetoothctl,
    pub settle_delay: Duration,
    pub theme: Theme,
    pub keymap: KeyMap,
}

impl Flags {
    pub fn new(ctl: Bluetoothctl) -> Self {
        Self {
            ctl,
            settle_delay: DEFAULT_SETTLE_DELAY,
            theme: Theme::default(),
            keymap: KeyMap::default(),
        }
    }
}

/// The device view model.
///
/// All state lives here and only [`App::handle`] changes it. Background
/// results arrive as [`Msg`]s in completion order; a later result simply
/// overwrites an earlier one.
#[derive(Debug)]
pub struct App {
    devices: Vec<Device>,
    cursor: usize,
    scanning: bool,
    /// `None` until the first power result, then never again.
    power: Option<bool>,
    error: Option<String>,
    theme: Theme,
    keymap: KeyMap,
    tasks: Tasks,
}

impl App {
    pub fn new(flags: Flags) -> Self {
        Self {
            devices: Vec::new(),
            cursor: 0,
            scanning: false,
            power: None,
            error: None,
            theme: flags.theme,
            keymap: flags.keymap,
            tasks: Tasks {
                ctl: flags.ctl,
                settle_delay: flags.settle_delay,
            },
        }
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn scanning(&self) -> bool {
        self.scanning
    }

    /// Controller power, once known.
    pub fn power(&self) -> Option<bool> {
        self.power
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn keymap(&self) -> &KeyMap {
        &self.keymap
    }

    /// Apply one message and return the follow-up operation, if any.
    pub fn handle(&mut self, msg: Msg) -> Option<Operation> {
        match msg {
            Msg::Key(key) => {
                let action = self.keymap.action_for(&key)?;
                self.act(action)
            }
            Msg::Mouse(mouse) => {
                let action = self.action_for_mouse(&mouse)?;
                self.act(action)
            }
            // The next frame is drawn at the new size; nothing to store.
            Msg::Resize(..) => None,
            Msg::DevicesLoaded(devices) => {
                self.replace_devices(devices);
                None
            }
            Msg::ScanFinished(Ok(devices)) => {
                self.scanning = false;
                self.replace_devices(devices);
                None
            }
            Msg::ScanFinished(Err(err)) => {
                self.scanning = false;
                self.record(err);
                None
            }
            Msg::DeviceStatus { address, connected } => {
                match self.devices.iter_mut().find(|d| d.address == address) {
                    Some(device) => device.connected = connected,
                    None => debug!(%address, "status for a device no longer listed"),
                }
                Some(Operation::ListDevices)
            }
            Msg::PowerStatus { enabled, error } => {
                self.power = Some(enabled);
                match error {
                    None => Some(Operation::ListDevices),
                    Some(err) => {
                        self.record(err);
                        None
                    }
                }
            }
            Msg::ChainFinished { failure, devices } => {
                match devices {
                    Ok(devices) => self.replace_devices(devices),
                    Err(err) => self.record(err),
                }
                if let Some(err) = failure {
                    self.record(err);
                }
                None
            }
            Msg::Failed(err) => {
                self.record(err);
                None
            }
        }
    }

    fn act(&mut self, action: Action) -> Option<Operation> {
        let op = match action {
            Action::Up => {
                self.cursor = self.cursor.saturating_sub(1);
                None
            }
            Action::Down => {
                if self.cursor + 1 < self.devices.len() {
                    self.cursor += 1;
                }
                None
            }
            Action::Select(index) => {
                if index < self.devices.len() {
                    self.cursor = index;
                }
                None
            }
            Action::Activate => self.current().map(|device| {
                let address = device.address.clone();
                if device.connected {
                    Operation::Disconnect(address)
                } else if device.paired {
                    Operation::Connect(address)
                } else {
                    Operation::PairAndConnect(address)
                }
            }),
            Action::Disconnect => self
                .current()
                .filter(|d| d.connected)
                .map(|d| Operation::Disconnect(d.address.clone())),
            Action::Pair => self
                .current()
                .filter(|d| !d.paired)
                .map(|d| Operation::Pair(d.address.clone())),
            Action::Forget => self.current().map(|d| Operation::Forget(d.address.clone())),
            Action::Scan if self.scanning => None,
            Action::Scan => {
                self.scanning = true;
                Some(Operation::Scan)
            }
            Action::Refresh => Some(Operation::ListDevices),
            Action::FullRefresh => Some(Operation::FullRefresh),
            Action::TogglePower => self.power.map(|on| Operation::SetPower(!on)),
            Action::Quit => Some(Operation::Quit),
        };
        if op.is_some() {
            self.error = None;
        }
        op
    }

    fn action_for_mouse(&self, mouse: &MouseEvent) -> Option<Action> {
        match mouse.kind {
            MouseEventKind::ScrollUp => Some(Action::Up),
            MouseEventKind::ScrollDown => Some(Action::Down),
            MouseEventKind::Down(MouseButton::Left) => {
                if !self.shows_rows() {
                    return None;
                }
                let index = usize::from(mouse.row.checked_sub(self.list_top())?);
                (index < self.devices.len()).then_some(Action::Select(index))
            }
            _ => None,
        }
    }

    fn current(&self) -> Option<&Device> {
        self.devices.get(self.cursor)
    }

    fn replace_devices(&mut self, devices: Vec<Device>) {
        self.devices = devices;
        self.error = None;
        self.cursor = self.cursor.min(self.devices.len().saturating_sub(1));
    }

    fn record(&mut self, err: AdapterError) {
        warn!(subcommand = err.subcommand(), error = %err, "operation failed");
        self.error = Some(err.message().to_string());
    }
}

impl Model for App {
    type Message = Msg;
    type Flags = Flags;

    fn init(flags: Flags) -> (Self, Command<Msg>) {
        let app = App::new(flags);
        let cmd = Operation::FullRefresh.launch(&app.tasks);
        (app, cmd)
    }

    fn update(&mut self, msg: Msg) -> Command<Msg> {
        match self.handle(msg) {
            Some(op) => {
                debug!(?op, "launching");
                op.launch(&self.tasks)
            }
            None => Command::none(),
        }
    }

    fn view(&self, frame: &mut Frame) {
        self.render(frame);
    }

    fn subscriptions(&self) -> Vec<Subscription<Msg>> {
        vec![terminal_events(|event| {
            Some(match event {
                TerminalEvent::Key(key) => Msg::Key(key),
                TerminalEvent::Mouse(mouse) => Msg::Mouse(mouse),
                TerminalEvent::Resize(width, height) => Msg::Resize(width, height),
            })
        })]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use hyprbt_core::testing::TestProgram;
    use hyprbt_ctl::testing::ScriptedRunner;

    const HEADPHONES: &str = "AA:BB:CC:DD:EE:FF";
    const MOUSE: &str = "11:22:33:44:55:66";

    fn flags() -> Flags {
        Flags {
            settle_delay: Duration::ZERO,
            ..Flags::new(Bluetoothctl::new(ScriptedRunner::new()))
        }
    }

    fn app() -> App {
        App::new(flags())
    }

    fn key(code: KeyCode) -> Msg {
        Msg::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn mouse(kind: MouseEventKind, row: u16) -> Msg {
        Msg::Mouse(MouseEvent {
            kind,
            column: 4,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn click(row: u16) -> Msg {
        mouse(MouseEventKind::Down(MouseButton::Left), row)
    }

    fn two_devices() -> Vec<Device> {
        let mut headphones = Device::new(HEADPHONES, "Headphones");
        headphones.paired = true;
        headphones.connected = true;
        vec![headphones, Device::new(MOUSE, "Mouse")]
    }

    /// A real adapter error from a scripted failing listing.
    async fn error(stderr: &str) -> AdapterError {
        let runner = ScriptedRunner::new().fail("devices", stderr);
        Bluetoothctl::new(runner)
            .list_devices()
            .await
            .expect_err("scripted failure")
    }

    #[test]
    fn init_lists_devices_and_queries_power() {
        let prog = TestProgram::<App>::new(flags());
        assert_eq!(prog.spawned(), 2);
        assert!(prog.model().devices().is_empty());
        assert_eq!(prog.model().power(), None);
    }

    #[test]
    fn same_listing_twice_is_idempotent() {
        let mut app = app();
        app.handle(Msg::DevicesLoaded(two_devices()));
        app.handle(key(KeyCode::Down));
        let devices = app.devices().to_vec();
        let cursor = app.cursor();

        app.handle(Msg::DevicesLoaded(two_devices()));
        assert_eq!(app.devices(), devices.as_slice());
        assert_eq!(app.cursor(), cursor);
    }

    #[test]
    fn cursor_stays_in_bounds() {
        let mut app = app();
        app.handle(Msg::PowerStatus {
            enabled: true,
            error: None,
        });
        let top = app.list_top();

        let mut inputs = Vec::new();
        for i in 0..40u16 {
            inputs.push(match i % 7 {
                0 => key(KeyCode::Down),
                1 => key(KeyCode::Char('k')),
                2 => mouse(MouseEventKind::ScrollDown, 0),
                3 => mouse(MouseEventKind::ScrollUp, 0),
                4 => click(top + i % 5),
                5 => key(KeyCode::Char('j')),
                _ => click(i),
            });
        }

        for (step, input) in inputs.into_iter().enumerate() {
            if step % 9 == 0 {
                let len = step % 4;
                app.handle(Msg::DevicesLoaded(
                    (0..len)
                        .map(|n| Device::new(format!("00:00:00:00:00:0{n}"), "Dev"))
                        .collect(),
                ));
            }
            app.handle(input);
            let len = app.devices().len();
            if len == 0 {
                assert_eq!(app.cursor(), 0, "step {step}");
            } else {
                assert!(app.cursor() < len, "step {step}: {} >= {len}", app.cursor());
            }
        }
    }

    #[test]
    fn shrinking_list_clamps_cursor() {
        let mut app = app();
        app.handle(Msg::DevicesLoaded(two_devices()));
        app.handle(key(KeyCode::Down));
        assert_eq!(app.cursor(), 1);
        app.handle(Msg::DevicesLoaded(vec![Device::new(MOUSE, "Mouse")]));
        assert_eq!(app.cursor(), 0);
        app.handle(Msg::DevicesLoaded(vec![]));
        assert_eq!(app.cursor(), 0);
    }

    #[test]
    fn scan_is_not_reentrant() {
        let mut app = app();
        assert_eq!(app.handle(key(KeyCode::Char('s'))), Some(Operation::Scan));
        assert!(app.scanning());

        assert_eq!(app.handle(key(KeyCode::Char('s'))), None);
        assert!(app.scanning());

        app.handle(Msg::ScanFinished(Ok(two_devices())));
        assert!(!app.scanning());
        assert_eq!(app.devices().len(), 2);
    }

    #[test]
    fn listing_mid_scan_keeps_scan_blocked() {
        let mut app = app();
        assert_eq!(app.handle(key(KeyCode::Char('s'))), Some(Operation::Scan));
        app.handle(Msg::DevicesLoaded(vec![]));
        assert!(app.scanning());
        assert_eq!(app.handle(key(KeyCode::Char('s'))), None);

        app.handle(Msg::ChainFinished {
            failure: None,
            devices: Ok(two_devices()),
        });
        assert!(app.scanning());
        assert_eq!(app.handle(key(KeyCode::Char('s'))), None);

        app.handle(Msg::ScanFinished(Ok(two_devices())));
        assert_eq!(app.handle(key(KeyCode::Char('s'))), Some(Operation::Scan));
    }

    #[tokio::test]
    async fn failed_scan_clears_flag_and_reports() {
        let mut app = app();
        app.handle(key(KeyCode::Char('s')));
        app.handle(Msg::ScanFinished(Err(error("org.bluez.Error.NotReady").await)));
        assert!(!app.scanning());
        assert_eq!(app.error(), Some("failed to get devices: exit status 1, output: org.bluez.Error.NotReady"));
    }

    #[test]
    fn activate_depends_on_device_state() {
        let mut app = app();
        let mut paired = Device::new(MOUSE, "Mouse");
        paired.paired = true;
        let mut devices = two_devices();
        devices.push(paired);
        devices.push(Device::new("22:22:22:22:22:22", "Speaker"));
        app.handle(Msg::DevicesLoaded(devices));

        assert_eq!(
            app.handle(key(KeyCode::Enter)),
            Some(Operation::Disconnect(HEADPHONES.into()))
        );
        app.handle(key(KeyCode::Down));
        assert_eq!(
            app.handle(key(KeyCode::Char(' '))),
            Some(Operation::PairAndConnect(MOUSE.into()))
        );
        app.handle(key(KeyCode::Down));
        assert_eq!(app.handle(key(KeyCode::Enter)), Some(Operation::Connect(MOUSE.into())));
        app.handle(key(KeyCode::Down));
        assert_eq!(
            app.handle(key(KeyCode::Enter)),
            Some(Operation::PairAndConnect("22:22:22:22:22:22".into()))
        );
    }

    #[test]
    fn device_keys_on_empty_list_do_nothing() {
        let mut app = app();
        for code in ['d', 'p', 'x'] {
            assert_eq!(app.handle(key(KeyCode::Char(code))), None);
        }
        assert_eq!(app.handle(key(KeyCode::Enter)), None);
    }

    #[test]
    fn disconnect_and_pair_are_gated() {
        let mut app = app();
        app.handle(Msg::DevicesLoaded(two_devices()));
        assert_eq!(app.handle(key(KeyCode::Char('p'))), None);
        assert_eq!(
            app.handle(key(KeyCode::Char('d'))),
            Some(Operation::Disconnect(HEADPHONES.into()))
        );
        app.handle(key(KeyCode::Down));
        assert_eq!(app.handle(key(KeyCode::Char('d'))), None);
        assert_eq!(app.handle(key(KeyCode::Char('p'))), Some(Operation::Pair(MOUSE.into())));
        assert_eq!(app.handle(key(KeyCode::Char('x'))), Some(Operation::Forget(MOUSE.into())));
    }

    #[test]
    fn power_toggle_waits_for_first_status() {
        let mut app = app();
        assert_eq!(app.handle(key(KeyCode::Char('e'))), None);

        app.handle(Msg::PowerStatus {
            enabled: true,
            error: None,
        });
        assert_eq!(app.handle(key(KeyCode::Char('e'))), Some(Operation::SetPower(false)));

        app.handle(Msg::PowerStatus {
            enabled: false,
            error: None,
        });
        assert_eq!(app.handle(key(KeyCode::Char('e'))), Some(Operation::SetPower(true)));
    }

    #[tokio::test]
    async fn power_failure_records_error_without_refresh() {
        let mut app = app();
        let op = app.handle(Msg::PowerStatus {
            enabled: false,
            error: Some(error("no default controller").await),
        });
        assert_eq!(op, None);
        assert_eq!(app.power(), Some(false));
        assert!(app.error().is_some());
    }

    #[test]
    fn device_status_patches_then_refreshes() {
        let mut app = app();
        app.handle(Msg::DevicesLoaded(two_devices()));
        let op = app.handle(Msg::DeviceStatus {
            address: HEADPHONES.into(),
            connected: false,
        });
        assert_eq!(op, Some(Operation::ListDevices));
        assert!(!app.devices()[0].connected);

        let op = app.handle(Msg::DeviceStatus {
            address: "FF:FF:FF:FF:FF:FF".into(),
            connected: true,
        });
        assert_eq!(op, Some(Operation::ListDevices));
        assert_eq!(app.devices().len(), 2);
        assert!(app.devices()[1].address == MOUSE && !app.devices()[1].connected);
    }

    #[tokio::test]
    async fn errors_persist_until_an_action_runs() {
        let mut app = app();
        app.handle(Msg::DevicesLoaded(two_devices()));
        app.handle(Msg::Failed(error("boom").await));
        assert!(app.error().is_some());

        app.handle(key(KeyCode::Down));
        assert!(app.error().is_some(), "navigation keeps the error");
        app.handle(key(KeyCode::Char('z')));
        assert!(app.error().is_some(), "unbound keys keep the error");

        assert_eq!(app.handle(key(KeyCode::Char('r'))), Some(Operation::ListDevices));
        assert_eq!(app.error(), None);
    }

    #[tokio::test]
    async fn successful_listing_clears_error() {
        let mut app = app();
        app.handle(Msg::Failed(error("boom").await));
        app.handle(Msg::DevicesLoaded(vec![]));
        assert_eq!(app.error(), None);
    }

    #[tokio::test]
    async fn failed_chain_reports_after_refresh() {
        let mut app = app();
        app.handle(Msg::ChainFinished {
            failure: Some(error("pairing rejected").await),
            devices: Ok(two_devices()),
        });
        assert_eq!(app.devices().len(), 2);
        assert!(app.error().is_some());
    }

    #[test]
    fn quit_and_full_refresh() {
        let mut app = app();
        assert_eq!(app.handle(key(KeyCode::Char('q'))), Some(Operation::Quit));
        assert_eq!(
            app.handle(Msg::Key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL))),
            Some(Operation::FullRefresh)
        );
    }

    #[test]
    fn header_height_matches_flags() {
        let mut app = app();
        assert_eq!(app.list_top(), 2);
        app.handle(Msg::PowerStatus {
            enabled: true,
            error: None,
        });
        assert_eq!(app.list_top(), 3);
        app.handle(key(KeyCode::Char('s')));
        assert_eq!(app.list_top(), 5);
    }

    #[test]
    fn clicks_ignored_outside_rows_and_when_disabled() {
        let mut app = app();
        app.handle(Msg::DevicesLoaded(two_devices()));
        let top = app.list_top();

        app.handle(click(top + 1));
        assert_eq!(app.cursor(), 1);
        app.handle(click(0));
        assert_eq!(app.cursor(), 1);
        app.handle(click(top + 2));
        assert_eq!(app.cursor(), 1);

        app.handle(Msg::PowerStatus {
            enabled: false,
            error: None,
        });
        app.handle(click(app.list_top()));
        assert_eq!(app.cursor(), 1);
    }

    #[tokio::test]
    async fn error_line_fits_terminal_width() {
        let mut prog = TestProgram::<App>::new(flags());
        prog.send(Msg::Failed(error("a very long explanation of what went wrong").await));

        for width in [30u16, 45] {
            let screen = prog.render_string(width, 20);
            let line = screen
                .lines()
                .find(|l| l.starts_with("Error: "))
                .expect("error line rendered");
            assert!(line.ends_with('…'), "{line}");
            assert_eq!(line.chars().count(), usize::from(width));
        }
    }

    #[tokio::test]
    async fn multiline_output_stays_on_one_line() {
        let mut prog = TestProgram::<App>::new(flags());
        prog.send(Msg::Failed(error("Attempting to pair\nFailed to pair").await));
        let screen = prog.render_string(200, 20);
        assert!(
            screen.contains("output: Attempting to pair; Failed to pair"),
            "{screen}"
        );
    }

    #[test]
    fn end_to_end_power_listing_and_click() {
        let mut prog = TestProgram::<App>::new(flags());
        let spawned = prog.spawned();

        prog.send(Msg::PowerStatus {
            enabled: true,
            error: None,
        });
        assert_eq!(prog.spawned(), spawned + 1, "power result triggers a listing");
        assert!(prog.render_string(80, 24).contains("Bluetooth: ON"));

        prog.send(Msg::DevicesLoaded(two_devices()));
        assert_eq!(prog.model().cursor(), 0);

        let screen = prog.render_string(80, 24);
        let rows: Vec<&str> = screen.lines().collect();
        let top = usize::from(prog.model().list_top());
        assert!(rows[top].contains("Headphones"), "{screen}");
        assert!(rows[top].starts_with('>'));
        assert!(rows[top + 1].contains("Mouse"), "{screen}");

        prog.send(click(prog.model().list_top() + 1));
        assert_eq!(prog.model().cursor(), 1);
        let screen = prog.render_string(80, 24);
        assert!(screen.lines().nth(top + 1).is_some_and(|row| row.starts_with("> ○ Mouse")));
    }

    #[test]
    fn notices_replace_rows() {
        let mut prog = TestProgram::<App>::new(flags());
        assert!(prog.render_string(80, 24).contains("No devices found"));

        prog.send(Msg::DevicesLoaded(two_devices()));
        prog.send(Msg::PowerStatus {
            enabled: false,
            error: None,
        });
        let screen = prog.render_string(80, 24);
        assert!(screen.contains("Bluetooth is disabled"));
        assert!(screen.contains("Bluetooth: OFF"));
        assert!(!screen.contains("Headphones"));
    }

    #[test]
    fn legend_follows_key_map() {
        let prog = TestProgram::<App>::new(flags());
        let screen = prog.render_string(100, 30);
        assert!(screen.contains("Controls:"));
        assert!(screen.contains("Enter/Space: Connect/Disconnect"));
        assert!(screen.contains("Ctrl+r: Full Refresh"));
        assert!(screen.contains("x: Forget"));
        assert!(screen.contains("Status: ● Connected  ◐ Paired  ○ Unpaired"));
    }
}
