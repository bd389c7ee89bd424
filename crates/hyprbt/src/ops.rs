//! Adapter work launched by the model.
//!
//! [`App::update`](crate::app::App) decides *what* to do and returns at most
//! one [`Operation`]. [`Operation::launch`] turns it into a [`Command`] whose
//! futures call the adapter and report back with exactly one [`Msg`] each.
//! Adapter failures never escape a task: they become [`Msg::Failed`] or the
//! error half of a result message.

use crate::msg::Msg;
use hyprbt_core::Command;
use hyprbt_ctl::{AdapterError, Bluetoothctl};
use std::convert::identity;
use std::time::Duration;
use tracing::{debug, info};

/// Pause between trusting and connecting a freshly paired device.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1000);

/// A follow-up requested by an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    ListDevices,
    Scan,
    Connect(String),
    Disconnect(String),
    /// Pair, trust, wait, connect, then refresh.
    PairAndConnect(String),
    /// Pair, trust, then refresh.
    Pair(String),
    /// Remove the pairing, then refresh.
    Forget(String),
    SetPower(bool),
    PowerStatus,
    /// Listing and power query side by side.
    FullRefresh,
    Quit,
}

/// What background tasks need to run.
#[derive(Debug, Clone)]
pub struct Tasks {
    pub ctl: Bluetoothctl,
    pub settle_delay: Duration,
}

impl Operation {
    pub fn launch(self, tasks: &Tasks) -> Command<Msg> {
        let ctl = tasks.ctl.clone();
        match self {
            Operation::ListDevices => Command::perform(list_devices(ctl), identity),
            Operation::Scan => Command::perform(scan(ctl), identity),
            Operation::Connect(address) => Command::perform(connect(ctl, address), identity),
            Operation::Disconnect(address) => Command::perform(disconnect(ctl, address), identity),
            Operation::PairAndConnect(address) => Command::perform(
                pair_trust_connect(ctl, address, tasks.settle_delay),
                identity,
            ),
            Operation::Pair(address) => Command::perform(pair_trust(ctl, address), identity),
            Operation::Forget(address) => Command::perform(forget(ctl, address), identity),
            Operation::SetPower(enabled) => Command::perform(set_power(ctl, enabled), identity),
            Operation::PowerStatus => Command::perform(power_status(ctl), identity),
            Operation::FullRefresh => Command::batch([
                Command::perform(list_devices(ctl.clone()), identity),
                Command::perform(power_status(ctl), identity),
            ]),
            Operation::Quit => Command::quit(),
        }
    }
}

pub async fn list_devices(ctl: Bluetoothctl) -> Msg {
    match ctl.list_devices().await {
        Ok(devices) => Msg::DevicesLoaded(devices),
        Err(err) => Msg::Failed(err),
    }
}

pub async fn scan(ctl: Bluetoothctl) -> Msg {
    info!(window = ?ctl.scan_window(), "scanning");
    Msg::ScanFinished(ctl.scan_devices().await)
}

pub async fn connect(ctl: Bluetoothctl, address: String) -> Msg {
    match ctl.connect(&address).await {
        Ok(()) => Msg::DeviceStatus {
            address,
            connected: true,
        },
        Err(err) => Msg::Failed(err),
    }
}

pub async fn disconnect(ctl: Bluetoothctl, address: String) -> Msg {
    match ctl.disconnect(&address).await {
        Ok(()) => Msg::DeviceStatus {
            address,
            connected: false,
        },
        Err(err) => Msg::Failed(err),
    }
}

/// Pair, then trust and connect on success. Trust and connect are best
/// effort. Whatever happens, the chain ends with one listing.
pub async fn pair_trust_connect(ctl: Bluetoothctl, address: String, settle: Duration) -> Msg {
    let paired = ctl.pair(&address).await;
    if paired.is_ok() {
        best_effort("trust", ctl.trust(&address).await);
        tokio::time::sleep(settle).await;
        best_effort("connect", ctl.connect(&address).await);
    }
    conclude(&ctl, paired.err()).await
}

pub async fn pair_trust(ctl: Bluetoothctl, address: String) -> Msg {
    let paired = ctl.pair(&address).await;
    if paired.is_ok() {
        best_effort("trust", ctl.trust(&address).await);
    }
    conclude(&ctl, paired.err()).await
}

pub async fn forget(ctl: Bluetoothctl, address: String) -> Msg {
    let removed = ctl.remove(&address).await;
    conclude(&ctl, removed.err()).await
}

pub async fn set_power(ctl: Bluetoothctl, enabled: bool) -> Msg {
    match ctl.set_power(enabled).await {
        Ok(()) => Msg::PowerStatus {
            enabled,
            error: None,
        },
        Err(err) => Msg::PowerStatus {
            enabled: !enabled,
            error: Some(err),
        },
    }
}

pub async fn power_status(ctl: Bluetoothctl) -> Msg {
    match ctl.is_powered().await {
        Ok(enabled) => Msg::PowerStatus {
            enabled,
            error: None,
        },
        Err(err) => Msg::PowerStatus {
            enabled: false,
            error: Some(err),
        },
    }
}

/// Log and drop the failure of a step whose outcome the chain ignores.
fn best_effort(step: &str, result: Result<(), AdapterError>) {
    if let Err(err) = result {
        debug!(step, error = %err, "ignoring failed step");
    }
}

async fn conclude(ctl: &Bluetoothctl, failure: Option<AdapterError>) -> Msg {
    Msg::ChainFinished {
        failure,
        devices: ctl.list_devices().await,
    }
}
