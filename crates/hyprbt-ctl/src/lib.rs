//! `bluetoothctl` adapter for **hyprbt**.
//!
//! This crate turns high-level device intents into `bluetoothctl`
//! subprocess invocations and parses the line-oriented replies into typed
//! [`Device`] records. It never holds UI state.
//!
//! # Key types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Bluetoothctl`] | The adapter: list, scan, connect, pair, trust, remove, power |
//! | [`Device`] | One device record keyed by hardware address |
//! | [`AdapterError`] | The single failure kind for every operation |
//! | [`CommandRunner`] | Seam between the adapter and the operating system |
//! | [`ScriptedRunner`](testing::ScriptedRunner) | Fake runner for tests |
//!
//! Every operation is `async` and performs its subprocess calls sequentially.
//! Callers are expected to run operations as background tasks; nothing here
//! touches the terminal.

pub mod bluetoothctl;
pub mod device;
pub mod error;
pub mod runner;
pub mod testing;

pub use bluetoothctl::{Bluetoothctl, DEFAULT_SCAN_WINDOW};
pub use device::{parse_device_info, parse_device_list, parse_powered, Device};
pub use error::AdapterError;
pub use runner::{CommandOutput, CommandRunner, SystemRunner};
