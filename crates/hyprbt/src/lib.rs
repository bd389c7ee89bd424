//! Terminal Bluetooth device manager.
//!
//! [`App`] is the view model. It runs on the [`hyprbt_core`] runtime and
//! drives `bluetoothctl` through [`hyprbt_ctl`]. Input is resolved through a
//! [`KeyMap`](keymap::KeyMap), background work is described by
//! [`Operation`](ops::Operation)s, and [`view`] renders the whole screen from
//! the model alone.

pub mod app;
pub mod config;
pub mod keymap;
pub mod msg;
pub mod ops;
pub mod view;

pub use app::{App, Flags};
pub use config::Config;
pub use msg::{Action, Msg};
