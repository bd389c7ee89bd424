//! Startup configuration from the environment, and log setup.

use crate::app::Flags;
use crate::ops::DEFAULT_SETTLE_DELAY;
use anyhow::{anyhow, Context};
use hyprbt_ctl::{Bluetoothctl, SystemRunner, DEFAULT_SCAN_WINDOW};
use std::env;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

pub const ENV_BLUETOOTHCTL: &str = "HYPRBT_BLUETOOTHCTL";
pub const ENV_SCAN_SECS: &str = "HYPRBT_SCAN_SECS";
pub const ENV_SETTLE_MS: &str = "HYPRBT_SETTLE_MS";
pub const ENV_LOG: &str = "HYPRBT_LOG";

const DEFAULT_FILTER: &str = "hyprbt=info,hyprbt_core=info,hyprbt_ctl=info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bluetoothctl: PathBuf,
    pub scan_window: Duration,
    pub settle_delay: Duration,
    /// Logging is off when unset.
    pub log_file: Option<PathBuf>,
    /// Values that could not be parsed and were replaced by defaults.
    /// Reported once logging is up.
    pub rejected: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bluetoothctl: PathBuf::from("bluetoothctl"),
            scan_window: DEFAULT_SCAN_WINDOW,
            settle_delay: DEFAULT_SETTLE_DELAY,
            log_file: None,
            rejected: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Config::default();

        if let Some(path) = get(ENV_BLUETOOTHCTL) {
            config.bluetoothctl = PathBuf::from(path);
        }
        if let Some(raw) = get(ENV_SCAN_SECS) {
            match parse::<u64>(ENV_SCAN_SECS, &raw) {
                Ok(secs) => config.scan_window = Duration::from_secs(secs),
                Err(issue) => config.rejected.push(issue),
            }
        }
        if let Some(raw) = get(ENV_SETTLE_MS) {
            match parse::<u64>(ENV_SETTLE_MS, &raw) {
                Ok(ms) => config.settle_delay = Duration::from_millis(ms),
                Err(issue) => config.rejected.push(issue),
            }
        }
        config.log_file = get(ENV_LOG).map(PathBuf::from);
        config
    }
}

fn parse<T: FromStr>(key: &str, raw: &str) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|err| format!("ignoring {key}={raw:?}: {err}"))
}

impl From<&Config> for Flags {
    fn from(config: &Config) -> Self {
        let ctl = Bluetoothctl::new(SystemRunner::new(&config.bluetoothctl))
            .with_scan_window(config.scan_window);
        Flags {
            settle_delay: config.settle_delay,
            ..Flags::new(ctl)
        }
    }
}

/// Send tracing output to `path`. The terminal belongs to the UI, so without
/// a path nothing is installed and events are dropped.
///
/// The filter comes from `RUST_LOG` when set.
pub fn init_logging(path: Option<&Path>) -> anyhow::Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow!("installing log subscriber: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config(&[]);
        assert_eq!(config, Config::default());
        assert_eq!(config.scan_window, Duration::from_secs(5));
        assert_eq!(config.settle_delay, Duration::from_millis(1000));
    }

    #[test]
    fn reads_every_variable() {
        let config = config(&[
            (ENV_BLUETOOTHCTL, "/usr/local/bin/bluetoothctl"),
            (ENV_SCAN_SECS, "10"),
            (ENV_SETTLE_MS, " 250 "),
            (ENV_LOG, "/tmp/hyprbt.log"),
        ]);
        assert_eq!(config.bluetoothctl, PathBuf::from("/usr/local/bin/bluetoothctl"));
        assert_eq!(config.scan_window, Duration::from_secs(10));
        assert_eq!(config.settle_delay, Duration::from_millis(250));
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/hyprbt.log")));
        assert!(config.rejected.is_empty());
    }

    #[test]
    fn bad_numbers_fall_back() {
        let config = config(&[(ENV_SCAN_SECS, "soon"), (ENV_SETTLE_MS, "-5")]);
        assert_eq!(config.scan_window, DEFAULT_SCAN_WINDOW);
        assert_eq!(config.settle_delay, DEFAULT_SETTLE_DELAY);
        assert_eq!(config.rejected.len(), 2);
        assert!(config.rejected[0].starts_with("ignoring HYPRBT_SCAN_SECS=\"soon\""));
    }

    #[test]
    fn empty_values_are_unset() {
        let config = config(&[(ENV_LOG, ""), (ENV_BLUETOOTHCTL, "  ")]);
        assert_eq!(config.log_file, None);
        assert_eq!(config.bluetoothctl, PathBuf::from("bluetoothctl"));
    }

    #[test]
    fn flags_carry_timings() {
        let config = config(&[(ENV_SCAN_SECS, "2"), (ENV_SETTLE_MS, "0")]);
        let flags = Flags::from(&config);
        assert_eq!(flags.ctl.scan_window(), Duration::from_secs(2));
        assert_eq!(flags.settle_delay, Duration::ZERO);
    }

    #[test]
    fn no_log_path_installs_nothing() {
        assert!(init_logging(None).is_ok());
    }
}
