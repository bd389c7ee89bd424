use crate::device::{parse_device_info, parse_device_list, parse_powered, Device};
use crate::error::AdapterError;
use crate::runner::{CommandRunner, SystemRunner};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default length of the discovery window used by [`Bluetoothctl::scan_devices`].
pub const DEFAULT_SCAN_WINDOW: Duration = Duration::from_secs(5);

/// High-level device operations on top of `bluetoothctl`.
///
/// Each method maps to one or a few subprocess invocations and parses the
/// reply. The adapter holds no device state; cloning it is cheap and every
/// clone drives the same runner.
///
/// # Example
///
/// ```rust,ignore
/// let ctl = Bluetoothctl::system();
/// for device in ctl.list_devices().await? {
///     println!("{} {}", device.address, device.name);
/// }
/// ```
#[derive(Clone)]
pub struct Bluetoothctl {
    runner: Arc<dyn CommandRunner>,
    scan_window: Duration,
}

impl Bluetoothctl {
    /// Drive the tool through `runner`.
    pub fn new(runner: impl CommandRunner + 'static) -> Self {
        Self {
            runner: Arc::new(runner),
            scan_window: DEFAULT_SCAN_WINDOW,
        }
    }

    /// Drive the `bluetoothctl` found on `PATH`.
    pub fn system() -> Self {
        Self::new(SystemRunner::default())
    }

    /// Override how long [`scan_devices`](Self::scan_devices) keeps discovery on.
    pub fn with_scan_window(mut self, window: Duration) -> Self {
        self.scan_window = window;
        self
    }

    pub fn scan_window(&self) -> Duration {
        self.scan_window
    }

    /// All devices known to the controller, in the tool's order.
    ///
    /// Each device is enriched with an `info` query. A device whose `info`
    /// query fails keeps its default flags; only a failure of the listing
    /// itself fails the call.
    pub async fn list_devices(&self) -> Result<Vec<Device>, AdapterError> {
        let output = self.query(&["devices"], "failed to get devices").await?;
        let mut devices = parse_device_list(&output);
        for device in &mut devices {
            match self.device_info(&device.address).await {
                Ok(info) => device.merge_info(info),
                Err(err) => debug!(address = %device.address, error = %err, "info lookup failed"),
            }
        }
        Ok(devices)
    }

    /// Status of a single device.
    pub async fn device_info(&self, address: &str) -> Result<Device, AdapterError> {
        let output = self
            .query(&["info", address], "failed to get device info")
            .await?;
        Ok(parse_device_info(address, &output))
    }

    /// Turn discovery on for the scan window, turn it off, then list.
    pub async fn scan_devices(&self) -> Result<Vec<Device>, AdapterError> {
        self.invoke(&["scan", "on"], "failed to start scan").await?;
        tokio::time::sleep(self.scan_window).await;
        self.invoke(&["scan", "off"], "failed to stop scan").await?;
        self.list_devices().await
    }

    pub async fn connect(&self, address: &str) -> Result<(), AdapterError> {
        let context = format!("failed to connect to device {address}");
        self.invoke(&["connect", address], &context).await
    }

    pub async fn disconnect(&self, address: &str) -> Result<(), AdapterError> {
        let context = format!("failed to disconnect from device {address}");
        self.invoke(&["disconnect", address], &context).await
    }

    pub async fn pair(&self, address: &str) -> Result<(), AdapterError> {
        let context = format!("failed to pair with device {address}");
        self.invoke(&["pair", address], &context).await
    }

    pub async fn trust(&self, address: &str) -> Result<(), AdapterError> {
        let context = format!("failed to trust device {address}");
        self.invoke(&["trust", address], &context).await
    }

    /// Forget a device: unpair it and drop it from the controller's list.
    pub async fn remove(&self, address: &str) -> Result<(), AdapterError> {
        let context = format!("failed to remove device {address}");
        self.invoke(&["remove", address], &context).await
    }

    pub async fn set_power(&self, enabled: bool) -> Result<(), AdapterError> {
        if enabled {
            self.invoke(&["power", "on"], "failed to enable bluetooth").await
        } else {
            self.invoke(&["power", "off"], "failed to disable bluetooth").await
        }
    }

    /// Whether the default controller is powered, from `bluetoothctl show`.
    pub async fn is_powered(&self) -> Result<bool, AdapterError> {
        let output = self
            .query(&["show"], "failed to get bluetooth status")
            .await?;
        parse_powered(&output)
            .ok_or_else(|| AdapterError::missing("show", "could not determine bluetooth status", &output))
    }

    /// Run a subcommand and return its stdout, failing on a nonzero exit.
    async fn query(&self, args: &[&str], context: &str) -> Result<String, AdapterError> {
        let subcommand = args.join(" ");
        debug!(%subcommand, "invoking bluetoothctl");
        let output = match self.runner.run(args).await {
            Ok(output) => output,
            Err(err) => {
                warn!(%subcommand, error = %err, "could not launch bluetoothctl");
                return Err(AdapterError::launch(&subcommand, context, &err));
            }
        };
        if !output.success() {
            warn!(%subcommand, status = %output.status(), "bluetoothctl failed");
            return Err(AdapterError::exit(
                &subcommand,
                context,
                output.status(),
                &output.combined(),
            ));
        }
        Ok(output.stdout)
    }

    async fn invoke(&self, args: &[&str], context: &str) -> Result<(), AdapterError> {
        self.query(args, context).await.map(drop)
    }
}

impl std::fmt::Debug for Bluetoothctl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bluetoothctl")
            .field("scan_window", &self.scan_window)
            .finish_non_exhaustive()
    }
}
