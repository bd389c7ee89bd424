//! Device records and the line parsers for `bluetoothctl` replies.
//!
//! All parsers are line-oriented and prefix-based. Unknown lines are skipped
//! and field order is irrelevant, so newer `bluetoothctl` releases that emit
//! extra fields keep working.

const YES: &str = "yes";

/// A Bluetooth device as last reported by `bluetoothctl`.
///
/// `address` is the stable key; everything else is refreshed wholesale on
/// every listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Device {
    /// Colon-separated hardware address, e.g. `AA:BB:CC:DD:EE:FF`.
    pub address: String,
    /// Advertised name. Empty when unknown.
    pub name: String,
    pub connected: bool,
    pub paired: bool,
    pub trusted: bool,
    /// Device category from the `Icon:` field, e.g. `audio-headset`.
    pub device_type: String,
}

impl Device {
    /// A device with the given address and name and every flag cleared.
    pub fn new(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Copy the status fields of an `info` reply onto this record.
    ///
    /// The name is kept: the listing's name is what the user saw first.
    pub(crate) fn merge_info(&mut self, info: Device) {
        self.connected = info.connected;
        self.paired = info.paired;
        self.trusted = info.trusted;
        self.device_type = info.device_type;
    }
}

/// Parse the reply of `bluetoothctl devices`.
///
/// Each relevant line has the shape `Device <MAC> <optional name>`. Blank
/// lines and lines whose first token is not `Device` are ignored.
pub fn parse_device_list(output: &str) -> Vec<Device> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let mut parts = line.splitn(3, ' ');
            if parts.next()? != "Device" {
                return None;
            }
            let address = parts.next()?;
            let name = parts.next().unwrap_or("");
            Some(Device::new(address, name))
        })
        .collect()
}

/// Parse the reply of `bluetoothctl info <address>`.
pub fn parse_device_info(address: &str, output: &str) -> Device {
    let mut device = Device::new(address, "");
    for line in output.lines().map(str::trim) {
        if let Some(value) = line.strip_prefix("Name: ") {
            device.name = value.to_string();
        } else if let Some(value) = line.strip_prefix("Connected: ") {
            device.connected = value == YES;
        } else if let Some(value) = line.strip_prefix("Paired: ") {
            device.paired = value == YES;
        } else if let Some(value) = line.strip_prefix("Trusted: ") {
            device.trusted = value == YES;
        } else if let Some(value) = line.strip_prefix("Icon: ") {
            device.device_type = value.to_string();
        }
    }
    device
}

/// Extract the `Powered:` field of `bluetoothctl show`.
///
/// Returns `None` when the reply has no such line.
pub fn parse_powered(output: &str) -> Option<bool> {
    output
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("Powered: "))
        .map(|value| value == YES)
}
