use log::warn;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::SystemTime;

use crate::adb::protocol::DEFAULT_FILE_MODE;

/// Device state as reported by the host server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceState {
    Online,
    Offline,
    Unauthorized,
    Disconnected,
    Unknown,
}

impl DeviceState {
    pub fn from_str(s: &str) -> Self {
        match s.trim() {
            "" => DeviceState::Disconnected,
            "device" => DeviceState::Online,
            "offline" => DeviceState::Offline,
            "unauthorized" => DeviceState::Unauthorized,
            _ => DeviceState::Unknown,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DeviceState::Online => "online",
            DeviceState::Offline => "offline",
            DeviceState::Unauthorized => "unauthorized",
            DeviceState::Disconnected => "disconnected",
            DeviceState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One line of `host:devices-l`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub serial: String,
    pub state: DeviceState,
    pub attrs: BTreeMap<String, String>,
}

impl DeviceInfo {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    pub fn model(&self) -> Option<&str> {
        self.attr("model")
    }

    pub fn product(&self) -> Option<&str> {
        self.attr("product")
    }

    pub fn usb(&self) -> Option<&str> {
        self.attr("usb")
    }

    pub fn transport_id(&self) -> Option<&str> {
        self.attr("transport_id")
    }

    pub fn is_usb(&self) -> bool {
        self.usb().map_or(false, |usb| !usb.is_empty())
    }
}

/// Parse `serial state key:value ...` lines; malformed lines are skipped.
pub fn parse_device_list(text: &str) -> Vec<DeviceInfo> {
    text.lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let serial = fields.next()?;
            let state = fields.next().unwrap_or("");
            let attrs = fields
                .filter_map(|pair| {
                    let (key, value) = pair.split_once(':')?;
                    Some((key.to_string(), value.to_string()))
                })
                .collect();

            Some(DeviceInfo {
                serial: serial.to_string(),
                state: DeviceState::from_str(state),
                attrs,
            })
        })
        .collect()
}

/// A forward or reverse endpoint such as `tcp:8080`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Port(String);

impl Port {
    pub fn tcp(port: u16) -> Self {
        Port(format!("tcp:{}", port))
    }

    /// A name in Android's abstract UNIX socket namespace.
    pub fn local_abstract(name: &str) -> Self {
        Port(format!("localabstract:{}", name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Port {
    fn from(s: &str) -> Self {
        Port(s.to_string())
    }
}

impl From<String> for Port {
    fn from(s: String) -> Self {
        Port(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceForward {
    pub serial: String,
    pub local: String,
    pub remote: String,
}

/// Parse `host:list-forward` output: `serial local remote` per line.
pub fn parse_forward_list(text: &str) -> Vec<DeviceForward> {
    text.lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [serial, local, remote, ..] => Some(DeviceForward {
                    serial: serial.to_string(),
                    local: local.to_string(),
                    remote: remote.to_string(),
                }),
                _ => None,
            }
        })
        .collect()
}

/// Parse `reverse:list-forward` output. Daemons print either
/// `local remote` or `serial local remote`; two-field lines are attributed
/// to `host`.
pub fn parse_reverse_list(text: &str) -> Vec<DeviceForward> {
    text.lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [] | [_] => None,
                [local, remote] => Some(DeviceForward {
                    serial: "host".to_string(),
                    local: local.to_string(),
                    remote: remote.to_string(),
                }),
                [serial, local, remote, rest @ ..] => {
                    if !rest.is_empty() {
                        warn!("unexpected reverse forward line: {:?}", line);
                    }
                    Some(DeviceForward {
                        serial: serial.to_string(),
                        local: local.to_string(),
                        remote: remote.to_string(),
                    })
                }
            }
        })
        .collect()
}

/// Options for pushing a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushOptions {
    /// Permission bits sent in the `SEND` request.
    pub mode: u32,
    /// Modification time applied on the device; `None` means now.
    pub mtime: Option<SystemTime>,
}

impl Default for PushOptions {
    fn default() -> Self {
        Self {
            mode: DEFAULT_FILE_MODE,
            mtime: None,
        }
    }
}

impl PushOptions {
    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_mtime(mut self, mtime: SystemTime) -> Self {
        self.mtime = Some(mtime);
        self
    }

    /// Seconds since the epoch, clamped into the 32-bit wire field.
    pub fn mtime_unix(&self) -> u32 {
        let when = self.mtime.unwrap_or_else(SystemTime::now);
        when.duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs().min(u64::from(u32::MAX)) as u32)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardOptions {
    /// Fail instead of replacing an existing forward on the same local port.
    pub no_rebind: bool,
}
