//! Process-wide bridge configuration.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// How to reach the bridge and how to pace what is sent to it.
///
/// Built once at startup and only read afterwards. Every field has a
/// default, so a JSON config file only needs the values it changes:
///
/// ```
/// use milight_rs::BridgeConfig;
///
/// let config: BridgeConfig = serde_json::from_str(r#"{"repeat": 3, "address": "10.0.0.5"}"#).unwrap();
/// assert_eq!(config.repeat, 3);
/// assert_eq!(config.port, 5987);
/// assert!(!config.discovery);
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    /// Number of times every command frame is sent.
    pub repeat: u32,
    /// Find the bridge with a broadcast instead of using `address`.
    pub discovery: bool,
    /// Bridge address, ignored when `discovery` is set.
    pub address: Ipv4Addr,
    /// Bridge UDP port.
    pub port: u16,
    /// Local UDP port shared by every protocol phase.
    pub local_port: u16,
    pub receive_timeout_ms: u64,
    /// Pause between repeats of the same frame.
    pub repeat_delay_ms: u64,
    /// Pause after each colour step of a spectrum animation.
    pub spectrum_step_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            repeat: 1,
            discovery: false,
            address: Ipv4Addr::new(192, 168, 1, 11),
            port: 5987,
            local_port: 55054,
            receive_timeout_ms: 2000,
            repeat_delay_ms: 10,
            spectrum_step_ms: 300,
        }
    }
}

impl BridgeConfig {
    /// Load a config from a JSON file; missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| Error::ConfigRead {
            path: path.to_path_buf(),
            err,
        })?;
        serde_json::from_str(&raw).map_err(Error::ConfigLoad)
    }

    /// Configured bridge address and port.
    pub fn bridge_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.address, self.port))
    }

    /// Frames sent per command; never less than one.
    pub fn repeats(&self) -> u32 {
        self.repeat.max(1)
    }

    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }

    pub fn repeat_delay(&self) -> Duration {
        Duration::from_millis(self.repeat_delay_ms)
    }

    pub fn spectrum_step(&self) -> Duration {
        Duration::from_millis(self.spectrum_step_ms)
    }
}
