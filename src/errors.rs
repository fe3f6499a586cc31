use std::path::PathBuf;

use crate::types::DeviceType;

/// All error types that can occur when talking to a MiLight bridge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The device type is not one of 0, 1, 7 or 8.
    #[error("invalid device {0}; device can be any of 0, 1, 7 or 8")]
    InvalidDevice(i64),

    /// The zone is outside 0-4.
    #[error("invalid zone {0}; zone can be any of 0, 1, 2, 3 or 4")]
    InvalidZone(i64),

    /// The command token is not a known command.
    #[error("unknown command {0:?}")]
    UnknownCommand(String),

    /// A command that needs a value was given none.
    #[error("no value given for {command}; expected {expected}")]
    MissingArgument {
        command: String,
        expected: &'static str,
    },

    /// A command argument could not be parsed, or was not expected.
    #[error("invalid argument for {command}: {reason}")]
    InvalidArgument { command: String, reason: String },

    /// Failed to parse a [`crate::Color`] from a hex string.
    #[error("invalid color {0:?}; expected a hex color such as \"#ff0000\" or \"f00\"")]
    InvalidColorFormat(String),

    /// The command exists but the device family does not support it.
    #[error("{command} is not supported by device type {device}")]
    UnsupportedCommandForDevice {
        command: String,
        device: DeviceType,
    },

    /// The command is an animation and has no single payload.
    #[error("{0} is an animation and cannot be encoded as a single payload")]
    Animation(String),

    /// No bridge answered the discovery broadcast.
    #[error("bridge discovery did not return any results after {attempts} attempts")]
    DiscoveryFailed { attempts: u32 },

    /// The bridge never returned a session id.
    #[error("did not receive the expected session response from the bridge after {attempts} attempts")]
    HandshakeFailed { attempts: u32 },

    /// The bridge never returned the session password.
    #[error("could not retrieve the session password from the bridge after {attempts} attempts")]
    PasswordRetrievalFailed { attempts: u32 },

    /// A network socket operation failed while communicating with the bridge.
    #[error("socket {action} error: {err:?}")]
    Socket { action: String, err: std::io::Error },

    /// The configuration file could not be read.
    #[error("failed to read config {path:?}: {err:?}")]
    ConfigRead { path: PathBuf, err: std::io::Error },

    /// The configuration file is not valid JSON for [`crate::BridgeConfig`].
    #[error("failed to load config: {0:?}")]
    ConfigLoad(serde_json::Error),
}

impl Error {
    /// Create a new socket error
    pub fn socket(action: &str, err: std::io::Error) -> Self {
        Error::Socket {
            action: action.to_string(),
            err,
        }
    }

    /// Create a new missing argument error
    pub fn missing_argument(command: &str, expected: &'static str) -> Self {
        Error::MissingArgument {
            command: command.to_string(),
            expected,
        }
    }

    /// Create a new invalid argument error
    pub fn invalid_argument(command: &str, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            command: command.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a new unsupported command error
    pub fn unsupported(command: impl ToString, device: DeviceType) -> Self {
        Error::UnsupportedCommandForDevice {
            command: command.to_string(),
            device,
        }
    }

    /// True for errors caused by user input, detected before any network I/O.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidDevice(_)
                | Error::InvalidZone(_)
                | Error::UnknownCommand(_)
                | Error::MissingArgument { .. }
                | Error::InvalidArgument { .. }
                | Error::InvalidColorFormat(_)
                | Error::UnsupportedCommandForDevice { .. }
                | Error::Animation(_)
                | Error::ConfigRead { .. }
                | Error::ConfigLoad(_)
        )
    }

    /// True when one of the handshake phases exhausted its attempts.
    pub fn is_negotiation_failure(&self) -> bool {
        matches!(
            self,
            Error::DiscoveryFailed { .. }
                | Error::HandshakeFailed { .. }
                | Error::PasswordRetrievalFailed { .. }
        )
    }
}

/// Hacky implementation of PartialEq for testing
#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}
