//! The seven command bytes carried by every frame.

use std::fmt;

/// A command payload to send to the bridge.
///
/// The layout is `[device, category, opcode-or-value, b3, b4, b5, zone]`.
/// Payloads are produced by [`crate::map_command`] and are immutable once
/// built.
///
/// # Examples
///
/// ```
/// use milight_rs::{map_command, Command, DeviceType, Payload, Zone};
///
/// let payload = map_command(DeviceType::White, Zone::create(0).unwrap(), &Command::DimUp).unwrap();
/// assert_eq!(payload, Payload::from([1, 0, 1, 0, 0, 0, 0]));
/// ```
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payload([u8; Payload::LEN]);

impl Payload {
    pub const LEN: usize = 7;

    /// Payload of the frame that asks the bridge for its session password.
    pub const PASSWORD_REQUEST: Payload = Payload([0, 1, 0, 0, 0, 0, 0]);

    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    pub fn device(&self) -> u8 {
        self.0[0]
    }

    pub fn category(&self) -> u8 {
        self.0[1]
    }

    pub fn value(&self) -> u8 {
        self.0[2]
    }

    pub fn zone(&self) -> u8 {
        self.0[6]
    }
}

impl From<[u8; Payload::LEN]> for Payload {
    fn from(bytes: [u8; Payload::LEN]) -> Self {
        Payload(bytes)
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}
