//! Bulb families understood by the bridge.

use std::fmt;

use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::errors::Error;

/// The bulb family (protocol generation) a command is addressed to.
///
/// Each family has its own opcode layout and supports a different subset
/// of commands; see [`crate::map_command`].
#[derive(Debug, Clone, Copy, EnumIter, PartialEq, Eq, Hash)]
pub enum DeviceType {
    /// The lamp built into the bridge itself.
    Bridge = 0,
    /// Dual white (CCT) bulbs.
    White = 1,
    /// RGBW bulbs.
    Rgbw = 7,
    /// RGB + CCT bulbs.
    Rgbww = 8,
}

impl DeviceType {
    /// Look up a device type by its numeric id.
    ///
    /// # Examples
    ///
    /// ```
    /// use milight_rs::DeviceType;
    ///
    /// assert_eq!(DeviceType::create(8).unwrap(), DeviceType::Rgbww);
    /// assert!(DeviceType::create(5).is_err());
    /// ```
    pub fn create(value: i64) -> Result<Self, Error> {
        DeviceType::iter()
            .find(|device| i64::from(device.id()) == value)
            .ok_or(Error::InvalidDevice(value))
    }

    pub fn id(&self) -> u8 {
        *self as u8
    }

    /// Rotation applied to a computed hue so that it lands on the same
    /// colour on this family's colour wheel.
    pub fn hue_offset(&self) -> u8 {
        match self {
            DeviceType::Bridge | DeviceType::White => 0,
            DeviceType::Rgbw => 26,
            DeviceType::Rgbww => 10,
        }
    }

    /// Rotate a device-agnostic hue onto this family's colour wheel.
    pub fn wheel_hue(&self, hue: u8) -> u8 {
        hue.wrapping_add(self.hue_offset())
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_accepts_only_known_families() {
        let known: Vec<i64> = (-1..=9)
            .filter(|v| DeviceType::create(*v).is_ok())
            .collect();
        assert_eq!(known, vec![0, 1, 7, 8]);
        assert_eq!(DeviceType::create(3), Err(Error::InvalidDevice(3)));
    }

    #[test]
    fn test_wheel_hue_wraps() {
        assert_eq!(DeviceType::Bridge.wheel_hue(200), 200);
        assert_eq!(DeviceType::White.wheel_hue(200), 200);
        assert_eq!(DeviceType::Rgbw.wheel_hue(240), 10);
        assert_eq!(DeviceType::Rgbww.wheel_hue(250), 4);
    }
}
