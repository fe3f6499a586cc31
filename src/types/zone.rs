//! Zone addressing.

use std::fmt;

use crate::errors::Error;

/// A bulb group on the bridge, from 1 to 4. Zone 0 addresses all zones.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zone {
    pub(crate) value: u8,
}

impl Zone {
    const MAX: u8 = 4;

    /// Zone 0, which addresses every zone of a device type.
    pub const ALL: Zone = Zone { value: 0 };

    pub fn value(&self) -> u8 {
        self.value
    }

    /// Returns an error if value is outside the valid range (0-4).
    ///
    /// # Examples
    ///
    /// ```
    /// use milight_rs::Zone;
    ///
    /// assert_eq!(Zone::create(2).unwrap().value(), 2);
    /// assert!(Zone::create(5).is_err());
    /// assert!(Zone::create(-1).is_err());
    /// ```
    pub fn create(value: i64) -> Result<Self, Error> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= Self::MAX)
            .map(|value| Zone { value })
            .ok_or(Error::InvalidZone(value))
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}
