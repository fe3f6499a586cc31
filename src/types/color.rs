//! RGB colors and their conversion to the bridge's hue byte.

use crate::errors::Error;

/// An RGB color with red, green, and blue components (0-255 each).
///
/// The bridge's colour wheel only knows hue, so a `Color` is only ever
/// sent as [`Color::hue`]; saturation and value are discarded.
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub(crate) red: u8,
    pub(crate) green: u8,
    pub(crate) blue: u8,
}

impl Color {
    /// Create a color with the given RGB values.
    pub fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Create a color from arbitrary integers, clamping each channel to 0-255.
    ///
    /// # Examples
    ///
    /// ```
    /// use milight_rs::Color;
    ///
    /// assert_eq!(Color::clamped(300, -20, 128), Color::rgb(255, 0, 128));
    /// ```
    pub fn clamped(red: i64, green: i64, blue: i64) -> Self {
        let clamp = |v: i64| v.clamp(0, 255) as u8;
        Self::rgb(clamp(red), clamp(green), clamp(blue))
    }

    /// Parse a `#rgb` or `#rrggbb` hex color; the `#` is optional.
    ///
    /// # Examples
    ///
    /// ```
    /// use milight_rs::Color;
    ///
    /// assert_eq!(Color::from_hex("#ff8000").unwrap(), Color::rgb(255, 128, 0));
    /// assert_eq!(Color::from_hex("f80").unwrap(), Color::rgb(255, 136, 0));
    /// assert!(Color::from_hex("#ff00").is_err());
    /// ```
    pub fn from_hex(value: &str) -> Result<Self, Error> {
        let digits = value.strip_prefix('#').unwrap_or(value);
        let invalid = || Error::InvalidColorFormat(value.to_string());

        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let width = match digits.len() {
            3 => 1,
            6 => 2,
            _ => return Err(invalid()),
        };

        let mut channels = [0u8; 3];
        for (i, channel) in channels.iter_mut().enumerate() {
            let part = &digits[i * width..(i + 1) * width];
            let parsed = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
            // a single digit is a 0-15 channel: 0xf * 17 == 0xff
            *channel = if width == 1 { parsed * 17 } else { parsed };
        }

        Ok(Self::rgb(channels[0], channels[1], channels[2]))
    }

    pub fn red(&self) -> u8 {
        self.red
    }

    pub fn green(&self) -> u8 {
        self.green
    }

    pub fn blue(&self) -> u8 {
        self.blue
    }

    /// HSV hue of this color scaled to a single byte.
    ///
    /// Greyscale colors (including black and white) have hue 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use milight_rs::Color;
    ///
    /// assert_eq!(Color::rgb(255, 0, 0).hue(), 0);
    /// assert_eq!(Color::rgb(0, 255, 0).hue(), 85);
    /// assert_eq!(Color::rgb(0, 0, 255).hue(), 171);
    /// ```
    pub fn hue(&self) -> u8 {
        let r = f64::from(self.red) / 255.0;
        let g = f64::from(self.green) / 255.0;
        let b = f64::from(self.blue) / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        if max == min {
            return 0;
        }

        let range = max - min;
        let rc = (max - r) / range;
        let gc = (max - g) / range;
        let bc = (max - b) / range;

        let h = if r == max {
            bc - gc
        } else if g == max {
            2.0 + rc - bc
        } else {
            4.0 + gc - rc
        };
        let fraction = (h / 6.0).rem_euclid(1.0);

        ((fraction * 256.0).round() as u32 % 256) as u8
    }
}

/// Convert a hex color string to the bridge's hue byte.
pub fn hex_to_hue(value: &str) -> Result<u8, Error> {
    Color::from_hex(value).map(|color| color.hue())
}

/// Convert an RGB triple to the bridge's hue byte, clamping each channel to 0-255.
pub fn rgb_to_hue(red: i64, green: i64, blue: i64) -> u8 {
    Color::clamped(red, green, blue).hue()
}
