//! User commands and their mapping onto bridge payloads.

use std::fmt;

use crate::errors::Error;
use crate::payload::Payload;
use crate::types::{Color, DeviceType, Zone};

type Result<T> = std::result::Result<T, Error>;

/// A lighting command, with any argument already clamped to its range.
///
/// Not every command is valid for every [`DeviceType`]; [`map_command`]
/// rejects the combinations the bulb family does not implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    On,
    Off,
    DimUp,
    DimDown,
    Night,
    /// Built-in animation mode, 1-9.
    Disco(u8),
    DiscoFaster,
    DiscoSlower,
    White,
    /// White temperature, 0-100.
    Temp(u8),
    /// Raw hue byte, sent without any device offset.
    Hue(u8),
    /// Saturation, 0-100.
    Saturation(u8),
    /// Brightness, 0-100.
    Brightness(u8),
    /// Device-agnostic hue byte; the device offset is applied when mapped.
    Color(u8),
    /// Walk every hue of the colour wheel.
    Spectrum,
}

impl Command {
    pub fn disco(mode: i64) -> Self {
        Command::Disco(mode.clamp(1, 9) as u8)
    }

    pub fn temp(value: i64) -> Self {
        Command::Temp(percent(value))
    }

    pub fn hue(value: i64) -> Self {
        Command::Hue(value.clamp(0, 255) as u8)
    }

    pub fn saturation(value: i64) -> Self {
        Command::Saturation(percent(value))
    }

    pub fn brightness(value: i64) -> Self {
        Command::Brightness(percent(value))
    }

    pub fn color(color: &Color) -> Self {
        Command::Color(color.hue())
    }

    /// Parse a command token and its positional arguments.
    ///
    /// The token is case-insensitive. Numeric arguments outside their range
    /// are clamped, not rejected.
    ///
    /// # Examples
    ///
    /// ```
    /// use milight_rs::Command;
    ///
    /// assert_eq!(Command::parse("bright", &["150"]).unwrap(), Command::Brightness(100));
    /// assert_eq!(Command::parse("DISCO5", &[] as &[&str]).unwrap(), Command::Disco(5));
    /// assert_eq!(Command::parse("COLOR", &["255", "0", "0"]).unwrap(), Command::Color(0));
    /// assert!(Command::parse("BRIGHT", &[] as &[&str]).is_err());
    /// ```
    pub fn parse<S: AsRef<str>>(name: &str, args: &[S]) -> Result<Self> {
        let token = name.to_ascii_uppercase();
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();

        let command = match token.as_str() {
            "ON" => Command::On,
            "OFF" => Command::Off,
            "DIMUP" => Command::DimUp,
            "DIMDOWN" => Command::DimDown,
            "NIGHT" => Command::Night,
            "DISCOFASTER" => Command::DiscoFaster,
            "DISCOSLOWER" => Command::DiscoSlower,
            "WHITE" => Command::White,
            "SPECTRUM" => Command::Spectrum,
            "TEMP" => return Ok(Command::temp(single_value(&token, &args, "0-100")?)),
            "HUE" => return Ok(Command::hue(single_value(&token, &args, "0-255")?)),
            "SATUR" => return Ok(Command::saturation(single_value(&token, &args, "0-100")?)),
            "BRIGHT" => return Ok(Command::brightness(single_value(&token, &args, "0-100")?)),
            "COLOR" => return parse_color(&token, &args),
            other => match other.strip_prefix("DISCO").and_then(leading_digit) {
                Some(mode) => Command::disco(mode),
                None => return Err(Error::UnknownCommand(name.to_string())),
            },
        };

        if let Some(extra) = args.first() {
            return Err(Error::invalid_argument(
                &token,
                format!("unexpected argument {extra:?}"),
            ));
        }
        Ok(command)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::On => write!(f, "ON"),
            Command::Off => write!(f, "OFF"),
            Command::DimUp => write!(f, "DIMUP"),
            Command::DimDown => write!(f, "DIMDOWN"),
            Command::Night => write!(f, "NIGHT"),
            Command::Disco(mode) => write!(f, "DISCO{mode}"),
            Command::DiscoFaster => write!(f, "DISCOFASTER"),
            Command::DiscoSlower => write!(f, "DISCOSLOWER"),
            Command::White => write!(f, "WHITE"),
            Command::Temp(v) => write!(f, "TEMP {v}"),
            Command::Hue(v) => write!(f, "HUE {v}"),
            Command::Saturation(v) => write!(f, "SATUR {v}"),
            Command::Brightness(v) => write!(f, "BRIGHT {v}"),
            Command::Color(hue) => write!(f, "COLOR (hue {hue})"),
            Command::Spectrum => write!(f, "SPECTRUM"),
        }
    }
}

fn percent(value: i64) -> u8 {
    value.clamp(0, 100) as u8
}

// the mode is the first character after DISCO; anything after it is ignored
fn leading_digit(rest: &str) -> Option<i64> {
    rest.chars().next()?.to_digit(10).map(i64::from)
}

fn integer(command: &str, arg: &str) -> Result<i64> {
    arg.trim()
        .parse()
        .map_err(|_| Error::invalid_argument(command, format!("{arg:?} is not an integer")))
}

fn single_value(command: &str, args: &[&str], expected: &'static str) -> Result<i64> {
    match args {
        [] => Err(Error::missing_argument(command, expected)),
        [value] => integer(command, value),
        [_, extra, ..] => Err(Error::invalid_argument(
            command,
            format!("unexpected argument {extra:?}"),
        )),
    }
}

fn parse_color(command: &str, args: &[&str]) -> Result<Command> {
    let color = match args {
        [hex] => Color::from_hex(hex)?,
        [r, g, b] => Color::clamped(integer(command, r)?, integer(command, g)?, integer(command, b)?),
        [] => {
            return Err(Error::missing_argument(
                command,
                "a hex color (\"#ff0000\") or red, green and blue values (255 0 0)",
            ));
        }
        _ => {
            return Err(Error::invalid_argument(
                command,
                format!("expected 1 or 3 values, got {}", args.len()),
            ));
        }
    };
    Ok(Command::color(&color))
}

/// One byte of a payload template.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Byte(u8),
    ZoneId,
    Arg,
}

use Slot::{Arg as A, Byte as B, ZoneId as Z};

/// The opcode table, keyed by (command, device).
///
/// `None` marks a combination the device family does not support.
fn template(command: &Command, device: DeviceType) -> Option<[Slot; Payload::LEN]> {
    use DeviceType::{Bridge, Rgbw, Rgbww, White};

    let slots = match (command, device) {
        (Command::On, Bridge) => [B(0), B(3), B(3), B(0), B(0), B(0), B(0)],
        (Command::On, White) => [B(1), B(0), B(7), B(0), B(0), B(0), Z],
        (Command::On, Rgbw) => [B(7), B(3), B(1), B(0), B(0), B(0), Z],
        (Command::On, Rgbww) => [B(8), B(4), B(1), B(0), B(0), B(0), Z],

        (Command::Off, Bridge) => [B(0), B(3), B(4), B(0), B(0), B(0), B(0)],
        (Command::Off, White) => [B(1), B(0), B(8), B(0), B(0), B(0), Z],
        (Command::Off, Rgbw) => [B(7), B(3), B(2), B(0), B(0), B(0), Z],
        (Command::Off, Rgbww) => [B(8), B(4), B(2), B(0), B(0), B(0), Z],

        (Command::DimUp, White) => [B(1), B(0), B(1), B(0), B(0), B(0), Z],
        (Command::DimDown, White) => [B(1), B(0), B(2), B(0), B(0), B(0), Z],

        (Command::Night, White) => [B(1), B(0), B(6), B(0), B(0), B(0), Z],
        (Command::Night, Rgbww) => [B(8), B(4), B(5), B(0), B(0), B(0), Z],

        (Command::DiscoFaster, Bridge) => [B(0), B(3), B(2), B(0), B(0), B(0), B(0)],
        (Command::DiscoFaster, Rgbw) => [B(7), B(3), B(3), B(0), B(0), B(0), Z],
        (Command::DiscoFaster, Rgbww) => [B(8), B(4), B(3), B(0), B(0), B(0), Z],

        (Command::DiscoSlower, Bridge) => [B(0), B(3), B(1), B(0), B(0), B(0), B(0)],
        (Command::DiscoSlower, Rgbw) => [B(7), B(3), B(4), B(0), B(0), B(0), Z],
        (Command::DiscoSlower, Rgbww) => [B(8), B(4), B(4), B(0), B(0), B(0), Z],

        (Command::Disco(_), Bridge) => [B(0), B(4), A, B(0), B(0), B(0), Z],
        (Command::Disco(_), Rgbw) => [B(7), B(4), A, B(0), B(0), B(0), Z],
        (Command::Disco(_), Rgbww) => [B(8), B(6), A, B(0), B(0), B(0), Z],

        (Command::White, Bridge) => [B(0), B(3), B(5), B(0), B(0), B(0), Z],
        (Command::White, Rgbww) => [B(8), B(5), B(64), B(0), B(0), B(0), Z],

        (Command::Temp(_), Rgbww) => [B(8), B(5), A, B(0), B(0), B(0), Z],
        (Command::Hue(_), Rgbww) => [B(8), B(1), A, A, A, A, Z],
        (Command::Saturation(_), Rgbww) => [B(8), B(2), A, B(0), B(0), B(0), Z],

        (Command::Brightness(_), Bridge) => [B(0), B(2), A, B(0), B(0), B(0), Z],
        (Command::Brightness(_), White) => [B(1), B(2), A, B(0), B(0), B(0), Z],
        (Command::Brightness(_), Rgbw) => [B(7), B(2), A, B(0), B(0), B(0), Z],
        (Command::Brightness(_), Rgbww) => [B(8), B(3), A, B(0), B(0), B(0), Z],

        (Command::Color(_), Bridge) => [B(0), B(1), A, A, A, A, Z],
        (Command::Color(_), White) => [B(1), B(1), A, A, A, A, Z],
        (Command::Color(_), Rgbw) => [B(7), B(1), A, A, A, A, Z],
        (Command::Color(_), Rgbww) => [B(8), B(1), A, A, A, A, Z],

        _ => return None,
    };
    Some(slots)
}

/// The value substituted into the template's argument slots.
fn argument(command: &Command, device: DeviceType) -> u8 {
    match *command {
        Command::Disco(mode) => mode,
        Command::Temp(v) | Command::Hue(v) | Command::Saturation(v) | Command::Brightness(v) => v,
        Command::Color(hue) => device.wheel_hue(hue),
        _ => 0,
    }
}

/// Translate a command for a device type and zone into its payload.
///
/// Fails with [`Error::UnsupportedCommandForDevice`] when the device family
/// does not implement the command, and with [`Error::Animation`] for
/// [`Command::Spectrum`], which is sent as a sequence of
/// [`Command::Color`] payloads by [`crate::Bridge::execute`].
///
/// # Examples
///
/// ```
/// use milight_rs::{map_command, Command, DeviceType, Zone};
///
/// let zone = Zone::create(2).unwrap();
/// let payload = map_command(DeviceType::Rgbww, zone, &Command::brightness(150)).unwrap();
/// assert_eq!(payload.as_bytes(), &[8, 3, 100, 0, 0, 0, 2]);
///
/// assert!(map_command(DeviceType::Rgbw, zone, &Command::Night).is_err());
/// ```
pub fn map_command(device: DeviceType, zone: Zone, command: &Command) -> Result<Payload> {
    if *command == Command::Spectrum {
        return Err(Error::Animation(command.to_string()));
    }

    let slots = template(command, device).ok_or_else(|| Error::unsupported(command, device))?;
    let value = argument(command, device);

    let mut bytes = [0u8; Payload::LEN];
    for (byte, slot) in bytes.iter_mut().zip(slots) {
        *byte = match slot {
            Slot::Byte(b) => b,
            Slot::ZoneId => zone.value(),
            Slot::Arg => value,
        };
    }
    Ok(Payload::from(bytes))
}
