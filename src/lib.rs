//! # milight_rs
//!
//! An async Rust library for controlling MiLight / LimitlessLED v6 bridges
//! over UDP.
//!
//! The bridge relays commands over RF to bulbs grouped by device type and
//! zone. Before it accepts any command it requires a short session
//! handshake, which this crate performs on every connection:
//!
//! 1. optionally, a broadcast to discover the bridge's address,
//! 2. a request for a 2-byte session id,
//! 3. a request for a 2-byte session password.
//!
//! After that, every command is a 22-byte frame carrying a 7-byte payload.
//!
//! ## Quick Start
//!
//! ```ignore
//! use milight_rs::{Bridge, BridgeConfig, Color, Command, DeviceType, Zone};
//!
//! async fn living_room_red() -> Result<(), milight_rs::Error> {
//!     let mut bridge = Bridge::connect(BridgeConfig::default()).await?;
//!     let zone = Zone::create(1)?;
//!     bridge.execute(DeviceType::Rgbww, zone, &Command::On).await?;
//!     bridge
//!         .execute(DeviceType::Rgbww, zone, &Command::color(&Color::rgb(255, 0, 0)))
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Device types
//!
//! | id | [`DeviceType`] | family |
//! |----|----------------|--------|
//! | 0  | `Bridge`       | the lamp built into the bridge |
//! | 1  | `White`        | dual white bulbs |
//! | 7  | `Rgbw`         | RGBW bulbs |
//! | 8  | `Rgbww`        | RGB + CCT bulbs |
//!
//! Each family supports a different subset of [`Command`]s; see
//! [`map_command`].
//!
//! ## Runtime Selection
//!
//! This library is runtime-agnostic. Select your preferred runtime using
//! feature flags:
//!
//! - `runtime-tokio` (default): Use the tokio async runtime
//! - `runtime-async-std`: Use the async-std runtime
//! - `runtime-smol`: Use the smol runtime
//!
//! The `cli` feature (default) builds the `milight` binary.

mod bridge;
mod command;
mod config;
mod discovery;
mod errors;
mod frame;
mod negotiator;
mod payload;
pub mod runtime;
mod types;

// Re-export public API
pub use bridge::Bridge;
pub use command::{Command, map_command};
pub use config::BridgeConfig;
pub use discovery::{
    DISCOVERY_ATTEMPTS, DISCOVERY_PORT, DISCOVERY_TOKEN, DiscoveredBridge, discover_bridge,
};
pub use errors::Error;
pub use frame::{Frame, Session};
pub use negotiator::{HANDSHAKE_REQUEST, Negotiator, Phase, SessionState};
pub use payload::Payload;
pub use types::{Color, DeviceType, Zone, hex_to_hue, rgb_to_hue};
