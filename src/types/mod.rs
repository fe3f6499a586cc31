//! Value types for bridge addressing and colours.

mod color;
mod device;
mod zone;

pub use color::{Color, hex_to_hue, rgb_to_hue};
pub use device::DeviceType;
pub use zone::Zone;
