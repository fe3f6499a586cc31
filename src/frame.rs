//! Binary frame layout and session credentials.

use std::fmt;
use std::net::SocketAddr;

use crate::payload::Payload;

/// Credentials negotiated with the bridge for the lifetime of one process.
///
/// Only [`crate::Negotiator`] creates a session, so a frame can never be
/// built before the bridge has handed out a session id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: [u8; 2],
    password: [u8; 2],
    nonce: u8,
    bridge: SocketAddr,
}

impl Session {
    /// Password used until the bridge has returned the real one.
    pub const PASSWORD_SENTINEL: [u8; 2] = [0xFF, 0xFF];
    const INITIAL_NONCE: u8 = 1;

    pub(crate) fn new(id: [u8; 2], bridge: SocketAddr) -> Self {
        Session {
            id,
            password: Self::PASSWORD_SENTINEL,
            nonce: Self::INITIAL_NONCE,
            bridge,
        }
    }

    pub fn id(&self) -> [u8; 2] {
        self.id
    }

    pub fn password(&self) -> [u8; 2] {
        self.password
    }

    /// Nonce carried by the most recently built frame.
    pub fn nonce(&self) -> u8 {
        self.nonce
    }

    pub fn bridge(&self) -> SocketAddr {
        self.bridge
    }

    pub(crate) fn set_password(&mut self, password: [u8; 2]) {
        self.password = password;
    }

    /// Encode a payload into a frame, consuming one nonce tick.
    pub fn build_frame(&mut self, payload: &Payload) -> Frame {
        self.nonce = self.nonce.wrapping_add(1);

        let mut bytes = [0u8; Frame::LEN];
        bytes[..5].copy_from_slice(&[0x80, 0x00, 0x00, 0x00, 0x11]);
        bytes[5..7].copy_from_slice(&self.id);
        bytes[8] = self.nonce;
        bytes[10] = 0x31;
        bytes[11..13].copy_from_slice(&self.password);
        bytes[13..20].copy_from_slice(payload.as_bytes());
        bytes[Frame::CHECKSUM] = Frame::compute_checksum(&bytes);

        Frame(bytes)
    }
}

/// A 22-byte command frame:
///
/// ```text
/// 80 00 00 00 11 SID0 SID1 00 NONCE 00 31 PW0 PW1 P0 P1 P2 P3 P4 P5 P6 00 CHK
/// ```
///
/// The checksum is the sum, mod 256, of bytes 10 to 19 (the `0x31` marker,
/// the password and the payload).
///
/// # Examples
///
/// ```
/// use milight_rs::Frame;
///
/// let frame = Frame::from_bytes([
///     0x80, 0, 0, 0, 0x11, 0x0A, 0x0B, 0, 2, 0, 0x31, 0xFF, 0xFF, 8, 4, 1, 0, 0, 0, 1, 0, 0x3D,
/// ]);
/// assert!(frame.verify_checksum());
/// assert_eq!(frame.nonce(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame([u8; Frame::LEN]);

impl Frame {
    pub const LEN: usize = 22;
    const NONCE: usize = 8;
    const CHECKSUM: usize = 21;

    pub fn from_bytes(bytes: [u8; Frame::LEN]) -> Self {
        Frame(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; Frame::LEN] {
        &self.0
    }

    pub fn nonce(&self) -> u8 {
        self.0[Self::NONCE]
    }

    pub fn checksum(&self) -> u8 {
        self.0[Self::CHECKSUM]
    }

    pub fn session_id(&self) -> [u8; 2] {
        [self.0[5], self.0[6]]
    }

    pub fn payload(&self) -> Payload {
        let mut bytes = [0u8; Payload::LEN];
        bytes.copy_from_slice(&self.0[13..20]);
        Payload::from(bytes)
    }

    pub fn verify_checksum(&self) -> bool {
        Self::compute_checksum(&self.0) == self.checksum()
    }

    fn compute_checksum(bytes: &[u8; Frame::LEN]) -> u8 {
        bytes[10..20].iter().fold(0u8, |sum, b| sum.wrapping_add(*b))
    }
}

impl fmt::Display for Frame {
    /// Uppercase hex dump, one space between bytes.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}
