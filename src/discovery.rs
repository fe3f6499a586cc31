//! Bridge discovery via UDP broadcast.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use log::{debug, warn};

use crate::errors::Error;
use crate::runtime::{self, AsyncUdpSocket};

type Result<T> = std::result::Result<T, Error>;

/// Token the bridge's WiFi module answers on its discovery port.
pub const DISCOVERY_TOKEN: &[u8] = b"HF-A11ASSISTHREAD";
pub const DISCOVERY_PORT: u16 = 48899;
/// Broadcasts sent before discovery gives up.
pub const DISCOVERY_ATTEMPTS: u32 = 4;

const REPLY_LEN: usize = 34;

/// A bridge that answered the discovery broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredBridge {
    /// IP address of the bridge
    pub ip: Ipv4Addr,
    /// MAC address reported by the bridge, if any
    pub mac: Option<String>,
}

impl DiscoveredBridge {
    /// Parse a discovery reply of the form `ip,mac,model`.
    ///
    /// Only replies of exactly 34 bytes whose first field is an IPv4
    /// address are accepted.
    ///
    /// # Examples
    ///
    /// ```
    /// use milight_rs::DiscoveredBridge;
    ///
    /// let reply = b"192.168.1.11,ACCF23ABCDEF,HF-LPB10";
    /// let bridge = DiscoveredBridge::from_reply(reply).unwrap();
    /// assert_eq!(bridge.ip.to_string(), "192.168.1.11");
    /// assert_eq!(bridge.mac.as_deref(), Some("ACCF23ABCDEF"));
    /// ```
    pub fn from_reply(reply: &[u8]) -> Option<Self> {
        if reply.len() != REPLY_LEN {
            return None;
        }
        let text = std::str::from_utf8(reply).ok()?;
        let mut fields = text.split(',');
        let ip = fields.next()?.trim().parse().ok()?;
        let mac = fields
            .next()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(String::from);
        Some(DiscoveredBridge { ip, mac })
    }
}

/// Broadcast the discovery token and return the first bridge to answer.
///
/// The socket is switched to broadcast mode for the duration of the call
/// only. Each broadcast waits up to `recv_timeout` for a reply; after
/// [`DISCOVERY_ATTEMPTS`] broadcasts discovery fails with
/// [`Error::DiscoveryFailed`].
pub async fn discover_bridge<S: AsyncUdpSocket>(
    socket: &S,
    recv_timeout: Duration,
) -> Result<DiscoveredBridge> {
    socket
        .set_broadcast(true)
        .map_err(|e| Error::socket("set_broadcast", e))?;

    let found = broadcast(socket, recv_timeout).await;

    if let Err(e) = socket.set_broadcast(false) {
        warn!("Failed to disable broadcast after discovery: {}", e);
    }

    found
}

async fn broadcast<S: AsyncUdpSocket>(
    socket: &S,
    recv_timeout: Duration,
) -> Result<DiscoveredBridge> {
    let target = SocketAddr::from((Ipv4Addr::BROADCAST, DISCOVERY_PORT));
    let mut buffer = [0u8; 64];

    for attempt in 1..=DISCOVERY_ATTEMPTS {
        socket
            .send_to(DISCOVERY_TOKEN, target)
            .await
            .map_err(|e| Error::socket("send_to", e))?;

        match runtime::timeout(recv_timeout, socket.recv_from(&mut buffer)).await {
            Ok(Ok((size, addr))) => match DiscoveredBridge::from_reply(&buffer[..size]) {
                Some(bridge) => {
                    debug!("Bridge discovered at {} (reply from {})", bridge.ip, addr);
                    return Ok(bridge);
                }
                None => debug!(
                    "Ignoring {} byte discovery reply from {} (attempt {}/{})",
                    size, addr, attempt, DISCOVERY_ATTEMPTS
                ),
            },
            Ok(Err(e)) => warn!("Discovery receive failed: {}", e),
            Err(_) => debug!(
                "No discovery reply (attempt {}/{})",
                attempt, DISCOVERY_ATTEMPTS
            ),
        }
    }

    Err(Error::DiscoveryFailed {
        attempts: DISCOVERY_ATTEMPTS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(text: &str) -> Vec<u8> {
        let mut bytes = text.as_bytes().to_vec();
        bytes.resize(REPLY_LEN, b'0');
        bytes
    }

    #[test]
    fn test_from_reply() {
        let bridge = DiscoveredBridge::from_reply(&reply("10.0.0.7,ACCF23000001,HF-")).unwrap();
        assert_eq!(bridge.ip, Ipv4Addr::new(10, 0, 0, 7));
        assert_eq!(bridge.mac.as_deref(), Some("ACCF23000001"));
    }

    #[test]
    fn test_from_reply_rejects_wrong_length() {
        assert!(DiscoveredBridge::from_reply(b"10.0.0.7,ACCF23000001,HF-LPB100").is_none());
        let mut long = reply("10.0.0.7,ACCF23000001,");
        long.push(b'0');
        assert!(DiscoveredBridge::from_reply(&long).is_none());
    }

    #[test]
    fn test_from_reply_rejects_bad_address() {
        assert!(DiscoveredBridge::from_reply(&reply("bridge.local,ACCF23000001,")).is_none());
        assert!(DiscoveredBridge::from_reply(&reply("300.1.1.1,ACCF23000001,")).is_none());
    }
}
