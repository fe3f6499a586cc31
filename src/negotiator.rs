//! Session establishment with the bridge.
//!
//! Every run negotiates a fresh session in up to three phases, all over
//! the same socket:
//!
//! 1. optional broadcast discovery of the bridge address,
//! 2. a fixed handshake datagram answered with a 2-byte session id,
//! 3. a password request frame answered with a 2-byte session password.
//!
//! Each phase has a hard attempt ceiling and fails with its own error.
//! There is no retry across phases.

use std::fmt;
use std::net::{SocketAddr, SocketAddrV4};

use log::{debug, warn};

use crate::bridge::Bridge;
use crate::config::BridgeConfig;
use crate::discovery;
use crate::errors::Error;
use crate::frame::Session;
use crate::payload::Payload;
use crate::runtime::{self, AsyncUdpSocket};

type Result<T> = std::result::Result<T, Error>;

/// Datagram that opens a session.
pub const HANDSHAKE_REQUEST: [u8; 27] = [
    0x20, 0x00, 0x00, 0x00, 0x16, 0x02, 0x62, 0x3A, 0xD5, 0xED, 0xA3, 0x01, 0xAE, 0x08, 0x2D, 0x46,
    0x61, 0x41, 0xA7, 0xF6, 0xDC, 0xAF, 0xD3, 0xE6, 0x00, 0x00, 0x1E,
];

const SESSION_REPLY_PREFIX: [u8; 5] = [0x28, 0x00, 0x00, 0x00, 0x11];
const SESSION_ID_OFFSET: usize = 19;
const PASSWORD_REPLY_PREFIX: [u8; 5] = [0x80, 0x00, 0x00, 0x00, 0x15];
const PASSWORD_OFFSET: usize = 16;

const RECV_BUFFER: usize = 64;

/// The handshake phase a negotiation was in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Discovery,
    SessionId,
    SessionPassword,
}

/// Where a negotiation currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Discovering,
    AwaitingSessionId,
    AwaitingSessionPassword,
    Ready,
    Aborted(Phase),
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Aborted(phase) => write!(f, "Aborted({:?})", phase),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Drives the handshake and hands out a ready [`Bridge`].
///
/// The negotiator owns the socket. If any phase fails, the socket is
/// dropped, and thereby closed, before the error is returned.
pub struct Negotiator<S> {
    socket: S,
    config: BridgeConfig,
    state: SessionState,
}

impl<S: AsyncUdpSocket> Negotiator<S> {
    /// Handshake and password requests sent before giving up.
    pub const ATTEMPTS: u32 = 4;
    /// Receives per password request.
    pub const PASSWORD_RECEIVES: u32 = 2;

    pub fn new(socket: S, config: BridgeConfig) -> Self {
        Negotiator {
            socket,
            config,
            state: SessionState::Idle,
        }
    }

    /// Run every phase in order and return a bridge ready for commands.
    pub async fn run(mut self) -> Result<Bridge<S>> {
        let bridge_addr = if self.config.discovery {
            self.transition(SessionState::Discovering);
            let timeout = self.config.receive_timeout();
            let found = match discovery::discover_bridge(&self.socket, timeout).await {
                Ok(found) => found,
                Err(e) => return Err(self.abort(Phase::Discovery, e)),
            };
            SocketAddr::V4(SocketAddrV4::new(found.ip, self.config.port))
        } else {
            self.config.bridge_addr()
        };

        self.transition(SessionState::AwaitingSessionId);
        let id = match self.request_session_id(bridge_addr).await {
            Ok(id) => id,
            Err(e) => return Err(self.abort(Phase::SessionId, e)),
        };
        debug!(
            "Communicating with bridge at {}, identified by ID {:02X} {:02X}",
            bridge_addr, id[0], id[1]
        );

        let mut session = Session::new(id, bridge_addr);
        self.transition(SessionState::AwaitingSessionPassword);
        let password = match self.request_password(&mut session).await {
            Ok(password) => password,
            Err(e) => return Err(self.abort(Phase::SessionPassword, e)),
        };
        debug!(
            "Found bridge password to be {:02} {:02}",
            password[0], password[1]
        );
        session.set_password(password);

        self.transition(SessionState::Ready);
        Ok(Bridge::new(self.socket, session, self.config))
    }

    async fn request_session_id(&self, bridge: SocketAddr) -> Result<[u8; 2]> {
        for attempt in 1..=Self::ATTEMPTS {
            self.send(&HANDSHAKE_REQUEST, bridge).await?;

            match self.receive().await {
                Some(reply) => {
                    if let Some(id) =
                        extract(&reply, &SESSION_REPLY_PREFIX, SESSION_ID_OFFSET)
                    {
                        return Ok(id);
                    }
                    debug!(
                        "Unexpected session reply {:02X?} (attempt {}/{})",
                        reply,
                        attempt,
                        Self::ATTEMPTS
                    );
                }
                None => debug!(
                    "No session reply (attempt {}/{})",
                    attempt,
                    Self::ATTEMPTS
                ),
            }
        }

        Err(Error::HandshakeFailed {
            attempts: Self::ATTEMPTS,
        })
    }

    async fn request_password(&self, session: &mut Session) -> Result<[u8; 2]> {
        for attempt in 1..=Self::ATTEMPTS {
            let frame = session.build_frame(&Payload::PASSWORD_REQUEST);
            self.send(frame.as_bytes(), session.bridge()).await?;

            for _ in 0..Self::PASSWORD_RECEIVES {
                match self.receive().await {
                    Some(reply) => {
                        if let Some(password) =
                            extract(&reply, &PASSWORD_REPLY_PREFIX, PASSWORD_OFFSET)
                        {
                            return Ok(password);
                        }
                        debug!("Unexpected password reply {:02X?}", reply);
                    }
                    None => debug!(
                        "No password reply (attempt {}/{})",
                        attempt,
                        Self::ATTEMPTS
                    ),
                }
            }
        }

        Err(Error::PasswordRetrievalFailed {
            attempts: Self::ATTEMPTS,
        })
    }

    async fn send(&self, buf: &[u8], target: SocketAddr) -> Result<()> {
        self.socket
            .send_to(buf, target)
            .await
            .map_err(|e| Error::socket("send_to", e))?;
        Ok(())
    }

    /// Wait for one datagram. Timeouts and receive errors both yield `None`.
    async fn receive(&self) -> Option<Vec<u8>> {
        let mut buffer = [0u8; RECV_BUFFER];
        match runtime::timeout(self.config.receive_timeout(), self.socket.recv_from(&mut buffer))
            .await
        {
            Ok(Ok((size, _))) => Some(buffer[..size].to_vec()),
            Ok(Err(e)) => {
                warn!("Receive from bridge failed: {}", e);
                None
            }
            Err(_) => None,
        }
    }

    fn transition(&mut self, next: SessionState) {
        debug!("Session state {} -> {}", self.state, next);
        self.state = next;
    }

    fn abort(&mut self, phase: Phase, err: Error) -> Error {
        self.transition(SessionState::Aborted(phase));
        err
    }
}

/// Two bytes at `offset` of a reply that starts with `prefix`.
fn extract(reply: &[u8], prefix: &[u8], offset: usize) -> Option<[u8; 2]> {
    if !reply.starts_with(prefix) {
        return None;
    }
    match reply.get(offset..offset + 2) {
        Some(&[a, b]) => Some([a, b]),
        _ => None,
    }
}
