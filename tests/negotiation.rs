//! Session negotiation and dispatch against an in-memory bridge.

use std::collections::VecDeque;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use milight_rs::runtime::AsyncUdpSocket;
use milight_rs::{
    Bridge, BridgeConfig, Command, DISCOVERY_PORT, DISCOVERY_TOKEN, DeviceType, Error,
    HANDSHAKE_REQUEST, Negotiator, Payload, Session, Zone,
};

const SESSION_ID: [u8; 2] = [0xA1, 0xB2];
const PASSWORD: [u8; 2] = [0x07, 0x2C];
const DISCOVERED_IP: Ipv4Addr = Ipv4Addr::new(10, 1, 2, 3);

/// How the fake answers one kind of request.
#[derive(Debug, Clone, Copy)]
enum Reply {
    Answer,
    Silent,
    /// Ignore the first `n` requests, then answer.
    AnswerAfter(u32),
    /// Answer with a datagram of the wrong shape.
    Garbage,
    /// Queue a late session reply ahead of every answer.
    StaleFirst,
}

#[derive(Debug, Clone, Copy)]
struct Behavior {
    discovery: Reply,
    session: Reply,
    password: Reply,
}

impl Behavior {
    fn healthy() -> Self {
        Behavior {
            discovery: Reply::Answer,
            session: Reply::Answer,
            password: Reply::Answer,
        }
    }
}

#[derive(Debug, Default)]
struct Traffic {
    discovery: Vec<SocketAddr>,
    handshakes: u32,
    password_requests: Vec<[u8; 22]>,
    commands: Vec<([u8; 22], SocketAddr)>,
    broadcast: Vec<bool>,
    receives: u32,
}

struct FakeBridge {
    behavior: Behavior,
    inbox: Mutex<VecDeque<Vec<u8>>>,
    traffic: Arc<Mutex<Traffic>>,
    closed: Arc<AtomicBool>,
    fail_broadcast_reset: bool,
}

#[derive(Clone)]
struct Probe {
    traffic: Arc<Mutex<Traffic>>,
    closed: Arc<AtomicBool>,
}

impl Probe {
    fn traffic(&self) -> std::sync::MutexGuard<'_, Traffic> {
        self.traffic.lock().unwrap()
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl FakeBridge {
    fn new(behavior: Behavior) -> (Self, Probe) {
        let probe = Probe {
            traffic: Arc::new(Mutex::new(Traffic::default())),
            closed: Arc::new(AtomicBool::new(false)),
        };
        let bridge = FakeBridge {
            behavior,
            inbox: Mutex::new(VecDeque::new()),
            traffic: probe.traffic.clone(),
            closed: probe.closed.clone(),
            fail_broadcast_reset: false,
        };
        (bridge, probe)
    }

    fn respond(&self, reply: Reply, count: u32, answer: Vec<u8>) {
        let mut inbox = self.inbox.lock().unwrap();
        let datagram = match reply {
            Reply::Answer => Some(answer),
            Reply::StaleFirst => {
                inbox.push_back(session_reply());
                Some(answer)
            }
            Reply::AnswerAfter(n) if count > n => Some(answer),
            Reply::AnswerAfter(_) | Reply::Silent => None,
            Reply::Garbage => Some(vec![0x28, 0x00, 0x00, 0x00, 0x99, 0x00]),
        };
        if let Some(datagram) = datagram {
            inbox.push_back(datagram);
        }
    }
}

impl Drop for FakeBridge {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

fn discovery_reply() -> Vec<u8> {
    let mut reply = format!("{},ACCF23ABCDEF,", DISCOVERED_IP).into_bytes();
    reply.resize(34, b'X');
    reply
}

fn session_reply() -> Vec<u8> {
    let mut reply = vec![0u8; 22];
    reply[..5].copy_from_slice(&[0x28, 0x00, 0x00, 0x00, 0x11]);
    reply[19..21].copy_from_slice(&SESSION_ID);
    reply
}

fn password_reply() -> Vec<u8> {
    let mut reply = vec![0u8; 22];
    reply[..5].copy_from_slice(&[0x80, 0x00, 0x00, 0x00, 0x15]);
    reply[16..18].copy_from_slice(&PASSWORD);
    reply
}

impl AsyncUdpSocket for FakeBridge {
    async fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize> {
        if buf == DISCOVERY_TOKEN {
            let count = {
                let mut traffic = self.traffic.lock().unwrap();
                traffic.discovery.push(addr);
                traffic.discovery.len() as u32
            };
            self.respond(self.behavior.discovery, count, discovery_reply());
        } else if buf == HANDSHAKE_REQUEST {
            let count = {
                let mut traffic = self.traffic.lock().unwrap();
                traffic.handshakes += 1;
                traffic.handshakes
            };
            self.respond(self.behavior.session, count, session_reply());
        } else {
            let frame: [u8; 22] = buf
                .try_into()
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "not a frame"))?;
            if frame[13..20] == *Payload::PASSWORD_REQUEST.as_bytes() {
                let count = {
                    let mut traffic = self.traffic.lock().unwrap();
                    traffic.password_requests.push(frame);
                    traffic.password_requests.len() as u32
                };
                self.respond(self.behavior.password, count, password_reply());
            } else {
                self.traffic.lock().unwrap().commands.push((frame, addr));
            }
        }
        Ok(buf.len())
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.traffic.lock().unwrap().receives += 1;
        let next = self.inbox.lock().unwrap().pop_front();
        match next {
            Some(datagram) => {
                let size = datagram.len().min(buf.len());
                buf[..size].copy_from_slice(&datagram[..size]);
                Ok((size, SocketAddr::from((DISCOVERED_IP, 5987))))
            }
            None => std::future::pending().await,
        }
    }

    fn set_broadcast(&self, broadcast: bool) -> io::Result<()> {
        self.traffic.lock().unwrap().broadcast.push(broadcast);
        if !broadcast && self.fail_broadcast_reset {
            return Err(io::Error::other("broadcast reset refused"));
        }
        Ok(())
    }
}

fn config() -> BridgeConfig {
    BridgeConfig {
        receive_timeout_ms: 20,
        repeat_delay_ms: 1,
        spectrum_step_ms: 0,
        ..BridgeConfig::default()
    }
}

async fn ready_bridge(config: BridgeConfig) -> (Bridge<FakeBridge>, Probe) {
    let (fake, probe) = FakeBridge::new(Behavior::healthy());
    let bridge = Negotiator::new(fake, config).run().await.unwrap();
    (bridge, probe)
}

#[tokio::test]
async fn test_negotiates_with_configured_address() {
    let config = config();
    let (bridge, probe) = ready_bridge(config.clone()).await;

    let session = bridge.session();
    assert_eq!(session.id(), SESSION_ID);
    assert_eq!(session.password(), PASSWORD);
    assert_eq!(session.bridge(), config.bridge_addr());

    let traffic = probe.traffic();
    assert!(traffic.discovery.is_empty());
    assert!(traffic.broadcast.is_empty());
    assert_eq!(traffic.handshakes, 1);
    assert_eq!(traffic.password_requests.len(), 1);

    let request = traffic.password_requests[0];
    assert_eq!(&request[5..7], &SESSION_ID);
    assert_eq!(&request[11..13], &Session::PASSWORD_SENTINEL);
    assert_eq!(request[8], 2);
    assert!(milight_rs::Frame::from_bytes(request).verify_checksum());
}

#[tokio::test]
async fn test_discovery_sets_bridge_address() {
    let (fake, probe) = FakeBridge::new(Behavior::healthy());
    let config = BridgeConfig {
        discovery: true,
        ..config()
    };

    let bridge = Negotiator::new(fake, config).run().await.unwrap();
    assert_eq!(bridge.session().bridge(), SocketAddr::from((DISCOVERED_IP, 5987)));

    let traffic = probe.traffic();
    assert_eq!(
        traffic.discovery,
        vec![SocketAddr::from((Ipv4Addr::BROADCAST, DISCOVERY_PORT))]
    );
    assert_eq!(traffic.broadcast, vec![true, false]);
}

#[tokio::test]
async fn test_ready_within_attempt_ceilings() {
    let (fake, probe) = FakeBridge::new(Behavior {
        discovery: Reply::AnswerAfter(3),
        session: Reply::AnswerAfter(3),
        password: Reply::AnswerAfter(3),
    });
    let config = BridgeConfig {
        discovery: true,
        ..config()
    };

    let bridge = Negotiator::new(fake, config).run().await.unwrap();
    assert_eq!(bridge.session().password(), PASSWORD);

    let traffic = probe.traffic();
    assert_eq!(traffic.discovery.len(), 4);
    assert_eq!(traffic.handshakes, 4);
    assert_eq!(traffic.password_requests.len(), 4);
}

#[tokio::test]
async fn test_silent_discovery_aborts() {
    let (fake, probe) = FakeBridge::new(Behavior {
        discovery: Reply::Silent,
        ..Behavior::healthy()
    });
    let config = BridgeConfig {
        discovery: true,
        ..config()
    };

    let result = Negotiator::new(fake, config).run().await;
    assert!(matches!(result, Err(Error::DiscoveryFailed { attempts: 4 })));
    assert!(probe.is_closed());

    let traffic = probe.traffic();
    assert_eq!(traffic.discovery.len(), 4);
    assert_eq!(traffic.handshakes, 0);
    assert_eq!(traffic.broadcast, vec![true, false]);
}

#[tokio::test]
async fn test_discovery_failure_survives_broadcast_reset_error() {
    let (mut fake, probe) = FakeBridge::new(Behavior {
        discovery: Reply::Silent,
        ..Behavior::healthy()
    });
    fake.fail_broadcast_reset = true;
    let config = BridgeConfig {
        discovery: true,
        ..config()
    };

    let result = Negotiator::new(fake, config).run().await;
    assert!(matches!(result, Err(Error::DiscoveryFailed { attempts: 4 })));
    assert_eq!(probe.traffic().broadcast, vec![true, false]);
}

#[tokio::test]
async fn test_silent_handshake_aborts() {
    let (fake, probe) = FakeBridge::new(Behavior {
        session: Reply::Silent,
        ..Behavior::healthy()
    });

    let result = Negotiator::new(fake, config()).run().await;
    assert!(matches!(result, Err(Error::HandshakeFailed { attempts: 4 })));
    assert!(probe.is_closed());

    let traffic = probe.traffic();
    assert_eq!(traffic.handshakes, 4);
    assert!(traffic.password_requests.is_empty());
}

#[tokio::test]
async fn test_unexpected_session_replies_are_retried() {
    let (fake, probe) = FakeBridge::new(Behavior {
        session: Reply::Garbage,
        ..Behavior::healthy()
    });

    let result = Negotiator::new(fake, config()).run().await;
    assert!(matches!(result, Err(Error::HandshakeFailed { .. })));
    assert_eq!(probe.traffic().handshakes, 4);
}

#[tokio::test]
async fn test_silent_password_aborts_without_new_handshake() {
    let (fake, probe) = FakeBridge::new(Behavior {
        password: Reply::Silent,
        ..Behavior::healthy()
    });

    let result = Negotiator::new(fake, config()).run().await;
    let err = result.err().expect("password phase should fail");
    assert!(matches!(err, Error::PasswordRetrievalFailed { attempts: 4 }));
    assert!(err.is_negotiation_failure());
    assert!(probe.is_closed());

    let traffic = probe.traffic();
    assert_eq!(traffic.handshakes, 1);
    let nonces: Vec<u8> = traffic.password_requests.iter().map(|f| f[8]).collect();
    assert_eq!(nonces, vec![2, 3, 4, 5]);
    // one receive for the session id, then two per password request
    assert_eq!(traffic.receives, 1 + 4 * 2);
}

#[tokio::test]
async fn test_password_read_on_second_receive() {
    let (fake, probe) = FakeBridge::new(Behavior {
        password: Reply::StaleFirst,
        ..Behavior::healthy()
    });

    let bridge = Negotiator::new(fake, config()).run().await.unwrap();
    assert_eq!(bridge.session().password(), PASSWORD);

    let traffic = probe.traffic();
    assert_eq!(traffic.handshakes, 1);
    assert_eq!(traffic.password_requests.len(), 1);
    assert_eq!(traffic.receives, 3);
}

#[tokio::test]
async fn test_send_repeats_with_fresh_nonces() {
    let config = BridgeConfig {
        repeat: 3,
        ..config()
    };
    let (mut bridge, probe) = ready_bridge(config.clone()).await;
    let zone = Zone::create(2).unwrap();

    bridge
        .execute(DeviceType::Rgbww, zone, &Command::brightness(150))
        .await
        .unwrap();

    let traffic = probe.traffic();
    assert_eq!(traffic.commands.len(), 3);
    let mut nonces = Vec::new();
    for (frame, target) in &traffic.commands {
        assert_eq!(*target, config.bridge_addr());
        assert_eq!(&frame[5..7], &SESSION_ID);
        assert_eq!(&frame[11..13], &PASSWORD);
        assert_eq!(&frame[13..20], &[8, 3, 100, 0, 0, 0, 2]);
        nonces.push(frame[8]);
    }
    // the password request used nonce 2
    assert_eq!(nonces, vec![3, 4, 5]);
}

#[tokio::test]
async fn test_unsupported_command_sends_nothing() {
    let (mut bridge, probe) = ready_bridge(config()).await;

    let result = bridge
        .execute(DeviceType::Rgbw, Zone::create(1).unwrap(), &Command::Night)
        .await;
    assert!(matches!(
        result,
        Err(Error::UnsupportedCommandForDevice { device: DeviceType::Rgbw, .. })
    ));
    assert!(probe.traffic().commands.is_empty());
}

#[tokio::test]
async fn test_spectrum_walks_every_hue() {
    let (mut bridge, probe) = ready_bridge(config()).await;

    bridge
        .execute(DeviceType::Rgbw, Zone::create(3).unwrap(), &Command::Spectrum)
        .await
        .unwrap();

    let traffic = probe.traffic();
    assert_eq!(traffic.commands.len(), 256);
    for (step, (frame, _)) in traffic.commands.iter().enumerate() {
        let hue = (step as u8).wrapping_add(26);
        assert_eq!(&frame[13..20], &[7, 1, hue, hue, hue, hue, 3]);
    }
}

#[tokio::test]
async fn test_close_releases_socket() {
    let (bridge, probe) = ready_bridge(config()).await;
    assert!(!probe.is_closed());
    bridge.close();
    assert!(probe.is_closed());
}
