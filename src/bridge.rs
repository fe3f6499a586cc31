//! Command dispatch over an established session.

use log::debug;

use crate::command::{Command, map_command};
use crate::config::BridgeConfig;
use crate::errors::Error;
use crate::frame::Session;
use crate::negotiator::Negotiator;
use crate::payload::Payload;
use crate::runtime::{self, AsyncUdpSocket, UdpSocket};
use crate::types::{DeviceType, Zone};

type Result<T> = std::result::Result<T, Error>;

/// A bridge with a negotiated session, ready to receive command frames.
///
/// Only [`Negotiator::run`] creates a `Bridge`, so every frame it sends
/// carries a valid session id. Commands are fire-and-forget: nothing is
/// read back from the bridge once the session is established.
///
/// Dropping the bridge closes its socket.
pub struct Bridge<S> {
    socket: S,
    session: Session,
    config: BridgeConfig,
}

impl Bridge<UdpSocket> {
    /// Bind the local socket and negotiate a session with the bridge.
    ///
    /// ```ignore
    /// use milight_rs::{Bridge, BridgeConfig, Command, DeviceType, Zone};
    ///
    /// let mut bridge = Bridge::connect(BridgeConfig::default()).await?;
    /// bridge.execute(DeviceType::Rgbww, Zone::create(1)?, &Command::On).await?;
    /// ```
    pub async fn connect(config: BridgeConfig) -> Result<Self> {
        let socket =
            runtime::bind_bridge_socket(config.local_port).map_err(|e| Error::socket("bind", e))?;
        Negotiator::new(socket, config).run().await
    }
}

impl<S: AsyncUdpSocket> Bridge<S> {
    pub(crate) fn new(socket: S, session: Session, config: BridgeConfig) -> Self {
        Bridge {
            socket,
            session,
            config,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Send one payload, repeated as configured.
    ///
    /// Every repeat is a fresh frame with its own nonce. Repeats are spaced
    /// by the repeat delay; there is no delay after the last one.
    pub async fn send(&mut self, payload: &Payload) -> Result<()> {
        let repeats = self.config.repeats();
        for i in 0..repeats {
            let frame = self.session.build_frame(payload);
            debug!("Sending message to the bridge: {}", frame);
            self.socket
                .send_to(frame.as_bytes(), self.session.bridge())
                .await
                .map_err(|e| Error::socket("send_to", e))?;

            if i + 1 < repeats {
                runtime::sleep(self.config.repeat_delay()).await;
            }
        }
        Ok(())
    }

    /// Map a command for a device and zone and send it.
    ///
    /// [`Command::Spectrum`] is expanded into 256 colour steps.
    pub async fn execute(&mut self, device: DeviceType, zone: Zone, command: &Command) -> Result<()> {
        if *command == Command::Spectrum {
            return self.spectrum(device, zone).await;
        }

        let payload = map_command(device, zone, command)?;
        self.send(&payload).await?;
        debug!("Message sent: {} to device {} zone {}", command, device, zone);
        Ok(())
    }

    /// Walk the whole colour wheel, one hue per step.
    pub async fn spectrum(&mut self, device: DeviceType, zone: Zone) -> Result<()> {
        for hue in 0..=u8::MAX {
            let payload = map_command(device, zone, &Command::Color(hue))?;
            debug!("Spectrum step, color {}", payload.value());
            self.send(&payload).await?;
            runtime::sleep(self.config.spectrum_step()).await;
        }
        debug!("Spectrum sent to device {} zone {}", device, zone);
        Ok(())
    }

    /// Close the socket.
    pub fn close(self) {
        debug!("Closing bridge socket");
    }
}
