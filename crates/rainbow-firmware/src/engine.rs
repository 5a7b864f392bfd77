use std::{
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard},
};

use tracing::{error, info};

use crate::{
    admin::{self, AdminHandle},
    config::FirmwareConfig,
    dispatch::{self, FollowUp},
    link::Link,
    state::{self, ChipState},
};

/// Byte-level capability the emulator drives. UART details are out of
/// scope: bytes are exchanged directly, one per call.
pub trait Firmware {
    /// Feed one byte from the CPU.
    fn rx(&mut self, byte: u8);
    /// Read one byte towards the CPU. When nothing new is queued, the
    /// previously read byte is returned again, like a UART data register.
    fn tx(&mut self) -> u8;
    /// GPIO 15, set half. Accepted and ignored.
    fn set_gpio15(&mut self, level: bool);
    /// GPIO 15, get half: true when response bytes are waiting.
    fn get_gpio15(&mut self) -> bool;
}

/// Closed set of supported chip firmwares.
#[derive(Clone, Copy, Debug)]
#[repr(u8)]
pub enum FirmwareKind {
    Rainbow,
}

impl FirmwareKind {
    pub fn boot(self, config: FirmwareConfig) -> Box<dyn Firmware> {
        match self {
            Self::Rainbow => Box::new(RainbowFirmware::new(config)),
        }
    }
}

/// The BrokeStudio Rainbow chip: framed command protocol, virtual
/// filesystem, game-server WebSocket link and HTTP admin surface, all over
/// one shared state record.
pub struct RainbowFirmware {
    state: Arc<Mutex<ChipState>>,
    admin: Option<AdminHandle>,
}

impl RainbowFirmware {
    /// Boot the chip: dial the game server (best effort) and start the
    /// admin surface when configured. Neither failing is fatal.
    pub fn new(config: FirmwareConfig) -> Self {
        let mut chip = ChipState::new(config.server_url.clone());
        chip.link = Link::open(&config.server_url);
        let state = Arc::new(Mutex::new(chip));

        let admin = config.admin_port.and_then(|port| {
            match admin::spawn(port, Arc::clone(&state)) {
                Ok(handle) => {
                    info!(addr = %handle.addr(), "admin server up");
                    Some(handle)
                }
                Err(err) => {
                    error!(%err, "admin server failed to start");
                    None
                }
            }
        });

        Self { state, admin }
    }

    /// Local address of the admin server, when it is running.
    pub fn admin_addr(&self) -> Option<SocketAddr> {
        self.admin.as_ref().map(AdminHandle::addr)
    }

    fn lock(&self) -> MutexGuard<'_, ChipState> {
        state::lock(&self.state)
    }

    /// Dial the configured server with the engine lock released, then take
    /// it again just long enough to install the result. Everything else
    /// keeps running during the dial; status queries report down until it
    /// completes.
    fn redial(&self) {
        let url = self.lock().server_url.clone();
        let link = Link::open(&url);
        self.lock().link = link;
    }
}

impl Firmware for RainbowFirmware {
    fn rx(&mut self, byte: u8) {
        let follow_up = {
            let mut state = self.lock();
            match state.assembler.push(byte) {
                Some(frame) => dispatch::dispatch(&mut state, &frame),
                None => None,
            }
        };
        match follow_up {
            Some(FollowUp::Redial) => self.redial(),
            None => {}
        }
    }

    fn tx(&mut self) -> u8 {
        let mut state = self.lock();
        state.pump_link();
        if let Some(byte) = state.tx.pop_front() {
            state.last_byte_read = byte;
        }
        state.last_byte_read
    }

    fn set_gpio15(&mut self, _level: bool) {}

    fn get_gpio15(&mut self) -> bool {
        let mut state = self.lock();
        state.pump_link();
        !state.tx.is_empty()
    }
}

impl Drop for RainbowFirmware {
    fn drop(&mut self) {
        if let Some(admin) = self.admin.take() {
            admin.shutdown();
        }
        let waiters = {
            let mut state = self.lock();
            dispatch::close_link(&mut state);
            std::mem::take(&mut state.close_waiters)
        };
        for waiter in waiters {
            let _ = waiter.join();
        }
    }
}
