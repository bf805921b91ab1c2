//! Strip-type listener
//!
//! A small UDP service on port 3002 that receives the LED chip name as ASCII
//! (`WS281X`, `SK9822`, `APA102`, `P9813`, `LPD8806`) and publishes it on the
//! shared [`OutputModeFlag`]. The render loop picks the change up on its next
//! cycle.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use ledmap_core::{ChipType, DatagramSocket, OutputModeFlag, ShutdownToken};
use tracing::{debug, info, warn};

use crate::error::{ControlError, Result};

const MAX_NAME_LEN: usize = 64;
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// State owned by the strip-type thread
pub struct ModeListener {
    socket: Box<dyn DatagramSocket>,
    flag: OutputModeFlag,
    current: ChipType,
    buf: [u8; MAX_NAME_LEN],
}

impl ModeListener {
    /// Create a listener publishing to `flag`
    pub fn new(socket: Box<dyn DatagramSocket>, flag: OutputModeFlag) -> Self {
        let current = flag.load();
        Self {
            socket,
            flag,
            current,
            buf: [0; MAX_NAME_LEN],
        }
    }

    /// Drain pending datagrams, returning the newly selected chip if it changed
    pub fn poll_once(&mut self) -> Option<ChipType> {
        let mut changed = None;
        loop {
            let n = match self.socket.recv_from(&mut self.buf) {
                Ok(Some((n, _))) => n,
                Ok(None) => break,
                Err(e) => {
                    warn!("Strip type receive failed: {}", e);
                    break;
                }
            };

            let name = String::from_utf8_lossy(&self.buf[..n]);
            let Some(chip) = ChipType::from_name(&name) else {
                debug!("Ignoring unknown strip type {:?}", name);
                continue;
            };
            if chip != self.current {
                info!("Strip type changed: {} -> {}", self.current, chip);
                self.current = chip;
                self.flag.store(chip);
                changed = Some(chip);
            }
        }
        changed
    }

    /// Run on a named thread until `shutdown` fires
    pub fn spawn(mut self, shutdown: ShutdownToken) -> Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("strip-type".to_string())
            .spawn(move || {
                info!("Strip type listener started ({})", self.current);
                while shutdown.is_running() {
                    self.poll_once();
                    thread::sleep(POLL_INTERVAL);
                }
                info!("Strip type listener stopped");
            })
            .map_err(|source| ControlError::Spawn {
                name: "strip-type".to_string(),
                source,
            })
    }
}
